//! Error handling for roughness mipmap generation

use thiserror::Error;

use crate::texture::TextureId;

/// Result type alias for roughness mipmapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the rendering collaborator or by invalid API usage
///
/// Skipped materials are not errors; see [`crate::MipmapStatus`].
#[derive(Error, Debug)]
pub enum Error {
    /// A render surface or texture could not be allocated
    #[error("Allocation failed: {message}")]
    AllocationFailed { message: String },

    /// Invalid parameters or configuration
    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// A render surface was used after it was disposed or was never bound
    #[error("Invalid render surface: {message}")]
    InvalidSurface { message: String },

    /// A texture was read or written after it was disposed
    #[error("Texture {id} has been disposed")]
    TextureDisposed { id: TextureId },

    /// The mipmapper was used after `dispose()`
    #[error("Mipmapper has been disposed")]
    RendererDisposed,

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with custom message
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a new allocation error
    pub fn allocation_failed<S: Into<String>>(message: S) -> Self {
        Self::AllocationFailed {
            message: message.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(message: S) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new invalid surface error
    pub fn invalid_surface<S: Into<String>>(message: S) -> Self {
        Self::InvalidSurface {
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = Error::allocation_failed("out of video memory");
        assert!(matches!(error, Error::AllocationFailed { .. }));
        assert_eq!(error.to_string(), "Allocation failed: out of video memory");
    }

    #[test]
    fn test_disposed_texture_message() {
        let error = Error::TextureDisposed { id: TextureId(7) };
        assert_eq!(error.to_string(), "Texture #7 has been disposed");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error: Error = io.into();
        assert!(matches!(error, Error::Io(_)));
    }
}
