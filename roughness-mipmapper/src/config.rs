//! Mipmapper configuration

use crate::{
    error::{Error, Result},
    texture::FilterMode,
};

/// Default level-of-detail bias for the pass's texture reads
pub const DEFAULT_LOD_BIAS: f32 = -1.0;

/// Default tap distance, as a fraction of the current level's texel size
pub const DEFAULT_NEIGHBORHOOD_OFFSET: f32 = 0.25;

/// Settings for a [`crate::RoughnessMipmapper`]
///
/// ```rust
/// use roughness_mipmapper::{FilterMode, MipmapperConfig};
///
/// let config = MipmapperConfig::new()
///     .with_dispose_superseded(false)
///     .with_destination_filter(FilterMode::LinearMipmapNearest);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MipmapperConfig {
    /// Bias added to the automatic level of detail of both source reads
    ///
    /// The default of -1 makes level `n` read level `n - 1` of the previous
    /// output rather than the stale level `n` itself.
    pub lod_bias: f32,
    /// Distance of the four normal taps from the fragment center, in texels
    pub neighborhood_offset: f32,
    /// Whether a roughness texture replaced by a resized one is disposed
    pub dispose_superseded: bool,
    /// Minification filter of a newly allocated destination texture
    pub destination_filter: FilterMode,
}

impl MipmapperConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self {
            lod_bias: DEFAULT_LOD_BIAS,
            neighborhood_offset: DEFAULT_NEIGHBORHOOD_OFFSET,
            dispose_superseded: true,
            destination_filter: FilterMode::LinearMipmapLinear,
        }
    }

    /// Set the level-of-detail bias
    pub fn with_lod_bias(mut self, bias: f32) -> Self {
        self.lod_bias = bias;
        self
    }

    /// Set the neighborhood tap offset
    pub fn with_neighborhood_offset(mut self, offset: f32) -> Self {
        self.neighborhood_offset = offset;
        self
    }

    /// Enable or disable disposal of superseded roughness textures
    pub fn with_dispose_superseded(mut self, dispose: bool) -> Self {
        self.dispose_superseded = dispose;
        self
    }

    /// Set the destination minification filter
    pub fn with_destination_filter(mut self, filter: FilterMode) -> Self {
        self.destination_filter = filter;
        self
    }

    /// Check that the values are usable
    pub fn validate(&self) -> Result<()> {
        if !self.lod_bias.is_finite() {
            return Err(Error::invalid_parameter("lod_bias must be finite"));
        }
        if !(self.neighborhood_offset > 0.0 && self.neighborhood_offset <= 0.5) {
            return Err(Error::invalid_parameter(format!(
                "neighborhood_offset must be in (0, 0.5], got {}",
                self.neighborhood_offset
            )));
        }
        if !self.destination_filter.uses_mipmaps() {
            return Err(Error::invalid_parameter(
                "destination_filter must sample mipmaps",
            ));
        }
        Ok(())
    }
}

impl Default for MipmapperConfig {
    fn default() -> Self {
        Self::new()
    }
}
