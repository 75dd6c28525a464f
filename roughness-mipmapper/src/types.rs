//! Common types and type aliases used throughout the mipmapper
//!
//! This module re-exports glam types for the vector math the passes need and
//! provides a few small helpers shared by the orchestrator and the renderers.
//!
//! # Usage
//!
//! ```rust
//! use roughness_mipmapper::types::*;
//!
//! let texel_size = Vector2D::new(1.0 / 256.0, 1.0 / 256.0);
//! let viewport = Viewport::new(0.0, 0.0, 256.0, 256.0);
//! assert_eq!(viewport.size(), Vector2D::new(256.0, 256.0));
//! assert!(is_power_of_two(256));
//! # let _ = texel_size;
//! ```

// Re-export glam types as our primary math types
pub use glam::{UVec2 as Extent2D, Vec2 as Vector2D, Vec3 as Vector3D, Vec4 as Vector4D};

/// Integer pixel offset (alias for Extent2D)
pub type Offset2D = Extent2D;

/// Returns true when `value` is a non-zero power of two
#[inline]
pub fn is_power_of_two(value: u32) -> bool {
    value.is_power_of_two()
}

/// A viewport rectangle in logical (device-independent) pixels
///
/// Renderers multiply by their pixel ratio to obtain the physical rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Viewport {
    /// Create a new viewport
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a viewport anchored at the origin
    pub fn from_size(size: Vector2D) -> Self {
        Self::new(0.0, 0.0, size.x, size.y)
    }

    /// Offset of the viewport
    pub fn offset(&self) -> Vector2D {
        Vector2D::new(self.x, self.y)
    }

    /// Size of the viewport
    pub fn size(&self) -> Vector2D {
        Vector2D::new(self.width, self.height)
    }

    /// Scale every component, e.g. by a device pixel ratio
    pub fn scaled(&self, factor: f32) -> Self {
        Self::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two() {
        assert!(is_power_of_two(1));
        assert!(is_power_of_two(512));
        assert!(!is_power_of_two(0));
        assert!(!is_power_of_two(100));
    }

    #[test]
    fn test_viewport_scaling() {
        let viewport = Viewport::new(0.0, 0.0, 64.0, 32.0).scaled(2.0);
        assert_eq!(viewport.size(), Vector2D::new(128.0, 64.0));
        assert_eq!(viewport.offset(), Vector2D::ZERO);
    }
}
