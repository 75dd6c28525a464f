//! Texel storage and mip pyramids
//!
//! A [`MipChain`] is an ordered list of [`TexelGrid`]s: level 0 at full
//! resolution, every following level halved in each dimension (never below
//! one texel), ending at 1×1.

use crate::{
    error::{Error, Result},
    types::{Extent2D, Vector2D, Vector4D},
};

/// Number of levels in a full mip pyramid for the given base size
///
/// Equals `floor(log2(max(width, height))) + 1`, or 0 for an empty base.
pub fn level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height);
    u32::BITS - largest.leading_zeros()
}

/// Size of `level` in a pyramid whose base is `width` × `height`
pub fn level_extent(width: u32, height: u32, level: u32) -> Extent2D {
    let shrink = |dim: u32| dim.checked_shr(level).unwrap_or(0).max(1);
    Extent2D::new(shrink(width), shrink(height))
}

/// A 2D grid of linear RGBA texels
#[derive(Debug, Clone, PartialEq)]
pub struct TexelGrid {
    width: u32,
    height: u32,
    texels: Vec<Vector4D>,
}

impl TexelGrid {
    /// Create a zero-initialized grid
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Vector4D::ZERO)
    }

    /// Create a grid where every texel holds `color`
    pub fn filled(width: u32, height: u32, color: Vector4D) -> Self {
        Self {
            width,
            height,
            texels: vec![color; width as usize * height as usize],
        }
    }

    /// Create a grid by evaluating `f(x, y)` for every texel
    pub fn from_fn<F: FnMut(u32, u32) -> Vector4D>(width: u32, height: u32, mut f: F) -> Self {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            texels,
        }
    }

    /// Wrap existing row-major texel data
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vector4D>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(Error::invalid_parameter(format!(
                "expected {} texels for a {}x{} grid, got {}",
                expected,
                width,
                height,
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// Width in texels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as (width, height)
    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }

    /// Row-major texel data
    pub fn texels(&self) -> &[Vector4D] {
        &self.texels
    }

    /// Mutable row-major texel data
    pub fn texels_mut(&mut self) -> &mut [Vector4D] {
        &mut self.texels
    }

    /// Read a texel, clamping the coordinate to the edge
    pub fn get(&self, x: i64, y: i64) -> Vector4D {
        if self.texels.is_empty() {
            return Vector4D::ZERO;
        }
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.texels[y * self.width as usize + x]
    }

    /// Write a texel; out-of-range coordinates are ignored
    pub fn set(&mut self, x: u32, y: u32, value: Vector4D) {
        if x < self.width && y < self.height {
            self.texels[y as usize * self.width as usize + x as usize] = value;
        }
    }

    /// Set every texel to `color`
    pub fn fill(&mut self, color: Vector4D) {
        self.texels.fill(color);
    }

    /// Bilinear sample with clamp-to-edge addressing
    ///
    /// `uv` is in normalized coordinates, (0,0) being the corner of texel (0,0).
    pub fn sample_bilinear(&self, uv: Vector2D) -> Vector4D {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = self.get(x0, y0).lerp(self.get(x0 + 1, y0), tx);
        let bottom = self.get(x0, y0 + 1).lerp(self.get(x0 + 1, y0 + 1), tx);
        top.lerp(bottom, ty)
    }

    /// Nearest-texel sample with clamp-to-edge addressing
    pub fn sample_nearest(&self, uv: Vector2D) -> Vector4D {
        let x = (uv.x * self.width as f32).floor() as i64;
        let y = (uv.y * self.height as f32).floor() as i64;
        self.get(x, y)
    }

    /// Produce the next pyramid level with a 2×2 box filter
    pub fn downsample(&self) -> TexelGrid {
        let width = (self.width / 2).max(1);
        let height = (self.height / 2).max(1);
        TexelGrid::from_fn(width, height, |x, y| {
            let (sx, sy) = (x as i64 * 2, y as i64 * 2);
            (self.get(sx, sy) + self.get(sx + 1, sy) + self.get(sx, sy + 1) + self.get(sx + 1, sy + 1))
                * 0.25
        })
    }
}

/// A full or partial mip pyramid
#[derive(Debug, Clone, PartialEq)]
pub struct MipChain {
    levels: Vec<TexelGrid>,
}

impl MipChain {
    /// Allocate a complete zero-initialized pyramid
    pub fn allocate(width: u32, height: u32) -> Self {
        let levels = (0..level_count(width, height))
            .map(|level| {
                let extent = level_extent(width, height, level);
                TexelGrid::new(extent.x, extent.y)
            })
            .collect();
        Self { levels }
    }

    /// Build a pyramid from a base level
    ///
    /// With `generate` set, every coarser level is box-filtered from the one
    /// above it; otherwise the chain holds the base level only.
    pub fn from_base(base: TexelGrid, generate: bool) -> Self {
        let count = if generate {
            level_count(base.width, base.height) as usize
        } else {
            1
        };
        let mut levels = Vec::with_capacity(count);
        levels.push(base);
        while levels.len() < count {
            let next = levels[levels.len() - 1].downsample();
            levels.push(next);
        }
        Self { levels }
    }

    /// Append zero-initialized levels until the pyramid reaches 1×1
    pub fn complete(&mut self) {
        let Some(base) = self.levels.first() else {
            return;
        };
        let (width, height) = (base.width, base.height);
        for level in self.levels.len() as u32..level_count(width, height) {
            let extent = level_extent(width, height, level);
            self.levels.push(TexelGrid::new(extent.x, extent.y));
        }
    }

    /// Number of stored levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Full resolution level
    pub fn base(&self) -> Option<&TexelGrid> {
        self.levels.first()
    }

    /// Get a level by index
    pub fn level(&self, level: usize) -> Option<&TexelGrid> {
        self.levels.get(level)
    }

    /// Get a mutable level by index
    pub fn level_mut(&mut self, level: usize) -> Option<&mut TexelGrid> {
        self.levels.get_mut(level)
    }

    /// All levels, finest first
    pub fn levels(&self) -> &[TexelGrid] {
        &self.levels
    }

    /// Validate that each level is exactly half the previous one
    pub fn validate_size(&self) -> bool {
        self.levels.windows(2).all(|pair| {
            let (previous, level) = (&pair[0], &pair[1]);
            (previous.width / 2).max(1) == level.width && (previous.height / 2).max(1) == level.height
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_level_count() {
        assert_eq!(level_count(1, 1), 1);
        assert_eq!(level_count(256, 256), 9);
        assert_eq!(level_count(512, 128), 10);
        assert_eq!(level_count(0, 0), 0);
    }

    #[test]
    fn test_level_extent_never_reaches_zero() {
        assert_eq!(level_extent(8, 2, 0), Extent2D::new(8, 2));
        assert_eq!(level_extent(8, 2, 2), Extent2D::new(2, 1));
        assert_eq!(level_extent(8, 2, 3), Extent2D::new(1, 1));
    }

    #[test]
    fn test_allocate_is_valid_pyramid() {
        let chain = MipChain::allocate(64, 16);
        assert_eq!(chain.level_count(), 7);
        assert!(chain.validate_size());
        assert_eq!(chain.level(6).map(TexelGrid::extent), Some(Extent2D::new(1, 1)));
    }

    #[test]
    fn test_complete_appends_missing_levels() {
        let mut chain = MipChain::from_base(TexelGrid::filled(8, 8, Vector4D::ONE), false);
        chain.complete();
        assert_eq!(chain.level_count(), 4);
        assert!(chain.validate_size());
        assert_eq!(chain.level(0).map(|l| l.get(3, 3)), Some(Vector4D::ONE));
    }

    #[test]
    fn test_from_texels_rejects_wrong_length() {
        assert!(TexelGrid::from_texels(2, 2, vec![Vector4D::ONE; 3]).is_err());
    }

    #[test]
    fn test_bilinear_at_texel_centers_is_exact() {
        let grid = TexelGrid::from_fn(4, 4, |x, y| Vector4D::splat((x + 4 * y) as f32));
        let sample = grid.sample_bilinear(Vector2D::new(2.5 / 4.0, 1.5 / 4.0));
        assert_eq!(sample, Vector4D::splat(6.0));
    }

    #[test]
    fn test_bilinear_at_corner_averages_quad() {
        let grid = TexelGrid::from_fn(2, 2, |x, y| Vector4D::splat((x + 2 * y) as f32));
        let sample = grid.sample_bilinear(Vector2D::splat(0.5));
        assert_abs_diff_eq!(sample.x, 1.5);
    }

    #[test]
    fn test_generated_chain_box_filters() {
        let base = TexelGrid::from_fn(2, 2, |x, _| Vector4D::splat(x as f32));
        let chain = MipChain::from_base(base, true);
        assert_eq!(chain.level_count(), 2);
        assert_abs_diff_eq!(chain.level(1).map(|l| l.get(0, 0).x).unwrap_or(-1.0), 0.5);
    }
}
