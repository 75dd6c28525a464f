//! Normal-map neighborhood sampling
//!
//! For each output texel the normal map is read at four points arranged as a
//! 2×2 grid around the texel center. Their decoded directions are normalized
//! and summed; the shorter the sum, the more the normals disagree, and the
//! more roughness the texel has to absorb.

use crate::{
    error::Result,
    texture::Texture,
    types::{Vector2D, Vector3D, Vector4D},
};

/// Source of filtered texture reads for a single fragment
///
/// Implementations own the screen-space footprint of the fragment, so the
/// mip level they read from follows from the texture size and `bias`.
pub trait TextureSampler {
    /// Sample `texture` at `uv`, offsetting the automatic level of detail by `bias`
    fn sample(&self, texture: &Texture, uv: Vector2D, bias: f32) -> Result<Vector4D>;
}

/// Offsets of the four taps, in units of `offset * texel_size`
const TAPS: [Vector2D; 4] = [
    Vector2D::new(-1.0, -1.0),
    Vector2D::new(-1.0, 1.0),
    Vector2D::new(1.0, -1.0),
    Vector2D::new(1.0, 1.0),
];

/// Decode a normal-map color into a signed direction in [-0.5, 0.5]
#[inline]
pub fn decode_normal(color: Vector4D) -> Vector3D {
    color.truncate() - Vector3D::splat(0.5)
}

/// Dispersion of four normal directions
///
/// Every direction is normalized (a zero vector stays zero) and the result is
/// `1 - |sum| / 4`: 0 for identical directions, 1 when they cancel out.
pub fn dispersion_from_normals(normals: [Vector3D; 4]) -> f32 {
    let sum: Vector3D = normals.iter().map(|n| n.normalize_or_zero()).sum();
    (1.0 - 0.25 * sum.length()).max(0.0)
}

/// Sample the 2×2 neighborhood of `uv` and return its dispersion
///
/// Returns 0 without touching the texture when `texel_size` is zero, which
/// marks the full-resolution passthrough level.
pub fn neighborhood_dispersion<S: TextureSampler + ?Sized>(
    sampler: &S,
    normal_map: &Texture,
    uv: Vector2D,
    texel_size: Vector2D,
    offset: f32,
    bias: f32,
) -> Result<f32> {
    if texel_size == Vector2D::ZERO {
        return Ok(0.0);
    }

    let mut normals = [Vector3D::ZERO; 4];
    for (normal, tap) in normals.iter_mut().zip(TAPS) {
        let color = sampler.sample(normal_map, uv + tap * offset * texel_size, bias)?;
        *normal = decode_normal(color);
    }
    Ok(dispersion_from_normals(normals))
}
