//! The full-screen roughness pass
//!
//! [`MipmapPass`] bundles what a renderer needs to draw one mip level: the
//! bound roughness and normal sources, the texel-size uniform, the quad to
//! rasterize and the per-fragment shading function [`MipmapPass::shade`].

use crate::{
    error::{Error, Result},
    sampler::{neighborhood_dispersion, TextureSampler},
    texture::TextureRef,
    types::{Vector2D, Vector3D, Vector4D},
    variance::add_variance,
};

/// Debug name renderers may use for the compiled program
pub const PASS_LABEL: &str = "RoughnessMipmapper";

/// A 2×2 plane in clip space covering the whole viewport
#[derive(Debug, Clone, PartialEq)]
pub struct FullScreenQuad {
    positions: Vec<Vector3D>,
    uvs: Vec<Vector2D>,
    indices: Vec<u16>,
}

impl FullScreenQuad {
    /// Build the quad geometry
    pub fn new() -> Self {
        Self {
            positions: vec![
                Vector3D::new(-1.0, 1.0, 0.0),
                Vector3D::new(1.0, 1.0, 0.0),
                Vector3D::new(-1.0, -1.0, 0.0),
                Vector3D::new(1.0, -1.0, 0.0),
            ],
            uvs: vec![
                Vector2D::new(0.0, 0.0),
                Vector2D::new(1.0, 0.0),
                Vector2D::new(0.0, 1.0),
                Vector2D::new(1.0, 1.0),
            ],
            indices: vec![0, 2, 1, 2, 3, 1],
        }
    }

    /// Clip-space vertex positions
    pub fn positions(&self) -> &[Vector3D] {
        &self.positions
    }

    /// Texture coordinates, (0,0) at the top-left corner
    pub fn uvs(&self) -> &[Vector2D] {
        &self.uvs
    }

    /// Triangle list indices
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }
}

impl Default for FullScreenQuad {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform values of the pass
#[derive(Debug, Clone, Default)]
pub struct PassUniforms {
    /// Roughness source; rebound to the destination after every level
    pub roughness_map: Option<TextureRef>,
    /// Normal map the dispersion is measured on
    pub normal_map: Option<TextureRef>,
    /// Reciprocal size of the level being drawn, zero for level 0
    pub texel_size: Vector2D,
    /// Level-of-detail bias for both texture reads
    pub lod_bias: f32,
    /// Tap distance as a fraction of `texel_size`
    pub neighborhood_offset: f32,
}

/// The roughness mip pass: geometry, uniforms and fragment logic
#[derive(Debug)]
pub struct MipmapPass {
    uniforms: PassUniforms,
    quad: Option<FullScreenQuad>,
}

impl MipmapPass {
    /// Create the pass with unbound sources
    pub fn new(lod_bias: f32, neighborhood_offset: f32) -> Self {
        Self {
            uniforms: PassUniforms {
                lod_bias,
                neighborhood_offset,
                texel_size: Vector2D::ONE,
                ..PassUniforms::default()
            },
            quad: Some(FullScreenQuad::new()),
        }
    }

    /// Current uniform values
    pub fn uniforms(&self) -> &PassUniforms {
        &self.uniforms
    }

    /// Bind the roughness source
    pub fn set_roughness_map(&mut self, texture: Option<TextureRef>) {
        self.uniforms.roughness_map = texture;
    }

    /// Bind the normal source
    pub fn set_normal_map(&mut self, texture: Option<TextureRef>) {
        self.uniforms.normal_map = texture;
    }

    /// Set the texel-size uniform
    pub fn set_texel_size(&mut self, texel_size: Vector2D) {
        self.uniforms.texel_size = texel_size;
    }

    /// Quad to rasterize; `None` once the pass is disposed
    pub fn geometry(&self) -> Option<&FullScreenQuad> {
        self.quad.as_ref()
    }

    /// Whether [`MipmapPass::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.quad.is_none()
    }

    /// Drop the geometry and unbind both sources
    pub fn dispose(&mut self) {
        self.quad = None;
        self.uniforms.roughness_map = None;
        self.uniforms.normal_map = None;
    }

    /// Shade one fragment
    ///
    /// The roughness source is read with the configured bias. At the
    /// passthrough level (zero texel size) the sample is returned as is;
    /// otherwise the green channel gains the normal dispersion of the
    /// fragment's neighborhood, added in variance space.
    pub fn shade<S: TextureSampler + ?Sized>(&self, sampler: &S, uv: Vector2D) -> Result<Vector4D> {
        let uniforms = &self.uniforms;
        let roughness_map = uniforms
            .roughness_map
            .as_ref()
            .ok_or_else(|| Error::invalid_parameter("roughness map is not bound"))?;

        let mut color = sampler.sample(roughness_map, uv, uniforms.lod_bias)?;
        if uniforms.texel_size.x == 0.0 {
            return Ok(color);
        }

        let normal_map = uniforms
            .normal_map
            .as_ref()
            .ok_or_else(|| Error::invalid_parameter("normal map is not bound"))?;
        let dispersion = neighborhood_dispersion(
            sampler,
            normal_map,
            uv,
            uniforms.texel_size,
            uniforms.neighborhood_offset,
            uniforms.lod_bias,
        )?;
        color.y = add_variance(color.y, dispersion);
        Ok(color)
    }
}
