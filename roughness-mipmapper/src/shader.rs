//! WGSL version of the roughness mip pass
//!
//! GPU backends can compile [`ROUGHNESS_MIPMAP_WGSL`] and draw the
//! [`crate::pass::FullScreenQuad`] with it. Bind group 0 holds the uniform
//! block ([`MipmapUniforms`]), the roughness source, the normal map and a
//! trilinear clamp-to-edge sampler.

use crate::pass::PassUniforms;

/// Vertex entry point name
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point name
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL source of the pass
pub const ROUGHNESS_MIPMAP_WGSL: &str = r#"
struct MipmapUniforms {
    texel_size: vec2<f32>,
    lod_bias: f32,
    neighborhood_offset: f32,
};

@group(0) @binding(0) var<uniform> uniforms: MipmapUniforms;
@group(0) @binding(1) var roughness_map: texture_2d<f32>;
@group(0) @binding(2) var normal_map: texture_2d<f32>;
@group(0) @binding(3) var map_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

const R0: f32 = 1.0;
const V0: f32 = 0.339;
const R1: f32 = 0.8;
const V1: f32 = 0.276;
const R4: f32 = 0.4;
const V4: f32 = 0.046;
const R5: f32 = 0.305;
const V5: f32 = 0.016;

fn roughness_to_variance(value: f32) -> f32 {
    let roughness = clamp(value, 0.0, 1.0);
    if (roughness >= R1) {
        return (R0 - roughness) * (V1 - V0) / (R0 - R1) + V0;
    }
    if (roughness >= R4) {
        return (R1 - roughness) * (V4 - V1) / (R1 - R4) + V1;
    }
    if (roughness >= R5) {
        return (R4 - roughness) * (V5 - V4) / (R4 - R5) + V4;
    }
    let t = roughness / R5;
    let t2 = t * t;
    return V5 * t2 * t2;
}

fn variance_to_roughness(variance: f32) -> f32 {
    var roughness: f32 = 0.0;
    if (variance >= V1) {
        roughness = (V0 - variance) * (R1 - R0) / (V0 - V1) + R0;
    } else if (variance >= V4) {
        roughness = (V1 - variance) * (R4 - R1) / (V1 - V4) + R1;
    } else if (variance >= V5) {
        roughness = (V4 - variance) * (R5 - R4) / (V4 - V5) + R4;
    } else if (variance > 0.0) {
        roughness = R5 * pow(variance / V5, 0.25);
    }
    return clamp(roughness, 0.0, 1.0);
}

fn normalize_or_zero(v: vec3<f32>) -> vec3<f32> {
    let len = length(v);
    if (len > 0.0) {
        return v / len;
    }
    return vec3<f32>(0.0);
}

fn decode_normal(uv: vec2<f32>) -> vec3<f32> {
    let color = textureSampleBias(normal_map, map_sampler, uv, uniforms.lod_bias);
    return normalize_or_zero(color.xyz - vec3<f32>(0.5));
}

@vertex
fn vs_main(in_vertex: VertexInput) -> VertexOutput {
    var vs_out: VertexOutput;
    vs_out.position = vec4<f32>(in_vertex.position, 1.0);
    vs_out.uv = in_vertex.uv;
    return vs_out;
}

@fragment
fn fs_main(in_fragment: VertexOutput) -> @location(0) vec4<f32> {
    var color = textureSampleBias(roughness_map, map_sampler, in_fragment.uv, uniforms.lod_bias);
    if (uniforms.texel_size.x == 0.0) {
        return color;
    }

    let tap = uniforms.neighborhood_offset * uniforms.texel_size;
    var sum = decode_normal(in_fragment.uv + vec2<f32>(-tap.x, -tap.y));
    sum += decode_normal(in_fragment.uv + vec2<f32>(-tap.x, tap.y));
    sum += decode_normal(in_fragment.uv + vec2<f32>(tap.x, -tap.y));
    sum += decode_normal(in_fragment.uv + vec2<f32>(tap.x, tap.y));

    let dispersion = max(1.0 - 0.25 * length(sum), 0.0);
    color.y = variance_to_roughness(roughness_to_variance(color.y) + dispersion);
    return color;
}
"#;

/// Uniform block layout shared with [`ROUGHNESS_MIPMAP_WGSL`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C)]
pub struct MipmapUniforms {
    /// Reciprocal size of the level being drawn, zero for level 0
    pub texel_size: [f32; 2],
    /// Level-of-detail bias of both texture reads
    pub lod_bias: f32,
    /// Tap distance as a fraction of `texel_size`
    pub neighborhood_offset: f32,
}

impl From<&PassUniforms> for MipmapUniforms {
    fn from(uniforms: &PassUniforms) -> Self {
        Self {
            texel_size: uniforms.texel_size.to_array(),
            lod_bias: uniforms.lod_bias,
            neighborhood_offset: uniforms.neighborhood_offset,
        }
    }
}

#[cfg(feature = "bytemuck")]
impl MipmapUniforms {
    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
