//! # Roughness Mipmapper
//!
//! Variance-preserving mip chains for physically based roughness maps.
//!
//! Box-filtering a roughness map hides the fact that a minified surface
//! averages many microfacet orientations. This crate renders each roughness
//! mip level with a full-screen pass that measures how much the normal map
//! diverges inside the level's footprint and folds that spread back into
//! roughness, so distant surfaces keep their glossiness where normals agree
//! and get rougher where they do not.
//!
//! ## Features
//!
//! - **Renderer agnostic**: generation runs through the [`Renderer`] trait
//! - **CPU reference backend**: [`SoftwareRenderer`] needs no graphics device
//! - **WGSL pass**: [`shader::ROUGHNESS_MIPMAP_WGSL`] for GPU backends
//! - **Packed maps**: metalness and occlusion slots sharing the roughness
//!   image follow it when it is enlarged
//!
//! ## Quick Start
//!
//! ```rust
//! use roughness_mipmapper::{
//!     Material, RoughnessMipmapper, SoftwareRenderer, Texture, TextureType, types::Vector4D,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let roughness = Texture::filled(64, 64, Vector4D::new(1.0, 0.3, 0.0, 1.0), true);
//! let normals = Texture::filled(64, 64, Vector4D::new(0.5, 0.5, 1.0, 1.0), true);
//! let mut material = Material::new("metal")
//!     .with_texture(TextureType::Roughness, roughness)
//!     .with_texture(TextureType::Normals, normals);
//!
//! let mut mipmapper = RoughnessMipmapper::new(SoftwareRenderer::new(64, 64))?;
//! let status = mipmapper.generate_mipmaps(&mut material)?;
//! println!("{:?}", status);
//! mipmapper.dispose();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Re-export common types for convenience
pub use crate::{
    config::MipmapperConfig,
    error::{Error, Result},
    mipmapper::{MipmapReport, MipmapStatus, RoughnessMipmapper, SkipReason},
};

// Re-export logging functionality
pub use crate::logging::{LogLevel, LogStream, Logger, MemoryLogStream};

// Re-export material functionality
pub use crate::material::{Material, TextureType};

// Re-export texture functionality
pub use crate::mip_chain::{MipChain, TexelGrid};
pub use crate::texture::{FilterMode, Texel, Texture, TextureDescriptor, TextureId, TextureRef};

// Re-export rendering functionality
pub use crate::pass::{FullScreenQuad, MipmapPass, PassUniforms};
pub use crate::renderer::{RenderSurface, Renderer, SurfaceFlags, SurfaceOptions};
pub use crate::sampler::TextureSampler;
pub use crate::software::{RenderStats, SoftwareRenderer};

// Re-export the roughness codec
pub use crate::variance::{add_variance, roughness_to_variance, variance_to_roughness};

// Core modules
pub mod config;
pub mod error;
pub mod mipmapper;
pub mod types;

// Data structure modules
pub mod material;
pub mod mip_chain;
pub mod texture;

// Rendering modules
pub mod pass;
pub mod renderer;
pub mod sampler;
pub mod shader;
pub mod software;
pub mod variance;

// Advanced features
pub mod logging;

/// Version information
pub mod version {
    /// Version of this crate
    pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");
}
