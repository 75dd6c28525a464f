//! Mip-chain orchestration
//!
//! [`RoughnessMipmapper`] turns a material's roughness map into a mip chain
//! whose coarser levels carry the normal-map detail they can no longer
//! resolve. Each level is one full-screen pass into a scratch surface,
//! followed by a copy into the matching mip of the destination texture; the
//! next level then reads the level just written.
//!
//! A single instance owns one scratch surface and is not meant to be shared
//! between threads; `&mut self` serializes its calls. Separate instances do
//! not interfere with each other.

use std::fmt;

use log::{debug, trace, warn};

use crate::{
    config::MipmapperConfig,
    error::{Error, Result},
    material::{Material, TextureType},
    mip_chain::{level_count, level_extent},
    pass::MipmapPass,
    renderer::{RenderSurface, Renderer, SurfaceFlags, SurfaceOptions},
    texture::{Texture, TextureRef},
    types::{is_power_of_two, Extent2D, Offset2D, Vector2D, Viewport},
};

/// Why a material was left untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The material has no roughness map
    MissingRoughnessMap,
    /// The material has no normal map
    MissingNormalMap,
    /// The roughness map has mipmap generation disabled
    MipmapsDisabled,
    /// The roughness map of this material was already processed
    AlreadyProcessed,
    /// The combined size is not a power of two in both dimensions
    NotPowerOfTwo {
        /// Combined width
        width: u32,
        /// Combined height
        height: u32,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoughnessMap => write!(f, "material has no roughness map"),
            Self::MissingNormalMap => write!(f, "material has no normal map"),
            Self::MipmapsDisabled => write!(f, "roughness map does not generate mipmaps"),
            Self::AlreadyProcessed => write!(f, "roughness map was already processed"),
            Self::NotPowerOfTwo { width, height } => {
                write!(f, "combined size {}x{} is not a power of two", width, height)
            }
        }
    }
}

/// Summary of a completed mip generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MipmapReport {
    /// Size of the resulting roughness map
    pub extent: Extent2D,
    /// Number of levels rendered
    pub levels: u32,
    /// Whether the roughness map was replaced by a larger texture
    pub resized: bool,
    /// Whether the scratch surface had to be (re)allocated
    pub scratch_reallocated: bool,
    /// Slots re-pointed to the new roughness map
    pub repointed: Vec<TextureType>,
}

/// Outcome of [`RoughnessMipmapper::generate_mipmaps`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MipmapStatus {
    /// The roughness mip chain was written
    Generated(MipmapReport),
    /// Nothing was done
    Skipped(SkipReason),
}

impl MipmapStatus {
    /// True when the mip chain was written
    pub fn is_generated(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    /// The skip reason, if nothing was done
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            Self::Generated(_) => None,
        }
    }

    /// The report, if the mip chain was written
    pub fn report(&self) -> Option<&MipmapReport> {
        match self {
            Self::Generated(report) => Some(report),
            Self::Skipped(_) => None,
        }
    }
}

/// Render state that generation changes and must put back
struct SavedState {
    render_target: Option<RenderSurface>,
    viewport: Viewport,
    auto_clear: bool,
}

/// Generates variance-corrected roughness mip chains
///
/// ```rust
/// use roughness_mipmapper::{
///     Material, RoughnessMipmapper, SoftwareRenderer, Texture, TextureType, types::Vector4D,
/// };
///
/// # fn main() -> roughness_mipmapper::Result<()> {
/// let roughness = Texture::filled(16, 16, Vector4D::new(0.0, 0.5, 0.0, 1.0), true);
/// let normals = Texture::filled(16, 16, Vector4D::new(0.5, 0.5, 1.0, 1.0), true);
/// let mut material = Material::new("floor")
///     .with_texture(TextureType::Roughness, roughness)
///     .with_texture(TextureType::Normals, normals);
///
/// let mut mipmapper = RoughnessMipmapper::new(SoftwareRenderer::new(16, 16))?;
/// let status = mipmapper.generate_mipmaps(&mut material)?;
/// assert!(status.is_generated());
/// mipmapper.dispose();
/// # Ok(())
/// # }
/// ```
pub struct RoughnessMipmapper<R: Renderer> {
    renderer: R,
    config: MipmapperConfig,
    pass: MipmapPass,
    scratch: Option<RenderSurface>,
    disposed: bool,
}

impl<R: Renderer> RoughnessMipmapper<R> {
    /// Bind to a renderer and compile the pass, with default settings
    pub fn new(renderer: R) -> Result<Self> {
        Self::with_config(renderer, MipmapperConfig::default())
    }

    /// Bind to a renderer and compile the pass
    pub fn with_config(mut renderer: R, config: MipmapperConfig) -> Result<Self> {
        config.validate()?;
        let pass = MipmapPass::new(config.lod_bias, config.neighborhood_offset);
        renderer.compile_pass(&pass)?;
        Ok(Self {
            renderer,
            config,
            pass,
            scratch: None,
            disposed: false,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MipmapperConfig {
        &self.config
    }

    /// The bound renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The bound renderer, mutably
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Size of the scratch surface, if one is allocated
    pub fn scratch_extent(&self) -> Option<Extent2D> {
        self.scratch.as_ref().map(RenderSurface::extent)
    }

    /// Whether [`RoughnessMipmapper::dispose`] has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Generate the roughness mip chain of `material`
    ///
    /// Materials without both maps, with mipmaps disabled, already processed,
    /// or with a non-power-of-two combined size are left untouched and
    /// reported as [`MipmapStatus::Skipped`]. Renderer failures are returned
    /// as errors; levels written before the failure stay written. The
    /// renderer's target, viewport and auto-clear flag are restored either way.
    pub fn generate_mipmaps(&mut self, material: &mut Material) -> Result<MipmapStatus> {
        if self.disposed {
            return Err(Error::RendererDisposed);
        }

        let (roughness, normal) = match Self::check_material(material) {
            Ok(maps) => maps,
            Err(reason) => {
                debug!("skipping material '{}': {}", material.name(), reason);
                return Ok(MipmapStatus::Skipped(reason));
            }
        };
        material.mark_roughness_updated();

        let saved = SavedState {
            render_target: self.renderer.render_target(),
            viewport: self.renderer.viewport(),
            auto_clear: self.renderer.auto_clear(),
        };
        self.renderer.set_auto_clear(false);

        let result = self.render_chain(material, roughness, normal);

        self.pass.set_roughness_map(None);
        self.pass.set_normal_map(None);
        self.restore(saved);

        let report = result?;
        debug!(
            "generated {} roughness levels for '{}' at {}x{}",
            report.levels,
            material.name(),
            report.extent.x,
            report.extent.y
        );
        Ok(MipmapStatus::Generated(report))
    }

    /// Release the pass, its geometry and the scratch surface
    ///
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.renderer.release_pass(&self.pass);
        self.pass.dispose();
        if let Some(scratch) = self.scratch.take() {
            self.renderer.dispose_surface(scratch);
        }
        self.disposed = true;
    }

    /// Dispose and hand the renderer back
    pub fn into_renderer(mut self) -> R {
        self.dispose();
        self.renderer
    }

    fn check_material(
        material: &Material,
    ) -> std::result::Result<(TextureRef, TextureRef), SkipReason> {
        let roughness = material
            .roughness_map()
            .ok_or(SkipReason::MissingRoughnessMap)?;
        let normal = material.normal_map().ok_or(SkipReason::MissingNormalMap)?;
        if !roughness.generate_mipmaps() {
            return Err(SkipReason::MipmapsDisabled);
        }
        if material.is_roughness_updated() {
            return Err(SkipReason::AlreadyProcessed);
        }

        let extent = roughness.extent().max(normal.extent());
        if !is_power_of_two(extent.x) || !is_power_of_two(extent.y) {
            return Err(SkipReason::NotPowerOfTwo {
                width: extent.x,
                height: extent.y,
            });
        }
        Ok((roughness.clone(), normal.clone()))
    }

    fn render_chain(
        &mut self,
        material: &mut Material,
        roughness: TextureRef,
        normal: TextureRef,
    ) -> Result<MipmapReport> {
        let extent = roughness.extent().max(normal.extent());

        let resized = roughness.extent() != extent;
        let mut repointed = Vec::new();
        if resized {
            let options = SurfaceOptions::color_only()
                .with_flags(SurfaceFlags::GENERATE_MIPMAPS)
                .with_min_filter(self.config.destination_filter)
                .with_label(roughness.label().unwrap_or("roughness").to_string());
            let destination = self.renderer.allocate_surface(extent.x, extent.y, &options)?;
            debug!(
                "enlarging roughness map {} from {}x{} to {}x{}",
                roughness.id(),
                roughness.width(),
                roughness.height(),
                extent.x,
                extent.y
            );
            repointed = material.replace_roughness_map(destination.texture().clone());
        }
        let destination = material
            .roughness_map()
            .cloned()
            .ok_or_else(|| Error::other("roughness map disappeared during generation"))?;

        let (scratch, scratch_reallocated) = self.ensure_scratch(extent)?;
        self.renderer.set_render_target(Some(&scratch))?;
        self.pass.set_roughness_map(Some(roughness.clone()));
        self.pass.set_normal_map(Some(normal));

        let pixel_ratio = self.renderer.pixel_ratio();
        let levels = level_count(extent.x, extent.y);
        for level in 0..levels {
            let size = level_extent(extent.x, extent.y, level).as_vec2();
            let texel_size = if level == 0 {
                Vector2D::ZERO
            } else {
                Vector2D::ONE / size
            };
            trace!("rendering roughness level {} at {}x{}", level, size.x, size.y);

            self.pass.set_texel_size(texel_size);
            self.renderer
                .set_viewport(Viewport::from_size(size / pixel_ratio));
            self.renderer.execute_pass(&self.pass)?;
            self.renderer
                .copy_framebuffer_to_texture(Offset2D::ZERO, &destination, level)?;
            self.pass.set_roughness_map(Some(destination.clone()));
        }

        if !Texture::ptr_eq(&roughness, &destination) && self.config.dispose_superseded {
            debug!("disposing superseded roughness map {}", roughness.id());
            self.renderer.dispose_texture(&roughness);
        }

        Ok(MipmapReport {
            extent,
            levels,
            resized,
            scratch_reallocated,
            repointed,
        })
    }

    /// Reuse the scratch surface if it has the right size, otherwise replace it
    fn ensure_scratch(&mut self, extent: Extent2D) -> Result<(RenderSurface, bool)> {
        if let Some(scratch) = &self.scratch {
            if scratch.extent() == extent {
                return Ok((scratch.clone(), false));
            }
        }

        if let Some(previous) = self.scratch.take() {
            debug!(
                "reallocating scratch surface from {}x{} to {}x{}",
                previous.width(),
                previous.height(),
                extent.x,
                extent.y
            );
            self.renderer.dispose_surface(previous);
        }

        let options = SurfaceOptions::color_only().with_label("roughness mipmapper scratch");
        let scratch = self.renderer.allocate_surface(extent.x, extent.y, &options)?;
        self.scratch = Some(scratch.clone());
        Ok((scratch, true))
    }

    fn restore(&mut self, saved: SavedState) {
        self.renderer.set_auto_clear(saved.auto_clear);
        if let Err(err) = self.renderer.set_render_target(saved.render_target.as_ref()) {
            warn!("could not restore the previous render target: {}", err);
            // unbinding the default framebuffer cannot fail
            let _ = self.renderer.set_render_target(None);
        }
        self.renderer.set_viewport(saved.viewport);
    }
}
