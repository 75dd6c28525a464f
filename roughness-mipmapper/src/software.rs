//! CPU reference renderer
//!
//! [`SoftwareRenderer`] implements [`Renderer`] on the host. It rasterizes the
//! full-screen pass one fragment at a time, picks mip levels from the
//! fragment footprint the way a GPU does, and samples with clamp-to-edge
//! addressing. It is slow, deterministic, and needs no graphics device.

use crate::{
    error::{Error, Result},
    mip_chain::TexelGrid,
    pass::{MipmapPass, PASS_LABEL},
    renderer::{RenderSurface, Renderer, SurfaceOptions},
    sampler::TextureSampler,
    texture::{Texture, TextureRef},
    types::{Offset2D, Vector2D, Vector4D, Viewport},
};

/// Counters of work done by a [`SoftwareRenderer`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Calls to `compile_pass`
    pub passes_compiled: usize,
    /// Calls to `execute_pass` that drew at least one fragment
    pub passes_executed: usize,
    /// Fragments shaded across all passes
    pub fragments_shaded: usize,
    /// Framebuffer-to-texture copies
    pub copies: usize,
    /// Surfaces allocated
    pub surfaces_allocated: usize,
    /// Surfaces disposed
    pub surfaces_disposed: usize,
    /// Textures disposed through `dispose_texture`
    pub textures_disposed: usize,
}

/// Sampler for fragments of a pass drawn into a `footprint`-sized viewport
struct FragmentSampler {
    footprint: Vector2D,
}

impl TextureSampler for FragmentSampler {
    fn sample(&self, texture: &Texture, uv: Vector2D, bias: f32) -> Result<Vector4D> {
        let texels = texture.extent().as_vec2() / self.footprint;
        let lod = texels.max_element().log2() + bias;
        texture.sample(uv, lod)
    }
}

/// A renderer that executes passes on the CPU
pub struct SoftwareRenderer {
    size: Vector2D,
    pixel_ratio: f32,
    viewport: Viewport,
    render_target: Option<RenderSurface>,
    framebuffer: TexelGrid,
    auto_clear: bool,
    clear_color: Vector4D,
    compiled: bool,
    allocation_limit: Option<usize>,
    stats: RenderStats,
}

impl SoftwareRenderer {
    /// Create a renderer with a `width` × `height` drawing area
    pub fn new(width: u32, height: u32) -> Self {
        let size = Vector2D::new(width as f32, height as f32);
        Self {
            size,
            pixel_ratio: 1.0,
            viewport: Viewport::from_size(size),
            render_target: None,
            framebuffer: TexelGrid::new(width, height),
            auto_clear: true,
            clear_color: Vector4D::ZERO,
            compiled: false,
            allocation_limit: None,
            stats: RenderStats::default(),
        }
    }

    /// Set the device pixel ratio; the default framebuffer is resized to match
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self.resize_framebuffer();
        self
    }

    /// Fail every surface allocation after `limit` successful ones
    pub fn with_allocation_limit(mut self, limit: usize) -> Self {
        self.allocation_limit = Some(limit);
        self
    }

    /// Resize the drawing area and reset the viewport to cover it
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = Vector2D::new(width as f32, height as f32);
        self.viewport = Viewport::from_size(self.size);
        self.resize_framebuffer();
    }

    /// Color written by automatic clears
    pub fn set_clear_color(&mut self, color: Vector4D) {
        self.clear_color = color;
    }

    /// Contents of the default framebuffer
    pub fn framebuffer(&self) -> &TexelGrid {
        &self.framebuffer
    }

    /// Whether a pass program is currently compiled
    pub fn is_pass_compiled(&self) -> bool {
        self.compiled
    }

    /// Work counters
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Reset the work counters
    pub fn reset_stats(&mut self) {
        self.stats = RenderStats::default();
    }

    fn resize_framebuffer(&mut self) {
        let physical = (self.size * self.pixel_ratio).round().as_uvec2();
        self.framebuffer = TexelGrid::new(physical.x, physical.y);
    }

    /// Read the base level of the current target
    fn read_target(&self) -> Result<TexelGrid> {
        match &self.render_target {
            Some(surface) => surface.texture().read_level(0),
            None => Ok(self.framebuffer.clone()),
        }
    }

    fn write_target(&mut self, grid: TexelGrid) -> Result<()> {
        match &self.render_target {
            Some(surface) => surface.texture().write_level(0, grid),
            None => {
                self.framebuffer = grid;
                Ok(())
            }
        }
    }
}

impl Renderer for SoftwareRenderer {
    fn compile_pass(&mut self, pass: &MipmapPass) -> Result<()> {
        if pass.is_disposed() {
            return Err(Error::RendererDisposed);
        }
        self.compiled = true;
        self.stats.passes_compiled += 1;
        log::debug!("compiled pass '{}'", PASS_LABEL);
        Ok(())
    }

    fn release_pass(&mut self, _pass: &MipmapPass) {
        self.compiled = false;
    }

    fn execute_pass(&mut self, pass: &MipmapPass) -> Result<()> {
        if pass.is_disposed() {
            return Err(Error::RendererDisposed);
        }

        let physical = self.viewport.scaled(self.pixel_ratio);
        let origin = physical.offset().round();
        let footprint = physical.size().round();
        if footprint.x < 1.0 || footprint.y < 1.0 {
            return Ok(());
        }

        let mut target = self.read_target()?;
        if self.auto_clear {
            target.fill(self.clear_color);
        }

        let sampler = FragmentSampler { footprint };
        let (x0, y0) = (origin.x as i64, origin.y as i64);
        let (width, height) = (footprint.x as i64, footprint.y as i64);
        let mut shaded = 0;
        for y in y0.max(0)..(y0 + height).min(target.height() as i64) {
            for x in x0.max(0)..(x0 + width).min(target.width() as i64) {
                let uv = Vector2D::new(
                    ((x - x0) as f32 + 0.5) / footprint.x,
                    ((y - y0) as f32 + 0.5) / footprint.y,
                );
                let color = pass.shade(&sampler, uv)?;
                target.set(x as u32, y as u32, color);
                shaded += 1;
            }
        }

        self.write_target(target)?;
        if shaded > 0 {
            self.stats.passes_executed += 1;
            self.stats.fragments_shaded += shaded;
        }
        Ok(())
    }

    fn render_target(&self) -> Option<RenderSurface> {
        self.render_target.clone()
    }

    fn set_render_target(&mut self, target: Option<&RenderSurface>) -> Result<()> {
        if let Some(surface) = target {
            if surface.is_disposed() {
                return Err(Error::invalid_surface(format!(
                    "surface {} has been disposed",
                    surface.texture().id()
                )));
            }
        }
        self.render_target = target.cloned();
        Ok(())
    }

    fn copy_framebuffer_to_texture(
        &mut self,
        position: Offset2D,
        texture: &TextureRef,
        level: u32,
    ) -> Result<()> {
        let source = self.read_target()?;
        let extent = texture.level_extent(level);
        let end = position + extent;
        if end.x > source.width() || end.y > source.height() {
            return Err(Error::invalid_parameter(format!(
                "copy region {}x{} at ({}, {}) exceeds the {}x{} render target",
                extent.x,
                extent.y,
                position.x,
                position.y,
                source.width(),
                source.height()
            )));
        }

        let region = TexelGrid::from_fn(extent.x, extent.y, |x, y| {
            source.get((position.x + x) as i64, (position.y + y) as i64)
        });
        if level > 0 {
            texture.complete_mip_chain()?;
        }
        texture.write_level(level as usize, region)?;
        self.stats.copies += 1;
        Ok(())
    }

    fn size(&self) -> Vector2D {
        self.size
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    fn auto_clear(&self) -> bool {
        self.auto_clear
    }

    fn set_auto_clear(&mut self, auto_clear: bool) {
        self.auto_clear = auto_clear;
    }

    fn allocate_surface(
        &mut self,
        width: u32,
        height: u32,
        options: &SurfaceOptions,
    ) -> Result<RenderSurface> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_parameter(format!(
                "cannot allocate a {}x{} surface",
                width, height
            )));
        }
        if let Some(limit) = self.allocation_limit {
            if self.stats.surfaces_allocated >= limit {
                return Err(Error::allocation_failed(format!(
                    "surface budget of {} exhausted",
                    limit
                )));
            }
        }

        self.stats.surfaces_allocated += 1;
        Ok(RenderSurface::allocate(width, height, options))
    }

    fn dispose_surface(&mut self, surface: RenderSurface) {
        let bound = self
            .render_target
            .as_ref()
            .is_some_and(|current| RenderSurface::ptr_eq(current, &surface));
        if bound {
            self.render_target = None;
        }
        surface.texture().dispose();
        self.stats.surfaces_disposed += 1;
    }

    fn dispose_texture(&mut self, texture: &TextureRef) {
        texture.dispose();
        self.stats.textures_disposed += 1;
    }
}
