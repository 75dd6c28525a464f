//! The rendering collaborator
//!
//! [`Renderer`] is the narrow interface the mipmapper drives: surface
//! allocation, render-target binding, viewport control, pass execution and
//! framebuffer-to-mip copies. Any graphics backend can sit behind it; the
//! crate ships [`crate::software::SoftwareRenderer`] as a CPU reference.

use bitflags::bitflags;

use crate::{
    error::Result,
    pass::MipmapPass,
    texture::{FilterMode, Texture, TextureDescriptor, TextureRef},
    types::{Extent2D, Offset2D, Vector2D, Viewport},
};

bitflags! {
    /// Attachments and features of a render surface
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// Attach a depth buffer.
        const DEPTH_BUFFER = 1 << 0;

        /// Attach a stencil buffer.
        const STENCIL_BUFFER = 1 << 1;

        /// Allocate storage for a full mip chain in the color texture.
        const GENERATE_MIPMAPS = 1 << 2;
    }
}

/// Allocation parameters for a render surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    /// Attachments and features
    pub flags: SurfaceFlags,
    /// Minification filter of the color texture
    pub min_filter: FilterMode,
    /// Debug label of the color texture
    pub label: Option<String>,
}

impl SurfaceOptions {
    /// Color-only surface without mipmaps
    pub fn color_only() -> Self {
        Self {
            flags: SurfaceFlags::empty(),
            min_filter: FilterMode::Linear,
            label: None,
        }
    }

    /// Set the flags
    pub fn with_flags(mut self, flags: SurfaceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the minification filter
    pub fn with_min_filter(mut self, filter: FilterMode) -> Self {
        self.min_filter = filter;
        self
    }

    /// Set the debug label
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Descriptor of the color texture for a surface of the given size
    pub fn texture_descriptor(&self, width: u32, height: u32) -> TextureDescriptor {
        let mut descriptor = TextureDescriptor::new(width, height)
            .with_generate_mipmaps(self.flags.contains(SurfaceFlags::GENERATE_MIPMAPS))
            .with_min_filter(self.min_filter);
        descriptor.label = self.label.clone();
        descriptor
    }
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::color_only()
    }
}

/// An offscreen render target
///
/// Cloning yields another handle to the same surface.
#[derive(Debug, Clone)]
pub struct RenderSurface {
    texture: TextureRef,
    flags: SurfaceFlags,
}

impl RenderSurface {
    /// Wrap a color texture as a render surface
    pub fn new(texture: TextureRef, flags: SurfaceFlags) -> Self {
        Self { texture, flags }
    }

    /// Create a surface with a freshly allocated color texture
    pub fn allocate(width: u32, height: u32, options: &SurfaceOptions) -> Self {
        Self::new(
            Texture::allocate(options.texture_descriptor(width, height)),
            options.flags,
        )
    }

    /// The color attachment
    pub fn texture(&self) -> &TextureRef {
        &self.texture
    }

    /// Attachments and features
    pub fn flags(&self) -> SurfaceFlags {
        self.flags
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Dimensions as (width, height)
    pub fn extent(&self) -> Extent2D {
        self.texture.extent()
    }

    /// Whether the surface has been disposed
    pub fn is_disposed(&self) -> bool {
        self.texture.is_disposed()
    }

    /// Identity comparison
    pub fn ptr_eq(a: &RenderSurface, b: &RenderSurface) -> bool {
        Texture::ptr_eq(&a.texture, &b.texture)
    }
}

/// Full-screen pass execution service
///
/// Calls are synchronous and ordered: a pass has finished writing before a
/// following copy reads it, and a copy has landed before the next pass
/// samples the destination.
pub trait Renderer {
    /// Prepare the pass program ahead of its first use
    fn compile_pass(&mut self, pass: &MipmapPass) -> Result<()>;

    /// Release backend resources created for the pass
    fn release_pass(&mut self, pass: &MipmapPass);

    /// Draw the pass over the current viewport into the current render target
    fn execute_pass(&mut self, pass: &MipmapPass) -> Result<()>;

    /// Currently bound render target, `None` for the default framebuffer
    fn render_target(&self) -> Option<RenderSurface>;

    /// Bind a render target, `None` for the default framebuffer
    fn set_render_target(&mut self, target: Option<&RenderSurface>) -> Result<()>;

    /// Copy pixels of the current render target, starting at `position`, into
    /// mip `level` of `texture`; the copied region has the size of that level
    fn copy_framebuffer_to_texture(
        &mut self,
        position: Offset2D,
        texture: &TextureRef,
        level: u32,
    ) -> Result<()>;

    /// Logical size of the drawing area
    fn size(&self) -> Vector2D;

    /// Current viewport in logical pixels
    fn viewport(&self) -> Viewport;

    /// Set the viewport in logical pixels
    fn set_viewport(&mut self, viewport: Viewport);

    /// Physical pixels per logical pixel
    fn pixel_ratio(&self) -> f32;

    /// Whether the target is cleared before each pass
    fn auto_clear(&self) -> bool;

    /// Enable or disable clearing before each pass
    fn set_auto_clear(&mut self, auto_clear: bool);

    /// Allocate a render surface
    fn allocate_surface(
        &mut self,
        width: u32,
        height: u32,
        options: &SurfaceOptions,
    ) -> Result<RenderSurface>;

    /// Release a render surface
    fn dispose_surface(&mut self, surface: RenderSurface);

    /// Release a texture that is no longer referenced by any material
    fn dispose_texture(&mut self, texture: &TextureRef) {
        texture.dispose();
    }
}
