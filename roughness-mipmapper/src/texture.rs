//! Textures shared between materials and renderers
//!
//! A [`Texture`] owns a [`MipChain`] behind a lock so that several material
//! slots and the renderer can hold the same image through a [`TextureRef`].
//! Two slots alias each other exactly when their `Arc`s point at the same
//! texture; see [`Texture::ptr_eq`].

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::{
    error::{Error, Result},
    mip_chain::{level_extent, MipChain, TexelGrid},
    types::{Extent2D, Vector2D, Vector4D},
};

/// Shared handle to a texture
pub type TextureRef = Arc<Texture>;

/// Process-unique texture identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl TextureId {
    fn next() -> Self {
        static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A texel in RGBA8888 format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[repr(C)]
pub struct Texel {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255), holds roughness in roughness maps
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
    /// Alpha component (0-255)
    pub a: u8,
}

impl Texel {
    /// Create a new texel with the given RGBA values
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Convert to normalized floating-point RGBA values (0.0-1.0)
    pub fn to_vec4(self) -> Vector4D {
        Vector4D::new(
            self.r as f32,
            self.g as f32,
            self.b as f32,
            self.a as f32,
        ) / 255.0
    }

    /// Quantize normalized RGBA values, clamping to 0.0-1.0
    pub fn from_vec4(color: Vector4D) -> Self {
        let q = (color.clamp(Vector4D::ZERO, Vector4D::ONE) * 255.0).round();
        Self::new(q.x as u8, q.y as u8, q.z as u8, q.w as u8)
    }
}

/// Minification filter of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Nearest texel, base level only
    Nearest,
    /// Bilinear, base level only
    Linear,
    /// Nearest texel from the nearest mip
    NearestMipmapNearest,
    /// Bilinear from the nearest mip
    LinearMipmapNearest,
    /// Nearest texel, blended between two mips
    NearestMipmapLinear,
    /// Trilinear
    #[default]
    LinearMipmapLinear,
}

impl FilterMode {
    /// Whether the filter reads levels other than the base level
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }

    /// Whether texels are blended within a level
    pub fn is_linear(self) -> bool {
        matches!(
            self,
            Self::Linear | Self::LinearMipmapNearest | Self::LinearMipmapLinear
        )
    }
}

/// Creation parameters for a [`Texture`]
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Debug label
    pub label: Option<String>,
    /// Base level width
    pub width: u32,
    /// Base level height
    pub height: u32,
    /// Whether a mip chain is (or may be) generated for this texture
    pub generate_mipmaps: bool,
    /// Minification filter
    pub min_filter: FilterMode,
}

impl TextureDescriptor {
    /// Create a descriptor with mipmaps enabled and trilinear filtering
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            label: None,
            width,
            height,
            generate_mipmaps: true,
            min_filter: FilterMode::default(),
        }
    }

    /// Set the debug label
    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable mipmap generation
    pub fn with_generate_mipmaps(mut self, generate: bool) -> Self {
        self.generate_mipmaps = generate;
        self
    }

    /// Set the minification filter
    pub fn with_min_filter(mut self, filter: FilterMode) -> Self {
        self.min_filter = filter;
        self
    }
}

/// A 2D image with an optional mip chain
pub struct Texture {
    id: TextureId,
    descriptor: TextureDescriptor,
    mips: RwLock<MipChain>,
    disposed: AtomicBool,
}

impl Texture {
    /// Create a texture from a descriptor and pre-built mip levels
    pub fn new(descriptor: TextureDescriptor, mips: MipChain) -> Result<Self> {
        let base = mips
            .base()
            .ok_or_else(|| Error::invalid_parameter("texture needs at least a base level"))?;
        if base.extent() != Extent2D::new(descriptor.width, descriptor.height) {
            return Err(Error::invalid_parameter(format!(
                "base level is {}x{} but descriptor says {}x{}",
                base.width(),
                base.height(),
                descriptor.width,
                descriptor.height
            )));
        }
        if !mips.validate_size() {
            return Err(Error::invalid_parameter("mip levels do not halve in size"));
        }

        Ok(Self {
            id: TextureId::next(),
            descriptor,
            mips: RwLock::new(mips),
            disposed: AtomicBool::new(false),
        })
    }

    /// Create a source texture from its base level
    ///
    /// With `generate_mipmaps` set, the coarser levels are box-filtered the way
    /// a GPU driver fills them on upload.
    pub fn from_grid(base: TexelGrid, generate_mipmaps: bool) -> TextureRef {
        let descriptor = TextureDescriptor::new(base.width(), base.height())
            .with_generate_mipmaps(generate_mipmaps)
            .with_min_filter(if generate_mipmaps {
                FilterMode::LinearMipmapLinear
            } else {
                FilterMode::Linear
            });
        let mips = MipChain::from_base(base, generate_mipmaps);
        Arc::new(Self {
            id: TextureId::next(),
            descriptor,
            mips: RwLock::new(mips),
            disposed: AtomicBool::new(false),
        })
    }

    /// Create a source texture where every texel holds `color`
    pub fn filled(width: u32, height: u32, color: Vector4D, generate_mipmaps: bool) -> TextureRef {
        Self::from_grid(TexelGrid::filled(width, height, color), generate_mipmaps)
    }

    /// Allocate a texture with a complete, zero-initialized mip chain
    pub fn allocate(descriptor: TextureDescriptor) -> TextureRef {
        let mips = if descriptor.generate_mipmaps {
            MipChain::allocate(descriptor.width, descriptor.height)
        } else {
            MipChain::from_base(TexelGrid::new(descriptor.width, descriptor.height), false)
        };
        Arc::new(Self {
            id: TextureId::next(),
            descriptor,
            mips: RwLock::new(mips),
            disposed: AtomicBool::new(false),
        })
    }

    /// Identity comparison: true when both handles point at the same image
    pub fn ptr_eq(a: &TextureRef, b: &TextureRef) -> bool {
        Arc::ptr_eq(a, b)
    }

    /// Unique identifier
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Debug label, if any
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }

    /// Creation parameters
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Base level width
    pub fn width(&self) -> u32 {
        self.descriptor.width
    }

    /// Base level height
    pub fn height(&self) -> u32 {
        self.descriptor.height
    }

    /// Base level dimensions as (width, height)
    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.descriptor.width, self.descriptor.height)
    }

    /// Whether mipmap generation is enabled
    pub fn generate_mipmaps(&self) -> bool {
        self.descriptor.generate_mipmaps
    }

    /// Minification filter
    pub fn min_filter(&self) -> FilterMode {
        self.descriptor.min_filter
    }

    /// Size of the given mip level
    pub fn level_extent(&self, level: u32) -> Extent2D {
        level_extent(self.descriptor.width, self.descriptor.height, level)
    }

    /// Number of stored mip levels (0 once disposed)
    pub fn mip_level_count(&self) -> usize {
        self.mips
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .level_count()
    }

    /// Whether [`Texture::dispose`] has been called
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Release the texel storage; later reads and writes fail
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            let mut mips = self.mips.write().unwrap_or_else(PoisonError::into_inner);
            *mips = MipChain::from_base(TexelGrid::new(0, 0), false);
        }
    }

    /// Run `f` with shared access to the mip chain
    pub fn with_mips<R>(&self, f: impl FnOnce(&MipChain) -> R) -> Result<R> {
        self.check_alive()?;
        let mips = self.mips.read().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mips))
    }

    /// Run `f` with exclusive access to the mip chain
    pub fn with_mips_mut<R>(&self, f: impl FnOnce(&mut MipChain) -> R) -> Result<R> {
        self.check_alive()?;
        let mut mips = self.mips.write().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut mips))
    }

    /// Grow the stored chain to a full pyramid, zero-filling new levels
    pub fn complete_mip_chain(&self) -> Result<()> {
        self.with_mips_mut(MipChain::complete)
    }

    /// Copy of one mip level
    pub fn read_level(&self, level: usize) -> Result<TexelGrid> {
        self.with_mips(|mips| mips.level(level).cloned())?
            .ok_or_else(|| self.missing_level(level))
    }

    /// Replace the contents of an existing mip level
    pub fn write_level(&self, level: usize, grid: TexelGrid) -> Result<()> {
        let missing = self.missing_level(level);
        self.with_mips_mut(|mips| {
            let slot = mips.level_mut(level).ok_or(missing)?;
            if slot.extent() != grid.extent() {
                return Err(Error::invalid_parameter(format!(
                    "level {} is {}x{}, got {}x{}",
                    level,
                    slot.width(),
                    slot.height(),
                    grid.width(),
                    grid.height()
                )));
            }
            *slot = grid;
            Ok(())
        })?
    }

    /// Filtered sample at a level of detail
    ///
    /// `lod` is the base-2 log of the texel-to-pixel ratio, already biased.
    /// Levels beyond the stored chain clamp to the coarsest one.
    pub fn sample(&self, uv: Vector2D, lod: f32) -> Result<Vector4D> {
        let filter = self.descriptor.min_filter;
        self.with_mips(|mips| {
            let last = mips.level_count().saturating_sub(1);
            let fetch = |level: usize| {
                mips.level(level.min(last))
                    .map(|grid| {
                        if filter.is_linear() {
                            grid.sample_bilinear(uv)
                        } else {
                            grid.sample_nearest(uv)
                        }
                    })
                    .unwrap_or(Vector4D::ZERO)
            };

            let lod = lod.clamp(0.0, last as f32);
            match filter {
                FilterMode::Nearest | FilterMode::Linear => fetch(0),
                FilterMode::NearestMipmapNearest | FilterMode::LinearMipmapNearest => {
                    fetch(lod.round() as usize)
                }
                FilterMode::NearestMipmapLinear | FilterMode::LinearMipmapLinear => {
                    let lower = lod.floor();
                    let blend = lod - lower;
                    let fine = fetch(lower as usize);
                    if blend == 0.0 {
                        fine
                    } else {
                        fine.lerp(fetch(lower as usize + 1), blend)
                    }
                }
            }
        })
    }

    fn check_alive(&self) -> Result<()> {
        if self.is_disposed() {
            Err(Error::TextureDisposed { id: self.id })
        } else {
            Ok(())
        }
    }

    fn missing_level(&self, level: usize) -> Error {
        Error::invalid_parameter(format!("texture {} has no mip level {}", self.id, level))
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &self.descriptor.label)
            .field("width", &self.descriptor.width)
            .field("height", &self.descriptor.height)
            .field("generate_mipmaps", &self.descriptor.generate_mipmaps)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(feature = "image")]
impl Texture {
    /// Create a source texture from an 8-bit RGBA image
    pub fn from_rgba_image(image: &image::RgbaImage, generate_mipmaps: bool) -> TextureRef {
        let base = TexelGrid::from_fn(image.width(), image.height(), |x, y| {
            let [r, g, b, a] = image.get_pixel(x, y).0;
            Texel::new(r, g, b, a).to_vec4()
        });
        Self::from_grid(base, generate_mipmaps)
    }

    /// Quantize one mip level into an 8-bit RGBA image
    pub fn to_rgba_image(&self, level: usize) -> Result<image::RgbaImage> {
        let grid = self.read_level(level)?;
        Ok(image::RgbaImage::from_fn(grid.width(), grid.height(), |x, y| {
            let texel = Texel::from_vec4(grid.get(x as i64, y as i64));
            image::Rgba([texel.r, texel.g, texel.b, texel.a])
        }))
    }
}
