//! Physically based material with texture slots

use crate::texture::{Texture, TextureRef};

/// Texture slots of a [`Material`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// Albedo
    BaseColor,
    /// Tangent-space normal map
    Normals,
    /// Roughness in the green channel
    Roughness,
    /// Metalness in the blue channel; often packed with roughness
    Metalness,
    /// Ambient occlusion in the red channel; often packed with roughness
    AmbientOcclusion,
    /// Emission
    Emissive,
}

impl TextureType {
    /// Every slot, in storage order
    pub const ALL: [TextureType; 6] = [
        TextureType::BaseColor,
        TextureType::Normals,
        TextureType::Roughness,
        TextureType::Metalness,
        TextureType::AmbientOcclusion,
        TextureType::Emissive,
    ];

    /// Slots that follow the roughness map when it is replaced
    pub const PACKED_WITH_ROUGHNESS: [TextureType; 2] =
        [TextureType::Metalness, TextureType::AmbientOcclusion];

    fn index(self) -> usize {
        self as usize
    }
}

/// A material referencing shared textures
///
/// Slots may hold the same [`TextureRef`]; such slots alias one image.
#[derive(Debug, Clone, Default)]
pub struct Material {
    name: String,
    textures: [Option<TextureRef>; 6],
    roughness_updated: bool,
}

impl Material {
    /// Create an empty material
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get the name of the material
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Builder-style slot assignment
    pub fn with_texture(mut self, texture_type: TextureType, texture: TextureRef) -> Self {
        self.textures[texture_type.index()] = Some(texture);
        self
    }

    /// Get the texture bound to a slot
    pub fn texture(&self, texture_type: TextureType) -> Option<&TextureRef> {
        self.textures[texture_type.index()].as_ref()
    }

    /// Bind or clear a slot
    pub fn set_texture(
        &mut self,
        texture_type: TextureType,
        texture: Option<TextureRef>,
    ) -> &mut Self {
        self.textures[texture_type.index()] = texture;
        self
    }

    /// Roughness map
    pub fn roughness_map(&self) -> Option<&TextureRef> {
        self.texture(TextureType::Roughness)
    }

    /// Normal map
    pub fn normal_map(&self) -> Option<&TextureRef> {
        self.texture(TextureType::Normals)
    }

    /// Metalness map
    pub fn metalness_map(&self) -> Option<&TextureRef> {
        self.texture(TextureType::Metalness)
    }

    /// Ambient occlusion map
    pub fn ao_map(&self) -> Option<&TextureRef> {
        self.texture(TextureType::AmbientOcclusion)
    }

    /// Number of bound slots
    pub fn texture_count(&self) -> usize {
        self.textures.iter().flatten().count()
    }

    /// Check whether two slots hold the very same image
    pub fn aliases(&self, a: TextureType, b: TextureType) -> bool {
        match (self.texture(a), self.texture(b)) {
            (Some(a), Some(b)) => Texture::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Slots that hold `texture`
    pub fn slots_holding<'a>(
        &'a self,
        texture: &'a TextureRef,
    ) -> impl Iterator<Item = TextureType> + 'a {
        TextureType::ALL
            .into_iter()
            .filter(move |&slot| self.texture(slot).is_some_and(|t| Texture::ptr_eq(t, texture)))
    }

    /// Whether the roughness mip chain has already been generated
    pub fn is_roughness_updated(&self) -> bool {
        self.roughness_updated
    }

    pub(crate) fn mark_roughness_updated(&mut self) {
        self.roughness_updated = true;
    }

    /// Install `replacement` as the roughness map
    ///
    /// Metalness and ambient-occlusion slots that held the previous roughness
    /// image are re-pointed to the replacement. Returns the re-pointed slots.
    pub(crate) fn replace_roughness_map(&mut self, replacement: TextureRef) -> Vec<TextureType> {
        let previous = self.textures[TextureType::Roughness.index()].replace(replacement.clone());
        let Some(previous) = previous else {
            return Vec::new();
        };

        let mut repointed = Vec::new();
        for slot in TextureType::PACKED_WITH_ROUGHNESS {
            let held = &mut self.textures[slot.index()];
            if held.as_ref().is_some_and(|t| Texture::ptr_eq(t, &previous)) {
                *held = Some(replacement.clone());
                repointed.push(slot);
            }
        }
        repointed
    }
}
