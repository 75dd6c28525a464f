// Integration tests for roughness mip chain generation on the software renderer
use approx::assert_abs_diff_eq;
use roughness_mipmapper::{
    Error, Material, MipmapStatus, MipmapperConfig, RenderSurface, Renderer, RoughnessMipmapper,
    SkipReason, SoftwareRenderer, SurfaceOptions, TexelGrid, Texture, TextureRef, TextureType,
    types::{Vector4D, Viewport},
};

const FLAT_NORMAL: Vector4D = Vector4D::new(0.5, 0.5, 1.0, 1.0);

fn roughness(size: u32, g: f32) -> TextureRef {
    Texture::filled(size, size, Vector4D::new(1.0, g, 0.0, 1.0), true)
}

fn flat_normals(size: u32) -> TextureRef {
    Texture::filled(size, size, FLAT_NORMAL, true)
}

/// Normals alternating between two directions tilted away from each other
fn checkerboard_normals(size: u32) -> TextureRef {
    let grid = TexelGrid::from_fn(size, size, |x, y| {
        if (x + y) % 2 == 0 {
            Vector4D::new(0.9, 0.5, 0.8, 1.0)
        } else {
            Vector4D::new(0.1, 0.5, 0.8, 1.0)
        }
    });
    Texture::from_grid(grid, true)
}

fn material(roughness_map: TextureRef, normal_map: TextureRef) -> Material {
    Material::new("test")
        .with_texture(TextureType::Roughness, roughness_map)
        .with_texture(TextureType::Normals, normal_map)
}

fn mipmapper(width: u32, height: u32) -> RoughnessMipmapper<SoftwareRenderer> {
    RoughnessMipmapper::new(SoftwareRenderer::new(width, height)).expect("Failed to create mipmapper")
}

fn green(grid: &TexelGrid) -> Vec<f32> {
    grid.texels().iter().map(|texel| texel.y).collect()
}

#[test]
fn test_level_count_for_square_targets() {
    for size in [1u32, 2, 8, 64] {
        let mut mipmapper = mipmapper(8, 8);
        let mut material = material(roughness(size, 0.5), flat_normals(size));
        let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
        let report = status.report().expect("material was skipped");

        let expected = (size as f32).log2().floor() as u32 + 1;
        assert_eq!(report.levels, expected, "wrong level count for {}x{}", size, size);
        assert_eq!(mipmapper.renderer().stats().copies, expected as usize);
        assert!(material.is_roughness_updated());
    }
}

#[test]
fn test_non_square_target_fills_every_level() {
    let mut mipmapper = mipmapper(8, 8);
    let roughness_map = Texture::filled(16, 4, Vector4D::new(1.0, 0.5, 0.0, 1.0), true);
    let normal_map = Texture::filled(16, 4, FLAT_NORMAL, true);
    let mut material = material(roughness_map.clone(), normal_map);

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    assert_eq!(status.report().expect("material was skipped").levels, 5);
    assert_eq!(roughness_map.mip_level_count(), 5);
    let last = roughness_map.read_level(4).expect("missing level");
    assert_eq!((last.width(), last.height()), (1, 1));
}

#[test]
fn test_second_call_is_a_no_op() {
    let mut mipmapper = mipmapper(8, 8);
    let mut material = material(roughness(8, 0.4), checkerboard_normals(8));

    assert!(mipmapper.generate_mipmaps(&mut material).expect("generation failed").is_generated());
    let roughness_map = material.roughness_map().cloned().expect("roughness map");
    let levels: Vec<TexelGrid> = (0..4)
        .map(|level| roughness_map.read_level(level).expect("missing level"))
        .collect();
    let stats = mipmapper.renderer().stats();

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    assert_eq!(status, MipmapStatus::Skipped(SkipReason::AlreadyProcessed));
    assert!(Texture::ptr_eq(material.roughness_map().expect("roughness map"), &roughness_map));
    for (level, expected) in levels.iter().enumerate() {
        assert_eq!(&roughness_map.read_level(level).expect("missing level"), expected);
    }
    assert_eq!(mipmapper.renderer().stats(), stats);
}

#[test]
fn test_upscales_to_normal_map_size() {
    let mut mipmapper = mipmapper(8, 8);
    let original = roughness(4, 0.5);
    let mut material = material(original.clone(), flat_normals(16));

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    let report = status.report().expect("material was skipped");
    assert!(report.resized);
    assert_eq!((report.extent.x, report.extent.y), (16, 16));
    assert_eq!(report.levels, 5);

    let replaced = material.roughness_map().expect("roughness map");
    assert!(!Texture::ptr_eq(replaced, &original));
    assert_eq!((replaced.width(), replaced.height()), (16, 16));
    assert!(replaced.generate_mipmaps());
    assert!(original.is_disposed());
    assert_eq!(mipmapper.renderer().stats().textures_disposed, 1);

    // a uniform source upsamples to the same uniform color
    let base = replaced.read_level(0).expect("missing level");
    for texel in base.texels() {
        assert_abs_diff_eq!(texel.y, 0.5, epsilon = 1e-5);
    }
}

#[test]
fn test_superseded_texture_kept_when_configured() {
    let config = MipmapperConfig::new().with_dispose_superseded(false);
    let mut mipmapper = RoughnessMipmapper::with_config(SoftwareRenderer::new(8, 8), config)
        .expect("Failed to create mipmapper");
    let original = roughness(4, 0.5);
    let mut material = material(original.clone(), flat_normals(8));

    mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    assert!(!original.is_disposed());
    assert_eq!(mipmapper.renderer().stats().textures_disposed, 0);
}

#[test]
fn test_equal_sizes_keep_the_texture() {
    let mut mipmapper = mipmapper(8, 8);
    let original = roughness(8, 0.5);
    let mut material = material(original.clone(), flat_normals(8));

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    let report = status.report().expect("material was skipped");
    assert!(!report.resized);
    assert!(report.repointed.is_empty());
    assert!(Texture::ptr_eq(material.roughness_map().expect("roughness map"), &original));
    assert!(!original.is_disposed());

    let stats = mipmapper.renderer().stats();
    assert_eq!(stats.textures_disposed, 0);
    // only the scratch surface
    assert_eq!(stats.surfaces_allocated, 1);
}

#[test]
fn test_non_power_of_two_leaves_material_untouched() {
    let mut mipmapper = mipmapper(8, 8);
    let original = roughness(100, 0.5);
    let mut material = material(original.clone(), flat_normals(100));

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    assert_eq!(
        status,
        MipmapStatus::Skipped(SkipReason::NotPowerOfTwo {
            width: 100,
            height: 100
        })
    );
    assert!(!material.is_roughness_updated());
    assert!(Texture::ptr_eq(material.roughness_map().expect("roughness map"), &original));
    assert_eq!(original.mip_level_count(), 7);

    let stats = mipmapper.renderer().stats();
    assert_eq!(stats.passes_executed, 0);
    assert_eq!(stats.surfaces_allocated, 0);
    assert!(mipmapper.scratch_extent().is_none());

    // the combined size decides, not the roughness size alone
    let mut mixed = self::material(roughness(64, 0.5), flat_normals(100));
    let status = mipmapper.generate_mipmaps(&mut mixed).expect("generation failed");
    assert!(matches!(status.skip_reason(), Some(SkipReason::NotPowerOfTwo { .. })));
    assert!(!mixed.is_roughness_updated());
}

#[test]
fn test_packed_slots_follow_the_new_roughness_map() {
    let mut mipmapper = mipmapper(8, 8);
    let packed = roughness(4, 0.5);
    let mut material = material(packed.clone(), flat_normals(8))
        .with_texture(TextureType::Metalness, packed.clone())
        .with_texture(TextureType::AmbientOcclusion, packed.clone());

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    let report = status.report().expect("material was skipped");
    assert_eq!(
        report.repointed,
        vec![TextureType::Metalness, TextureType::AmbientOcclusion]
    );

    let replaced = material.roughness_map().expect("roughness map");
    assert!(!Texture::ptr_eq(replaced, &packed));
    assert!(material.aliases(TextureType::Roughness, TextureType::Metalness));
    assert!(material.aliases(TextureType::Roughness, TextureType::AmbientOcclusion));
}

#[test]
fn test_render_state_is_restored() {
    let mut renderer = SoftwareRenderer::new(32, 32).with_pixel_ratio(2.0);
    let user_target = renderer
        .allocate_surface(64, 64, &SurfaceOptions::color_only())
        .expect("allocation failed");
    renderer
        .set_render_target(Some(&user_target))
        .expect("bind failed");
    let user_viewport = Viewport::new(3.0, 4.0, 20.0, 10.0);
    renderer.set_viewport(user_viewport);
    renderer.set_auto_clear(true);

    let mut mipmapper = RoughnessMipmapper::new(renderer).expect("Failed to create mipmapper");
    let mut material = material(roughness(16, 0.5), flat_normals(16));
    mipmapper.generate_mipmaps(&mut material).expect("generation failed");

    let renderer = mipmapper.renderer();
    let target = renderer.render_target().expect("target was unbound");
    assert!(RenderSurface::ptr_eq(&target, &user_target));
    assert_eq!(renderer.viewport(), user_viewport);
    assert!(renderer.auto_clear());

    // viewports are divided by the pixel ratio, so every level covers its full size
    assert_eq!(renderer.stats().fragments_shaded, 256 + 64 + 16 + 4 + 1);
}

#[test]
fn test_render_state_is_restored_on_failure() {
    // the caller's own surface uses up the whole budget
    let mut renderer = SoftwareRenderer::new(8, 8).with_allocation_limit(1);
    let user_target = renderer
        .allocate_surface(8, 8, &SurfaceOptions::color_only())
        .expect("allocation failed");
    renderer
        .set_render_target(Some(&user_target))
        .expect("bind failed");
    let user_viewport = Viewport::new(1.0, 1.0, 4.0, 4.0);
    renderer.set_viewport(user_viewport);

    let mut mipmapper = RoughnessMipmapper::new(renderer).expect("Failed to create mipmapper");
    let mut material = material(roughness(8, 0.5), flat_normals(8));
    let result = mipmapper.generate_mipmaps(&mut material);
    assert!(matches!(result, Err(Error::AllocationFailed { .. })));

    let renderer = mipmapper.renderer();
    let target = renderer.render_target().expect("target was unbound");
    assert!(RenderSurface::ptr_eq(&target, &user_target));
    assert_eq!(renderer.viewport(), user_viewport);
    assert!(renderer.auto_clear());
}

#[test]
fn test_scratch_surface_reuse_and_reallocation() {
    let mut mipmapper = mipmapper(8, 8);

    let mut first = material(roughness(16, 0.5), flat_normals(16));
    let status = mipmapper.generate_mipmaps(&mut first).expect("generation failed");
    assert!(status.report().expect("material was skipped").scratch_reallocated);

    let mut second = material(roughness(16, 0.7), flat_normals(16));
    let status = mipmapper.generate_mipmaps(&mut second).expect("generation failed");
    assert!(!status.report().expect("material was skipped").scratch_reallocated);
    assert_eq!(mipmapper.renderer().stats().surfaces_allocated, 1);

    let mut smaller = material(roughness(8, 0.7), flat_normals(8));
    let status = mipmapper.generate_mipmaps(&mut smaller).expect("generation failed");
    assert!(status.report().expect("material was skipped").scratch_reallocated);
    let scratch = mipmapper.scratch_extent().expect("no scratch surface");
    assert_eq!((scratch.x, scratch.y), (8, 8));

    let stats = mipmapper.renderer().stats();
    assert_eq!(stats.surfaces_allocated, 2);
    assert_eq!(stats.surfaces_disposed, 1);

    mipmapper.dispose();
    assert!(mipmapper.scratch_extent().is_none());
    assert_eq!(mipmapper.renderer().stats().surfaces_disposed, 2);
    assert!(!mipmapper.renderer().is_pass_compiled());
}

#[test]
fn test_passthrough_level_equals_source() {
    let mut mipmapper = mipmapper(8, 8);
    let source = TexelGrid::from_fn(8, 8, |x, y| {
        Vector4D::new(x as f32 / 8.0, (x + y * 8) as f32 / 64.0, y as f32 / 8.0, 1.0)
    });
    let roughness_map = Texture::from_grid(source.clone(), true);
    let mut material = material(roughness_map.clone(), checkerboard_normals(8));

    mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    assert_eq!(roughness_map.read_level(0).expect("missing level"), source);
}

#[test]
fn test_flat_normals_give_box_filtered_roughness() {
    let mut mipmapper = mipmapper(8, 8);
    let source = TexelGrid::from_fn(16, 16, |x, y| {
        Vector4D::new(0.25, ((x * 3 + y * 5) % 16) as f32 / 16.0, 0.75, 1.0)
    });
    let roughness_map = Texture::from_grid(source, true);
    let mut material = material(roughness_map.clone(), flat_normals(16));

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    let levels = status.report().expect("material was skipped").levels as usize;

    for level in 1..levels {
        let previous = roughness_map.read_level(level - 1).expect("missing level");
        let current = roughness_map.read_level(level).expect("missing level");
        let expected = previous.downsample();
        assert_eq!(current.extent(), expected.extent());
        for (got, want) in current.texels().iter().zip(expected.texels()) {
            assert_abs_diff_eq!(got.x, want.x, epsilon = 1e-5);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 1e-4);
            assert_abs_diff_eq!(got.z, want.z, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_divergent_normals_raise_roughness() {
    let mut mipmapper = mipmapper(8, 8);
    let roughness_map = roughness(8, 0.5);
    let mut material = material(roughness_map.clone(), checkerboard_normals(8));

    let status = mipmapper.generate_mipmaps(&mut material).expect("generation failed");
    let levels = status.report().expect("material was skipped").levels as usize;
    assert_eq!(levels, 4);

    let base = green(&roughness_map.read_level(0).expect("missing level"));
    assert!(base.iter().all(|&g| (g - 0.5).abs() < 1e-6));

    for level in 1..levels {
        let values = green(&roughness_map.read_level(level).expect("missing level"));
        assert!(
            values.iter().all(|&g| g > 0.6),
            "level {} was not roughened: {:?}",
            level,
            values
        );
    }
}

#[test]
fn test_disposed_mipmapper_rejects_work() {
    let mut mipmapper = mipmapper(8, 8);
    mipmapper.dispose();
    let mut material = material(roughness(8, 0.5), flat_normals(8));
    assert!(matches!(
        mipmapper.generate_mipmaps(&mut material),
        Err(Error::RendererDisposed)
    ));
    assert!(!material.is_roughness_updated());

    let renderer = mipmapper.into_renderer();
    assert!(!renderer.is_pass_compiled());
}

#[test]
fn test_shared_types_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Texture>();
    assert_send_sync::<Material>();
    assert_send_sync::<SoftwareRenderer>();
    assert_send_sync::<RoughnessMipmapper<SoftwareRenderer>>();
}
