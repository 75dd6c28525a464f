// Integration tests for routing crate log records into attached streams
use std::sync::{Arc, Mutex};

use roughness_mipmapper::{
    LogLevel, Material, MemoryLogStream, RoughnessMipmapper, SoftwareRenderer, Texture,
    TextureType,
    logging::{self, SharedLogStream},
    types::Vector4D,
};

#[test]
fn test_skip_reason_is_logged() {
    logging::init(LogLevel::Debug).expect("Failed to install logger");
    let memory = Arc::new(Mutex::new(MemoryLogStream::new()));
    let stream: SharedLogStream = memory.clone();
    logging::attach_stream(stream.clone());

    let mut mipmapper =
        RoughnessMipmapper::new(SoftwareRenderer::new(8, 8)).expect("Failed to create mipmapper");
    let mut material = Material::new("odd-sized")
        .with_texture(
            TextureType::Roughness,
            Texture::filled(100, 100, Vector4D::new(1.0, 0.5, 0.0, 1.0), true),
        )
        .with_texture(
            TextureType::Normals,
            Texture::filled(100, 100, Vector4D::new(0.5, 0.5, 1.0, 1.0), true),
        );
    let status = mipmapper
        .generate_mipmaps(&mut material)
        .expect("generation failed");
    assert!(!status.is_generated());

    assert!(logging::detach_stream(&stream));
    let memory = memory.lock().expect("memory stream poisoned");
    let skip_line = memory
        .messages()
        .iter()
        .find(|line| line.contains("odd-sized"))
        .expect("skip message was not captured");
    assert!(skip_line.starts_with("[DEBUG"));
    assert!(skip_line.contains("100x100 is not a power of two"));
}

#[test]
fn test_init_is_repeatable() {
    // both tests share the global logger, so stay at the level the other one needs
    logging::init(LogLevel::Debug).expect("Failed to install logger");
    logging::init(LogLevel::Debug).expect("Failed to reinstall logger");
    assert_eq!(logging::global_logger().level(), log::LevelFilter::Debug);
}
