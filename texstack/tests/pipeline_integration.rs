//! Integration tests for the conversion and export pipeline.
//!
//! These tests drive the public API end to end against real files:
//! - images on disk → Assembler → Container
//! - Container → container file → Container
//! - Container → ExternalFormatExporter → images on disk
//!
//! Run with: `cargo test --test pipeline_integration`

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use texstack::codec::{CodecError, DecodedImage, ImageView};
use texstack::{
    Assembler, Codec, CodecRegistry, Container, ExternalCapability, ExternalFormatExporter,
    FileDescriptor, Geometry, ImageCodec, LocalFileStore, PixelFormat, PrimitiveKind,
    SubresourceKey, TextureDimension, TextureFlags,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn rgba8() -> PixelFormat {
    PixelFormat::new(4, 8, PrimitiveKind::Unorm, false).unwrap()
}

/// Write a PNG whose bytes count up from `seed`.
fn write_png(path: &Path, width: u32, height: u32, format: PixelFormat, seed: u8) {
    let len = width as usize * height as usize * format.stride();
    let pixels: Vec<u8> = (0..len).map(|i| seed.wrapping_add(i as u8)).collect();
    let bytes = ImageCodec::png()
        .encode(
            &ImageView {
                width,
                height,
                format,
                pixels: &pixels,
            },
            1.0,
        )
        .unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn local_assembler() -> Assembler {
    Assembler::new(CodecRegistry::with_defaults(), Arc::new(LocalFileStore::new()))
}

/// Encoder that advertises only 8-bit UNORM output.
struct Unorm8Codec;

impl Codec for Unorm8Codec {
    fn name(&self) -> &str {
        "UNORM8"
    }

    fn extension(&self) -> &str {
        "u8"
    }

    fn capability(&self) -> ExternalCapability {
        ExternalCapability::UNORM
            | ExternalCapability::BITS_8
            | ExternalCapability::R
            | ExternalCapability::RG
            | ExternalCapability::RGB
            | ExternalCapability::RGBA
            | ExternalCapability::LOSSLESS
    }

    fn can_decode(&self, _bytes: &[u8]) -> bool {
        false
    }

    fn decode(&self, _bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        Err(CodecError::NoCodec)
    }

    fn encode(&self, image: &ImageView<'_>, _quality: f32) -> Result<Vec<u8>, CodecError> {
        Ok(image.pixels.to_vec())
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Two 64×64 RGBA8 layers with ARRAY and no mip generation.
#[test]
fn test_two_layer_array_geometry() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    write_png(&a, 64, 64, rgba8(), 0);
    write_png(&b, 64, 64, rgba8(), 100);

    let descriptors = [
        FileDescriptor::path(&a, SubresourceKey::new(0, 0, 0)),
        FileDescriptor::path(&b, SubresourceKey::new(0, 1, 0)),
    ];
    let flags = TextureFlags::none().with_array(true);
    let container = local_assembler()
        .convert_descriptors(&descriptors, &flags)
        .unwrap();

    assert_eq!(container.geometry(), Geometry::new(1, 2, 1));
    assert_eq!(container.mip_data(0, 0).unwrap().len(), 2 * 64 * 64 * 4);
    assert_eq!(
        container.subresource(0, SubresourceKey::new(0, 1, 0)).unwrap()[0],
        100
    );
}

/// A cube map with one face missing.
#[test]
fn test_cube_missing_face() {
    let dir = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for face in ["right", "left", "top", "bottom", "back"] {
        let path = dir.path().join(format!("sky_{}.png", face));
        write_png(&path, 4, 4, rgba8(), 0);
        paths.push(path);
    }

    let flags = TextureFlags::default().with_dimension(TextureDimension::Cube);
    let err = local_assembler().convert_paths(&paths, &flags).unwrap_err();
    assert_eq!(err.code(), 0x21);
}

/// A complete cube map found from a single path.
#[test]
fn test_cube_from_single_path() {
    let dir = TempDir::new().unwrap();
    for (i, face) in ["+x", "-x", "+y", "-y", "+z", "-z"].iter().enumerate() {
        write_png(
            &dir.path().join(format!("sky{}.png", face)),
            8,
            8,
            rgba8(),
            i as u8 * 40,
        );
    }

    let flags = TextureFlags::default().with_dimension(TextureDimension::Cube);
    let container = local_assembler()
        .convert_path(&dir.path().join("sky.png"), &flags)
        .unwrap();
    assert_eq!(container.geometry(), Geometry::new(1, 6, 4));
    // -y is face 3
    assert_eq!(
        container.subresource(0, SubresourceKey::new(0, 3, 0)).unwrap()[0],
        120
    );
}

/// Files whose names merely start with the requested stem aren't siblings.
#[test]
fn test_single_path_skips_neighbour_textures() {
    let dir = TempDir::new().unwrap();
    write_png(&dir.path().join("tex_0.png"), 4, 4, rgba8(), 0);
    write_png(&dir.path().join("tex_1.png"), 4, 4, rgba8(), 50);
    write_png(&dir.path().join("texture_0.png"), 4, 4, rgba8(), 200);
    write_png(&dir.path().join("skybox_right.png"), 4, 4, rgba8(), 200);

    let flags = TextureFlags::default().with_array(true);
    let container = local_assembler()
        .convert_path(&dir.path().join("tex.png"), &flags)
        .unwrap();
    assert_eq!(container.geometry().layers, 2);
    assert_eq!(
        container.subresource(0, SubresourceKey::new(0, 1, 0)).unwrap()[0],
        50
    );
}

/// 8-bit FLOAT is rejected before the (nonexistent) file is read.
#[test]
fn test_invalid_format_before_read() {
    let flags = TextureFlags::none()
        .with_bits(8)
        .with_primitive(PrimitiveKind::Float);
    let err = local_assembler()
        .convert_paths(&[PathBuf::from("/nonexistent/input.png")], &flags)
        .unwrap_err();
    assert_eq!(err.code(), 0x05);
}

/// The same subresource supplied twice.
#[test]
fn test_duplicate_subresource() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.png");
    write_png(&a, 4, 4, rgba8(), 0);
    let key = SubresourceKey::new(0, 0, 0);
    let descriptors = [FileDescriptor::path(&a, key), FileDescriptor::path(&a, key)];

    let err = local_assembler()
        .convert_descriptors(&descriptors, &TextureFlags::none())
        .unwrap_err();
    assert_eq!(err.code(), 0x43);
}

// ============================================================================
// Persistence and export
// ============================================================================

/// Container file round trip on disk.
#[test]
fn test_container_file_roundtrip() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("tex.png");
    write_png(&source, 16, 8, rgba8(), 7);

    let store = LocalFileStore::new();
    let container = local_assembler()
        .convert_path(&source, &TextureFlags::default())
        .unwrap();
    let file = dir.path().join("out").join("tex.txsk");
    container.save(&file, &store).unwrap();

    let loaded = Container::load(&file, &store).unwrap();
    assert_eq!(loaded, container);
    assert_eq!(loaded.geometry().mips, 5);
}

/// PNG in, PNG out: pixel identical at quality 1.
#[test]
fn test_png_roundtrip_through_container() {
    let dir = TempDir::new().unwrap();
    let format = PixelFormat::new(2, 16, PrimitiveKind::Unorm, false).unwrap();
    let source = dir.path().join("in.png");
    write_png(&source, 5, 3, format, 9);

    let descriptors = [FileDescriptor::path(&source, SubresourceKey::default())];
    let container = local_assembler()
        .convert_descriptors(&descriptors, &TextureFlags::none())
        .unwrap();
    let exporter = ExternalFormatExporter::default();
    let base = dir.path().join("out");
    assert!(exporter.to_disk(&container, &base, 1.0).is_empty());

    let original = CodecRegistry::with_defaults()
        .decode(&std::fs::read(&source).unwrap())
        .unwrap();
    let exported = CodecRegistry::with_defaults()
        .decode(&std::fs::read(dir.path().join("out.png")).unwrap())
        .unwrap();
    assert_eq!(exported, original);
}

/// RGBA16 FLOAT with only an 8-bit UNORM encoder available.
#[test]
fn test_unsupported_format_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let rgba16f = PixelFormat::new(4, 16, PrimitiveKind::Float, false).unwrap();
    let mut builder = texstack::ContainerBuilder::new(
        texstack::TextureType::new(TextureDimension::TwoD, false),
        Geometry::default(),
        Default::default(),
    );
    let f = builder.allocate(2, 2, rgba16f).unwrap();
    builder
        .insert(f, SubresourceKey::default(), &[0u8; 2 * 2 * 8])
        .unwrap();
    let container = builder.finish().unwrap();

    let exporter = ExternalFormatExporter::new(
        CodecRegistry::empty().with_codec(Arc::new(Unorm8Codec)),
        Arc::new(LocalFileStore::new()),
    );
    let unsupported = exporter.to_disk(&container, &dir.path().join("tex"), 1.0);
    assert_eq!(unsupported, vec![rgba16f]);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
