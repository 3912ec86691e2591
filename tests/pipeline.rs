//! End-to-end exposure pipeline tests through the public library API.
//!
//! Real files go through `RustBackend` in a temp directory; every render uses
//! a seeded `StdRng` so results are reproducible.

use cophotographer::camera::{CameraParameters, Dial};
use cophotographer::config::{SimConfig, load_config};
use cophotographer::imaging::{
    Dimensions, ExposureBaseline, ExposureStatus, ImageBackend, PixelBuffer, RustBackend,
    classify, compute_blur_radius, compute_exposure_factor, transform,
};
use cophotographer::session::{Session, noise_rng};
use image::{Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

fn write_png(path: &Path, width: u32, height: u32, value: u8) {
    RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255]))
        .save(path)
        .unwrap();
}

fn params(aperture: f64, shutter: &str, iso: u32) -> CameraParameters {
    CameraParameters::from_values(aperture, shutter, iso).unwrap()
}

#[test]
fn load_render_save_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("scene.png");
    write_png(&input, 1600, 1000, 100);

    let backend = RustBackend::new();
    let mut session = Session::from_config(&SimConfig::default()).unwrap();
    let dims = session.load_image(&backend, &input).unwrap();
    assert_eq!(
        dims,
        Dimensions {
            width: 800,
            height: 500,
        }
    );

    session.set_params(params(2.8, "1/125", 400));
    let render = session.render(&mut noise_rng(Some(11))).unwrap();
    assert_eq!(render.blur_radius, 2);
    assert_eq!(render.classification.status, ExposureStatus::Overexposed);

    let output = tmp.path().join("preview.png");
    render.save_preview(&backend, &output).unwrap();
    let saved = backend.decode(&output).unwrap();
    assert_eq!((saved.width(), saved.height()), (800, 500));
    // The source itself is untouched by rendering.
    assert_eq!(session.source().unwrap().as_raw()[0], 100);
}

#[test]
fn small_images_are_not_upscaled() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("small.png");
    write_png(&input, 120, 90, 128);

    let mut session = Session::from_config(&SimConfig::default()).unwrap();
    let dims = session.load_image(&RustBackend::new(), &input).unwrap();
    assert_eq!(
        dims,
        Dimensions {
            width: 120,
            height: 90,
        }
    );
}

#[test]
fn failed_load_keeps_loaded_image() {
    let tmp = TempDir::new().unwrap();
    let good = tmp.path().join("good.png");
    let bad = tmp.path().join("bad.png");
    write_png(&good, 10, 10, 77);
    std::fs::write(&bad, b"definitely not a png").unwrap();

    let backend = RustBackend::new();
    let mut session = Session::from_config(&SimConfig::default()).unwrap();
    session.load_image(&backend, &good).unwrap();
    assert!(session.load_image(&backend, &bad).is_err());
    assert_eq!(session.source().unwrap().as_raw()[0], 77);
}

#[test]
fn exposure_factor_follows_stops() {
    let baseline = ExposureBaseline::default();
    let base = compute_exposure_factor(&CameraParameters::default(), &baseline);
    assert!((base - 1.0).abs() < 1e-12);

    let wide = compute_exposure_factor(&params(2.8, "1/125", 400), &baseline);
    assert!((wide - 4.0 * base).abs() < 1e-9);

    let fast = compute_exposure_factor(&params(5.6, "1/250", 400), &baseline);
    assert!((fast - 0.5).abs() < 1e-12);

    let sensitive = compute_exposure_factor(&params(5.6, "1/125", 1600), &baseline);
    assert!((sensitive - 4.0).abs() < 1e-12);
}

#[test]
fn blur_spans_the_aperture_range() {
    assert_eq!(compute_blur_radius(1.8), 3);
    assert_eq!(compute_blur_radius(22.0), 0);
}

#[test]
fn neutral_transform_is_identity() {
    let source = PixelBuffer::new(2, 1, vec![10, 20, 30, 40, 200, 150, 100, 7]).unwrap();
    let out = transform::apply(&source, 1.0, 200, &mut noise_rng(Some(5)));
    assert_eq!(out, source);
}

#[test]
fn seeded_renders_repeat_and_reapplying_compounds() {
    let source = PixelBuffer::filled(32, 32, [60, 80, 100, 255]).unwrap();
    let a = transform::apply(&source, 1.5, 3200, &mut noise_rng(Some(42)));
    let b = transform::apply(&source, 1.5, 3200, &mut noise_rng(Some(42)));
    assert_eq!(a, b);

    let twice = transform::apply(&a, 1.5, 3200, &mut noise_rng(Some(42)));
    assert_ne!(twice, a);
}

#[test]
fn dial_changes_re_derive_from_source() {
    let mut session = Session::new(
        CameraParameters::default(),
        Dimensions {
            width: 800,
            height: 500,
        },
    );
    session.set_source(PixelBuffer::filled(16, 16, [90, 90, 90, 255]).unwrap());
    session.select(Dial::Iso, 0);
    let first = session.render(&mut noise_rng(Some(3))).unwrap();

    session.step(Dial::Aperture, -3);
    session.render(&mut noise_rng(Some(3))).unwrap();
    session.step(Dial::Aperture, 3);
    let back = session.render(&mut noise_rng(Some(3))).unwrap();

    assert_eq!(first.buffer, back.buffer);
}

#[test]
fn classification_extremes() {
    let white = classify(&PixelBuffer::filled(8, 8, [255, 255, 255, 255]).unwrap());
    assert_eq!(white.status, ExposureStatus::Overexposed);
    assert_eq!(white.average_luminance.round(), 255.0);

    let black = classify(&PixelBuffer::filled(8, 8, [0, 0, 0, 255]).unwrap());
    assert_eq!(black.status, ExposureStatus::Underexposed);
    assert_eq!(black.average_luminance, 0.0);

    let gray = classify(&PixelBuffer::filled(8, 8, [128, 128, 128, 255]).unwrap());
    assert_eq!(gray.status, ExposureStatus::Ok);
    assert!(gray.reason.is_empty());
}

#[test]
fn sparse_config_file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cophotographer.toml");
    std::fs::write(
        &path,
        "[camera]\naperture = 2.8\n\n[simulation]\nseed = 7\n",
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.camera.aperture, 2.8);
    assert_eq!(config.camera.shutter, "1/125");
    assert_eq!(config.simulation.seed, Some(7));
    assert_eq!(config.preview.max_width, 800);

    let session = Session::from_config(&config).unwrap();
    assert_eq!(session.params().aperture(), 2.8);
}

#[test]
fn missing_config_file_means_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = load_config(&tmp.path().join("absent.toml")).unwrap();
    assert_eq!(config, SimConfig::default());
}
