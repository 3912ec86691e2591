//! Pure exposure math.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::camera::CameraParameters;
use tracing::warn;

/// Reference exposure every other setting is measured against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureBaseline {
    pub aperture: f64,
    pub shutter_denominator: f64,
    pub iso: f64,
}

impl Default for ExposureBaseline {
    /// f/5.6, 1/125 s, ISO 400.
    fn default() -> Self {
        Self {
            aperture: 5.6,
            shutter_denominator: 125.0,
            iso: 400.0,
        }
    }
}

/// Widest and narrowest apertures on the dial, used to normalize blur.
pub const MIN_APERTURE: f64 = 1.8;
pub const MAX_APERTURE: f64 = 22.0;
/// Blur radius at the widest aperture.
pub const MAX_BLUR_RADIUS: u32 = 3;

/// Brightness multiplier for `params` relative to `baseline`.
///
/// The product of three independent terms:
///
/// - aperture: `(baseline / f)^2`, light scales with the opening's area
/// - shutter: `baseline_denominator / denominator`, so 1/1000 lets in less than 1/125
/// - ISO: `iso / baseline_iso`
///
/// No clamping; the pixel transform clamps per channel.
///
/// ```
/// # use cophotographer::camera::CameraParameters;
/// # use cophotographer::imaging::{ExposureBaseline, compute_exposure_factor};
/// let params = CameraParameters::from_values(2.8, "1/125", 400).unwrap();
/// let factor = compute_exposure_factor(&params, &ExposureBaseline::default());
/// assert!((factor - 4.0).abs() < 1e-9);
/// ```
pub fn compute_exposure_factor(params: &CameraParameters, baseline: &ExposureBaseline) -> f64 {
    let aperture_term = (baseline.aperture / params.aperture()).powi(2);
    let shutter_term = baseline.shutter_denominator / shutter_denominator(params.shutter());
    let iso_term = params.iso() as f64 / baseline.iso;
    aperture_term * shutter_term * iso_term
}

/// Denominator of a shutter label.
///
/// `"1/N"` yields `N`. A label without `/` is a whole-second exposure and
/// yields `1`, which makes the shutter term large relative to the baseline.
pub fn shutter_denominator(label: &str) -> f64 {
    match label.split_once('/') {
        Some((_, denominator)) => denominator.trim().parse().unwrap_or_else(|_| {
            warn!("Unreadable shutter speed {label:?}, treating as 1s");
            1.0
        }),
        None => 1.0,
    }
}

/// Depth-of-field blur radius for an f-number, in pixels.
///
/// Linear in aperture between f/1.8 (radius 3) and f/22 (radius 0), floored.
pub fn compute_blur_radius(aperture: f64) -> u32 {
    let normalized = (MAX_APERTURE - aperture) / (MAX_APERTURE - MIN_APERTURE);
    let radius = (normalized * MAX_BLUR_RADIUS as f64).floor();
    radius.clamp(0.0, MAX_BLUR_RADIUS as f64) as u32
}

/// Sensor noise strength for an ISO value.
///
/// Roughly 0 at ISO 200 up to ~19 at ISO 6400. Used both as the percentage of
/// pixels perturbed and as the width of the perturbation. Negative below
/// ISO 200, which means no noise.
pub fn noise_level(iso: u32) -> f64 {
    (iso as f64 - 200.0) / 6400.0 * 20.0
}

/// Calculate preview dimensions that fit inside `bounds` without upscaling.
///
/// Aspect ratio is preserved; each side is floored and kept at least 1px.
pub fn calculate_preview_dimensions(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    let scale = (max_w as f64 / src_w as f64)
        .min(max_h as f64 / src_h as f64)
        .min(1.0);

    let w = ((src_w as f64 * scale).floor() as u32).max(1);
    let h = ((src_h as f64 * scale).floor() as u32).max(1);
    (w, h)
}
