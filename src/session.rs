//! Simulation session: the current camera settings plus the untouched source image.
//!
//! A [`Session`] owns everything that changes while a user experiments with
//! one photo. Parameters mutate in place; the loaded image never does. Every
//! [`Session::render`] re-derives the exposed frame from the source, so moving
//! a dial back and forth never accumulates rounding or clipping.
//!
//! ```text
//! load_image ──► source (downscaled once)
//!                   │
//! params ──► factor, blur radius
//!                   │
//!                   ▼
//!            transform::apply ──► adjusted buffer ──► classify
//!                                        │
//!                                        └─► blur ──► preview (display/save only)
//! ```
//!
//! The classifier always sees the unblurred buffer; blur is a display effect.

use crate::camera::{CameraParameters, Dial};
use crate::config::SimConfig;
use crate::imaging::{
    BackendError, Dimensions, ExposureBaseline, ExposureClassification, ImageBackend, PixelBuffer,
    calculate_preview_dimensions, classify, compute_blur_radius, compute_exposure_factor,
    transform,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error, info};

/// One rendered frame and everything derived from it.
#[derive(Debug, Clone)]
pub struct Render {
    /// Parameters the frame was rendered with.
    pub params: CameraParameters,
    pub exposure_factor: f64,
    pub blur_radius: u32,
    /// Exposed and noised buffer, before depth-of-field blur.
    pub buffer: PixelBuffer,
    pub classification: ExposureClassification,
}

impl Render {
    /// The frame as displayed: `buffer` with depth-of-field blur applied.
    pub fn preview(&self, backend: &impl ImageBackend) -> Result<PixelBuffer, BackendError> {
        backend.blur(&self.buffer, self.blur_radius)
    }

    /// Write the displayed frame to `path`.
    pub fn save_preview(
        &self,
        backend: &impl ImageBackend,
        path: &Path,
    ) -> Result<(), BackendError> {
        let preview = self.preview(backend)?;
        backend.encode(&preview, path)?;
        info!("Saved {}", path.display());
        Ok(())
    }
}

/// A noise RNG: seeded when `seed` is given, otherwise from OS entropy.
pub fn noise_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Name for a saved preview when the user gives none: `cophotographer_<millis>.png`.
pub fn default_output_path() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    PathBuf::from(format!("cophotographer_{millis}.png"))
}

/// Parameters and source image for one simulation.
#[derive(Debug, Clone)]
pub struct Session {
    params: CameraParameters,
    baseline: ExposureBaseline,
    preview_bounds: Dimensions,
    source: Option<PixelBuffer>,
}

impl Session {
    pub fn new(params: CameraParameters, preview_bounds: Dimensions) -> Self {
        Self {
            params,
            baseline: ExposureBaseline::default(),
            preview_bounds,
            source: None,
        }
    }

    /// Start a session from config: starting parameters and preview bounds.
    pub fn from_config(config: &SimConfig) -> Result<Self, crate::camera::ParamError> {
        Ok(Self::new(
            config.camera.to_parameters()?,
            Dimensions {
                width: config.preview.max_width,
                height: config.preview.max_height,
            },
        ))
    }

    pub fn params(&self) -> &CameraParameters {
        &self.params
    }

    pub fn set_params(&mut self, params: CameraParameters) {
        self.params = params;
    }

    /// Select a stop by index on one dial.
    pub fn select(&mut self, dial: Dial, index: usize) {
        self.params.select(dial, index);
    }

    /// Move one dial by `delta` stops.
    pub fn step(&mut self, dial: Dial, delta: i32) {
        self.params.step(dial, delta);
    }

    pub fn source(&self) -> Option<&PixelBuffer> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Decode `path`, scale it to the preview bounds and make it the source.
    ///
    /// On failure the previous source, if any, stays loaded.
    pub fn load_image(
        &mut self,
        backend: &impl ImageBackend,
        path: &Path,
    ) -> Result<Dimensions, BackendError> {
        let decoded = backend.decode(path)?;
        info!(
            "Image loaded: {}x{} from {}",
            decoded.width(),
            decoded.height(),
            path.display()
        );

        let (width, height) = calculate_preview_dimensions(
            (decoded.width(), decoded.height()),
            (self.preview_bounds.width, self.preview_bounds.height),
        );
        let target = Dimensions { width, height };
        let scaled = backend.resize(&decoded, target)?;
        debug!("Preview size {}x{}", width, height);

        self.source = Some(scaled);
        Ok(target)
    }

    /// Replace the source with an already-decoded buffer, used as-is.
    pub fn set_source(&mut self, buffer: PixelBuffer) {
        self.source = Some(buffer);
    }

    /// Render the current parameters against the source image.
    ///
    /// Returns `None` (and logs) when no image is loaded.
    pub fn render<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Render> {
        let Some(source) = &self.source else {
            error!("No image loaded");
            return None;
        };

        let exposure_factor = compute_exposure_factor(&self.params, &self.baseline);
        let blur_radius = compute_blur_radius(self.params.aperture());
        debug!("Exposure factor: {exposure_factor:.4}, blur radius: {blur_radius}");

        let buffer = transform::apply(source, exposure_factor, self.params.iso(), rng);
        let classification = classify(&buffer);
        debug!(
            "Classified {} (avg {:.1})",
            classification.status, classification.average_luminance
        );

        Some(Render {
            params: self.params,
            exposure_factor,
            blur_radius,
            buffer,
            classification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ExposureStatus;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    fn bounds() -> Dimensions {
        Dimensions {
            width: 800,
            height: 500,
        }
    }

    fn gray_session(v: u8) -> Session {
        let mut session = Session::new(CameraParameters::default(), bounds());
        session.set_source(PixelBuffer::filled(20, 10, [v, v, v, 255]).unwrap());
        session
    }

    #[test]
    fn render_without_image_is_noop() {
        let session = Session::new(CameraParameters::default(), bounds());
        assert!(session.render(&mut noise_rng(Some(1))).is_none());
    }

    #[test]
    fn iso_200_render_is_noise_free() {
        let mut session = gray_session(128);
        session.select(Dial::Iso, 0);
        let render = session.render(&mut noise_rng(None)).unwrap();
        assert_eq!(render.exposure_factor, 0.5);
        assert!(render.buffer.pixels().all(|p| p == [64, 64, 64, 255]));
    }

    #[test]
    fn render_reports_blur_and_classification() {
        let mut session = gray_session(128);
        session.set_params(CameraParameters::from_values(1.8, "1/125", 400).unwrap());
        let render = session.render(&mut noise_rng(Some(3))).unwrap();
        assert_eq!(render.blur_radius, 3);
        // f/1.8 is ~9.7x baseline: 128 saturates
        assert_eq!(render.classification.status, ExposureStatus::Overexposed);
        assert_eq!(render.params, *session.params());
    }

    #[test]
    fn rendering_twice_re_derives_from_source() {
        let mut session = gray_session(60);
        session.set_params(CameraParameters::from_values(4.0, "1/125", 400).unwrap());
        let first = session.render(&mut noise_rng(Some(9))).unwrap();
        let second = session.render(&mut noise_rng(Some(9))).unwrap();
        assert_eq!(first.buffer, second.buffer);
        assert_eq!(session.source().unwrap().as_raw()[0], 60);
    }

    #[test]
    fn load_image_scales_to_preview_bounds() {
        let backend = MockBackend::with_images(vec![
            PixelBuffer::filled(1600, 900, [10, 10, 10, 255]).unwrap(),
        ]);
        let mut session = Session::new(CameraParameters::default(), bounds());
        let dims = session.load_image(&backend, Path::new("/in.jpg")).unwrap();

        assert_eq!((dims.width, dims.height), (800, 450));
        assert_eq!(session.source().unwrap().width(), 800);
        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Decode("/in.jpg".into()),
                RecordedOp::Resize {
                    width: 800,
                    height: 450
                }
            ]
        );
    }

    #[test]
    fn failed_load_keeps_previous_source() {
        let backend = MockBackend::new();
        let mut session = gray_session(90);
        let before = session.source().cloned();

        assert!(session.load_image(&backend, Path::new("/bad.png")).is_err());
        assert_eq!(session.source().cloned(), before);
    }

    #[test]
    fn failed_first_load_leaves_no_image() {
        let backend = MockBackend::new();
        let mut session = Session::new(CameraParameters::default(), bounds());
        assert!(session.load_image(&backend, Path::new("/bad.png")).is_err());
        assert!(!session.has_image());
    }

    #[test]
    fn save_preview_blurs_then_encodes() {
        let backend = MockBackend::new();
        let mut session = gray_session(128);
        session.set_params(CameraParameters::from_values(2.0, "1/125", 400).unwrap());
        let render = session.render(&mut noise_rng(Some(0))).unwrap();
        render
            .save_preview(&backend, Path::new("/out/frame.png"))
            .unwrap();

        assert_eq!(
            backend.get_operations(),
            vec![
                RecordedOp::Blur(2),
                RecordedOp::Encode("/out/frame.png".into())
            ]
        );
    }

    #[test]
    fn default_output_path_is_timestamped_png() {
        let path = default_output_path();
        let name = path.to_str().unwrap();
        let millis = name
            .strip_prefix("cophotographer_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .unwrap();
        assert!(millis.parse::<u128>().unwrap() > 0);
    }

    #[test]
    fn from_config_uses_camera_section() {
        let mut config = SimConfig::default();
        config.camera.iso = 3200;
        config.preview.max_width = 100;
        let session = Session::from_config(&config).unwrap();
        assert_eq!(session.params().iso(), 3200);
    }
}
