//! Exposure simulation pipeline and image I/O.
//!
//! | Stage | Module |
//! |---|---|
//! | **Exposure factor, blur radius, noise level** | [`calculations`] |
//! | **Brightness multiply + ISO noise** | [`transform`] |
//! | **Luminance histogram + classification** | [`histogram`] |
//! | **Decode / downscale / blur / encode** | [`backend`], [`rust_backend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions from camera parameters to scalars (unit testable)
//! - **Buffer**: The RGBA8 [`PixelBuffer`] every stage consumes
//! - **Transform / Histogram**: Per-pixel passes over a buffer
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod buffer;
pub mod calculations;
pub mod histogram;
pub mod rust_backend;
pub mod transform;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use buffer::{BufferError, PixelBuffer};
pub use calculations::{
    ExposureBaseline, calculate_preview_dimensions, compute_blur_radius, compute_exposure_factor,
    noise_level, shutter_denominator,
};
pub use histogram::{ExposureClassification, ExposureStatus, LuminanceStats, classify};
pub use rust_backend::{RustBackend, supported_input_extensions};
