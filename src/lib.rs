//! # CoPhotographer
//!
//! A camera exposure simulator. Load your own photo, pick an aperture, shutter
//! speed and ISO, and see what that combination would have done to the frame:
//! brighter or darker, noisier at high ISO, softer at wide apertures. Each
//! render is classified from its luminance histogram, and an optional remote
//! service suggests better settings when the exposure is off.
//!
//! # Architecture: One Source, Many Renders
//!
//! The loaded image is treated as the exposure taken at a fixed baseline
//! (f/5.6, 1/125, ISO 400). Every render re-derives the frame from that
//! untouched source:
//!
//! ```text
//! photo ─► decode ─► downscale ─► source
//!                                   │   params ─► exposure factor, blur radius
//!                                   ▼
//!                       brightness × factor + ISO noise ─► classify
//!                                   │
//!                                   └─► blur ─► preview (display / save)
//! ```
//!
//! Renders never feed back into the source, so moving a dial back restores the
//! earlier frame exactly (given the same noise draws).
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`camera`] | Allowed stops for each dial, parsing, stepping |
//! | [`imaging`] | Exposure math, pixel transform, histogram classifier, image I/O |
//! | [`session`] | Current parameters plus source image; produces [`session::Render`]s |
//! | [`suggest`] | Client for the remote exposure-advice service |
//! | [`dial`] | Interactive line-oriented session |
//! | [`config`] | `cophotographer.toml` loading, merging over defaults, validation |
//! | [`output`] | CLI output formatting |
//! | [`logger`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Stops, Not Numbers
//!
//! Parameters are held as indices into fixed stop lists, so a value outside the
//! allowed sets cannot be constructed. Text only becomes a stop through the
//! parsers in [`camera`], which are the single place a bad value is reported.
//!
//! ## Injected Randomness
//!
//! Noise takes any [`rand::Rng`]. The CLI creates one generator per run,
//! seeded from entropy unless a seed is configured, so a seeded run repeats
//! exactly. Tests always pass a seeded `StdRng`.
//!
//! ## Advice Off the Render Path
//!
//! The suggestion service is asked only after a frame is rendered (and saved),
//! only for non-ok exposures, and only when the service reports it has a model
//! key. Every failure is logged and swallowed: the simulator works the same
//! with the service down.

pub mod camera;
pub mod config;
pub mod dial;
pub mod imaging;
pub mod logger;
pub mod output;
pub mod session;
pub mod suggest;
