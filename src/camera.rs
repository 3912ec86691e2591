//! Camera parameter model.
//!
//! The simulator never interpolates between stops: every parameter is an index
//! into one of three fixed, ordered stop sets. Those sets are part of the wire
//! contract with the suggestion backend (they are sent as the `*_options`
//! arrays), so they must match exactly.
//!
//! | Dial | Stops |
//! |------|-------|
//! | Aperture | f/1.8 … f/22 (11 stops) |
//! | Shutter | 1/4 … 1/8000 (13 stops) |
//! | ISO | 200 … 6400 (6 stops) |
//!
//! [`CameraParameters`] stores indices, which makes an out-of-set value
//! unrepresentable. Text from the command line is resolved with the `parse_*`
//! helpers, which either find an exact member or fail with [`ParamError`].

use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Aperture f-numbers, widest first.
pub const APERTURE_STOPS: &[f64] = &[1.8, 2.0, 2.8, 4.0, 5.6, 8.0, 11.0, 14.0, 16.0, 18.0, 22.0];

/// Shutter speeds as `1/N` labels, slowest first.
pub const SHUTTER_STOPS: &[&str] = &[
    "1/4", "1/8", "1/15", "1/30", "1/60", "1/125", "1/250", "1/500", "1/1000", "1/2000", "1/3000",
    "1/4000", "1/8000",
];

/// ISO sensitivities, lowest first.
pub const ISO_STOPS: &[u32] = &[200, 400, 800, 1600, 3200, 6400];

const DEFAULT_APERTURE: usize = 4; // f/5.6
const DEFAULT_SHUTTER: usize = 5; // 1/125
const DEFAULT_ISO: usize = 1; // ISO 400

#[derive(Error, Debug, PartialEq)]
pub enum ParamError {
    #[error("f/{0} is not an available aperture stop")]
    Aperture(String),
    #[error("{0} is not an available shutter speed")]
    Shutter(String),
    #[error("ISO {0} is not an available sensitivity")]
    Iso(String),
}

/// One of the three camera dials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dial {
    Aperture,
    Shutter,
    Iso,
}

impl Dial {
    /// Number of stops on this dial.
    pub fn len(self) -> usize {
        match self {
            Dial::Aperture => APERTURE_STOPS.len(),
            Dial::Shutter => SHUTTER_STOPS.len(),
            Dial::Iso => ISO_STOPS.len(),
        }
    }

    /// Display label for the stop at `index`, as the pickers show it.
    pub fn label(self, index: usize) -> String {
        match self {
            Dial::Aperture => format_aperture(APERTURE_STOPS[index]),
            Dial::Shutter => SHUTTER_STOPS[index].to_string(),
            Dial::Iso => format!("ISO {}", ISO_STOPS[index]),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dial::Aperture => "aperture",
            Dial::Shutter => "shutter",
            Dial::Iso => "iso",
        }
    }
}

/// Format an f-number without a trailing `.0` (`f/4`, `f/5.6`).
pub fn format_aperture(value: f64) -> String {
    format!("f/{value}")
}

/// Current aperture, shutter and ISO selection.
///
/// Defaults to the exposure baseline: f/5.6, 1/125, ISO 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraParameters {
    aperture: usize,
    shutter: usize,
    iso: usize,
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            aperture: DEFAULT_APERTURE,
            shutter: DEFAULT_SHUTTER,
            iso: DEFAULT_ISO,
        }
    }
}

impl CameraParameters {
    /// Build from stop indices, saturating each at the end of its set.
    pub fn from_indices(aperture: usize, shutter: usize, iso: usize) -> Self {
        Self {
            aperture: aperture.min(APERTURE_STOPS.len() - 1),
            shutter: shutter.min(SHUTTER_STOPS.len() - 1),
            iso: iso.min(ISO_STOPS.len() - 1),
        }
    }

    /// Build from exact stop values.
    pub fn from_values(aperture: f64, shutter: &str, iso: u32) -> Result<Self, ParamError> {
        let aperture = APERTURE_STOPS
            .iter()
            .position(|&a| a == aperture)
            .ok_or_else(|| ParamError::Aperture(aperture.to_string()))?;
        let shutter = SHUTTER_STOPS
            .iter()
            .position(|&s| s == shutter)
            .ok_or_else(|| ParamError::Shutter(shutter.to_string()))?;
        let iso = ISO_STOPS
            .iter()
            .position(|&i| i == iso)
            .ok_or_else(|| ParamError::Iso(iso.to_string()))?;
        Ok(Self {
            aperture,
            shutter,
            iso,
        })
    }

    pub fn aperture(&self) -> f64 {
        APERTURE_STOPS[self.aperture]
    }

    pub fn shutter(&self) -> &'static str {
        SHUTTER_STOPS[self.shutter]
    }

    pub fn iso(&self) -> u32 {
        ISO_STOPS[self.iso]
    }

    /// Stop index currently selected on `dial`.
    pub fn index(&self, dial: Dial) -> usize {
        match dial {
            Dial::Aperture => self.aperture,
            Dial::Shutter => self.shutter,
            Dial::Iso => self.iso,
        }
    }

    /// Select a stop by index. Indices past the end select the last stop.
    pub fn select(&mut self, dial: Dial, index: usize) {
        let index = index.min(dial.len() - 1);
        match dial {
            Dial::Aperture => self.aperture = index,
            Dial::Shutter => self.shutter = index,
            Dial::Iso => self.iso = index,
        }
    }

    /// Move `dial` by `delta` stops, stopping at either end of the set.
    pub fn step(&mut self, dial: Dial, delta: i32) {
        let current = self.index(dial) as i64;
        let max = dial.len() as i64 - 1;
        let next = (current + delta as i64).clamp(0, max);
        self.select(dial, next as usize);
    }
}

impl fmt::Display for CameraParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  ISO {}",
            format_aperture(self.aperture()),
            self.shutter(),
            self.iso()
        )
    }
}

/// Wire form: `{"aperture": 5.6, "shutter": "1/125", "iso": 400}`.
impl Serialize for CameraParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("CameraParameters", 3)?;
        s.serialize_field("aperture", &self.aperture())?;
        s.serialize_field("shutter", self.shutter())?;
        s.serialize_field("iso", &self.iso())?;
        s.end()
    }
}

/// Resolve aperture text (`"f/2.8"`, `"F2.8"`, `"2.8"`) to a stop index.
pub fn parse_aperture(text: &str) -> Result<usize, ParamError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("f/")
        .or_else(|| trimmed.strip_prefix("F/"))
        .or_else(|| trimmed.strip_prefix('f'))
        .or_else(|| trimmed.strip_prefix('F'))
        .unwrap_or(trimmed);
    let value: f64 = digits
        .parse()
        .map_err(|_| ParamError::Aperture(trimmed.to_string()))?;
    APERTURE_STOPS
        .iter()
        .position(|&a| a == value)
        .ok_or_else(|| ParamError::Aperture(digits.to_string()))
}

/// Resolve shutter text (`"1/250"`, `"250"`) to a stop index.
///
/// A bare number is read as the denominator, since every available stop is a
/// fraction of a second.
pub fn parse_shutter(text: &str) -> Result<usize, ParamError> {
    let trimmed = text.trim();
    let label = if trimmed.contains('/') {
        trimmed.to_string()
    } else {
        format!("1/{trimmed}")
    };
    SHUTTER_STOPS
        .iter()
        .position(|&s| s == label)
        .ok_or_else(|| ParamError::Shutter(trimmed.to_string()))
}

/// Resolve ISO text (`"ISO 800"`, `"iso800"`, `"800"`) to a stop index.
pub fn parse_iso(text: &str) -> Result<usize, ParamError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("ISO")
        .or_else(|| trimmed.strip_prefix("iso"))
        .unwrap_or(trimmed)
        .trim();
    let value: u32 = digits
        .parse()
        .map_err(|_| ParamError::Iso(trimmed.to_string()))?;
    ISO_STOPS
        .iter()
        .position(|&i| i == value)
        .ok_or_else(|| ParamError::Iso(digits.to_string()))
}

/// Resolve text for any dial.
pub fn parse_stop(dial: Dial, text: &str) -> Result<usize, ParamError> {
    match dial {
        Dial::Aperture => parse_aperture(text),
        Dial::Shutter => parse_shutter(text),
        Dial::Iso => parse_iso(text),
    }
}
