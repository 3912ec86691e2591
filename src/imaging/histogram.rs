//! Luminance histogram analysis and exposure classification.
//!
//! Each pixel's perceptual luminance `0.299R + 0.587G + 0.114B` is bucketed
//! into 256 levels. The average level and the share of pixels in the shadow
//! (`<= 50`) and highlight (`>= 205`) ranges decide the classification.
//!
//! ## Decision order
//!
//! Rules are checked top to bottom and the first match wins. The order is
//! part of the contract: a frame that is clearly blown out must never be
//! reported as only slightly bright.
//!
//! | # | Condition | Status |
//! |---|-----------|--------|
//! | 1 | `avg > 200` or `bright > 20%` | overexposed |
//! | 2 | `avg < 80` or `dark > 30%` | underexposed |
//! | 3 | `avg > 180` and `bright > 10%` | slightly overexposed |
//! | 4 | `avg < 100` and `dark > 20%` | slightly underexposed |
//! | 5 | otherwise | ok |

use super::buffer::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest luminance level counted as shadow.
pub const DARK_LEVEL: usize = 50;
/// Lowest luminance level counted as highlight.
pub const BRIGHT_LEVEL: usize = 205;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureStatus {
    Ok,
    Overexposed,
    Underexposed,
    SlightlyOverexposed,
    SlightlyUnderexposed,
}

impl ExposureStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExposureStatus::Ok => "ok",
            ExposureStatus::Overexposed => "overexposed",
            ExposureStatus::Underexposed => "underexposed",
            ExposureStatus::SlightlyOverexposed => "slightly_overexposed",
            ExposureStatus::SlightlyUnderexposed => "slightly_underexposed",
        }
    }

    pub fn is_ok(self) -> bool {
        self == ExposureStatus::Ok
    }
}

impl fmt::Display for ExposureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Luminance statistics for one buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct LuminanceStats {
    /// Pixel counts per integer luminance level.
    pub histogram: [u32; 256],
    pub average: f64,
    pub dark_ratio: f64,
    pub bright_ratio: f64,
}

/// Classification result for one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureClassification {
    pub status: ExposureStatus,
    /// Human-readable explanation. Empty when the exposure is ok.
    pub reason: String,
    pub average_luminance: f64,
    pub stats: LuminanceStats,
}

/// Perceptual luminance of one pixel (alpha ignored).
pub fn luminance(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Build the luminance histogram and summary ratios for `buffer`.
pub fn luminance_stats(buffer: &PixelBuffer) -> LuminanceStats {
    let mut histogram = [0u32; 256];
    let mut total = 0.0;
    let mut dark = 0usize;
    let mut bright = 0usize;

    for px in buffer.pixels() {
        let l = luminance(px[0], px[1], px[2]);
        let level = (l.floor() as usize).min(255);
        histogram[level] += 1;
        total += l;
        if level <= DARK_LEVEL {
            dark += 1;
        }
        if level >= BRIGHT_LEVEL {
            bright += 1;
        }
    }

    let count = buffer.pixel_count() as f64;
    LuminanceStats {
        histogram,
        average: total / count,
        dark_ratio: dark as f64 / count,
        bright_ratio: bright as f64 / count,
    }
}

/// Pick the exposure status from summary statistics, first match wins.
pub fn decide(average: f64, dark_ratio: f64, bright_ratio: f64) -> ExposureStatus {
    if average > 200.0 || bright_ratio > 0.2 {
        ExposureStatus::Overexposed
    } else if average < 80.0 || dark_ratio > 0.3 {
        ExposureStatus::Underexposed
    } else if average > 180.0 && bright_ratio > 0.1 {
        ExposureStatus::SlightlyOverexposed
    } else if average < 100.0 && dark_ratio > 0.2 {
        ExposureStatus::SlightlyUnderexposed
    } else {
        ExposureStatus::Ok
    }
}

fn reason_for(status: ExposureStatus, stats: &LuminanceStats) -> String {
    match status {
        ExposureStatus::Overexposed => format!(
            "average brightness {}, {:.1}% of pixels in highlights",
            stats.average.round(),
            stats.bright_ratio * 100.0
        ),
        ExposureStatus::Underexposed => format!(
            "average brightness {}, {:.1}% of pixels in shadows",
            stats.average.round(),
            stats.dark_ratio * 100.0
        ),
        ExposureStatus::SlightlyOverexposed => "brightness slightly high".to_string(),
        ExposureStatus::SlightlyUnderexposed => "brightness slightly low".to_string(),
        ExposureStatus::Ok => String::new(),
    }
}

/// Classify the exposure of a rendered buffer.
pub fn classify(buffer: &PixelBuffer) -> ExposureClassification {
    let stats = luminance_stats(buffer);
    let status = decide(stats.average, stats.dark_ratio, stats.bright_ratio);
    ExposureClassification {
        status,
        reason: reason_for(status, &stats),
        average_luminance: stats.average,
        stats,
    }
}
