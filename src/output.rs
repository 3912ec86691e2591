//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Render report
//!
//! ```text
//! Camera     f/2.8  1/250  ISO 800
//! Exposure   x4.00 (+2.0 EV)
//! Blur       2px
//! Status     overexposed
//! Reason     average brightness 231, 45.0% of pixels in highlights
//! Luminance  avg 231.4  shadows 0.0%  highlights 45.0%
//! Histogram  ▁▁▁▁▁▁▁▁▁▁▂▃▄▅▇█
//! ```
//!
//! ## Stops
//!
//! ```text
//! Aperture  f/1.8 f/2 f/2.8 f/4 [f/5.6] f/8 ...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::camera::{CameraParameters, Dial};
use crate::imaging::ExposureClassification;
use crate::session::Render;
use crate::suggest::Alert;

const LABEL_WIDTH: usize = 11;
const SPARK_LEVELS: &[char] = &['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const HISTOGRAM_COLUMNS: usize = 16;

fn row(label: &str, value: impl std::fmt::Display) -> String {
    format!("{label:<LABEL_WIDTH$}{value}")
}

/// Render a 256-level histogram as a sparkline of `columns` characters.
///
/// Levels are summed into equal-width columns and scaled to the tallest one.
/// An empty histogram renders as the lowest bar throughout.
pub fn histogram_sparkline(histogram: &[u32; 256], columns: usize) -> String {
    let columns = columns.clamp(1, 256);
    let per_column = 256usize.div_ceil(columns);
    let sums: Vec<u64> = histogram
        .chunks(per_column)
        .map(|c| c.iter().map(|&n| n as u64).sum())
        .collect();
    let peak = sums.iter().copied().max().unwrap_or(0);

    sums.iter()
        .map(|&sum| {
            if peak == 0 {
                return SPARK_LEVELS[0];
            }
            let idx = (sum * (SPARK_LEVELS.len() as u64 - 1) + peak / 2) / peak;
            SPARK_LEVELS[idx as usize]
        })
        .collect()
}

/// Format the luminance analysis of a frame.
pub fn format_classification(classification: &ExposureClassification) -> Vec<String> {
    let stats = &classification.stats;
    let mut lines = vec![row("Status", classification.status)];
    if !classification.reason.is_empty() {
        lines.push(row("Reason", &classification.reason));
    }
    lines.push(row(
        "Luminance",
        format!(
            "avg {:.1}  shadows {:.1}%  highlights {:.1}%",
            classification.average_luminance,
            stats.dark_ratio * 100.0,
            stats.bright_ratio * 100.0
        ),
    ));
    lines.push(row(
        "Histogram",
        histogram_sparkline(&stats.histogram, HISTOGRAM_COLUMNS),
    ));
    lines
}

/// Format a full render report: settings, derived values and classification.
pub fn format_render_report(render: &Render) -> Vec<String> {
    let ev = render.exposure_factor.log2();
    let mut lines = vec![
        row("Camera", render.params),
        row(
            "Exposure",
            format!("x{:.2} ({:+.1} EV)", render.exposure_factor, ev),
        ),
        row("Blur", format!("{}px", render.blur_radius)),
    ];
    lines.extend(format_classification(&render.classification));
    lines
}

/// Format every dial's stops with the current selection in brackets.
pub fn format_stops(params: &CameraParameters) -> Vec<String> {
    [Dial::Aperture, Dial::Shutter, Dial::Iso]
        .into_iter()
        .map(|dial| {
            let current = params.index(dial);
            let stops: Vec<String> = (0..dial.len())
                .map(|i| {
                    let label = match dial {
                        // The ISO row is already labelled.
                        Dial::Iso => crate::camera::ISO_STOPS[i].to_string(),
                        _ => dial.label(i),
                    };
                    if i == current {
                        format!("[{label}]")
                    } else {
                        label
                    }
                })
                .collect();
            let name = match dial {
                Dial::Aperture => "Aperture",
                Dial::Shutter => "Shutter",
                Dial::Iso => "ISO",
            };
            row(name, stops.join(" "))
        })
        .collect()
}

/// Format a suggestion alert. Stale alerts say which settings they answer.
pub fn format_alert(alert: &Alert, current: &CameraParameters) -> Vec<String> {
    let mut lines = vec![row("Suggestion", &alert.text)];
    if alert.is_stale(current) {
        lines.push(row("", format!("(for {})", alert.requested_for)));
    }
    lines
}

pub fn print_render_report(render: &Render) {
    for line in format_render_report(render) {
        println!("{}", line);
    }
}

pub fn print_classification(classification: &ExposureClassification) {
    for line in format_classification(classification) {
        println!("{}", line);
    }
}

pub fn print_stops(params: &CameraParameters) {
    for line in format_stops(params) {
        println!("{}", line);
    }
}

pub fn print_alert(alert: &Alert, current: &CameraParameters) {
    for line in format_alert(alert, current) {
        println!("{}", line);
    }
}
