//! Pixel transform: exposure multiply followed by ISO noise.
//!
//! The transform always produces a new buffer from the untouched source.
//! Re-applying it to its own output compounds the exposure, so callers keep
//! the original around and re-derive on every parameter change (see
//! [`Session`](crate::session::Session)).

use super::buffer::PixelBuffer;
use super::calculations::noise_level;
use rand::Rng;

/// Round and clamp a channel value into `0..=255`.
fn clamp_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Apply `exposure_factor` and ISO noise to `source`, returning a new buffer.
///
/// Alpha is copied unchanged. The random source is injected so tests and
/// seeded renders are reproducible.
pub fn apply<R: Rng + ?Sized>(
    source: &PixelBuffer,
    exposure_factor: f64,
    iso: u32,
    rng: &mut R,
) -> PixelBuffer {
    let mut output = source.clone();
    scale_brightness(&mut output, exposure_factor);
    inject_noise(&mut output, iso, rng);
    output
}

/// Multiply R, G and B of every pixel by `factor`.
pub fn scale_brightness(buffer: &mut PixelBuffer, factor: f64) {
    for px in buffer.pixels_mut() {
        for channel in &mut px[..3] {
            *channel = clamp_channel(*channel as f64 * factor);
        }
    }
}

/// Add ISO-proportional noise in place.
///
/// Each pixel is perturbed with probability `noise_level / 100`. A perturbed
/// pixel gets one delta drawn from `[-noise_level/2, noise_level/2)` added to
/// all three color channels, which are then clamped separately. Returns the
/// number of pixels perturbed.
pub fn inject_noise<R: Rng + ?Sized>(buffer: &mut PixelBuffer, iso: u32, rng: &mut R) -> usize {
    let level = noise_level(iso);
    if level <= 0.0 {
        return 0;
    }

    let probability = level / 100.0;
    let mut perturbed = 0;
    for px in buffer.pixels_mut() {
        if rng.random::<f64>() < probability {
            let delta = (rng.random::<f64>() - 0.5) * level;
            for channel in &mut px[..3] {
                *channel = clamp_channel(*channel as f64 + delta);
            }
            perturbed += 1;
        }
    }
    perturbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        let data = (0..width * height)
            .flat_map(|i| {
                let v = (i % 256) as u8;
                [v, v / 2, 255 - v, (i % 7) as u8 * 30]
            })
            .collect();
        PixelBuffer::new(width, height, data).unwrap()
    }

    #[test]
    fn unit_factor_at_iso_200_is_identity() {
        let source = gradient(32, 16);
        let out = apply(&source, 1.0, 200, &mut StdRng::seed_from_u64(1));
        assert_eq!(out, source);
    }

    #[test]
    fn alpha_is_preserved() {
        let source = gradient(32, 16);
        let out = apply(&source, 3.7, 6400, &mut StdRng::seed_from_u64(9));
        for (a, b) in source.pixels().zip(out.pixels()) {
            assert_eq!(a[3], b[3]);
        }
    }

    #[test]
    fn source_is_untouched() {
        let source = PixelBuffer::filled(4, 4, [100, 100, 100, 255]).unwrap();
        let copy = source.clone();
        let _ = apply(&source, 2.0, 3200, &mut StdRng::seed_from_u64(3));
        assert_eq!(source, copy);
    }

    #[test]
    fn brightness_scales_and_clamps() {
        let mut buf = PixelBuffer::new(2, 1, vec![100, 200, 10, 255, 0, 128, 255, 7]).unwrap();
        scale_brightness(&mut buf, 1.5);
        assert_eq!(buf.as_raw(), &[150, 255, 15, 255, 0, 192, 255, 7]);
    }

    #[test]
    fn brightness_rounds_half_up() {
        let mut buf = PixelBuffer::new(1, 1, vec![1, 3, 5, 0]).unwrap();
        scale_brightness(&mut buf, 0.5);
        assert_eq!(buf.as_raw(), &[1, 2, 3, 0]);
    }

    #[test]
    fn same_seed_same_render() {
        let source = gradient(64, 64);
        let a = apply(&source, 1.8, 3200, &mut StdRng::seed_from_u64(42));
        let b = apply(&source, 1.8, 3200, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn reapplying_to_output_compounds() {
        let source = PixelBuffer::filled(8, 8, [40, 40, 40, 255]).unwrap();
        let once = apply(&source, 2.0, 200, &mut StdRng::seed_from_u64(0));
        let twice = apply(&once, 2.0, 200, &mut StdRng::seed_from_u64(0));
        assert_eq!(once.as_raw()[0], 80);
        assert_eq!(twice.as_raw()[0], 160);
        assert_ne!(once, twice);
    }

    #[test]
    fn no_noise_below_iso_200() {
        let mut buf = PixelBuffer::filled(16, 16, [128, 128, 128, 255]).unwrap();
        let perturbed = inject_noise(&mut buf, 100, &mut StdRng::seed_from_u64(5));
        assert_eq!(perturbed, 0);
        assert!(buf.pixels().all(|p| p == [128, 128, 128, 255]));
    }

    #[test]
    fn noise_fraction_tracks_level() {
        // ISO 6400: level 19.375 → ~19.4% of pixels perturbed
        let mut buf = PixelBuffer::filled(200, 200, [128, 128, 128, 255]).unwrap();
        let perturbed = inject_noise(&mut buf, 6400, &mut StdRng::seed_from_u64(11));
        let fraction = perturbed as f64 / buf.pixel_count() as f64;
        assert!(
            (fraction - 0.19375).abs() < 0.02,
            "perturbed fraction {fraction}"
        );
    }

    #[test]
    fn noise_delta_is_bounded_and_channel_correlated() {
        let mut buf = PixelBuffer::filled(100, 100, [128, 128, 128, 255]).unwrap();
        inject_noise(&mut buf, 3200, &mut StdRng::seed_from_u64(21));
        let half = noise_level(3200) / 2.0;
        for px in buf.pixels() {
            let delta = px[0] as f64 - 128.0;
            assert!(delta.abs() <= half.ceil());
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
    }

    #[test]
    fn noise_clamps_channels_independently() {
        // Red sits at the ceiling, so a positive delta moves only green/blue.
        let mut buf = PixelBuffer::filled(100, 100, [255, 128, 128, 255]).unwrap();
        inject_noise(&mut buf, 6400, &mut StdRng::seed_from_u64(8));
        assert!(buf.pixels().any(|p| p[0] == 255 && p[1] > 128));
        assert!(buf.pixels().all(|p| p[1] == p[2]));
    }
}
