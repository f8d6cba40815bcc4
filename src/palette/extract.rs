//! Cheap palette extraction: a handful of sampled pixels from a downscaled frame.

use std::cmp::Reverse;
use std::time::Duration;

use super::Frame;
use crate::models::Rgb;

/// Width of the offscreen sampling canvas.
pub const SAMPLE_WIDTH: u32 = 64;
/// Height of the offscreen sampling canvas.
pub const SAMPLE_HEIGHT: u32 = 36;
/// Number of colours kept after ranking.
pub const PALETTE_SIZE: usize = 5;
/// How often an active video slide is sampled.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Sampled coordinates: corners, centre, then edge midpoints.
pub fn sample_points(width: u32, height: u32) -> [(u32, u32); 9] {
    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);
    let mid_x = width / 2;
    let mid_y = height / 2;
    [
        (0, 0),
        (right, 0),
        (0, bottom),
        (right, bottom),
        (mid_x, mid_y),
        (mid_x, 0),
        (mid_x, bottom),
        (0, mid_y),
        (right, mid_y),
    ]
}

/// Colours at every sample point of the downscaled frame, in sampling order.
pub fn sample_frame(frame: &Frame) -> Vec<Rgb> {
    let canvas = frame.downscale(SAMPLE_WIDTH, SAMPLE_HEIGHT);
    sample_points(canvas.width(), canvas.height())
        .iter()
        .map(|&(x, y)| canvas.pixel(x, y))
        .collect()
}

/// The most vibrant samples of a frame, brightest first.
///
/// Ties keep sampling order, so a static frame always yields the same palette.
pub fn extract_palette(frame: &Frame) -> Vec<Rgb> {
    let mut samples = sample_frame(frame);
    samples.sort_by_key(|c| Reverse(c.intensity()));
    samples.truncate(PALETTE_SIZE);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_points_cover_corners_and_centre() {
        let points = sample_points(SAMPLE_WIDTH, SAMPLE_HEIGHT);
        assert_eq!(points[0], (0, 0));
        assert_eq!(points[3], (63, 35));
        assert_eq!(points[4], (32, 18));
        assert!(points.iter().all(|&(x, y)| x < 64 && y < 36));
    }

    #[test]
    fn test_solid_frame_samples_expected_colour() {
        let red = Rgb::new(255, 0, 0);
        let frame = Frame::solid(SAMPLE_WIDTH, SAMPLE_HEIGHT, red).unwrap();

        let samples = sample_frame(&frame);
        assert_eq!(samples.len(), 9);
        assert!(samples.iter().all(|&c| c == red));

        let palette = extract_palette(&frame);
        assert_eq!(palette, vec![red; PALETTE_SIZE]);
    }

    #[test]
    fn test_static_frame_is_idempotent() {
        let mut rgba = Vec::new();
        for y in 0..180u32 {
            for x in 0..320u32 {
                rgba.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 90, 255]);
            }
        }
        let frame = Frame::new(320, 180, rgba).unwrap();

        assert_eq!(extract_palette(&frame), extract_palette(&frame));
    }

    #[test]
    fn test_palette_ranks_by_intensity() {
        // Dark frame with a bright centre
        let mut rgba = Vec::new();
        for y in 0..SAMPLE_HEIGHT {
            for x in 0..SAMPLE_WIDTH {
                if (x, y) == (32, 18) {
                    rgba.extend_from_slice(&[250, 240, 230, 255]);
                } else if x == 0 {
                    rgba.extend_from_slice(&[0, 0, 120, 255]);
                } else {
                    rgba.extend_from_slice(&[10, 10, 10, 255]);
                }
            }
        }
        let frame = Frame::new(SAMPLE_WIDTH, SAMPLE_HEIGHT, rgba).unwrap();

        let palette = extract_palette(&frame);
        assert_eq!(palette.len(), PALETTE_SIZE);
        assert_eq!(palette[0], Rgb::new(250, 240, 230));
        // Left edge samples: two corners and the left midpoint
        assert_eq!(&palette[1..4], &[Rgb::new(0, 0, 120); 3]);
        assert_eq!(palette[4], Rgb::new(10, 10, 10));
    }
}
