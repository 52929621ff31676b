//! Stand-in frame for renders that failed.

use image::{Rgb, RgbImage};

/// Vertical gray ramp from 50 at the top towards 150 at the bottom.
///
/// Depends only on the size, so every substitution of a given size is the
/// same image.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn placeholder_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| {
        let gray = (50.0 + f64::from(y) / f64::from(height) * 100.0) as u8;
        Rgb([gray, gray, gray])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_the_ramp() {
        let frame = placeholder_frame(3, 10);
        assert_eq!(frame.dimensions(), (3, 10));
        assert_eq!(*frame.get_pixel(0, 0), Rgb([50, 50, 50]));
        assert_eq!(*frame.get_pixel(2, 5), Rgb([100, 100, 100]));
        assert_eq!(*frame.get_pixel(1, 9), Rgb([140, 140, 140]));
    }

    #[test]
    fn deterministic() {
        assert_eq!(placeholder_frame(16, 12), placeholder_frame(16, 12));
    }
}
