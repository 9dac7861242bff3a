use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;

/// Ink value in a binary grid
pub const INK: u8 = 255;
/// Background value in a binary grid
pub const BACKGROUND: u8 = 0;

pub type FloatImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Normalized luma grid with values in [0, 1]
pub fn to_normalized(img: &DynamicImage) -> FloatImage {
    img.to_luma32f()
}

/// Binarize dark-on-light artwork so that ink becomes `INK`.
///
/// A pixel is ink when its luma is at or below `threshold`, or Otsu's level
/// when no threshold is given. A uniform image has no ink.
pub fn binarize(gray: &GrayImage, threshold: Option<u8>) -> GrayImage {
    let (min, max) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if gray.is_empty() || min == max {
        return GrayImage::from_pixel(gray.width(), gray.height(), Luma([BACKGROUND]));
    }

    let level = threshold.unwrap_or_else(|| otsu_level(gray));
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] <= level {
            Luma([INK])
        } else {
            Luma([BACKGROUND])
        }
    })
}
