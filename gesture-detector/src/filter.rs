//! Skin color region filter.
//!
//! frame -> HSV band threshold -> Gaussian smoothing -> binary threshold
//! -> optional opening and closing.

use gesture_shared::HsvColor;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::euclidean_squared_distance_transform;
use imageproc::filter::separable_filter_equal;

use crate::color::rgb_to_hsv;
use crate::error::{DetectError, Result};

pub const GAUSSIAN_KERNEL_SIZE: usize = 7;
pub const GAUSSIAN_SIGMA: f32 = 0.8;
/// Blurred values above this become foreground
pub const BINARY_THRESHOLD: u8 = 10;
/// Disk radius of the structuring element, close to a 9x9 ellipse
pub const MORPHOLOGY_RADIUS: u8 = 4;

/// Normalized 1D Gaussian kernel of odd size
pub fn gaussian_kernel(size: usize, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as f32;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - half;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Pixels whose HSV value lies in `[lower, upper]` and that are not masked
/// out by `foreground`
pub fn color_band_mask(
    frame: &RgbImage,
    foreground: Option<&GrayImage>,
    lower: &HsvColor,
    upper: &HsvColor,
) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let visible = foreground.map_or(true, |mask| mask.get_pixel(x, y)[0] != 0);
        if visible && rgb_to_hsv(frame.get_pixel(x, y)).within(lower, upper) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Set pixels above `level` to 255 and everything else to 0
pub fn binarize(image: &mut GrayImage, level: u8) {
    for p in image.pixels_mut() {
        p[0] = if p[0] > level { 255 } else { 0 };
    }
}

fn invert(image: &GrayImage) -> GrayImage {
    let mut inverted = image.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

/// Binary dilation with a disk of the given radius
pub fn dilate(mask: &GrayImage, radius: u8) -> GrayImage {
    if mask.pixels().all(|p| p[0] == 0) {
        return mask.clone();
    }
    let distances = euclidean_squared_distance_transform(mask);
    let limit = (radius as f64) * (radius as f64);
    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if distances.get_pixel(x, y)[0] <= limit {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Binary erosion with a disk of the given radius.
///
/// Pixels beyond the image border do not erode the mask.
pub fn erode(mask: &GrayImage, radius: u8) -> GrayImage {
    invert(&dilate(&invert(mask), radius))
}

pub fn open(mask: &GrayImage, radius: u8) -> GrayImage {
    dilate(&erode(mask, radius), radius)
}

pub fn close(mask: &GrayImage, radius: u8) -> GrayImage {
    erode(&dilate(mask, radius), radius)
}

/// Produce the binary skin candidate mask of a frame
pub fn filter(
    frame: &RgbImage,
    foreground: Option<&GrayImage>,
    lower: &HsvColor,
    upper: &HsvColor,
    use_morphology: bool,
) -> Result<GrayImage> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(DetectError::EmptyFrame);
    }
    if let Some(mask) = foreground {
        if mask.dimensions() != frame.dimensions() {
            return Err(DetectError::MaskSizeMismatch {
                mask: mask.dimensions(),
                frame: frame.dimensions(),
            });
        }
    }

    let band = color_band_mask(frame, foreground, lower, upper);

    let kernel = gaussian_kernel(GAUSSIAN_KERNEL_SIZE, GAUSSIAN_SIGMA);
    let mut mask = separable_filter_equal(&band, &kernel[..]);
    binarize(&mut mask, BINARY_THRESHOLD);

    if use_morphology {
        mask = close(&open(&mask, MORPHOLOGY_RADIUS), MORPHOLOGY_RADIUS);
    }

    Ok(mask)
}
