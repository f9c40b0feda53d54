use image::imageops::FilterType;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_colors;
use imageproc::morphology::{Mask, grayscale_dilate};

/// BT.601 luma in 14-bit fixed point, rounded
fn luma(p: Rgb<u8>) -> Luma<u8> {
    let [r, g, b] = p.0.map(u32::from);
    Luma([((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8])
}

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    map_colors(img, luma)
}

/// Resize to a fixed height keeping the aspect ratio.
///
/// Returns the resized image and the scale ratio (`target_height / height`).
pub fn resize_to_height(img: &GrayImage, target_height: u32) -> (GrayImage, f64) {
    let (width, height) = img.dimensions();
    let ratio = target_height as f64 / height as f64;
    let new_width = ((width as f64 * ratio) as u32).max(1);
    let resized = image::imageops::resize(img, new_width, target_height, FilterType::Triangle);
    (resized, ratio)
}

/// Gaussian blur with a 3x3 kernel of the given sigma
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    let side = (-1.0 / (2.0 * sigma * sigma)).exp();
    let sum = 1.0 + 2.0 * side;
    separable_filter_equal(img, &[side / sum, 1.0 / sum, side / sum])
}

/// Median pixel intensity; the mean of the two middle values for even counts
pub fn median_intensity(img: &GrayImage) -> f64 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel[0] as usize] += 1;
    }

    let count = img.width() as u64 * img.height() as u64;
    if count == 0 {
        return 0.0;
    }

    let nth = |rank: u64| -> f64 {
        let mut seen = 0;
        for (value, &n) in histogram.iter().enumerate() {
            seen += n;
            if seen > rank {
                return value as f64;
            }
        }
        255.0
    };

    if count % 2 == 1 {
        nth(count / 2)
    } else {
        (nth(count / 2 - 1) + nth(count / 2)) / 2.0
    }
}

/// Canny thresholds spread around the median so they follow scene lighting
pub fn edge_thresholds(median: f64, spread: f64) -> (f32, f32) {
    let lower = ((1.0 - spread) * median).max(0.0).floor();
    let upper = ((1.0 + spread) * median).min(255.0).floor();
    (lower as f32, upper as f32)
}

/// Detect edges using Canny edge detector.
///
/// Thresholds are raised to at least 1: at zero, hysteresis accepts the
/// unsuppressed border and walks off the image.
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let low = low_threshold.max(1.0);
    let high = high_threshold.max(low);
    canny(img, low, high)
}

/// The 5x5 elliptical structuring element
fn ellipse_mask() -> Mask {
    let kernel = GrayImage::from_fn(5, 5, |x, y| {
        let corner_row = y == 0 || y == 4;
        if corner_row && x != 2 {
            image::Luma([0])
        } else {
            image::Luma([255])
        }
    });
    Mask::from_image(&kernel, 2, 2)
}

/// Thicken edges so small gaps in the bezel outline close up
pub fn dilate_edges(edges: &GrayImage, iterations: u32) -> GrayImage {
    let mask = ellipse_mask();
    let mut dilated = edges.clone();
    for _ in 0..iterations {
        dilated = grayscale_dilate(&dilated, &mask);
    }
    dilated
}
