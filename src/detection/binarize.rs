//! Digit row isolation
//!
//! Two binarizations of the rectified display are OR-ed together: an adaptive
//! mean threshold cleaned up with morphology, and a fixed threshold smoothed
//! through two Otsu passes. Either alone fails under some lighting; the
//! combination is what the crop is taken from.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::integral_image::{integral_image, sum_image_pixels};
use imageproc::morphology::{close, open};

use crate::config::DigitRegionConfig;
use crate::detection::preprocessing;

/// Adaptive mean threshold with replicated borders.
///
/// A pixel becomes white when it is brighter than the mean of the
/// `block_size x block_size` window around it minus `offset`.
pub fn adaptive_mean_threshold(gray: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let radius = block_size / 2;
    let area = (block_size * block_size) as f64;

    let padded = GrayImage::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
        let sx = (x as i64 - radius as i64).clamp(0, width as i64 - 1) as u32;
        let sy = (y as i64 - radius as i64).clamp(0, height as i64 - 1) as u32;
        *gray.get_pixel(sx, sy)
    });
    let integral = integral_image::<_, u64>(&padded);

    GrayImage::from_fn(width, height, |x, y| {
        // Window centered on (x, y) in source coordinates is
        // (x..=x + 2r, y..=y + 2r) in padded coordinates
        let sum = sum_image_pixels(&integral, x, y, x + 2 * radius, y + 2 * radius)[0];
        let mean = (sum as f64 / area).round() as i32;
        let value = gray.get_pixel(x, y)[0] as i32;
        if value > mean - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Remove speckles (3x3 opening) and then close small gaps in strokes (3x3 closing)
pub fn remove_noise(binary: &GrayImage) -> GrayImage {
    let opened = open(binary, Norm::LInf, 1);
    close(&opened, Norm::LInf, 1)
}

/// Fixed threshold followed by Otsu, a light blur and Otsu again
pub fn smooth_threshold(gray: &GrayImage, level: u8, sigma: f32) -> GrayImage {
    let fixed = threshold(gray, level, ThresholdType::Binary);
    let refined = threshold(&fixed, otsu_level(&fixed), ThresholdType::Binary);
    let blurred = preprocessing::apply_blur(&refined, sigma);
    threshold(&blurred, otsu_level(&blurred), ThresholdType::Binary)
}

/// Pixelwise OR of two binary images of the same size
pub fn combine(a: &GrayImage, b: &GrayImage) -> GrayImage {
    GrayImage::from_fn(a.width(), a.height(), |x, y| {
        Luma([a.get_pixel(x, y)[0] | b.get_pixel(x, y)[0]])
    })
}

/// Binarize a grayscale display image for recognition
pub fn binarize(gray: &GrayImage, config: &DigitRegionConfig) -> GrayImage {
    let adaptive = adaptive_mean_threshold(gray, config.adaptive_block_size, config.adaptive_offset);
    let cleaned = remove_noise(&adaptive);
    let smoothed = smooth_threshold(gray, config.fixed_threshold, config.smoothing_sigma);
    combine(&smoothed, &cleaned)
}

/// Crop the digit row using bounds proportional to the display size
pub fn crop_digit_region(binary: &GrayImage, config: &DigitRegionConfig) -> GrayImage {
    let (width, height) = binary.dimensions();
    let left = ((width as f64 * config.left) as u32).min(width);
    let right = ((width as f64 * config.right) as u32).clamp(left, width);
    let top = ((height as f64 * config.top) as u32).min(height);
    let bottom = ((height as f64 * config.bottom) as u32).clamp(top, height);

    image::imageops::crop_imm(binary, left, top, right - left, bottom - top).to_image()
}

/// Surround an image with a white border
pub fn pad_white(img: &GrayImage, border: u32) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut canvas = GrayImage::from_pixel(width + 2 * border, height + 2 * border, Luma([255u8]));
    image::imageops::replace(&mut canvas, img, border.into(), border.into());
    canvas
}

/// Produce the padded binary image of the digit row of a rectified display
pub fn isolate_digits(display: &RgbImage, config: &DigitRegionConfig) -> GrayImage {
    let gray = preprocessing::to_grayscale(display);
    let binary = binarize(&gray, config);
    let digits = crop_digit_region(&binary, config);
    pad_white(&digits, config.padding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    fn is_binary(img: &GrayImage) -> bool {
        img.pixels().all(|p| p[0] == 0 || p[0] == 255)
    }

    #[test]
    fn test_adaptive_uniform_is_white() {
        let gray = GrayImage::from_pixel(80, 40, Luma([90]));
        let binary = adaptive_mean_threshold(&gray, 61, 8);
        assert!(binary.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_adaptive_marks_dark_strokes() {
        let mut gray = GrayImage::from_pixel(120, 80, Luma([200]));
        draw_filled_rect_mut(&mut gray, Rect::at(50, 20).of_size(6, 40), Luma([20]));

        let binary = adaptive_mean_threshold(&gray, 61, 8);
        assert_eq!(binary.get_pixel(52, 40)[0], 0);
        assert_eq!(binary.get_pixel(10, 10)[0], 255);
        assert_eq!(binary.get_pixel(100, 70)[0], 255);
    }

    #[test]
    fn test_remove_noise_drops_speckles() {
        let mut binary = GrayImage::from_pixel(30, 30, Luma([0]));
        binary.put_pixel(5, 5, Luma([255]));
        draw_filled_rect_mut(&mut binary, Rect::at(12, 12).of_size(8, 8), Luma([255]));

        let cleaned = remove_noise(&binary);
        assert_eq!(cleaned.get_pixel(5, 5)[0], 0);
        assert_eq!(cleaned.get_pixel(15, 15)[0], 255);
    }

    #[test]
    fn test_smooth_threshold_is_binary() {
        let gray = GrayImage::from_fn(64, 64, |x, y| Luma([((x * 4 + y) % 256) as u8]));
        let smoothed = smooth_threshold(&gray, 180, 0.8);
        assert!(is_binary(&smoothed));
        // Deep shadow never survives the fixed threshold
        assert_eq!(smoothed.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_combine_is_or() {
        let a = GrayImage::from_raw(4, 1, vec![0, 255, 0, 255]).unwrap();
        let b = GrayImage::from_raw(4, 1, vec![0, 0, 255, 255]).unwrap();
        assert_eq!(combine(&a, &b).into_raw(), vec![0, 255, 255, 255]);
    }

    #[test]
    fn test_crop_uses_proportional_bounds() {
        let config = DigitRegionConfig::default();
        let binary = GrayImage::new(1000, 500);

        let cropped = crop_digit_region(&binary, &config);
        let expected_width = (1000.0 * config.right) as u32 - (1000.0 * config.left) as u32;
        let expected_height = (500.0 * config.bottom) as u32 - (500.0 * config.top) as u32;
        assert_eq!(cropped.dimensions(), (expected_width, expected_height));
        assert_eq!(cropped.dimensions(), (821, 142));
    }

    #[test]
    fn test_crop_takes_the_right_pixels() {
        let config = DigitRegionConfig::default();
        let mut binary = GrayImage::new(1000, 500);
        // Mark the first pixel inside the digit row
        binary.put_pixel(144, 183, Luma([255]));

        let cropped = crop_digit_region(&binary, &config);
        assert_eq!(cropped.get_pixel(0, 0)[0], 255);
        assert_eq!(cropped.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_pad_white() {
        let img = GrayImage::from_pixel(10, 5, Luma([0]));
        let padded = pad_white(&img, 20);

        assert_eq!(padded.dimensions(), (50, 45));
        assert_eq!(padded.get_pixel(0, 0)[0], 255);
        assert_eq!(padded.get_pixel(19, 22)[0], 255);
        assert_eq!(padded.get_pixel(20, 20)[0], 0);
        assert_eq!(padded.get_pixel(29, 24)[0], 0);
        assert_eq!(padded.get_pixel(30, 24)[0], 255);
    }

    #[test]
    fn test_isolate_digits_output() {
        let config = DigitRegionConfig::default();
        let mut display = RgbImage::from_pixel(344, 200, image::Rgb([190, 200, 185]));
        draw_filled_rect_mut(&mut display, Rect::at(80, 85).of_size(10, 30), image::Rgb([15, 15, 15]));

        let digits = isolate_digits(&display, &config);
        let crop_w = (344.0 * config.right) as u32 - (344.0 * config.left) as u32;
        let crop_h = (200.0 * config.bottom) as u32 - (200.0 * config.top) as u32;
        assert_eq!(digits.dimensions(), (crop_w + 40, crop_h + 40));
        assert!(is_binary(&digits));
        assert!(digits.pixels().any(|p| p[0] == 0));
    }
}
