#![allow(dead_code)]

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use meter_reader::{DigitRecognizer, MeterConfig, MeterReader, ReaderError};

/// Size of the drawn bezel, 1.72 wide per unit of height
pub const BEZEL_WIDTH: u32 = 516;
pub const BEZEL_HEIGHT: u32 = 300;

const BACKGROUND: Rgb<u8> = Rgb([220, 220, 215]);
const BEZEL: Rgb<u8> = Rgb([30, 32, 35]);
const LCD: Rgb<u8> = Rgb([185, 195, 175]);
const SEGMENT: Rgb<u8> = Rgb([20, 20, 20]);

/// Creates a 1200x900 photo of a meter display: a dark bezel with a lighter
/// LCD window and five dark digit strokes, its top-left corner at `(x, y)`.
pub fn meter_photo_at(x: i32, y: i32) -> RgbImage {
    let mut img = RgbImage::from_pixel(1200, 900, BACKGROUND);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(x, y).of_size(BEZEL_WIDTH, BEZEL_HEIGHT),
        BEZEL,
    );
    // Window ratio is far from the bezel's so it never wins
    draw_filled_rect_mut(&mut img, Rect::at(x + 41, y + 66).of_size(444, 168), LCD);
    for i in 0..5 {
        draw_filled_rect_mut(
            &mut img,
            Rect::at(x + 100 + 70 * i, y + 115).of_size(10, 70),
            SEGMENT,
        );
    }
    img
}

/// Creates the standard meter photo with the display left of center
pub fn meter_photo() -> RgbImage {
    meter_photo_at(300, 250)
}

/// Creates a photo with the bezel rotated by `degrees` about its center
pub fn tilted_meter_photo(degrees: f64) -> RgbImage {
    let mut img = RgbImage::from_pixel(1200, 900, BACKGROUND);
    let (cx, cy) = (600.0, 450.0);
    let (sin, cos) = degrees.to_radians().sin_cos();
    let corner = |dx: f64, dy: f64| {
        Point::new(
            (cx + dx * cos - dy * sin).round() as i32,
            (cy + dx * sin + dy * cos).round() as i32,
        )
    };

    let (hw, hh) = (BEZEL_WIDTH as f64 / 2.0, BEZEL_HEIGHT as f64 / 2.0);
    let bezel = [
        corner(-hw, -hh),
        corner(hw, -hh),
        corner(hw, hh),
        corner(-hw, hh),
    ];
    draw_polygon_mut(&mut img, &bezel, BEZEL);

    let (ww, wh) = (222.0, 84.0);
    let window = [
        corner(-ww, -wh),
        corner(ww, -wh),
        corner(ww, wh),
        corner(-ww, wh),
    ];
    draw_polygon_mut(&mut img, &window, LCD);
    img
}

/// Creates a frame taken without flash: black, optionally with a dim
/// 344x200 panel
pub fn dark_photo(panel: Option<u8>) -> RgbImage {
    let mut img = RgbImage::new(1200, 900);
    if let Some(level) = panel {
        draw_filled_rect_mut(
            &mut img,
            Rect::at(400, 300).of_size(344, 200),
            Rgb([level, level, level]),
        );
    }
    img
}

/// Creates a featureless gray photo
pub fn blank_photo() -> RgbImage {
    RgbImage::from_pixel(1024, 768, Rgb([128, 128, 128]))
}

/// Recognizer that answers with fixed text
pub struct StubRecognizer {
    pub text: String,
}

impl DigitRecognizer for StubRecognizer {
    fn recognize(&self, _roi: &GrayImage) -> Result<String, ReaderError> {
        Ok(self.text.clone())
    }
}

/// Recognizer whose engine is broken
pub struct BrokenRecognizer;

impl DigitRecognizer for BrokenRecognizer {
    fn recognize(&self, _roi: &GrayImage) -> Result<String, ReaderError> {
        Err(ReaderError::RecognitionEngine(
            "model produced no output".to_string(),
        ))
    }
}

/// Creates a reader with default settings that always recognizes `text`
pub fn reader_returning(text: &str) -> MeterReader {
    MeterReader::new(
        MeterConfig::default(),
        Box::new(StubRecognizer {
            text: text.to_string(),
        }),
    )
}
