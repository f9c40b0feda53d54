pub mod binarize;
pub mod contours;
pub mod display;
pub mod ocr;
pub mod preprocessing;
pub mod rectify;
pub mod validate;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use tracing::debug;

use crate::config::{MeterConfig, RecognizerConfig};
use crate::error::ReaderError;
use crate::models::{NormalizedContour, Reading};
use ocr::{DigitRecognizer, OcrsRecognizer};

/// Main meter reading pipeline.
///
/// Holds nothing but immutable configuration and the recognizer, so one reader
/// can serve several threads at once.
pub struct MeterReader {
    config: MeterConfig,
    recognizer: Box<dyn DigitRecognizer + Send + Sync>,
}

/// Intermediate images of one run, filled up to the stage that failed
#[derive(Debug, Clone, Default)]
pub struct StageImages {
    /// Dilated edge map at working resolution
    pub edges: Option<GrayImage>,
    /// Input photo with the located display outlined
    pub located: Option<RgbImage>,
    pub rectified: Option<RgbImage>,
    /// Padded binary digit row as handed to the recognizer
    pub digits: Option<GrayImage>,
}

/// Result of a run together with its stage images
#[derive(Debug, Clone)]
pub struct Inspection {
    pub stages: StageImages,
    pub outcome: Result<Reading, ReaderError>,
}

impl MeterReader {
    pub fn new(config: MeterConfig, recognizer: Box<dyn DigitRecognizer + Send + Sync>) -> Self {
        Self { config, recognizer }
    }

    /// Reader backed by the ocrs models named in `recognizer_config`
    pub fn with_ocrs(
        config: MeterConfig,
        recognizer_config: &RecognizerConfig,
    ) -> Result<Self, ReaderError> {
        let recognizer = OcrsRecognizer::new(recognizer_config)?;
        Ok(Self::new(config, Box::new(recognizer)))
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Read the meter in a photo
    pub fn read(&self, img: &RgbImage) -> Result<Reading, ReaderError> {
        self.run(img, None)
    }

    /// Read the meter in a photo and keep every intermediate image
    pub fn inspect(&self, img: &RgbImage) -> Inspection {
        let mut stages = StageImages::default();
        let outcome = self.run(img, Some(&mut stages));
        Inspection { stages, outcome }
    }

    fn run(
        &self,
        img: &RgbImage,
        mut stages: Option<&mut StageImages>,
    ) -> Result<Reading, ReaderError> {
        debug!(width = img.width(), height = img.height(), "Reading meter");

        // Step 1: Find quadrilaterals
        let contours::EdgeScan {
            edges,
            quadrilaterals,
        } = contours::scan_quadrilaterals(img, &self.config.edges);
        if let Some(stages) = stages.as_deref_mut() {
            stages.edges = Some(edges);
        }

        // Step 2: Pick the display
        let display = display::locate_display(&quadrilaterals, &self.config.display)?;
        if let Some(stages) = stages.as_deref_mut() {
            stages.located = Some(outline_display(img, &display.contour));
        }

        // Step 3: Rectify and isolate the digits
        let rectified = rectify::rectify_display(img, &display.contour)?;
        let digits = binarize::isolate_digits(&rectified, &self.config.digits);
        if let Some(stages) = stages.as_deref_mut() {
            stages.rectified = Some(rectified);
            stages.digits = Some(digits.clone());
        }

        // Step 4: Recognize and validate
        let raw = self.recognizer.recognize(&digits)?;
        validate::validate_reading(&raw, &self.config.validation)
    }
}

/// Copy of the photo with the display quadrilateral drawn on it
fn outline_display(img: &RgbImage, display: &NormalizedContour) -> RgbImage {
    let mut outlined = img.clone();
    let v = display.vertices;
    for i in 0..4 {
        let (a, b) = (v[i], v[(i + 1) % 4]);
        draw_line_segment_mut(
            &mut outlined,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            Rgb([255, 0, 0]),
        );
    }
    outlined
}
