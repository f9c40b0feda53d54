use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::Path;
use tracing::debug;

use crate::config::RecognizerConfig;
use crate::error::ReaderError;

/// Turns the isolated digit row into text
pub trait DigitRecognizer {
    /// Recognize the digits in a binary image of dark digits on white.
    ///
    /// Whitespace between digits is not significant and may be dropped.
    fn recognize(&self, roi: &GrayImage) -> Result<String, ReaderError>;
}

/// Digit recognizer backed by the ocrs text detection and recognition models
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load both models and restrict the output alphabet
    pub fn new(config: &RecognizerConfig) -> Result<Self, ReaderError> {
        for path in [&config.detection_model, &config.recognition_model] {
            if !path.exists() {
                return Err(ReaderError::RecognitionEngine(format!(
                    "OCR model not found: {}. Download the ocrs models (e.g. by running ocrs-cli once) or point the config at them",
                    path.display()
                )));
            }
        }

        let detection_model = load_model(&config.detection_model)?;
        let recognition_model = load_model(&config.recognition_model)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            allowed_chars: Some(config.allowed_chars.clone()),
            ..Default::default()
        })
        .map_err(|e| ReaderError::RecognitionEngine(e.to_string()))?;

        Ok(Self { engine })
    }
}

fn load_model(path: &Path) -> Result<Model, ReaderError> {
    Model::load_file(path).map_err(|e| {
        ReaderError::RecognitionEngine(format!("Failed to load {}: {}", path.display(), e))
    })
}

impl DigitRecognizer for OcrsRecognizer {
    fn recognize(&self, roi: &GrayImage) -> Result<String, ReaderError> {
        let rgb = DynamicImage::ImageLuma8(roi.clone()).to_rgb8();

        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| ReaderError::RecognitionEngine(e.to_string()))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|e| ReaderError::RecognitionEngine(e.to_string()))?;
        let text = self
            .engine
            .get_text(&input)
            .map_err(|e| ReaderError::RecognitionEngine(e.to_string()))?;

        debug!(text = %text, "Recognized text");

        Ok(collapse_whitespace(&text))
    }
}

/// Join the recognized lines and words into one run of characters
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect()
}
