pub mod config;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod models;
pub mod output;

pub use config::{MeterConfig, RecognizerConfig, Settings};
pub use detection::ocr::{DigitRecognizer, OcrsRecognizer};
pub use detection::{Inspection, MeterReader, StageImages};
pub use error::ReaderError;
pub use models::{Contour, DisplayCandidate, NormalizedContour, Reading};
