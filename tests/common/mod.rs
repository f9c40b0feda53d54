mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from meter_reader for tests
pub use meter_reader::{DigitRecognizer, MeterConfig, MeterReader, ReaderError, Reading};
