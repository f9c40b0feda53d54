use thiserror::Error;

/// Failures of a single meter reading attempt
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// No quadrilateral in the photo could serve as the display bezel
    #[error("Unable to find display contour: {reason}")]
    NoDisplayFound { reason: String },

    /// Digits were recognized but do not form a believable meter value
    #[error(
        "Incorrect readings: {}, most likely display contour was not properly identified",
        describe_value(.raw, .value)
    )]
    ImplausibleReading { raw: String, value: Option<f64> },

    /// The recognition engine could not be created or run
    #[error("Recognition engine failure: {0}")]
    RecognitionEngine(String),
}

impl ReaderError {
    pub fn no_display(reason: impl Into<String>) -> Self {
        Self::NoDisplayFound {
            reason: reason.into(),
        }
    }

    /// Whether another photo of the meter may succeed.
    ///
    /// Recognition engine failures are deployment faults (missing or broken
    /// models) and retrying with new pixels will not help.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::RecognitionEngine(_))
    }
}

fn describe_value(raw: &str, value: &Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => format!("{:?} (not a number)", raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implausible_message_mentions_value() {
        let err = ReaderError::ImplausibleReading {
            raw: "42".to_string(),
            value: Some(0.042),
        };
        assert_eq!(
            err.to_string(),
            "Incorrect readings: 0.042, most likely display contour was not properly identified"
        );
    }

    #[test]
    fn test_implausible_message_without_value() {
        let err = ReaderError::ImplausibleReading {
            raw: String::new(),
            value: None,
        };
        assert!(err.to_string().contains("\"\" (not a number)"));
    }

    #[test]
    fn test_retryable() {
        assert!(ReaderError::no_display("nothing").is_retryable());
        assert!(ReaderError::ImplausibleReading {
            raw: "1".to_string(),
            value: Some(0.001)
        }
        .is_retryable());
        assert!(!ReaderError::RecognitionEngine("missing model".to_string()).is_retryable());
    }
}
