use tracing::debug;

use crate::config::ValidationConfig;
use crate::error::ReaderError;
use crate::models::Reading;

/// Scale the recognized digits and reject values that point at a mis-located display
pub fn validate_reading(raw: &str, config: &ValidationConfig) -> Result<Reading, ReaderError> {
    let value = raw
        .parse::<f64>()
        .ok()
        .map(|digits| digits / config.divisor)
        .filter(|v| v.is_finite());

    match value {
        Some(value) if value >= config.min_value => {
            debug!(raw, value, "Reading passed validation");
            Ok(Reading {
                raw: raw.to_string(),
                value,
            })
        }
        _ => Err(ReaderError::ImplausibleReading {
            raw: raw.to_string(),
            value,
        }),
    }
}
