//! Reader configuration
//!
//! Every tunable constant of the pipeline lives here so that the same code can
//! serve a different meter model by loading another TOML file.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Immutable pipeline configuration passed into [`crate::MeterReader`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    pub edges: EdgeConfig,
    pub display: DisplayConfig,
    pub digits: DigitRegionConfig,
    pub validation: ValidationConfig,
}

/// Edge detection and quadrilateral extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Height the photo is resized to before edge detection
    pub working_height: u32,
    /// Sigma of the pre-Canny blur (a 3x3 kernel)
    pub blur_sigma: f32,
    /// Spread of the Canny thresholds around the median intensity
    pub threshold_spread: f64,
    /// Dilation passes with the 5x5 elliptical kernel
    pub dilate_iterations: u32,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approx_tolerance: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            working_height: 900,
            blur_sigma: 0.8,
            threshold_spread: 0.3,
            dilate_iterations: 2,
            approx_tolerance: 0.04,
        }
    }
}

/// Display bezel selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Physical width / height of the bezel
    pub aspect_ratio: f64,
    /// Score given to candidates with zero height
    pub degenerate_penalty: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.72,
            degenerate_penalty: 100.0,
        }
    }
}

/// Location of the digit row inside the rectified display and its binarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitRegionConfig {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    /// White border added around the crop before recognition
    pub padding: u32,
    /// Window of the adaptive mean threshold (odd)
    pub adaptive_block_size: u32,
    /// Subtracted from the window mean before comparison
    pub adaptive_offset: i32,
    /// Level of the fixed threshold in the smoothing branch
    pub fixed_threshold: u8,
    /// Sigma of the blur between the two Otsu passes (a 3x3 kernel)
    pub smoothing_sigma: f32,
}

impl Default for DigitRegionConfig {
    fn default() -> Self {
        Self {
            left: 0.144,
            right: 0.965,
            top: 0.367,
            bottom: 0.650,
            padding: 20,
            adaptive_block_size: 61,
            adaptive_offset: 8,
            fixed_threshold: 180,
            smoothing_sigma: 0.8,
        }
    }
}

/// Plausibility checks on the recognized number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// The displayed digits are divided by this to get the reading
    pub divisor: f64,
    /// Readings below this are treated as a mis-located display
    pub min_value: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            divisor: 1000.0,
            min_value: 0.1,
        }
    }
}

impl MeterConfig {
    /// Load a configuration from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Settings::load(path)?;
        Ok(settings.meter)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.edges.working_height == 0 {
            bail!("edges.working_height must be positive");
        }
        if !(self.edges.blur_sigma > 0.0) {
            bail!("edges.blur_sigma must be positive");
        }
        if !(self.edges.approx_tolerance > 0.0) {
            bail!("edges.approx_tolerance must be positive");
        }
        if !(self.display.aspect_ratio > 0.0) {
            bail!("display.aspect_ratio must be positive");
        }

        let d = &self.digits;
        for (name, value) in [
            ("left", d.left),
            ("right", d.right),
            ("top", d.top),
            ("bottom", d.bottom),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("digits.{} must be within [0, 1], got {}", name, value);
            }
        }
        if d.left >= d.right || d.top >= d.bottom {
            bail!("digit region bounds are inverted");
        }
        if d.adaptive_block_size < 3 || d.adaptive_block_size % 2 == 0 {
            bail!(
                "digits.adaptive_block_size must be odd and at least 3, got {}",
                d.adaptive_block_size
            );
        }

        if !(d.smoothing_sigma > 0.0) {
            bail!("digits.smoothing_sigma must be positive");
        }

        if !(self.validation.divisor > 0.0) {
            bail!("validation.divisor must be positive");
        }

        Ok(())
    }
}

/// Where the ocrs models live and which characters they may emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
    pub allowed_chars: String,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        let cache_dir = model_cache_dir();
        Self {
            detection_model: cache_dir.join("text-detection.rten"),
            recognition_model: cache_dir.join("text-recognition.rten"),
            allowed_chars: "0123456789".to_string(),
        }
    }
}

/// Standard ocrs model location (`~/.cache/ocrs`)
fn model_cache_dir() -> PathBuf {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_default();
    Path::new(&home_dir).join(".cache/ocrs")
}

/// Everything a config file may contain: the pipeline sections plus `[recognizer]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub meter: MeterConfig,
    pub recognizer: RecognizerConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
