//! Files written around a reading: stage images for debugging and copies of
//! photos that could not be read.
//!
//! The pipeline itself never touches the file system; these helpers are for
//! the calling application.

use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::detection::StageImages;

/// Make sure `dir` exists and is empty
pub fn prepare_debug_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read debug directory: {}", dir.display()))?;
        if entries.count() > 0 {
            return Err(anyhow!("Debug directory is not empty: {}", dir.display()));
        }
    } else {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;
    }
    Ok(())
}

/// Stage images in pipeline order with their file names
fn numbered_stages(stages: &StageImages) -> Vec<(String, DynamicImage)> {
    let named = [
        ("edges", stages.edges.clone().map(DynamicImage::ImageLuma8)),
        ("located", stages.located.clone().map(DynamicImage::ImageRgb8)),
        ("rectified", stages.rectified.clone().map(DynamicImage::ImageRgb8)),
        ("digits", stages.digits.clone().map(DynamicImage::ImageLuma8)),
    ];

    named
        .into_iter()
        .enumerate()
        .filter_map(|(i, (name, img))| img.map(|img| (format!("{:02}_{}.png", i + 1, name), img)))
        .collect()
}

/// Save the available stage images of one photo under `<dir>/<stem>/`
pub fn save_stages(dir: &Path, stem: &str, stages: &StageImages) -> Result<Vec<PathBuf>> {
    let stage_dir = dir.join(stem);
    std::fs::create_dir_all(&stage_dir)
        .with_context(|| format!("Failed to create {}", stage_dir.display()))?;

    let mut saved = Vec::new();
    for (filename, img) in numbered_stages(stages) {
        let output_path = stage_dir.join(filename);
        img.save(&output_path)
            .map_err(|e| anyhow!("Failed to save debug image {}: {}", output_path.display(), e))?;
        saved.push(output_path);
    }

    Ok(saved)
}

/// `YYYY-MM-DD-HH-MM-SS-<stem>.<ext>` for a photo taken at `timestamp`
pub fn failure_file_name(image_path: &Path, timestamp: OffsetDateTime) -> Result<String> {
    let stamp =
        timestamp.format(format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]"))?;

    let stem = image_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    Ok(match image_path.extension() {
        Some(ext) => format!("{}-{}.{}", stamp, stem, ext.to_string_lossy()),
        None => format!("{}-{}", stamp, stem),
    })
}

/// Copy a photo that could not be read into `failures_dir` for later inspection
pub fn preserve_failed_image(image_path: &Path, failures_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(failures_dir)
        .with_context(|| format!("Failed to create {}", failures_dir.display()))?;

    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let destination = failures_dir.join(failure_file_name(image_path, now)?);

    std::fs::copy(image_path, &destination).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            image_path.display(),
            destination.display()
        )
    })?;

    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};
    use tempfile::TempDir;

    fn timestamp() -> OffsetDateTime {
        // 2024-03-05 07:08:09 UTC
        OffsetDateTime::from_unix_timestamp(1_709_622_489).unwrap()
    }

    #[test]
    fn test_failure_file_name() {
        let name = failure_file_name(Path::new("/photos/meter.jpg"), timestamp()).unwrap();
        assert_eq!(name, "2024-03-05-07-08-09-meter.jpg");

        let name = failure_file_name(Path::new("capture"), timestamp()).unwrap();
        assert_eq!(name, "2024-03-05-07-08-09-capture");
    }

    #[test]
    fn test_preserve_failed_image() {
        let source_dir = TempDir::new().unwrap();
        let source = source_dir.path().join("meter.png");
        std::fs::write(&source, b"not really a png").unwrap();

        let failures = TempDir::new().unwrap();
        let target = failures.path().join("failed");
        let copied = preserve_failed_image(&source, &target).unwrap();

        assert!(copied.starts_with(&target));
        assert!(copied.to_string_lossy().ends_with("-meter.png"));
        assert_eq!(std::fs::read(&copied).unwrap(), b"not really a png");
        assert!(source.exists());
    }

    #[test]
    fn test_prepare_debug_dir() {
        let root = TempDir::new().unwrap();

        let fresh = root.path().join("debug");
        prepare_debug_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
        // Still empty, so it may be used again
        prepare_debug_dir(&fresh).unwrap();

        std::fs::write(fresh.join("leftover.png"), b"x").unwrap();
        let err = prepare_debug_dir(&fresh).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_save_stages_skips_missing_images() {
        let root = TempDir::new().unwrap();
        let stages = StageImages {
            edges: Some(GrayImage::new(8, 4)),
            located: Some(RgbImage::new(8, 4)),
            rectified: None,
            digits: None,
        };

        let saved = save_stages(root.path(), "meter", &stages).unwrap();
        let names: Vec<String> = saved
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_edges.png", "02_located.png"]);
        assert!(root.path().join("meter").join("01_edges.png").is_file());
        assert!(!root.path().join("meter").join("03_rectified.png").exists());
    }

    #[test]
    fn test_save_all_stages() {
        let root = TempDir::new().unwrap();
        let stages = StageImages {
            edges: Some(GrayImage::new(8, 4)),
            located: Some(RgbImage::new(8, 4)),
            rectified: Some(RgbImage::new(6, 3)),
            digits: Some(GrayImage::new(5, 2)),
        };

        let saved = save_stages(root.path(), "meter", &stages).unwrap();
        assert_eq!(saved.len(), 4);
        assert!(saved[3].ends_with("meter/04_digits.png"));

        let digits = image::open(&saved[3]).unwrap();
        assert_eq!((digits.width(), digits.height()), (5, 2));
    }
}
