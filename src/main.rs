use anyhow::{Context, bail};
use clap::Parser;
use image::ImageReader;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use meter_reader::output;
use meter_reader::{MeterReader, ReaderError, Settings};

#[derive(Parser)]
#[command(name = "meter-reader")]
#[command(about = "Read the digits off photos of a utility meter display")]
struct Cli {
    /// Photos to read, each one independently
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// TOML file overriding the default pipeline settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// ocrs text detection model
    #[arg(long, value_name = "FILE")]
    detection_model: Option<PathBuf>,

    /// ocrs text recognition model
    #[arg(long, value_name = "FILE")]
    recognition_model: Option<PathBuf>,

    /// Copy photos that could not be read into this directory
    #[arg(long, value_name = "DIR")]
    failures_dir: Option<PathBuf>,

    /// Save stage images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(path) = args.detection_model.clone() {
        settings.recognizer.detection_model = path;
    }
    if let Some(path) = args.recognition_model.clone() {
        settings.recognizer.recognition_model = path;
    }
    settings.meter.validate().context("Invalid configuration")?;

    if let Some(dir) = &args.debug_out {
        output::prepare_debug_dir(dir)?;
    }

    let reader = MeterReader::with_ocrs(settings.meter, &settings.recognizer)?;

    let mut failures = 0;
    for path in &args.images {
        match read_image(&reader, path, args.debug_out.as_deref()) {
            Ok(()) => {}
            Err(e) => {
                error!("{}: {:#}", path.display(), e);
                failures += 1;

                if let Some(dir) = &args.failures_dir {
                    match output::preserve_failed_image(path, dir) {
                        Ok(copy) => info!("Saved failed image to {}", copy.display()),
                        Err(e) => warn!("Could not preserve {}: {:#}", path.display(), e),
                    }
                }

                if is_fatal(&e) {
                    bail!("Aborting: recognition engine is not usable");
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} images could not be read", failures, args.images.len());
    }

    Ok(())
}

/// Read one photo and print its value
fn read_image(reader: &MeterReader, path: &Path, debug_out: Option<&Path>) -> anyhow::Result<()> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?
        .to_rgb8();

    info!("Loaded {} ({}x{})", path.display(), img.width(), img.height());

    let outcome = match debug_out {
        Some(dir) => {
            let inspection = reader.inspect(&img);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            let saved = output::save_stages(dir, &stem, &inspection.stages)?;
            info!("Saved {} stage images to {}", saved.len(), dir.join(&stem).display());
            inspection.outcome
        }
        None => reader.read(&img),
    };

    let reading = outcome?;
    info!(raw = %reading.raw, value = reading.value, "Meter read");
    println!("{}: {} (raw {})", path.display(), reading.value, reading.raw);

    Ok(())
}

fn is_fatal(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ReaderError>()
        .is_some_and(|e| !e.is_retryable())
}
