//! Example: Clean a camera image stored as FITS
//!
//! Reads the image from CLEANING_INPUT and the algorithm configuration from
//! CLEANING_CONFIG (YAML or JSON, chosen by extension), cleans the image and
//! writes the result to CLEANING_OUTPUT (default `test_output/cleaned.fits`).
//! The diagnostic report is printed as JSON.
//!
//! Example configuration:
//! ```text
//! algorithm: wavelet_transform
//! args:
//!   composed:
//!     number_of_scales: 4
//!     suppress_last_scale: true
//!     k_sigma_noise_threshold: 3.0
//! kill_isolated_pixels: true
//! ```
//!
//! # Usage
//!
//! ```bash
//! CLEANING_INPUT=event.fits CLEANING_CONFIG=wt.yaml cargo run --example clean_fits
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cleaning::{fits, CleanerConfig, Report};
use common::log_setup::{setup_logging, LogConfig};

fn main() -> Result<()> {
    setup_logging(&LogConfig::new("info", "clean_fits"))?;

    let input = env_path("CLEANING_INPUT")?;
    let config_path = env_path("CLEANING_CONFIG")?;
    let output = env::var("CLEANING_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("test_output/cleaned.fits"));

    let config = CleanerConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let algorithm = config.into_algorithm()?;

    let image = fits::load_image(&input)
        .with_context(|| format!("Failed to load FITS file {}", input.display()))?;
    tracing::info!(
        "Loaded {} with shape {:?} ({} invalid pixels)",
        input.display(),
        image.shape(),
        image.count_invalid()
    );

    let mut report = Report::new();
    let cleaned = algorithm.clean_timed(&image, Some(&mut report))?;

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    fits::save_image(&cleaned, &output)
        .with_context(|| format!("Failed to save FITS file {}", output.display()))?;
    tracing::info!("{} output written to {}", algorithm.label(), output.display());

    println!("{}", report.to_json()?);
    Ok(())
}

fn env_path(name: &str) -> Result<PathBuf> {
    env::var(name)
        .map(PathBuf::from)
        .with_context(|| format!("{name} environment variable must be set"))
}
