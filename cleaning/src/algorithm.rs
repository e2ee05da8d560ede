//! The common cleaning interface and config-driven algorithm selection.

use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use common::file_format;

use crate::error::Result;
use crate::image::Image;
use crate::report::Report;
use crate::tailcut::{Tailcut, TailcutConfig};
use crate::wavelet::{WaveletConfig, WaveletTransform};

/// An image cleaning algorithm.
///
/// `clean` never modifies its input and returns an image of the same shape.
/// Diagnostics go to `report` when one is supplied.
pub trait CleaningAlgorithm: Send + Sync {
    /// Short human-readable name, used to tag benchmark results.
    fn label(&self) -> &str;

    fn clean(&self, image: &Image, report: Option<&mut Report>) -> Result<Image>;

    /// [`clean`](Self::clean), recording the wall time as `exec_time_sec`.
    fn clean_timed(&self, image: &Image, mut report: Option<&mut Report>) -> Result<Image> {
        let start = Instant::now();
        let cleaned = self.clean(image, report.as_deref_mut())?;
        let elapsed = start.elapsed();

        tracing::info!(
            algorithm = self.label(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "Image cleaned"
        );
        if let Some(report) = report {
            report.insert("exec_time_sec", elapsed);
        }
        Ok(cleaned)
    }
}

/// Selects and configures an algorithm, e.g. from a YAML file:
///
/// ```yaml
/// algorithm: tailcut
/// high_threshold: 10.0
/// low_threshold: 5.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum CleanerConfig {
    Tailcut(TailcutConfig),
    WaveletTransform(WaveletConfig),
}

impl CleanerConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(file_format::load_file(path)?)
    }

    pub fn into_algorithm(self) -> Result<Box<dyn CleaningAlgorithm>> {
        Ok(match self {
            Self::Tailcut(config) => {
                config.validate()?;
                Box::new(Tailcut::new(config))
            }
            Self::WaveletTransform(config) => Box::new(WaveletTransform::new(config)?),
        })
    }
}
