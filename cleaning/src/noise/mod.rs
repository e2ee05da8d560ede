//! Empirical noise models used to fill invalid pixels before wavelet
//! filtering.

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::file_format::{self, FormatError};

/// Errors from loading or validating a noise model.
#[derive(Debug, Error)]
pub enum NoiseModelError {
    #[error("Failed to load noise CDF table '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Invalid noise CDF table: {0}")]
    InvalidTable(String),

    #[error("Noise distribution returned {actual} samples, {expected} requested")]
    SampleCount { expected: usize, actual: usize },
}

/// Anything that can draw synthetic pixel intensities.
pub trait NoiseDistribution: Send + Sync + std::fmt::Debug {
    /// Draw `count` independent samples.
    fn sample(&self, count: usize) -> Vec<f32>;
}

/// Cumulative distribution table as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdfTable {
    /// Intensities, strictly increasing.
    pub cdf_x: Vec<f64>,
    /// Cumulative probability at each `cdf_x`, non-decreasing.
    pub cdf_y: Vec<f64>,
}

/// Inverse transform sampling over a tabulated CDF.
///
/// `u` is drawn uniformly between the first and last tabulated
/// probabilities and mapped back to an intensity by linear interpolation
/// between the bracketing table entries.
#[derive(Debug, Clone)]
pub struct EmpiricalDistribution {
    table: CdfTable,
}

impl EmpiricalDistribution {
    pub fn new(table: CdfTable) -> Result<Self, NoiseModelError> {
        validate_table(&table)?;
        Ok(Self { table })
    }

    /// Load a CDF table from a JSON or YAML file.
    pub fn from_file(path: &Path) -> Result<Self, NoiseModelError> {
        let table: CdfTable = file_format::load_file(path).map_err(|source| NoiseModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let distribution = Self::new(table)?;
        tracing::debug!(
            path = %path.display(),
            points = distribution.table.cdf_x.len(),
            "Loaded noise CDF table"
        );
        Ok(distribution)
    }

    pub fn table(&self) -> &CdfTable {
        &self.table
    }

    /// Intensity at cumulative probability `u`, clamped to the table range.
    pub fn inverse_cdf(&self, u: f64) -> f64 {
        let xs = &self.table.cdf_x;
        let ys = &self.table.cdf_y;
        let last = xs.len() - 1;

        // first index with cdf_y >= u
        let idx = ys.partition_point(|&y| y < u);
        if idx == 0 {
            return xs[0];
        }
        if idx > last {
            return xs[last];
        }

        let (y0, y1) = (ys[idx - 1], ys[idx]);
        let (x0, x1) = (xs[idx - 1], xs[idx]);
        if y1 <= y0 {
            return x1;
        }
        x0 + (u - y0) * (x1 - x0) / (y1 - y0)
    }

    /// Draw `count` samples from a caller-supplied generator.
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<f32> {
        let ys = &self.table.cdf_y;
        let (low, high) = (ys[0], ys[ys.len() - 1]);

        (0..count)
            .map(|_| {
                let u = low + rng.random::<f64>() * (high - low);
                self.inverse_cdf(u) as f32
            })
            .collect()
    }
}

impl NoiseDistribution for EmpiricalDistribution {
    fn sample(&self, count: usize) -> Vec<f32> {
        self.sample_with(&mut rand::rng(), count)
    }
}

fn validate_table(table: &CdfTable) -> Result<(), NoiseModelError> {
    let CdfTable { cdf_x, cdf_y } = table;

    if cdf_x.len() != cdf_y.len() {
        return Err(NoiseModelError::InvalidTable(format!(
            "cdf_x has {} entries but cdf_y has {}",
            cdf_x.len(),
            cdf_y.len()
        )));
    }
    if cdf_x.len() < 2 {
        return Err(NoiseModelError::InvalidTable(
            "at least two points are required".to_string(),
        ));
    }
    if cdf_x.iter().chain(cdf_y).any(|v| !v.is_finite()) {
        return Err(NoiseModelError::InvalidTable(
            "values must be finite".to_string(),
        ));
    }
    if cdf_x.windows(2).any(|w| w[1] <= w[0]) {
        return Err(NoiseModelError::InvalidTable(
            "cdf_x must be strictly increasing".to_string(),
        ));
    }
    if cdf_y.windows(2).any(|w| w[1] < w[0]) {
        return Err(NoiseModelError::InvalidTable(
            "cdf_y must be non-decreasing".to_string(),
        ));
    }

    Ok(())
}
