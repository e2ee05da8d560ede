//! Image cleaning for imaging atmospheric Cherenkov telescope cameras.
//!
//! Two algorithms share the [`CleaningAlgorithm`] interface:
//!
//! - [`Tailcut`]: a two-threshold hysteresis filter.
//! - [`WaveletTransform`]: multiresolution filtering delegated to the
//!   external `mr_filter` program through temporary FITS files.
//!
//! Both take an [`Image`] (NaN marks invalid pixels), never modify it, and
//! optionally fill a [`Report`] with diagnostics.

pub mod algorithm;
pub mod error;
pub mod fits;
pub mod image;
pub mod islands;
pub mod noise;
pub mod report;
pub mod tailcut;
pub mod wavelet;

#[cfg(test)]
pub(crate) mod testing;

pub use algorithm::{CleanerConfig, CleaningAlgorithm};
pub use error::{Error, ExternalToolError, Result};
pub use image::Image;
pub use islands::{IslandFilter, IslandStats};
pub use noise::{EmpiricalDistribution, NoiseDistribution};
pub use report::{Report, ReportValue};
pub use tailcut::{Tailcut, TailcutConfig};
pub use wavelet::{MrFilterArgs, MrFilterOptions, WaveletConfig, WaveletTransform};
