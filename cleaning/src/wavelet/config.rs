//! Configuration of the wavelet (mr_filter) cleaning pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::islands::DEFAULT_ISLAND_THRESHOLD;

// ============================================================================
// Scale transform
// ============================================================================

/// Pointwise transform applied before filtering and inverted afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputScale {
    #[default]
    Linear,
    /// `log10` before, `10^x` after. Pixels <= 0 become NaN.
    Log,
    /// `sqrt` before, `2^x` after. Negative pixels become NaN.
    ///
    /// The inverse is not the square. This matches the historical results
    /// this pipeline is compared against.
    Sqrt,
}

// ============================================================================
// mr_filter options
// ============================================================================

/// Individually composed mr_filter switches.
///
/// `None` / `false` leaves the program default in place and emits no flag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MrFilterOptions {
    /// `-t`: type of multiresolution transform.
    pub transform_type: Option<u32>,
    /// `-T`: type of filters.
    pub filter_type: Option<u32>,
    /// `-U`: type of non-orthogonal filters.
    pub non_orthog_filter_type: Option<u32>,
    /// `-n`: number of scales.
    pub number_of_scales: Option<u32>,
    /// `-K`: suppress the last scale. The offset is then not subtracted
    /// again after filtering.
    pub suppress_last_scale: bool,
    /// `-k`: let mr_filter suppress isolated pixels in the support.
    pub suppress_isolated_pixels: bool,
    /// `-C`: coefficient detection method.
    pub coef_detection_method: Option<u32>,
    /// `-s`: k-sigma noise threshold.
    pub k_sigma_noise_threshold: Option<f64>,
    /// `-m`: noise model.
    pub noise_model: Option<u32>,
    /// `-p`: detect only positive structures.
    pub detect_only_positive_structure: bool,
    /// `-P`: suppress the positivity constraint.
    pub suppress_positivity_constraint: bool,
    /// `-f`: type of filtering.
    pub filtering_type: Option<u32>,
    /// `-F`: first detection scale.
    pub first_detection_scale: Option<u32>,
    /// `-i`: number of iterations.
    pub number_of_iterations: Option<u32>,
    /// `-e`: epsilon, convergence precision.
    pub epsilon: Option<f64>,
    /// `-w`: write the support to this file.
    pub support_file: Option<PathBuf>,
    /// `-E`: precision for computing thresholds.
    pub precision: Option<f64>,
    /// `-I`: mask file.
    pub mask_file: Option<PathBuf>,
}

/// Either composed switches or a raw argument string passed through as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MrFilterArgs {
    Composed(MrFilterOptions),
    /// Whitespace separated arguments, placed before the two file paths.
    Raw(String),
}

impl Default for MrFilterArgs {
    fn default() -> Self {
        Self::Composed(MrFilterOptions::default())
    }
}

impl MrFilterArgs {
    pub fn mask_file(&self) -> Option<&PathBuf> {
        match self {
            Self::Composed(options) => options.mask_file.as_ref(),
            Self::Raw(_) => None,
        }
    }
}

// ============================================================================
// Pipeline configuration
// ============================================================================

/// Configuration of [`WaveletTransform`](super::WaveletTransform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveletConfig {
    /// Path or name of the mr_filter executable.
    pub program: PathBuf,
    pub args: MrFilterArgs,
    /// With raw arguments, whether the last scale is treated as suppressed
    /// when inverting the offset. The raw string itself is never inspected.
    /// Ignored for composed options, which carry their own `-K` switch.
    pub raw_suppress_last_scale: bool,

    /// Keep only the heaviest island after filtering.
    pub kill_isolated_pixels: bool,
    /// Intensity below which a pixel does not belong to an island.
    pub isolated_pixel_threshold: f32,

    /// Added to every pixel before filtering.
    pub offset_after_calibration: Option<f32>,
    /// Shift the result so its minimum is 0, then zero everything below 1.
    pub correction_offset: bool,
    pub input_image_scale: InputScale,

    /// CDF table used to fill NaN pixels with noise before filtering.
    pub noise_cdf_file: Option<PathBuf>,

    /// Pass `-v` and show mr_filter's stdout.
    pub verbose: bool,
    /// Where the two temporary FITS files are written.
    pub tmp_files_directory: PathBuf,
    /// Fail on a non-zero exit of mr_filter instead of reading whatever
    /// output file exists.
    pub check_exit_status: bool,
}

impl Default for WaveletConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mr_filter"),
            args: MrFilterArgs::default(),
            raw_suppress_last_scale: false,
            kill_isolated_pixels: false,
            isolated_pixel_threshold: DEFAULT_ISLAND_THRESHOLD,
            offset_after_calibration: None,
            correction_offset: false,
            input_image_scale: InputScale::Linear,
            noise_cdf_file: None,
            verbose: false,
            tmp_files_directory: PathBuf::from("."),
            check_exit_status: true,
        }
    }
}

impl WaveletConfig {
    /// Config with composed mr_filter options and defaults elsewhere.
    pub fn with_options(options: MrFilterOptions) -> Self {
        Self {
            args: MrFilterArgs::Composed(options),
            ..Self::default()
        }
    }

    /// Whether the last wavelet scale is suppressed, in which case the
    /// offset must not be removed after filtering.
    pub fn suppresses_last_scale(&self) -> bool {
        match &self.args {
            MrFilterArgs::Composed(options) => options.suppress_last_scale,
            MrFilterArgs::Raw(_) => self.raw_suppress_last_scale,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(offset) = self.offset_after_calibration {
            check(offset.is_finite(), || {
                format!("offset_after_calibration must be finite, got {offset}")
            })?;
        }
        check(self.isolated_pixel_threshold.is_finite(), || {
            format!(
                "isolated_pixel_threshold must be finite, got {}",
                self.isolated_pixel_threshold
            )
        })?;

        match &self.args {
            MrFilterArgs::Raw(raw) => {
                check(!raw.trim().is_empty(), || {
                    "raw mr_filter arguments must not be empty".to_string()
                })?;
            }
            MrFilterArgs::Composed(options) => {
                check(options.number_of_scales != Some(0), || {
                    "number_of_scales must be at least 1".to_string()
                })?;
                check_positive("k_sigma_noise_threshold", options.k_sigma_noise_threshold)?;
                check_positive("epsilon", options.epsilon)?;
                check_positive("precision", options.precision)?;
            }
        }

        if self.input_image_scale != InputScale::Linear && self.offset_after_calibration.is_none()
        {
            tracing::debug!(
                scale = ?self.input_image_scale,
                "Non-linear input scale without offset, non-positive pixels become NaN"
            );
        }

        Ok(())
    }
}

fn check(condition: bool, message: impl FnOnce() -> String) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::InvalidParameterCombination(message()))
    }
}

fn check_positive(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) => check(v.is_finite() && v > 0.0, || {
            format!("{name} must be finite and positive, got {v}")
        }),
        None => Ok(()),
    }
}
