//! Wavelet cleaning through the external `mr_filter` program.
//!
//! The image is pre-processed (noise in NaN pixels, offset, scale), written
//! to a temporary FITS file, filtered by mr_filter into a second temporary
//! file, read back and post-processed (NaN restored, scale and offset
//! inverted, optional floor correction and isolated pixel removal).


mod command;
mod config;
mod temp_files;

pub use command::{options_to_flags, MrFilterCommand, MrFilterRunner, ProcessRunner, ToolExit};
pub use config::{InputScale, MrFilterArgs, MrFilterOptions, WaveletConfig};
pub use temp_files::{SequentialTempNames, TempFilePair, TempNameGenerator, UniqueTempNames};

use std::sync::Arc;
use std::time::Instant;

use common::{BitBuffer2, Buffer2};

use crate::algorithm::CleaningAlgorithm;
use crate::error::{Error, ExternalToolError, Result};
use crate::fits;
use crate::image::Image;
use crate::islands::{Connectivity, IslandFilter};
use crate::noise::{EmpiricalDistribution, NoiseDistribution, NoiseModelError};
use crate::report::{Report, ReportSink};

/// Wavelet transform cleaning.
#[derive(Debug)]
pub struct WaveletTransform {
    config: WaveletConfig,
    noise: Option<Arc<dyn NoiseDistribution>>,
    runner: Box<dyn MrFilterRunner>,
    names: Box<dyn TempNameGenerator>,
}

impl WaveletTransform {
    /// Validate `config` and load its noise CDF table, if any.
    pub fn new(config: WaveletConfig) -> Result<Self> {
        config.validate()?;

        let noise = match &config.noise_cdf_file {
            Some(path) => {
                let distribution: Arc<dyn NoiseDistribution> =
                    Arc::new(EmpiricalDistribution::from_file(path)?);
                Some(distribution)
            }
            None => None,
        };

        Ok(Self {
            config,
            noise,
            runner: Box::new(ProcessRunner),
            names: Box::new(UniqueTempNames),
        })
    }

    /// Fill NaN pixels with samples from `noise` before filtering.
    pub fn with_noise_distribution(mut self, noise: Arc<dyn NoiseDistribution>) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn MrFilterRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_name_generator(mut self, names: Box<dyn TempNameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn config(&self) -> &WaveletConfig {
        &self.config
    }

    fn prepare_input(&self, image: &Image, invalid: &BitBuffer2) -> Result<Vec<f32>> {
        let config = &self.config;
        let mut pixels = image.pixels().to_vec();

        if let Some(noise) = &self.noise {
            let count = invalid.count_ones();
            if count > 0 {
                tracing::debug!(count, "Injecting noise into invalid pixels");
                let samples = noise.sample(count);
                if samples.len() != count {
                    return Err(NoiseModelError::SampleCount {
                        expected: count,
                        actual: samples.len(),
                    }
                    .into());
                }
                let targets = pixels.iter_mut().zip(invalid.iter()).filter(|(_, nan)| *nan);
                for ((p, _), sample) in targets.zip(samples) {
                    *p = sample;
                }
            }
        }

        if let Some(offset) = config.offset_after_calibration {
            tracing::debug!(offset, "Apply an offset after calibration");
            pixels.iter_mut().for_each(|p| *p += offset);
        }

        match config.input_image_scale {
            InputScale::Linear => {}
            InputScale::Log => {
                tracing::debug!("Apply log scale");
                pixels
                    .iter_mut()
                    .for_each(|p| *p = if *p > 0.0 { p.log10() } else { f32::NAN });
            }
            InputScale::Sqrt => {
                tracing::debug!("Apply sqrt scale");
                pixels.iter_mut().for_each(|p| *p = p.sqrt());
            }
        }

        Ok(pixels)
    }

    /// Write the input, run mr_filter and read the output. Both temporary
    /// files are gone when this returns, on every path.
    fn run_mr_filter(&self, input: &Image, report: &mut Option<&mut Report>) -> Result<Image> {
        let config = &self.config;
        let files = TempFilePair::new(&config.tmp_files_directory, self.names.as_ref());

        report.record("mr_input_tmp_file_path", files.input());
        report.record("mr_output_tmp_file_path", files.output());
        if let Some(mask) = config.args.mask_file() {
            report.record("mr_mask_file_path", mask.as_path());
        }

        let start = Instant::now();
        fits::save_image(input, files.input()).map_err(|source| {
            tracing::error!("Error on input FITS file: {}", files.input().display());
            ExternalToolError::WriteInput {
                path: files.input().to_path_buf(),
                source,
            }
        })?;
        report.record("save_tmp_file_time_sec", start.elapsed());

        let command = MrFilterCommand::new(
            config.program.clone(),
            &config.args,
            config.verbose,
            files.input().to_path_buf(),
            files.output().to_path_buf(),
        );
        if config.verbose {
            tracing::info!("{}", command);
        }

        let start = Instant::now();
        let exit = self.runner.run(&command, config.verbose)?;
        report.record("mrfilter_cmd_exec_time_sec", start.elapsed());

        if let ToolExit::Failure { code } = exit {
            if config.check_exit_status {
                tracing::error!("Error on command: {}", command);
                return Err(ExternalToolError::NonZeroExit {
                    command: command.to_string(),
                    code,
                }
                .into());
            }
            tracing::warn!(?code, "mr_filter exited with failure, reading its output anyway");
        }

        let start = Instant::now();
        let output = fits::load_image(files.output()).map_err(|source| {
            tracing::error!("Error on output FITS file: {}", files.output().display());
            ExternalToolError::ReadOutput {
                path: files.output().to_path_buf(),
                source,
            }
        })?;
        report.record("load_tmp_file_time_sec", start.elapsed());

        if output.ndim() != 2 {
            return Err(Error::WrongDimension {
                path: files.output().to_path_buf(),
                shape: output.shape().to_vec(),
            });
        }
        if output.shape() != input.shape() {
            return Err(Error::ShapeMismatch {
                expected: input.shape().to_vec(),
                actual: output.shape().to_vec(),
            });
        }

        Ok(output)
    }

    fn restore_output(&self, output: Image, invalid: &BitBuffer2) -> Vec<f32> {
        let config = &self.config;
        let mut pixels = output.into_pixels();

        for (p, nan) in pixels.iter_mut().zip(invalid.iter()) {
            if nan {
                *p = f32::NAN;
            }
        }

        match config.input_image_scale {
            InputScale::Linear => {}
            InputScale::Log => {
                tracing::debug!("Invert log scale");
                pixels.iter_mut().for_each(|p| *p = 10f32.powf(*p));
            }
            InputScale::Sqrt => {
                tracing::debug!("Invert sqrt scale");
                pixels.iter_mut().for_each(|p| *p = 2f32.powf(*p));
            }
        }

        // with the last scale suppressed the offset went away with it
        if let Some(offset) = config.offset_after_calibration {
            if !config.suppresses_last_scale() {
                pixels.iter_mut().for_each(|p| *p -= offset);
            }
        }

        if config.correction_offset {
            tracing::debug!("Apply a correction offset after cleaning");
            apply_correction_offset(&mut pixels);
        }

        pixels
    }
}

impl CleaningAlgorithm for WaveletTransform {
    fn label(&self) -> &str {
        "WT (mr_filter)"
    }

    fn clean(&self, image: &Image, mut report: Option<&mut Report>) -> Result<Image> {
        self.config.validate()?;
        let (width, height) = image.dimensions()?;
        let invalid = image.invalid_mask()?;

        let input = Image::new(width, height, self.prepare_input(image, &invalid)?);
        let output = self.run_mr_filter(&input, &mut report)?;
        let cleaned = Buffer2::new(width, height, self.restore_output(output, &invalid));

        let islands = IslandFilter {
            threshold: self.config.isolated_pixel_threshold,
            connectivity: Connectivity::Four,
        };
        let stats = islands.stats(&cleaned);
        let num_islands = islands.island_count(&cleaned);
        report.record("img_cleaned_islands_delta_pe", stats.delta_intensity);
        report.record("img_cleaned_islands_delta_abs_pe", stats.delta_abs_intensity);
        report.record("img_cleaned_islands_delta_num_pixels", stats.delta_pixel_count);
        report.record("img_cleaned_num_islands", num_islands);

        let cleaned = if self.config.kill_isolated_pixels {
            tracing::debug!("Kill isolated pixels");
            let start = Instant::now();
            let filtered = islands.filter(&cleaned);
            report.record("scipy_kill_isolated_pixels_time_sec", start.elapsed());
            filtered
        } else {
            cleaned
        };

        tracing::debug!(
            width,
            height,
            invalid = invalid.count_ones(),
            islands = num_islands,
            "Wavelet cleaning done"
        );

        Ok(Image::from(cleaned))
    }
}

/// Shift so the smallest finite value is 0, then zero finite values below 1.
fn apply_correction_offset(pixels: &mut [f32]) {
    let min = pixels
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::INFINITY, f32::min);
    if !min.is_finite() {
        return;
    }

    for p in pixels.iter_mut() {
        *p -= min;
        if p.is_finite() && *p < 1.0 {
            *p = 0.0;
        }
    }
}
