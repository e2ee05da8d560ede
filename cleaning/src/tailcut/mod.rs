//! Two-threshold hysteresis cleaning ("tailcut").
//!
//! A pixel survives if it is at least `low_threshold` and lies within one
//! pixel (including diagonals) of a pixel that is at least
//! `high_threshold`. Everything else becomes exactly zero.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use common::{BitBuffer2, Buffer2};

use crate::algorithm::CleaningAlgorithm;
use crate::error::{Error, Result};
use crate::image::Image;
use crate::report::{Report, ReportSink};

/// Tailcut thresholds.
///
/// `high_threshold >= low_threshold` is the intended use. With
/// `low_threshold > high_threshold` every high pixel is also low, so the
/// filter keeps low pixels next to high ones, which in practice degenerates
/// towards a plain low-threshold filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailcutConfig {
    /// Pixels at or above this value seed the selection.
    pub high_threshold: f32,
    /// Pixels below this value are never selected.
    pub low_threshold: f32,
}

impl Default for TailcutConfig {
    fn default() -> Self {
        Self {
            high_threshold: 10.0,
            low_threshold: 5.0,
        }
    }
}

impl TailcutConfig {
    pub fn new(high_threshold: f32, low_threshold: f32) -> Self {
        Self {
            high_threshold,
            low_threshold,
        }
    }

    /// Reject thresholds that would silently select nothing.
    pub fn validate(&self) -> Result<()> {
        if !self.high_threshold.is_finite() || !self.low_threshold.is_finite() {
            return Err(Error::InvalidParameterCombination(format!(
                "tailcut thresholds must be finite, got high={} low={}",
                self.high_threshold, self.low_threshold
            )));
        }
        if self.low_threshold > self.high_threshold {
            tracing::warn!(
                high = self.high_threshold,
                low = self.low_threshold,
                "Tailcut low threshold is above high threshold"
            );
        }
        Ok(())
    }
}

/// Tailcut cleaning algorithm.
#[derive(Debug, Clone, Default)]
pub struct Tailcut {
    config: TailcutConfig,
}

impl Tailcut {
    pub fn new(config: TailcutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TailcutConfig {
        &self.config
    }
}

impl CleaningAlgorithm for Tailcut {
    fn label(&self) -> &str {
        "Tailcut"
    }

    fn clean(&self, image: &Image, mut report: Option<&mut Report>) -> Result<Image> {
        self.config.validate()?;
        let buffer = image.to_buffer()?;

        let mask = tailcut_mask(&buffer, &self.config);
        report.record("tailcut_num_selected_pixels", mask.count_ones());

        Ok(Image::from(apply_mask(&buffer, &mask)))
    }
}

/// Compute the final tailcut selection mask.
pub fn tailcut_mask(image: &Buffer2<f32>, config: &TailcutConfig) -> BitBuffer2 {
    let (width, height) = (image.width(), image.height());

    let pixels = image.pixels();
    let high = BitBuffer2::from_predicate(width, height, pixels, |&v| v >= config.high_threshold);
    let low = BitBuffer2::from_predicate(width, height, pixels, |&v| v >= config.low_threshold);

    let mut mask = dilate_one_ring(&high);
    mask.and_assign(&low);
    mask
}

/// Dilate by one pixel: vertically first, then horizontally on the
/// vertically dilated mask. The composition yields the full 3x3 ring.
/// Borders only grow inward.
pub fn dilate_one_ring(mask: &BitBuffer2) -> BitBuffer2 {
    let height = mask.height();
    let mut dilated = mask.clone();

    // Shift up and down, both from the undilated mask.
    for y in 0..height {
        let row = dilated.row_words_mut(y);
        if y + 1 < height {
            for (w, &below) in row.iter_mut().zip(mask.row_words(y + 1)) {
                *w |= below;
            }
        }
        if y > 0 {
            for (w, &above) in row.iter_mut().zip(mask.row_words(y - 1)) {
                *w |= above;
            }
        }
    }

    // Shift left then right, on the vertically dilated rows.
    let last_word_mask = dilated.last_word_mask();
    let mut scratch = vec![0u64; dilated.words_per_row()];
    for y in 0..height {
        scratch.copy_from_slice(dilated.row_words(y));
        let row = dilated.row_words_mut(y);
        let n = row.len();
        for i in 0..n {
            let cur = scratch[i];
            let next = if i + 1 < n { scratch[i + 1] } else { 0 };
            let prev = if i > 0 { scratch[i - 1] } else { 0 };
            // bit x takes x+1 (left shift of the image) and x-1 (right shift)
            row[i] = cur | (cur >> 1) | (next << 63) | (cur << 1) | (prev >> 63);
        }
        if let Some(last) = row.last_mut() {
            *last &= last_word_mask;
        }
    }

    dilated
}

/// Keep pixels inside the mask, zero everything else (NaN included).
fn apply_mask(image: &Buffer2<f32>, mask: &BitBuffer2) -> Buffer2<f32> {
    Buffer2::from_fn(image.width(), image.height(), |x, y| {
        if mask.get_xy(x, y) {
            image[(x, y)]
        } else {
            0.0
        }
    })
}
