//! Island ("connected component") analysis of cleaned images.
//!
//! An island is a connected group of pixels at or above a small intensity
//! threshold. Killing isolated pixels keeps only the island carrying the
//! largest total intensity.


mod labeling;

pub use labeling::{Connectivity, LabelMap};

use serde::{Deserialize, Serialize};

use common::{BitBuffer2, Buffer2};

/// Default intensity below which a pixel is treated as background.
pub const DEFAULT_ISLAND_THRESHOLD: f32 = 0.2;

/// How much signal killing isolated pixels would remove.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct IslandStats {
    /// Sum of `image - filtered` over finite pixels.
    pub delta_intensity: f64,
    /// Sum of `|image - filtered|` over finite pixels.
    pub delta_abs_intensity: f64,
    /// Finite non-zero pixels in the image minus those in the filtered image.
    pub delta_pixel_count: i64,
}

/// Isolated-pixel removal and island counting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandFilter {
    pub threshold: f32,
    pub connectivity: Connectivity,
}

impl Default for IslandFilter {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ISLAND_THRESHOLD,
            connectivity: Connectivity::Four,
        }
    }
}

impl IslandFilter {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    fn foreground(&self, image: &Buffer2<f32>) -> BitBuffer2 {
        // NaN compares false, so invalid pixels are background
        let (width, height) = (image.width(), image.height());
        BitBuffer2::from_predicate(width, height, image.pixels(), |&v| v >= self.threshold)
    }

    pub fn label(&self, image: &Buffer2<f32>) -> LabelMap {
        LabelMap::from_mask(&self.foreground(image), self.connectivity)
    }

    /// Number of islands.
    pub fn island_count(&self, image: &Buffer2<f32>) -> usize {
        self.label(image).num_labels()
    }

    /// Keep only the island with the largest total intensity.
    ///
    /// Every other finite pixel, including sub-threshold ones, becomes 0.
    /// Invalid (NaN) pixels are left untouched. An image without islands is
    /// returned unchanged.
    pub fn filter(&self, image: &Buffer2<f32>) -> Buffer2<f32> {
        let labels = self.label(image);
        if labels.num_labels() == 0 {
            return image.clone();
        }

        let mut island_sums = vec![0.0f64; labels.num_labels() + 1];
        for (&label, &v) in labels.labels().iter().zip(image.iter()) {
            if label != 0 {
                island_sums[label as usize] += v as f64;
            }
        }
        let max_sum = island_sums[1..]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        let mut filtered = image.clone();
        for (v, &label) in filtered.iter_mut().zip(labels.labels()) {
            if v.is_nan() {
                continue;
            }
            if label == 0 || island_sums[label as usize] < max_sum {
                *v = 0.0;
            }
        }
        filtered
    }

    /// Statistics of what [`filter`](Self::filter) removes.
    pub fn stats(&self, image: &Buffer2<f32>) -> IslandStats {
        let filtered = self.filter(image);
        island_stats(image, &filtered)
    }
}

fn island_stats(image: &Buffer2<f32>, filtered: &Buffer2<f32>) -> IslandStats {
    let mut stats = IslandStats::default();
    let is_signal = |v: f32| v.is_finite() && v != 0.0;

    for (&before, &after) in image.iter().zip(filtered.iter()) {
        let delta = before as f64 - after as f64;
        if delta.is_finite() {
            stats.delta_intensity += delta;
            stats.delta_abs_intensity += delta.abs();
        }
        if is_signal(before) {
            stats.delta_pixel_count += 1;
        }
        if is_signal(after) {
            stats.delta_pixel_count -= 1;
        }
    }

    stats
}
