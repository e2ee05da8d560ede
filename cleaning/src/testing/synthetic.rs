//! Synthetic camera images.

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::image::Image;

/// Zero background with one pixel set to `value`.
pub fn single_peak(width: usize, height: usize, x: usize, y: usize, value: f32) -> Image {
    let mut pixels = vec![0.0; width * height];
    pixels[y * width + x] = value;
    Image::new(width, height, pixels)
}

/// Low-level noise in `[0, 3)` plus an elliptical Gaussian shower of peak
/// 40 near the image center. Deterministic for a given seed.
pub fn noisy_shower(width: usize, height: usize, seed: u64) -> Image {
    let mut rng = StdRng::seed_from_u64(seed);
    let cx = width as f32 / 2.0;
    let cy = height as f32 / 2.0;
    let sx = (width as f32 / 8.0).max(1.0);
    let sy = (height as f32 / 10.0).max(1.0);

    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let dx = (x as f32 - cx) / sx;
            let dy = (y as f32 - cy) / sy;
            let shower = 40.0 * (-0.5 * (dx * dx + dy * dy)).exp();
            pixels.push(shower + rng.random::<f32>() * 3.0);
        }
    }
    Image::new(width, height, pixels)
}

/// Copy of `image` with the given `(x, y)` pixels set to NaN.
pub fn with_invalid(image: &Image, positions: &[(usize, usize)]) -> Image {
    let (width, height) = image.dimensions().expect("2D image");
    let mut pixels = image.pixels().to_vec();
    for &(x, y) in positions {
        pixels[y * width + x] = f32::NAN;
    }
    Image::new(width, height, pixels)
}
