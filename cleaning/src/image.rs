//! Raw and cleaned intensity images.

use common::{BitBuffer2, Buffer2};

use crate::error::{Error, Result};

/// A row-major array of intensities with an explicit shape.
///
/// Cleaning works on 2D images shaped `[height, width]`, but the shape is
/// kept general so that files of other dimensionality can be represented
/// and rejected with a proper error. Invalid pixels are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    shape: Vec<usize>,
    pixels: Vec<f32>,
}

impl Image {
    /// Create a 2D image of `height` rows and `width` columns.
    pub fn new(width: usize, height: usize, pixels: Vec<f32>) -> Self {
        assert_eq!(
            pixels.len(),
            width * height,
            "pixels length must equal width * height"
        );
        Self {
            shape: vec![height, width],
            pixels,
        }
    }

    /// Create an image of arbitrary dimensionality.
    pub fn from_shape(shape: Vec<usize>, pixels: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != pixels.len() {
            return Err(Error::PixelCount {
                shape,
                len: pixels.len(),
            });
        }
        Ok(Self { shape, pixels })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    #[inline]
    pub fn into_pixels(self) -> Vec<f32> {
        self.pixels
    }

    /// Width and height of a 2D image.
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        match self.shape.as_slice() {
            &[height, width] => Ok((width, height)),
            _ => Err(Error::Shape {
                shape: self.shape.clone(),
            }),
        }
    }

    /// Copy the pixels into a 2D grid, failing unless the image is 2D.
    pub fn to_buffer(&self) -> Result<Buffer2<f32>> {
        let (width, height) = self.dimensions()?;
        Ok(Buffer2::new(width, height, self.pixels.clone()))
    }

    /// Mask of NaN pixels. Fails unless the image is 2D.
    pub fn invalid_mask(&self) -> Result<BitBuffer2> {
        let (width, height) = self.dimensions()?;
        Ok(BitBuffer2::from_predicate(
            width,
            height,
            &self.pixels,
            |v| v.is_nan(),
        ))
    }

    pub fn count_invalid(&self) -> usize {
        self.pixels.iter().filter(|v| v.is_nan()).count()
    }
}

impl From<Buffer2<f32>> for Image {
    fn from(buffer: Buffer2<f32>) -> Self {
        let (width, height) = (buffer.width(), buffer.height());
        Self::new(width, height, buffer.into_vec())
    }
}
