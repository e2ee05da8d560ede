//! FITS reading and writing of single-HDU float images.
//!
//! This is the exchange format with the external wavelet program: one
//! primary image HDU, 32-bit float pixels, NaN for invalid pixels.

use std::path::Path;

use fitsio::FitsFile;
use fitsio::hdu::HduInfo;
use fitsio::images::{ImageDescription, ImageType};
use thiserror::Error;

use crate::image::Image;

/// Errors from reading or writing a FITS image.
#[derive(Debug, Error)]
pub enum FitsError {
    #[error(transparent)]
    Fits(#[from] fitsio::errors::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Primary HDU is not an image")]
    NotAnImage,

    #[error("Pixel count {len} does not match shape {shape:?}")]
    PixelCount { shape: Vec<usize>, len: usize },
}

/// Write `image` as the primary HDU of a new FITS file.
///
/// An existing file at `path` is replaced.
pub fn save_image(image: &Image, path: &Path) -> Result<(), FitsError> {
    // fitsio refuses to overwrite
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    // FITS shape order is [NAXISn, ..., NAXIS1], the same as the image shape
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: image.shape(),
    };

    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()?;
    let hdu = fptr.primary_hdu()?;
    hdu.write_image(&mut fptr, image.pixels())?;

    Ok(())
}

/// Read the primary HDU of a FITS file as `f32`, whatever its dimensionality.
pub fn load_image(path: &Path) -> Result<Image, FitsError> {
    let mut fptr = FitsFile::open(path)?;
    let hdu = fptr.primary_hdu()?;

    let shape = match &hdu.info {
        HduInfo::ImageInfo { shape, .. } if !shape.is_empty() => shape.clone(),
        _ => return Err(FitsError::NotAnImage),
    };

    let pixels: Vec<f32> = hdu.read_image(&mut fptr)?;
    let len = pixels.len();
    Image::from_shape(shape.clone(), pixels).map_err(|_| FitsError::PixelCount { shape, len })
}
