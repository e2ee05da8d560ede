//! Error types for image cleaning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fits::FitsError;
use crate::noise::NoiseModelError;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while cleaning an image.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Expected a 2D image, got shape {shape:?}")]
    Shape { shape: Vec<usize> },

    #[error("Pixel count {len} does not match shape {shape:?}")]
    PixelCount { shape: Vec<usize>, len: usize },

    #[error("Output file '{path}' should contain a 2D array, got shape {shape:?}")]
    WrongDimension { path: PathBuf, shape: Vec<usize> },

    #[error("Output shape {actual:?} does not match input shape {expected:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid parameter combination: {0}")]
    InvalidParameterCombination(String),

    #[error(transparent)]
    ExternalTool(#[from] ExternalToolError),

    #[error(transparent)]
    Noise(#[from] NoiseModelError),

    #[error("Failed to load configuration: {0}")]
    Config(#[from] common::file_format::FormatError),
}

/// Failures around the external denoising program call.
#[derive(Debug, Error)]
pub enum ExternalToolError {
    #[error("Failed to write input file '{path}': {source}")]
    WriteInput {
        path: PathBuf,
        #[source]
        source: FitsError,
    },

    #[error("Failed to read output file '{path}': {source}")]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: FitsError,
    },

    #[error("Failed to execute '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Command '{command}' exited with status {}", exit_code_label(.code))]
    NonZeroExit { command: String, code: Option<i32> },
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}
