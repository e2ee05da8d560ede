//! Shared test utilities: tracing setup, synthetic images and fake
//! mr_filter runners.

pub mod synthetic;

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::fits;
use crate::image::Image;
use crate::wavelet::{MrFilterCommand, MrFilterRunner, ToolExit};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// What a [`FakeRunner`] does in place of mr_filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FakeBehavior {
    /// Copy the input file to the output file.
    Identity,
    /// Like `Identity`, but every NaN becomes the given finite value.
    FillInvalid(f32),
    /// Multiply every pixel by the given factor.
    Scale(f32),
    /// Write a 3D cube instead of an image.
    WrongDimension,
    /// Write an image with one extra column.
    WrongSize,
    /// Exit with this code without writing anything.
    Fail(i32),
    /// Exit successfully without writing anything.
    NoOutput,
}

/// In-process stand-in for mr_filter that records every invocation.
#[derive(Debug, Clone)]
pub struct FakeRunner {
    behavior: FakeBehavior,
    calls: Arc<Mutex<Vec<MrFilterCommand>>>,
}

impl FakeRunner {
    pub fn new(behavior: FakeBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::default(),
        }
    }

    /// Handle to the recorded commands, valid after the runner is boxed.
    pub fn calls(&self) -> Arc<Mutex<Vec<MrFilterCommand>>> {
        Arc::clone(&self.calls)
    }

    fn transform(&self, input: &Path, output: &Path) -> Result<ToolExit> {
        let read = |path: &Path| fits::load_image(path).expect("fake runner input");
        let write = |image: &Image, path: &Path| {
            fits::save_image(image, path).expect("fake runner output")
        };

        match self.behavior {
            FakeBehavior::Identity => write(&read(input), output),
            FakeBehavior::FillInvalid(value) => {
                let image = read(input);
                let shape = image.shape().to_vec();
                let pixels = image
                    .into_pixels()
                    .into_iter()
                    .map(|v| if v.is_nan() { value } else { v })
                    .collect();
                write(&Image::from_shape(shape, pixels)?, output);
            }
            FakeBehavior::Scale(factor) => {
                let image = read(input);
                let shape = image.shape().to_vec();
                let pixels = image.into_pixels().into_iter().map(|v| v * factor).collect();
                write(&Image::from_shape(shape, pixels)?, output);
            }
            FakeBehavior::WrongDimension => {
                let len = read(input).pixels().len();
                write(&Image::from_shape(vec![1, 1, len], vec![0.0; len])?, output);
            }
            FakeBehavior::WrongSize => {
                let (width, height) = read(input).dimensions()?;
                write(&Image::new(width + 1, height, vec![0.0; (width + 1) * height]), output);
            }
            FakeBehavior::Fail(code) => return Ok(ToolExit::Failure { code: Some(code) }),
            FakeBehavior::NoOutput => {}
        }
        Ok(ToolExit::Success)
    }
}

impl MrFilterRunner for FakeRunner {
    fn run(&self, command: &MrFilterCommand, _verbose: bool) -> Result<ToolExit> {
        assert!(command.input.exists(), "input file must exist while mr_filter runs");
        self.calls.lock().unwrap().push(command.clone());
        self.transform(&command.input, &command.output)
    }
}
