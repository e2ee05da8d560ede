//! Temporary FITS file naming and cleanup.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Produces the unique stem shared by the input and output file of one call.
pub trait TempNameGenerator: Send + Sync + fmt::Debug {
    fn next_stem(&self) -> String;
}

/// `.tmp_<pid>_<nanos>_<uuid>`, unique across threads and processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueTempNames;

impl TempNameGenerator for UniqueTempNames {
    fn next_stem(&self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!(
            ".tmp_{}_{}_{}",
            std::process::id(),
            nanos,
            Uuid::new_v4().simple()
        )
    }
}

/// `.tmp_<pid>_<n>` with a per-generator counter. Deterministic, unique
/// within one process as long as a single generator is shared.
#[derive(Debug, Default)]
pub struct SequentialTempNames {
    next: AtomicU64,
}

impl TempNameGenerator for SequentialTempNames {
    fn next_stem(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!(".tmp_{}_{}", std::process::id(), n)
    }
}

/// The input/output pair of one mr_filter call. Both files are removed on
/// drop, whether or not they were ever created.
#[derive(Debug)]
pub struct TempFilePair {
    input: PathBuf,
    output: PathBuf,
}

impl TempFilePair {
    pub fn new(directory: &Path, generator: &dyn TempNameGenerator) -> Self {
        let stem = generator.next_stem();
        Self {
            input: directory.join(format!("{stem}_in.fits")),
            output: directory.join(format!("{stem}_out.fits")),
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Drop for TempFilePair {
    fn drop(&mut self) {
        for path in [&self.input, &self.output] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("Failed to remove temporary file {}: {}", path.display(), e)
                }
            }
        }
    }
}
