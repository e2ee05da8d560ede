//! Config (de)serialization chosen by file extension.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("Failed to get file extension for '{0}'")]
    MissingFileExtension(PathBuf),
    #[error("Unsupported file extension for file: {0}")]
    UnsupportedFileExtension(PathBuf),
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML serialization failed")]
    Yaml(#[from] serde_yml::Error),
    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerdeFormat {
    Yaml,
    Json,
}

impl SerdeFormat {
    pub fn from_path(path: &Path) -> FormatResult<Self> {
        let ext = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .ok_or_else(|| FormatError::MissingFileExtension(path.to_path_buf()))?;

        if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") {
            Ok(Self::Yaml)
        } else if ext.eq_ignore_ascii_case("json") {
            Ok(Self::Json)
        } else {
            Err(FormatError::UnsupportedFileExtension(path.to_path_buf()))
        }
    }
}

pub fn serialize<T: Serialize>(value: &T, format: SerdeFormat) -> FormatResult<String> {
    match format {
        SerdeFormat::Yaml => Ok(serde_yml::to_string(value)?),
        SerdeFormat::Json => Ok(serde_json::to_string_pretty(value)?),
    }
}

pub fn deserialize<T: DeserializeOwned + 'static>(
    serialized: &str,
    format: SerdeFormat,
) -> FormatResult<T> {
    match format {
        SerdeFormat::Yaml => Ok(serde_yml::from_str(serialized)?),
        SerdeFormat::Json => Ok(serde_json::from_str(serialized)?),
    }
}

/// Load a value from a `.yaml`/`.yml`/`.json` file.
pub fn load_file<T: DeserializeOwned + 'static>(path: &Path) -> FormatResult<T> {
    let format = SerdeFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| FormatError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    deserialize(&text, format)
}

/// Save a value to a `.yaml`/`.yml`/`.json` file, replacing any existing file.
pub fn save_file<T: Serialize>(value: &T, path: &Path) -> FormatResult<()> {
    let format = SerdeFormat::from_path(path)?;
    let text = serialize(value, format)?;
    std::fs::write(path, text).map_err(|source| FormatError::Write {
        path: path.to_path_buf(),
        source,
    })
}
