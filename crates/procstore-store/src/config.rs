use std::path::{Path, PathBuf};
use std::time::Duration;

use procstore_io::RetryingFileReader;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Settings shared by every storage policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Image file extension, without the dot. Matched case-insensitively.
    pub extension: String,
    /// How many times an image file open is attempted.
    pub read_attempts: u32,
    /// Pause between open attempts, in milliseconds.
    pub read_retry_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            extension: "bmp".into(),
            read_attempts: 50,
            read_retry_delay_ms: 100,
        }
    }
}

impl StorageConfig {
    pub fn read_retry_delay(&self) -> Duration {
        Duration::from_millis(self.read_retry_delay_ms)
    }

    /// A file reader using these retry settings.
    pub fn reader(&self) -> RetryingFileReader {
        RetryingFileReader::new(self.read_attempts, self.read_retry_delay())
    }
}

/// Settings for a search-pattern store: images of one exact size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPatternConfig {
    pub working_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for SearchPatternConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("search"),
            width: 8,
            height: 8,
        }
    }
}

/// Settings for a recognize-target store: images within a size range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizeTargetConfig {
    pub working_dir: PathBuf,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for RecognizeTargetConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("recognize"),
            min_width: 1,
            max_width: 400,
            min_height: 1,
            max_height: 400,
        }
    }
}

/// Top-level configuration, as read from a TOML file.
///
/// ```toml
/// [storage]
/// extension = "bmp"
///
/// [search]
/// working_dir = "/data/search"
/// width = 8
/// height = 8
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcstoreConfig {
    pub storage: StorageConfig,
    pub search: SearchPatternConfig,
    pub recognize: RecognizeTargetConfig,
}

impl ProcstoreConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
