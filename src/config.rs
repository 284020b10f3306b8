use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::loader::LoadOptions;
use crate::data::model::NEIGHBORS_PER_BLOCK;
use crate::error::{DatasetError, DatasetResult};

/// Neighbors kept per block when nothing else is configured.
pub const DEFAULT_K_NEAREST_FOR_TRAIN: usize = 3;

/// Everything needed to build a [`crate::Dataset`].
///
/// ```json
/// {
///   "train_path": "data/train.csv",
///   "holdout_path": "data/holdout.csv",
///   "k_nearest_for_train": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetConfig {
    pub train_path: PathBuf,
    pub holdout_path: PathBuf,
    #[serde(default = "default_k_nearest")]
    pub k_nearest_for_train: usize,
    /// Reject training files whose ids do not follow the neighbor-block
    /// layout instead of filtering them anyway.
    #[serde(default)]
    pub strict_neighbor_blocks: bool,
    /// Delimiter for text sources; picked from the extension when unset.
    #[serde(default)]
    pub delimiter: Option<char>,
}

fn default_k_nearest() -> usize {
    DEFAULT_K_NEAREST_FOR_TRAIN
}

impl DatasetConfig {
    pub fn new(train_path: impl Into<PathBuf>, holdout_path: impl Into<PathBuf>) -> Self {
        Self {
            train_path: train_path.into(),
            holdout_path: holdout_path.into(),
            k_nearest_for_train: DEFAULT_K_NEAREST_FOR_TRAIN,
            strict_neighbor_blocks: false,
            delimiter: None,
        }
    }

    pub fn with_k_nearest(mut self, k_nearest_for_train: usize) -> Self {
        self.k_nearest_for_train = k_nearest_for_train;
        self
    }

    pub fn with_strict_neighbor_blocks(mut self, strict: bool) -> Self {
        self.strict_neighbor_blocks = strict;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> DatasetResult<Self> {
        let config_error = |source: Box<dyn std::error::Error + Send + Sync>| {
            DatasetError::Config {
                path: path.to_path_buf(),
                source,
            }
        };
        let text = std::fs::read_to_string(path).map_err(|e| config_error(e.into()))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| config_error(e.into()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the arguments that can be checked without touching the disk.
    pub fn validate(&self) -> DatasetResult<()> {
        let max = NEIGHBORS_PER_BLOCK as usize;
        if !(1..=max).contains(&self.k_nearest_for_train) {
            return Err(DatasetError::InvalidArgument(format!(
                "k_nearest_for_train must be in [1, {max}], got {}",
                self.k_nearest_for_train
            )));
        }
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                return Err(DatasetError::InvalidArgument(format!(
                    "delimiter must be a single ASCII character, got {d:?}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.delimiter.map(|d| d as u8),
        }
    }
}
