use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or querying a [`crate::Dataset`].
#[derive(Error, Debug)]
pub enum DatasetError {
    /// A source table could not be read or parsed.
    #[error("failed to load table from {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A training label was missing from the vocabulary built from the
    /// same table.
    #[error("label {label:?} is not in the label index")]
    Lookup { label: String },

    /// A caller tried to encode a label the training data never produced.
    #[error("unknown label {label:?}: not present in the training vocabulary")]
    UnknownLabel { label: String },

    #[error("neighbor block {block} is malformed: {reason}")]
    NeighborBlock { block: i64, reason: String },

    #[error("failed to read config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DatasetError {
    pub(crate) fn load(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        DatasetError::Load {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Result alias for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
