//! Training and holdout preparation for nearest-neighbor cluster
//! classification.
//!
//! Training files hold up to ten candidate neighbors per entity, laid out in
//! blocks of ten ids where `id % 10` is the neighbor rank. [`Dataset`] keeps
//! the nearest `k` of each block, removes rows labeled `"unknown"`, encodes
//! the training labels and splits the holdout rows into dev and test parts.
//!
//! ```no_run
//! use neighbor_dataset::Dataset;
//!
//! let dataset = Dataset::new("train.csv", "holdout.csv", 3)?;
//! let (dev, test) = dataset.dev_test_split(0.5)?;
//! println!("{} labels, {} dev / {} test rows", dataset.vocabulary().len(), dev.len(), test.len());
//! # Ok::<(), neighbor_dataset::DatasetError>(())
//! ```

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;

pub use config::{DatasetConfig, DEFAULT_K_NEAREST_FOR_TRAIN};
pub use data::labels::{LabelIndex, LabelVocabulary};
pub use data::model::{
    EncodedTable, FieldValue, LabeledTable, Record, Table, TableView, UNKNOWN_CLUSTER,
};
pub use dataset::{Dataset, DEFAULT_DEV_RATIO};
pub use error::{DatasetError, DatasetResult};
