use std::path::Path;

use crate::config::DatasetConfig;
use crate::data::filter::{drop_unknown, keep_nearest, validate_neighbor_blocks};
use crate::data::labels::{LabelIndex, LabelVocabulary};
use crate::data::loader::load_table;
use crate::data::model::{EncodedTable, LabeledTable, TableView};
use crate::error::{DatasetError, DatasetResult};

/// Share of the holdout rows that goes to the dev split by default.
pub const DEFAULT_DEV_RATIO: f64 = 0.5;

// ---------------------------------------------------------------------------
// Dataset – training + holdout tables ready for a classifier
// ---------------------------------------------------------------------------

/// Filtered training and holdout tables plus the label encoding.
///
/// Everything is computed in the constructor and never changes afterwards.
/// The training labels are stored as indices into [`Dataset::label_index`];
/// the holdout labels stay as text.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    train: EncodedTable,
    holdout: LabeledTable,
    vocabulary: LabelVocabulary,
    label_index: LabelIndex,
    k_nearest_for_train: usize,
}

impl Dataset {
    /// Load and prepare both tables.
    ///
    /// Keeps the first `k_nearest_for_train` neighbors (`id % 10`) of every
    /// training block, drops `"unknown"` rows from both tables and encodes the
    /// training labels in sorted-label order.
    pub fn new(
        path_to_train: impl AsRef<Path>,
        path_to_test: impl AsRef<Path>,
        k_nearest_for_train: usize,
    ) -> DatasetResult<Self> {
        let config = DatasetConfig::new(path_to_train.as_ref(), path_to_test.as_ref())
            .with_k_nearest(k_nearest_for_train);
        Self::from_config(&config)
    }

    pub fn from_config(config: &DatasetConfig) -> DatasetResult<Self> {
        config.validate()?;
        let k = config.k_nearest_for_train;
        let options = config.load_options();

        let raw_train = load_table(&config.train_path, &options)
            .map_err(|e| DatasetError::load(&config.train_path, e))?;
        let raw_holdout = load_table(&config.holdout_path, &options)
            .map_err(|e| DatasetError::load(&config.holdout_path, e))?;
        log::info!(
            "loaded {} training rows from {} and {} holdout rows from {}",
            raw_train.len(),
            config.train_path.display(),
            raw_holdout.len(),
            config.holdout_path.display()
        );

        if config.strict_neighbor_blocks {
            validate_neighbor_blocks(&raw_train)?;
        }

        let loaded = raw_train.len();
        let nearest = keep_nearest(raw_train, k);
        log::debug!(
            "kept {} of {loaded} training rows with k_nearest_for_train = {k}",
            nearest.len()
        );

        let before = nearest.len();
        let train = drop_unknown(nearest);
        log::debug!("dropped {} unknown training rows", before - train.len());

        let before = raw_holdout.len();
        let holdout = drop_unknown(raw_holdout);
        log::debug!("dropped {} unknown holdout rows", before - holdout.len());

        let vocabulary = LabelVocabulary::from_table(&train);
        let label_index = LabelIndex::from_vocabulary(&vocabulary);
        if vocabulary.is_empty() {
            log::warn!("training table has no labeled rows left after filtering");
        }

        let train = encode_labels(&train, &label_index)?;
        log::info!(
            "dataset ready: {} training rows, {} holdout rows, {} labels",
            train.len(),
            holdout.len(),
            vocabulary.len()
        );

        Ok(Dataset {
            train,
            holdout,
            vocabulary,
            label_index,
            k_nearest_for_train: k,
        })
    }

    /// Training rows with labels replaced by their index.
    pub fn train(&self) -> &EncodedTable {
        &self.train
    }

    /// Holdout rows in file order, labels still text.
    pub fn holdout(&self) -> &LabeledTable {
        &self.holdout
    }

    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocabulary
    }

    pub fn label_index(&self) -> &LabelIndex {
        &self.label_index
    }

    pub fn k_nearest_for_train(&self) -> usize {
        self.k_nearest_for_train
    }

    /// Split the holdout table into `(dev, test)`.
    ///
    /// The first `floor(len * ratio)` rows form the dev part and the rest the
    /// test part, both in file order. `ratio` must lie in `[0, 1]`.
    pub fn dev_test_split(
        &self,
        ratio: f64,
    ) -> DatasetResult<(TableView<'_, String>, TableView<'_, String>)> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(DatasetError::InvalidArgument(format!(
                "split ratio must be in [0, 1], got {ratio}"
            )));
        }
        let split_index = (self.holdout.len() as f64 * ratio).floor() as usize;
        Ok(self.holdout.split_at(split_index))
    }

    /// [`Dataset::dev_test_split`] with [`DEFAULT_DEV_RATIO`].
    pub fn dev_test_split_default(&self) -> (TableView<'_, String>, TableView<'_, String>) {
        let split_index = (self.holdout.len() as f64 * DEFAULT_DEV_RATIO).floor() as usize;
        self.holdout.split_at(split_index)
    }
}

fn encode_labels(table: &LabeledTable, index: &LabelIndex) -> DatasetResult<EncodedTable> {
    table.map_labels(|label| {
        index
            .get(label)
            .ok_or_else(|| DatasetError::Lookup {
                label: label.clone(),
            })
    })
}
