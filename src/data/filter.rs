use std::collections::BTreeSet;

use super::model::{LabeledTable, Table, NEIGHBORS_PER_BLOCK, UNKNOWN_CLUSTER};
use crate::error::{DatasetError, DatasetResult};

// ---------------------------------------------------------------------------
// Row filters
// ---------------------------------------------------------------------------

/// Keep the first `k_nearest` neighbors of every block, i.e. rows whose
/// `id mod 10 < k_nearest`.
pub fn keep_nearest<L>(table: Table<L>, k_nearest: usize) -> Table<L> {
    let k = k_nearest as i64;
    table.retain_rows(|r| r.neighbor_rank() < k)
}

/// Drop rows whose label is the `"unknown"` sentinel.
pub fn drop_unknown(table: LabeledTable) -> LabeledTable {
    table.retain_rows(|r| r.cluster != UNKNOWN_CLUSTER)
}

// ---------------------------------------------------------------------------
// Block layout check
// ---------------------------------------------------------------------------

/// Check that `table` follows the neighbor-block layout.
///
/// Rows sharing `id div 10` must be adjacent in file order, and their ranks
/// (`id mod 10`) must be unique and start at 0 without gaps.
pub fn validate_neighbor_blocks<L>(table: &Table<L>) -> DatasetResult<()> {
    let mut finished: BTreeSet<i64> = BTreeSet::new();
    let mut current: Option<(i64, BTreeSet<i64>)> = None;

    for record in table {
        let block = record.block();
        let rank = record.neighbor_rank();

        match current.as_mut() {
            Some((b, ranks)) if *b == block => {
                if !ranks.insert(rank) {
                    return Err(DatasetError::NeighborBlock {
                        block,
                        reason: format!("rank {rank} appears twice"),
                    });
                }
            }
            _ => {
                if let Some((b, ranks)) = current.take() {
                    check_prefix(b, &ranks)?;
                    finished.insert(b);
                }
                if finished.contains(&block) {
                    return Err(DatasetError::NeighborBlock {
                        block,
                        reason: "rows are not contiguous".to_string(),
                    });
                }
                current = Some((block, BTreeSet::from([rank])));
            }
        }
    }

    if let Some((b, ranks)) = current {
        check_prefix(b, &ranks)?;
    }
    Ok(())
}

fn check_prefix(block: i64, ranks: &BTreeSet<i64>) -> DatasetResult<()> {
    debug_assert!(ranks.len() as i64 <= NEIGHBORS_PER_BLOCK);
    // Ranks are unique and sorted, so a gap-free prefix ends at len - 1.
    match ranks.iter().enumerate().find(|(i, r)| *i as i64 != **r) {
        Some((expected, _)) => Err(DatasetError::NeighborBlock {
            block,
            reason: format!("rank {expected} is missing"),
        }),
        None => Ok(()),
    }
}
