use std::collections::BTreeMap;

/// Width of a neighbor block: `id % NEIGHBORS_PER_BLOCK` is the neighbor rank.
pub const NEIGHBORS_PER_BLOCK: i64 = 10;

/// Reserved `cluster` value for rows whose label is not known yet.
pub const UNKNOWN_CLUSTER: &str = "unknown";

// ---------------------------------------------------------------------------
// FieldValue – a single passthrough cell
// ---------------------------------------------------------------------------

/// A dynamically-typed feature value mirroring common Pandas dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Interpret a raw text cell: empty → Null, then integer, float, bool.
    pub fn guess(s: &str) -> Self {
        if s.is_empty() {
            return FieldValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return FieldValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return FieldValue::Float(f);
        }
        if s == "true" || s == "false" {
            return FieldValue::Bool(s == "true");
        }
        FieldValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a table
// ---------------------------------------------------------------------------

/// A single row keyed by `id`.
///
/// `L` is the label type: `String` as read from disk, `usize` once the
/// training labels have been encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<L> {
    pub id: i64,
    pub cluster: L,
    /// Passthrough columns: column_name → value.
    pub features: BTreeMap<String, FieldValue>,
}

impl<L> Record<L> {
    /// Position of this row inside its neighbor block, always in `0..10`.
    pub fn neighbor_rank(&self) -> i64 {
        self.id.rem_euclid(NEIGHBORS_PER_BLOCK)
    }

    /// The neighbor block this row belongs to.
    pub fn block(&self) -> i64 {
        self.id.div_euclid(NEIGHBORS_PER_BLOCK)
    }
}

// ---------------------------------------------------------------------------
// Table – an ordered collection of records
// ---------------------------------------------------------------------------

/// Rows in source order plus the ordered names of their feature columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<L> {
    feature_columns: Vec<String>,
    records: Vec<Record<L>>,
}

/// A table straight from disk, labels still text.
pub type LabeledTable = Table<String>;

/// A table whose labels were replaced by their index.
pub type EncodedTable = Table<usize>;

impl<L> Table<L> {
    pub fn new(feature_columns: Vec<String>, records: Vec<Record<L>>) -> Self {
        Table {
            feature_columns,
            records,
        }
    }

    /// Feature column names in source order (excludes `id` and `cluster`).
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn records(&self) -> &[Record<L>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record<L>> {
        self.records.iter()
    }

    /// Row ids in table order.
    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// First row with the given id.
    pub fn get(&self, id: i64) -> Option<&Record<L>> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Keep only the rows matching `keep`, preserving order.
    pub fn retain_rows<F>(self, mut keep: F) -> Self
    where
        F: FnMut(&Record<L>) -> bool,
    {
        let records = self.records.into_iter().filter(|r| keep(r)).collect();
        Table {
            feature_columns: self.feature_columns,
            records,
        }
    }

    /// Build a new table with every label passed through `f`.
    ///
    /// Stops at the first error; `self` is left untouched either way.
    pub fn map_labels<M, E, F>(&self, mut f: F) -> Result<Table<M>, E>
    where
        F: FnMut(&L) -> Result<M, E>,
    {
        let records = self
            .records
            .iter()
            .map(|r| {
                Ok(Record {
                    id: r.id,
                    cluster: f(&r.cluster)?,
                    features: r.features.clone(),
                })
            })
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Table {
            feature_columns: self.feature_columns.clone(),
            records,
        })
    }

    /// Borrow the whole table as a view.
    pub fn view(&self) -> TableView<'_, L> {
        TableView {
            feature_columns: &self.feature_columns,
            records: &self.records,
        }
    }

    /// Split into the first `mid` rows and the rest. `mid` past the end is
    /// treated as `len()`.
    pub fn split_at(&self, mid: usize) -> (TableView<'_, L>, TableView<'_, L>) {
        let mid = mid.min(self.records.len());
        let (head, tail) = self.records.split_at(mid);
        (
            TableView {
                feature_columns: &self.feature_columns,
                records: head,
            },
            TableView {
                feature_columns: &self.feature_columns,
                records: tail,
            },
        )
    }
}

impl<'a, L> IntoIterator for &'a Table<L> {
    type Item = &'a Record<L>;
    type IntoIter = std::slice::Iter<'a, Record<L>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// TableView – a borrowed contiguous slice of a table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TableView<'a, L> {
    feature_columns: &'a [String],
    records: &'a [Record<L>],
}

impl<'a, L> TableView<'a, L> {
    pub fn feature_columns(&self) -> &'a [String] {
        self.feature_columns
    }

    pub fn records(&self) -> &'a [Record<L>] {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, Record<L>> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.id).collect()
    }
}

impl<L: Clone> TableView<'_, L> {
    /// Copy the viewed rows into an owned table.
    pub fn to_table(&self) -> Table<L> {
        Table::new(self.feature_columns.to_vec(), self.records.to_vec())
    }
}
