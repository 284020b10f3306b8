use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{FieldValue, LabeledTable, Record, Table};

/// Column holding the row key.
pub const ID_COLUMN: &str = "id";
/// Column holding the label.
pub const CLUSTER_COLUMN: &str = "cluster";

/// Knobs for reading delimited text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Field delimiter; when `None` it is picked from the file extension.
    pub delimiter: Option<u8>,
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – `id` integer column, `cluster` string column
/// * `.json`    – `[{ "id": 0, "cluster": "a", ...features }, ...]`
/// * `.tsv`     – tab-delimited text with a header row
/// * anything else – comma-delimited text with a header row
pub fn load_table(path: &Path, options: &LoadOptions) -> Result<LabeledTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "tsv" | "tab" => load_delimited(path, options.delimiter.unwrap_or(b'\t'))?,
        _ => load_delimited(path, options.delimiter.unwrap_or(b','))?,
    };

    log::debug!("read {} rows from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names; `id` must parse as an integer, `cluster`
/// is kept verbatim, every other column is a passthrough feature.
fn load_delimited(path: &Path, delimiter: u8) -> Result<LabeledTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let id_idx = headers
        .iter()
        .position(|h| h == ID_COLUMN)
        .context("missing 'id' column")?;
    let cluster_idx = headers
        .iter()
        .position(|h| h == CLUSTER_COLUMN)
        .context("missing 'cluster' column")?;

    let feature_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_idx && *i != cluster_idx)
        .map(|(i, h)| (i, h.clone()))
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;

        let raw_id = record.get(id_idx).unwrap_or("").trim();
        let id = raw_id
            .parse::<i64>()
            .with_context(|| format!("row {row_no}: id '{raw_id}' is not an integer"))?;
        let cluster = record.get(cluster_idx).unwrap_or("").to_string();

        let mut features = BTreeMap::new();
        for (col_idx, col_name) in &feature_cols {
            let value = record.get(*col_idx).unwrap_or("");
            features.insert(col_name.clone(), FieldValue::guess(value));
        }

        records.push(Record {
            id,
            cluster,
            features,
        });
    }

    let feature_columns = feature_cols.into_iter().map(|(_, name)| name).collect();
    Ok(Table::new(feature_columns, records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": 10, "cluster": "c7", "distance": 0.25 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<LabeledTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut feature_columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let id = obj
            .get(ID_COLUMN)
            .and_then(JsonValue::as_i64)
            .with_context(|| format!("Row {i}: missing or non-integer 'id'"))?;
        let cluster = match obj.get(CLUSTER_COLUMN) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Number(n)) => n.to_string(),
            Some(other) => bail!("Row {i}: 'cluster' must be a string, got {other}"),
            None => bail!("Row {i}: missing 'cluster'"),
        };

        let mut features = BTreeMap::new();
        for (key, val) in obj {
            if key == ID_COLUMN || key == CLUSTER_COLUMN {
                continue;
            }
            if !feature_columns.contains(key) {
                feature_columns.push(key.clone());
            }
            features.insert(key.clone(), json_to_field(val));
        }

        records.push(Record {
            id,
            cluster,
            features,
        });
    }

    Ok(Table::new(feature_columns, records))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file.
///
/// Expected schema:
/// - `id`: Int32 or Int64
/// - `cluster`: Utf8 / LargeUtf8 (integer labels are rendered as text)
/// - Any other columns are features (strings, ints, floats, bools)
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<LabeledTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let schema = builder.schema().clone();
    let id_idx = schema
        .index_of(ID_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing 'id' column"))?;
    let cluster_idx = schema
        .index_of(CLUSTER_COLUMN)
        .map_err(|_| anyhow::anyhow!("Parquet file missing 'cluster' column"))?;
    let feature_cols: Vec<(usize, String)> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != id_idx && *i != cluster_idx)
        .map(|(i, f)| (i, f.name().clone()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();
    // Rows already read from earlier batches, so messages use file positions.
    let mut offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let id_col = batch.column(id_idx);
        let cluster_col = batch.column(cluster_idx);

        for row in 0..batch.num_rows() {
            let file_row = offset + row;
            let id = extract_id(id_col, row)
                .with_context(|| format!("Row {file_row}: bad 'id'"))?;
            let cluster = extract_cluster(cluster_col, row)
                .with_context(|| format!("Row {file_row}: bad 'cluster'"))?;

            let mut features = BTreeMap::new();
            for (col_idx, col_name) in &feature_cols {
                let value = extract_field(batch.column(*col_idx), row)
                    .with_context(|| format!("Row {file_row}: bad '{col_name}'"))?;
                features.insert(col_name.clone(), value);
            }

            records.push(Record {
                id,
                cluster,
                features,
            });
        }
        offset += batch.num_rows();
    }

    let feature_columns = feature_cols.into_iter().map(|(_, name)| name).collect();
    Ok(Table::new(feature_columns, records))
}

// -- Parquet / Arrow helpers --

fn extract_id(col: &Arc<dyn Array>, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null id");
    }
    match col.data_type() {
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row)),
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row) as i64),
        other => bail!("Expected Int32 or Int64 id column, got {other:?}"),
    }
}

fn extract_cluster(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null cluster");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        DataType::Int64 => Ok(downcast::<Int64Array>(col)?.value(row).to_string()),
        DataType::Int32 => Ok(downcast::<Int32Array>(col)?.value(row).to_string()),
        other => bail!("Expected string cluster column, got {other:?}"),
    }
}

/// Extract a single feature value from an Arrow column at a given row.
fn extract_field(col: &Arc<dyn Array>, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => FieldValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            FieldValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Int32 => FieldValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => FieldValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => FieldValue::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => FieldValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => FieldValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        other => FieldValue::String(format!("{other:?}")),
    };
    Ok(value)
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array type {:?}", col.data_type()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use arrow::array::StringArray;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    use super::*;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_splits_key_label_and_features() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.csv",
            "distance,id,cluster,note\n0.5,10,c1,\n1.25,11,unknown,x\n",
        );

        let table = load_table(&path, &LoadOptions::default()).unwrap();

        assert_eq!(table.feature_columns(), ["distance", "note"]);
        assert_eq!(table.ids(), vec![10, 11]);
        let first = &table.records()[0];
        assert_eq!(first.cluster, "c1");
        assert_eq!(first.features["distance"], FieldValue::Float(0.5));
        assert_eq!(first.features["note"], FieldValue::Null);
        assert_eq!(table.records()[1].cluster, "unknown");
    }

    #[test]
    fn tsv_and_delimiter_override() {
        let dir = tempdir().unwrap();
        let tsv = write_file(dir.path(), "holdout.tsv", "id\tcluster\n1\ta\n2\tb\n");
        let table = load_table(&tsv, &LoadOptions::default()).unwrap();
        assert_eq!(table.ids(), vec![1, 2]);

        let semi = write_file(dir.path(), "holdout.txt", "id;cluster\n3;c\n");
        let options = LoadOptions {
            delimiter: Some(b';'),
        };
        let table = load_table(&semi, &options).unwrap();
        assert_eq!(table.records()[0].cluster, "c");
    }

    #[test]
    fn missing_columns_and_bad_ids_fail() {
        let dir = tempdir().unwrap();
        let no_cluster = write_file(dir.path(), "a.csv", "id,label\n1,a\n");
        let err = load_table(&no_cluster, &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("cluster"));

        let bad_id = write_file(dir.path(), "b.csv", "id,cluster\none,a\n");
        let err = load_table(&bad_id, &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("not an integer"));

        let missing = dir.path().join("nope.csv");
        assert!(load_table(&missing, &LoadOptions::default()).is_err());
    }

    #[test]
    fn json_records() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.json",
            r#"[{"id": 0, "cluster": "a", "score": 3},
                {"id": 1, "cluster": 7, "score": 1.5, "flag": true}]"#,
        );

        let table = load_table(&path, &LoadOptions::default()).unwrap();

        assert_eq!(table.feature_columns(), ["score", "flag"]);
        assert_eq!(table.records()[1].cluster, "7");
        assert_eq!(table.records()[0].features["score"], FieldValue::Integer(3));
        assert_eq!(table.records()[1].features["flag"], FieldValue::Bool(true));
    }

    #[test]
    fn json_keeps_key_order_of_the_file() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "train.json",
            r#"[{"id": 0, "cluster": "a", "zeta": 1, "alpha": 2},
                {"id": 1, "cluster": "b", "zeta": 3, "mid": 4, "alpha": 5}]"#,
        );

        let table = load_table(&path, &LoadOptions::default()).unwrap();

        assert_eq!(table.feature_columns(), ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn json_requires_integer_id() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "t.json", r#"[{"id": "x", "cluster": "a"}]"#);
        assert!(load_table(&path, &LoadOptions::default()).is_err());
    }

    #[test]
    fn parquet_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("cluster", DataType::Utf8, false),
            Field::new("distance", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![20, 21])),
                Arc::new(StringArray::from(vec!["b", "a"])),
                Arc::new(Float64Array::from(vec![Some(0.1), None])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_table(&path, &LoadOptions::default()).unwrap();

        assert_eq!(table.ids(), vec![20, 21]);
        assert_eq!(table.feature_columns(), ["distance"]);
        assert_eq!(table.records()[0].cluster, "b");
        assert_eq!(table.records()[0].features["distance"], FieldValue::Float(0.1));
        assert_eq!(table.records()[1].features["distance"], FieldValue::Null);
    }

    #[test]
    fn parquet_errors_report_file_row_across_batches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.parquet");

        // Readers hand out 1024-row batches, so row 1500 sits in the second one.
        let ids: Vec<Option<i64>> = (0..1600)
            .map(|i| if i == 1500 { None } else { Some(i) })
            .collect();
        let clusters: Vec<&str> = (0..1600).map(|_| "a").collect();
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("cluster", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(ids)),
                Arc::new(StringArray::from(clusters)),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let err = load_table(&path, &LoadOptions::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Row 1500: bad 'id'"), "{message}");
    }
}
