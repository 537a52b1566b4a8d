use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::AttrValue;
use super::table::{Record, Table};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a flat horizon (or site) table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – scalar columns (strings, ints, floats, bools)
/// * `.json`    – `[{ "id": "P1", "top": 0, ... }, ...]`
/// * `.csv`     – header row with column names, one horizon per line
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": "P1", "hzid": "H1", "top": 0, "bottom": 10, "clay": 15 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json_records(&text)
}

/// Parse records-oriented JSON text into a [`Table`].
pub fn parse_json_records(text: &str) -> Result<Table> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut table = Table::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let row: Record = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_value(val)))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_value(val: &JsonValue) -> AttrValue {
    match val {
        JsonValue::String(s) => AttrValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                AttrValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                AttrValue::Float(f)
            } else {
                AttrValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => AttrValue::Bool(*b),
        JsonValue::Null => AttrValue::Null,
        other => AttrValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every cell type-guessed.
fn load_csv(path: &Path) -> Result<Table> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse CSV text (with a header row) into a [`Table`].
pub fn parse_csv(text: &str) -> Result<Table> {
    read_csv(csv::Reader::from_reader(text.as_bytes()))
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Table> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new();
    for h in &headers {
        table.add_column(h.clone());
    }

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but {} headers",
                record.len(),
                headers.len()
            );
        }
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(h, cell)| (h.clone(), guess_value_type(cell)))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn guess_value_type(s: &str) -> AttrValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("na") || s.eq_ignore_ascii_case("nan") {
        return AttrValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return AttrValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return AttrValue::Float(f);
    }
    if s == "true" || s == "false" {
        return AttrValue::Bool(s == "true");
    }
    AttrValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns, one horizon per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        for field in schema.fields() {
            table.add_column(field.name().clone());
        }

        for row in 0..batch.num_rows() {
            let record: Record = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(col_idx, field)| -> Result<(String, AttrValue)> {
                    let value = extract_value(batch.column(col_idx), row)
                        .with_context(|| format!("Row {row}, column '{}'", field.name()))?;
                    Ok((field.name().clone(), value))
                })
                .collect::<Result<_>>()?;
            table.push_row(record);
        }
    }
    Ok(table)
}

// -- Arrow helpers --

/// Extract a single scalar value from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<AttrValue> {
    if col.is_null(row) {
        return Ok(AttrValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => AttrValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => AttrValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            AttrValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            AttrValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            AttrValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            AttrValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            AttrValue::Bool(arr.value(row))
        }
        // Dates, timestamps, decimals and the like keep their display form.
        other => {
            let text = arrow::util::display::array_value_to_string(col, row)
                .with_context(|| format!("formatting {other:?} value"))?;
            AttrValue::Text(text)
        }
    };
    Ok(value)
}
