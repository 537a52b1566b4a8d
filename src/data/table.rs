use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value as JsonValue;

use super::model::AttrValue;
use crate::error::{ProfileError, Result};

/// One record of a [`Table`]: column_name → value. Absent keys read as null.
pub type Record = BTreeMap<String, AttrValue>;

// ---------------------------------------------------------------------------
// Table – an ordered set of columns over fixed-schema records
// ---------------------------------------------------------------------------

/// A plain in-memory table: ordered column names plus row records.
///
/// This is what loaders produce and what a `ProfileCollection` is built from;
/// the collection resolves role columns out of it once and keeps typed rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table column-wise. Every column must have the same length.
    pub fn from_columns<S, V>(columns: Vec<(S, Vec<V>)>) -> Result<Self>
    where
        S: Into<String>,
        V: Into<AttrValue>,
    {
        let mut names = Vec::with_capacity(columns.len());
        let mut rows: Vec<Record> = Vec::new();
        let mut expected: Option<usize> = None;

        for (name, values) in columns {
            let name: String = name.into();
            let n = *expected.get_or_insert(values.len());
            if values.len() != n {
                return Err(ProfileError::ColumnLength {
                    column: name,
                    expected: n,
                    got: values.len(),
                });
            }
            if rows.is_empty() {
                rows = vec![Record::new(); n];
            }
            for (row, value) in rows.iter_mut().zip(values) {
                row.insert(name.clone(), value.into());
            }
            if !names.contains(&name) {
                names.push(name);
            }
        }

        Ok(Table {
            columns: names,
            rows,
        })
    }

    /// Append a record, registering any column not seen before.
    pub fn push_row(&mut self, row: Record) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    /// Declare a column without adding values (e.g. an all-empty CSV column).
    pub fn add_column(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Cell lookup; missing cells are null.
    pub fn value(&self, row: usize, column: &str) -> &AttrValue {
        static NULL: AttrValue = AttrValue::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// All values of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<AttrValue>> {
        if !self.has_column(name) {
            return None;
        }
        Some(
            (0..self.rows.len())
                .map(|i| self.value(i, name).clone())
                .collect(),
        )
    }

    /// Sorted distinct values of a column (nulls included).
    pub fn unique_values(&self, name: &str) -> BTreeSet<AttrValue> {
        (0..self.rows.len())
            .map(|i| self.value(i, name).clone())
            .collect()
    }

    /// Rename columns in place according to `mapping` (old → new).
    /// Columns not named in the mapping keep their names.
    pub fn rename(&mut self, mapping: &BTreeMap<String, String>) {
        for col in &mut self.columns {
            if let Some(new) = mapping.get(col) {
                *col = new.clone();
            }
        }
        let mut seen = BTreeSet::new();
        self.columns.retain(|c| seen.insert(c.clone()));

        for row in &mut self.rows {
            for (old, new) in mapping {
                if let Some(v) = row.remove(old) {
                    row.insert(new.clone(), v);
                }
            }
        }
    }

    pub fn drop_columns(&mut self, names: &BTreeSet<String>) {
        self.columns.retain(|c| !names.contains(c));
        for row in &mut self.rows {
            row.retain(|k, _| !names.contains(k));
        }
    }

    /// Records-oriented JSON, the same layout the JSON loader reads.
    pub fn to_json_records(&self) -> JsonValue {
        let records = self
            .rows
            .iter()
            .map(|row| {
                let obj = self
                    .columns
                    .iter()
                    .map(|c| {
                        let v = row.get(c).cloned().unwrap_or(AttrValue::Null);
                        let json = serde_json::to_value(v).unwrap_or(JsonValue::Null);
                        (c.clone(), json)
                    })
                    .collect::<serde_json::Map<_, _>>();
                JsonValue::Object(obj)
            })
            .collect();
        JsonValue::Array(records)
    }
}
