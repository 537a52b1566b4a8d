//! Re-slicing profiles onto shared depth intervals ("glom").
//!
//! ```text
//!   profile horizons        breakpoints          output
//!   0 ┬ A                   0 ┬                  [0,15)   → A  (10 of 15)
//!  10 ┼ Bt1                15 ┼                  [15,30)  → Bt1 (10 of 15)
//!  25 ┼ Bt2                30 ┼                  [30,60)  → Bt2 (20 of 30)
//!  50 ┼ C                  60 ┼                  [60,100) → C  (20 of 40)
//!  80 ┴                   100 ┴
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::collection::ProfileCollection;
use super::model::{AttrValue, Horizon};
use super::table::{Record, Table};
use crate::error::{ProfileError, Result};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Aggregation policy applied inside each output interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Value of the horizon with the largest overlap; ties go to the
    /// shallower horizon. Numeric values are never blended.
    #[default]
    Dominant,
}

impl FromStr for Aggregation {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dominant" => Ok(Aggregation::Dominant),
            other => Err(ProfileError::UnknownAggregation(other.to_string())),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregation::Dominant => write!(f, "dominant"),
        }
    }
}

/// Parameters of a glom run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlomOptions {
    /// Strictly increasing breakpoints; output intervals are
    /// `[intervals[i], intervals[i + 1])`.
    pub intervals: Vec<f64>,
    /// Attributes to aggregate. `None` means every non-role horizon column
    /// plus the designation column.
    pub vars: Option<Vec<String>>,
    pub aggregation: Aggregation,
    /// Emit null rows for intervals a profile does not reach.
    pub fill: bool,
}

impl GlomOptions {
    pub fn new(intervals: impl Into<Vec<f64>>) -> Self {
        Self {
            intervals: intervals.into(),
            vars: None,
            aggregation: Aggregation::Dominant,
            fill: true,
        }
    }

    pub fn var(mut self, name: impl Into<String>) -> Self {
        self.vars.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn vars<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.vars = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    fn check_intervals(&self) -> Result<()> {
        let iv = &self.intervals;
        if iv.len() < 2 {
            return Err(ProfileError::InvalidIntervals(format!(
                "need at least two breakpoints, got {}",
                iv.len()
            )));
        }
        if let Some(bad) = iv.iter().find(|d| !d.is_finite()) {
            return Err(ProfileError::InvalidIntervals(format!("breakpoint {bad} is not finite")));
        }
        if let Some(pair) = iv.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ProfileError::InvalidIntervals(format!(
                "breakpoints must strictly increase ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// One aggregated value: (profile, output interval, variable).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlomRow {
    pub profile_id: String,
    pub top: f64,
    pub bottom: f64,
    pub variable: String,
    pub value: AttrValue,
}

/// Long-form glom result, ordered by profile, then interval, then variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlomFrame {
    pub id_column: String,
    pub depth_columns: (String, String),
    pub variables: Vec<String>,
    pub rows: Vec<GlomRow>,
}

impl GlomFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The aggregated value of `variable` for the interval starting at `top`.
    pub fn value(&self, profile_id: &str, top: f64, variable: &str) -> Option<&AttrValue> {
        self.rows
            .iter()
            .find(|r| r.profile_id == profile_id && r.top == top && r.variable == variable)
            .map(|r| &r.value)
    }

    /// `(top, bottom, value)` for one profile and variable, shallowest first.
    pub fn values_for(&self, profile_id: &str, variable: &str) -> Vec<(f64, f64, AttrValue)> {
        self.rows
            .iter()
            .filter(|r| r.profile_id == profile_id && r.variable == variable)
            .map(|r| (r.top, r.bottom, r.value.clone()))
            .collect()
    }

    /// Wide form: one row per (profile, interval) with a column per variable.
    pub fn to_wide(&self) -> Table {
        let mut table = Table::new();
        table.add_column(self.id_column.clone());
        table.add_column(self.depth_columns.0.clone());
        table.add_column(self.depth_columns.1.clone());
        for v in &self.variables {
            table.add_column(v.clone());
        }

        let mut current: Option<(String, u64, Record)> = None;
        for row in &self.rows {
            let key = (row.profile_id.as_str(), row.top.to_bits());
            let same = current
                .as_ref()
                .is_some_and(|(id, top, _)| (id.as_str(), *top) == key);
            if !same {
                if let Some((_, _, done)) = current.take() {
                    table.push_row(done);
                }
                let mut record = Record::new();
                record.insert(self.id_column.clone(), AttrValue::Text(row.profile_id.clone()));
                record.insert(self.depth_columns.0.clone(), AttrValue::Float(row.top));
                record.insert(self.depth_columns.1.clone(), AttrValue::Float(row.bottom));
                current = Some((row.profile_id.clone(), row.top.to_bits(), record));
            }
            if let Some((_, _, record)) = current.as_mut() {
                record.insert(row.variable.clone(), row.value.clone());
            }
        }
        if let Some((_, _, done)) = current {
            table.push_row(done);
        }
        table
    }

    /// One variable laid out with a row per interval and a column per profile.
    /// Profiles missing an interval (glom without fill) read as null.
    pub fn pivot(&self, variable: &str) -> Result<Table> {
        if !self.variables.iter().any(|v| v == variable) {
            return Err(ProfileError::AttributeNotFound(variable.to_string()));
        }

        let mut profiles: Vec<&str> = Vec::new();
        let mut by_interval: BTreeMap<(u64, u64), (f64, f64, Record)> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| r.variable == variable) {
            if !profiles.contains(&row.profile_id.as_str()) {
                profiles.push(&row.profile_id);
            }
            let key = (order_key(row.top), order_key(row.bottom));
            by_interval
                .entry(key)
                .or_insert_with(|| (row.top, row.bottom, Record::new()))
                .2
                .insert(row.profile_id.clone(), row.value.clone());
        }

        let mut table = Table::new();
        table.add_column(self.depth_columns.0.clone());
        table.add_column(self.depth_columns.1.clone());
        for p in &profiles {
            table.add_column(p.to_string());
        }
        for (_, (top, bottom, mut record)) in by_interval {
            record.insert(self.depth_columns.0.clone(), AttrValue::Float(top));
            record.insert(self.depth_columns.1.clone(), AttrValue::Float(bottom));
            for p in &profiles {
                record.entry(p.to_string()).or_insert(AttrValue::Null);
            }
            table.push_row(record);
        }
        Ok(table)
    }
}

/// Monotone map from finite f64 to u64 (sign-flip trick).
fn order_key(v: f64) -> u64 {
    let bits = v.to_bits();
    if bits >> 63 == 1 {
        !bits
    } else {
        bits | (1 << 63)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The horizon with the greatest overlap with `[top, bottom)`.
/// Horizons must be sorted by top depth; on equal overlap the first
/// (shallower) one wins. `None` when nothing overlaps.
pub fn dominant(horizons: &[Horizon], top: f64, bottom: f64) -> Option<&Horizon> {
    let mut best: Option<(&Horizon, f64)> = None;
    for h in horizons {
        let overlap = h.overlap(top, bottom);
        if overlap <= 0.0 {
            continue;
        }
        match best {
            Some((_, len)) if overlap <= len => {}
            _ => best = Some((h, overlap)),
        }
    }
    best.map(|(h, _)| h)
}

fn resolve_variables(collection: &ProfileCollection, vars: Option<&[String]>) -> Result<Vec<String>> {
    match vars {
        Some(requested) => {
            if let Some(missing) = requested.iter().find(|v| !collection.has_horizon_column(v)) {
                return Err(ProfileError::AttributeNotFound(missing.clone()));
            }
            // The long and wide forms carry these as interval columns.
            let cfg = collection.config();
            let reserved = [&cfg.idname, &cfg.depthcols.0, &cfg.depthcols.1];
            if let Some(clash) = requested.iter().find(|v| reserved.contains(v)) {
                return Err(ProfileError::ReservedVariable(clash.clone()));
            }
            Ok(requested.to_vec())
        }
        None => Ok(collection
            .config()
            .hzdesgncol
            .iter()
            .chain(collection.horizon_columns())
            .cloned()
            .collect()),
    }
}

/// Aggregate every requested attribute of every profile over each output
/// interval.
pub fn glom(collection: &ProfileCollection, options: &GlomOptions) -> Result<GlomFrame> {
    options.check_intervals()?;
    let variables = resolve_variables(collection, options.vars.as_deref())?;

    let mut rows = Vec::new();
    for (profile_id, horizons) in collection.profiles() {
        for pair in options.intervals.windows(2) {
            let (top, bottom) = (pair[0], pair[1]);
            let picked = match options.aggregation {
                Aggregation::Dominant => dominant(horizons, top, bottom),
            };
            if picked.is_none() && !options.fill {
                continue;
            }
            for var in &variables {
                let value = picked
                    .and_then(|h| collection.horizon_value(h, var))
                    .unwrap_or(AttrValue::Null);
                rows.push(GlomRow {
                    profile_id: profile_id.to_string(),
                    top,
                    bottom,
                    variable: var.clone(),
                    value,
                });
            }
        }
    }

    log::debug!(
        "glom ({}) over {} intervals, {} variables: {} rows",
        options.aggregation,
        options.intervals.len() - 1,
        variables.len(),
        rows.len()
    );

    let cfg = collection.config();
    Ok(GlomFrame {
        id_column: cfg.idname.clone(),
        depth_columns: cfg.depthcols.clone(),
        variables,
        rows,
    })
}
