use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::glom::{self, GlomFrame, GlomOptions};
use super::model::{AttrValue, Horizon, Site};
use super::table::{Record, Table};
use super::validate::validate_profile;
use crate::error::{ProfileError, Result};

// ---------------------------------------------------------------------------
// Configuration – which columns play which role
// ---------------------------------------------------------------------------

/// Role column names. Everything not named here is an attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub idname: String,
    pub hzidname: String,
    /// `(top, bottom)` depth column names.
    pub depthcols: (String, String),
    pub hzdesgncol: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            idname: "id".to_string(),
            hzidname: "hzid".to_string(),
            depthcols: ("top".to_string(), "bottom".to_string()),
            hzdesgncol: None,
        }
    }
}

impl CollectionConfig {
    pub fn with_idname(mut self, name: impl Into<String>) -> Self {
        self.idname = name.into();
        self
    }

    pub fn with_hzidname(mut self, name: impl Into<String>) -> Self {
        self.hzidname = name.into();
        self
    }

    pub fn with_depthcols(mut self, top: impl Into<String>, bottom: impl Into<String>) -> Self {
        self.depthcols = (top.into(), bottom.into());
        self
    }

    pub fn with_hzdesgncol(mut self, name: impl Into<String>) -> Self {
        self.hzdesgncol = Some(name.into());
        self
    }

    fn is_role(&self, name: &str) -> bool {
        name == self.idname
            || name == self.hzidname
            || name == self.depthcols.0
            || name == self.depthcols.1
            || self.hzdesgncol.as_deref() == Some(name)
    }
}

// ---------------------------------------------------------------------------
// Query helper types
// ---------------------------------------------------------------------------

/// Which end of a profile `depths` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthSummary {
    /// Deepest bottom depth.
    #[default]
    Max,
    /// Shallowest top depth.
    Min,
}

impl FromStr for DepthSummary {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(DepthSummary::Max),
            "min" => Ok(DepthSummary::Min),
            other => Err(ProfileError::UnknownDepthSummary(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileDepth {
    pub profile_id: String,
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HorizonThickness {
    pub profile_id: String,
    pub hzid: AttrValue,
    pub thickness: f64,
}

/// How to pick profiles out of a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Position(usize),
    Positions(Vec<usize>),
    /// Slice semantics: bounds are clamped to the collection length.
    Range(Range<usize>),
    Ids(Vec<String>),
}

impl From<usize> for Selection {
    fn from(i: usize) -> Self {
        Selection::Position(i)
    }
}

impl From<Vec<usize>> for Selection {
    fn from(v: Vec<usize>) -> Self {
        Selection::Positions(v)
    }
}

impl From<Range<usize>> for Selection {
    fn from(r: Range<usize>) -> Self {
        Selection::Range(r)
    }
}

impl From<Vec<String>> for Selection {
    fn from(v: Vec<String>) -> Self {
        Selection::Ids(v)
    }
}

impl From<&[&str]> for Selection {
    fn from(v: &[&str]) -> Self {
        Selection::Ids(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Selection {
    fn from(v: [&str; N]) -> Self {
        Selection::Ids(v.iter().map(|s| s.to_string()).collect())
    }
}

// ---------------------------------------------------------------------------
// ProfileCollection
// ---------------------------------------------------------------------------

/// A validated set of soil profiles.
///
/// Horizons are stored grouped by profile (profiles in first-appearance order,
/// horizons by ascending top depth). Every profile has exactly one [`Site`]
/// row, empty when no site data was supplied for it.
#[derive(Debug, Clone)]
pub struct ProfileCollection {
    config: CollectionConfig,
    profile_ids: Vec<String>,
    /// `spans[i]` indexes the horizons of `profile_ids[i]`.
    spans: Vec<Range<usize>>,
    index: HashMap<String, usize>,
    horizons: Vec<Horizon>,
    horizon_columns: Vec<String>,
    site: Vec<Site>,
    site_columns: Vec<String>,
    metadata: BTreeMap<String, String>,
    crs: Option<String>,
}

impl ProfileCollection {
    /// Build and validate a collection.
    ///
    /// Fails on the first structural problem, checking profiles in the order
    /// they first appear in `horizons`.
    pub fn new(horizons: &Table, site: Option<&Table>, config: CollectionConfig) -> Result<Self> {
        let mut required = vec![
            &config.idname,
            &config.hzidname,
            &config.depthcols.0,
            &config.depthcols.1,
        ];
        if let Some(desgn) = &config.hzdesgncol {
            required.push(desgn);
        }
        if let Some(missing) = required.into_iter().find(|c| !horizons.has_column(c)) {
            return Err(ProfileError::Schema {
                table: "horizon",
                column: missing.clone(),
            });
        }
        if let Some(site) = site {
            if !site.has_column(&config.idname) {
                return Err(ProfileError::Schema {
                    table: "site",
                    column: config.idname.clone(),
                });
            }
        }

        let horizon_columns: Vec<String> = horizons
            .columns()
            .iter()
            .filter(|c| !config.is_role(c))
            .cloned()
            .collect();

        // Group rows by profile, keeping first-appearance order.
        let mut profile_ids: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<Horizon>> = HashMap::new();
        for (row_no, row) in horizons.rows().iter().enumerate() {
            let horizon = resolve_horizon(row_no, row, &config, &horizon_columns)?;
            let group = groups.entry(horizon.profile_id.clone()).or_insert_with(|| {
                profile_ids.push(horizon.profile_id.clone());
                Vec::new()
            });
            group.push(horizon);
        }

        let mut flat = Vec::with_capacity(horizons.len());
        let mut spans = Vec::with_capacity(profile_ids.len());
        for id in &profile_ids {
            let mut group = groups.remove(id).unwrap_or_default();
            group.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.bottom.total_cmp(&b.bottom)));
            validate_profile(id, &group)?;
            let start = flat.len();
            flat.extend(group);
            spans.push(start..flat.len());
        }

        let index: HashMap<String, usize> = profile_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let (site, site_columns) = match site {
            Some(table) => resolve_sites(table, &config, &profile_ids, &index),
            None => (profile_ids.iter().map(Site::bare).collect(), Vec::new()),
        };

        log::debug!(
            "built collection: {} profiles, {} horizons, horizon attributes {:?}",
            profile_ids.len(),
            flat.len(),
            horizon_columns
        );

        Ok(ProfileCollection {
            config,
            profile_ids,
            spans,
            index,
            horizons: flat,
            horizon_columns,
            site,
            site_columns,
            metadata: BTreeMap::new(),
            crs: None,
        })
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach an opaque coordinate-reference label (e.g. "EPSG:4326").
    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    // -- Plain accessors --

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profile_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profile_ids.is_empty()
    }

    pub fn profile_ids(&self) -> &[String] {
        &self.profile_ids
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    /// All horizons, grouped by profile in collection order.
    pub fn horizons(&self) -> &[Horizon] {
        &self.horizons
    }

    /// Non-role horizon columns in source-table order.
    pub fn horizon_columns(&self) -> &[String] {
        &self.horizon_columns
    }

    /// Site rows aligned with [`profile_ids`](Self::profile_ids).
    pub fn site(&self) -> &[Site] {
        &self.site
    }

    pub fn site_columns(&self) -> &[String] {
        &self.site_columns
    }

    /// Iterate `(profile_id, horizons)` in collection order.
    pub fn profiles(&self) -> impl Iterator<Item = (&str, &[Horizon])> + '_ {
        self.profile_ids
            .iter()
            .zip(&self.spans)
            .map(|(id, span)| (id.as_str(), &self.horizons[span.clone()]))
    }

    /// Horizons of one profile, shallowest first.
    pub fn get_profile(&self, id: &str) -> Result<&[Horizon]> {
        let pos = self
            .position(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        Ok(&self.horizons[self.spans[pos].clone()])
    }

    pub fn get_site(&self, id: &str) -> Result<&Site> {
        let pos = self
            .position(id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;
        Ok(&self.site[pos])
    }

    /// Whether `name` can be read off a horizon (role or attribute column).
    pub fn has_horizon_column(&self, name: &str) -> bool {
        self.config.is_role(name) || self.horizon_columns.iter().any(|c| c == name)
    }

    /// Read any horizon column by name, role columns included.
    /// `None` when the collection has no such column.
    pub fn horizon_value(&self, horizon: &Horizon, name: &str) -> Option<AttrValue> {
        let cfg = &self.config;
        if name == cfg.idname {
            Some(AttrValue::Text(horizon.profile_id.clone()))
        } else if name == cfg.hzidname {
            Some(horizon.hzid.clone())
        } else if name == cfg.depthcols.0 {
            Some(AttrValue::Float(horizon.top))
        } else if name == cfg.depthcols.1 {
            Some(AttrValue::Float(horizon.bottom))
        } else if cfg.hzdesgncol.as_deref() == Some(name) {
            Some(horizon.designation.clone().into())
        } else if self.horizon_columns.iter().any(|c| c == name) {
            Some(horizon.get(name).cloned().unwrap_or(AttrValue::Null))
        } else {
            None
        }
    }

    // -- Tabular views --

    fn role_columns(&self) -> Vec<String> {
        let cfg = &self.config;
        let mut cols = vec![
            cfg.idname.clone(),
            cfg.hzidname.clone(),
            cfg.depthcols.0.clone(),
            cfg.depthcols.1.clone(),
        ];
        cols.extend(cfg.hzdesgncol.clone());
        cols
    }

    fn horizons_to_table(&self, horizons: &[Horizon]) -> Table {
        let columns: Vec<String> = self
            .role_columns()
            .into_iter()
            .chain(self.horizon_columns.iter().cloned())
            .collect();
        let mut table = Table::new();
        for c in &columns {
            table.add_column(c.clone());
        }
        for h in horizons {
            let row: Record = columns
                .iter()
                .map(|c| (c.clone(), self.horizon_value(h, c).unwrap_or(AttrValue::Null)))
                .collect();
            table.push_row(row);
        }
        table
    }

    /// The full horizon table with role columns under their configured names.
    pub fn horizon_table(&self) -> Table {
        self.horizons_to_table(&self.horizons)
    }

    /// One profile's horizons as a table.
    pub fn get_profile_table(&self, id: &str) -> Result<Table> {
        Ok(self.horizons_to_table(self.get_profile(id)?))
    }

    pub fn site_table(&self) -> Table {
        let mut table = Table::new();
        table.add_column(self.config.idname.clone());
        for c in &self.site_columns {
            table.add_column(c.clone());
        }
        for s in &self.site {
            let mut row = Record::new();
            row.insert(self.config.idname.clone(), AttrValue::Text(s.profile_id.clone()));
            for c in &self.site_columns {
                row.insert(c.clone(), s.get(c).cloned().unwrap_or(AttrValue::Null));
            }
            table.push_row(row);
        }
        table
    }

    // -- Derived statistics --

    /// One depth per profile, in collection order.
    pub fn depths(&self, how: DepthSummary) -> Vec<ProfileDepth> {
        self.profiles()
            .map(|(id, hz)| {
                let depth = match how {
                    DepthSummary::Max => hz.iter().map(|h| h.bottom).fold(f64::NEG_INFINITY, f64::max),
                    DepthSummary::Min => hz.iter().map(|h| h.top).fold(f64::INFINITY, f64::min),
                };
                ProfileDepth {
                    profile_id: id.to_string(),
                    depth,
                }
            })
            .collect()
    }

    /// `bottom - top` for every horizon row, in the row order of the table
    /// the collection was built from.
    pub fn thickness(&self) -> Vec<HorizonThickness> {
        let mut rows: Vec<&Horizon> = self.horizons.iter().collect();
        rows.sort_by_key(|h| h.source_row);
        rows.into_iter()
            .map(|h| HorizonThickness {
                profile_id: h.profile_id.clone(),
                hzid: h.hzid.clone(),
                thickness: h.thickness(),
            })
            .collect()
    }

    /// Apply `f` to every profile's horizons. One result per profile, in
    /// collection order. `f` sees the raw horizons and supplies its own
    /// defaults for missing attributes.
    pub fn profile_apply<T, F>(&self, mut f: F) -> Vec<(String, T)>
    where
        F: FnMut(&[Horizon]) -> T,
    {
        self.profiles()
            .map(|(id, hz)| (id.to_string(), f(hz)))
            .collect()
    }

    /// Re-slice all profiles onto shared depth intervals.
    pub fn glom(&self, options: &GlomOptions) -> Result<GlomFrame> {
        glom::glom(self, options)
    }

    // -- Subsetting --

    /// New, independent collection holding the selected profiles.
    pub fn subset(&self, selection: impl Into<Selection>) -> Result<Self> {
        let len = self.len();
        let positions: Vec<usize> = match selection.into() {
            Selection::Position(i) => vec![self.check_position(i)?],
            Selection::Positions(v) => v
                .into_iter()
                .map(|i| self.check_position(i))
                .collect::<Result<_>>()?,
            Selection::Range(r) => {
                let start = r.start.min(len);
                let end = r.end.min(len).max(start);
                (start..end).collect()
            }
            Selection::Ids(ids) => ids
                .iter()
                .map(|id| {
                    self.position(id)
                        .ok_or_else(|| ProfileError::NotFound(id.clone()))
                })
                .collect::<Result<_>>()?,
        };
        Ok(self.take(&positions))
    }

    /// Keep the profiles whose site row satisfies `predicate`, in their
    /// original relative order.
    pub fn filter_sites<P>(&self, mut predicate: P) -> Self
    where
        P: FnMut(&Site) -> bool,
    {
        let positions: Vec<usize> = self
            .site
            .iter()
            .enumerate()
            .filter(|(_, s)| predicate(s))
            .map(|(i, _)| i)
            .collect();
        self.take(&positions)
    }

    /// Position-aligned boolean mask over the site rows.
    pub fn subset_mask(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(ProfileError::MaskLength {
                expected: self.len(),
                got: mask.len(),
            });
        }
        let positions: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        Ok(self.take(&positions))
    }

    fn check_position(&self, index: usize) -> Result<usize> {
        if index < self.len() {
            Ok(index)
        } else {
            Err(ProfileError::PositionOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Copy out the given profile positions. Repeats are dropped so ids stay
    /// unique; the first occurrence fixes the order.
    fn take(&self, positions: &[usize]) -> Self {
        let mut seen = BTreeSet::new();
        let mut profile_ids = Vec::new();
        let mut spans = Vec::new();
        let mut horizons = Vec::new();
        let mut site = Vec::new();

        for &pos in positions {
            if !seen.insert(pos) {
                log::warn!("profile '{}' selected more than once; keeping the first", self.profile_ids[pos]);
                continue;
            }
            let start = horizons.len();
            horizons.extend_from_slice(&self.horizons[self.spans[pos].clone()]);
            spans.push(start..horizons.len());
            profile_ids.push(self.profile_ids[pos].clone());
            site.push(self.site[pos].clone());
        }

        let index = profile_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        ProfileCollection {
            config: self.config.clone(),
            profile_ids,
            spans,
            index,
            horizons,
            horizon_columns: self.horizon_columns.clone(),
            site,
            site_columns: self.site_columns.clone(),
            metadata: self.metadata.clone(),
            crs: self.crs.clone(),
        }
    }
}

impl fmt::Display for ProfileCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ProfileCollection: {} profiles, {} horizons",
            self.len(),
            self.horizons.len()
        )?;
        let deepest = self.depths(DepthSummary::Max);
        if let (Some(lo), Some(hi)) = (
            deepest.iter().map(|d| d.depth).reduce(f64::min),
            deepest.iter().map(|d| d.depth).reduce(f64::max),
        ) {
            writeln!(f, "  profile depth range: {lo} - {hi}")?;
        }
        let ids: Vec<&str> = self.profile_ids.iter().take(6).map(String::as_str).collect();
        let more = if self.len() > ids.len() { ", ..." } else { "" };
        writeln!(f, "  profile ids: [{}{more}]", ids.join(", "))?;
        writeln!(f, "  horizon attributes: [{}]", self.horizon_columns.join(", "))?;
        writeln!(f, "  site attributes: [{}]", self.site_columns.join(", "))?;
        write!(f, "  crs: {}", self.crs.as_deref().unwrap_or("<none>"))
    }
}

// ---------------------------------------------------------------------------
// Row resolution
// ---------------------------------------------------------------------------

fn resolve_horizon(
    row_no: usize,
    row: &Record,
    config: &CollectionConfig,
    attribute_columns: &[String],
) -> Result<Horizon> {
    let cell = |name: &str| row.get(name).cloned().unwrap_or(AttrValue::Null);

    let profile_id = cell(&config.idname)
        .to_key()
        .ok_or(ProfileError::MissingProfileId { row: row_no })?;

    let depth = |column: &str| -> Result<f64> {
        let value = cell(column);
        let parsed = match &value {
            AttrValue::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        };
        parsed.ok_or_else(|| ProfileError::DepthNotNumeric {
            profile_id: profile_id.clone(),
            column: column.to_string(),
            value: value.to_string(),
        })
    };
    let top = depth(&config.depthcols.0)?;
    let bottom = depth(&config.depthcols.1)?;

    let designation = config
        .hzdesgncol
        .as_deref()
        .and_then(|c| cell(c).to_key());

    let attributes = attribute_columns
        .iter()
        .map(|c| (c.clone(), cell(c)))
        .collect();

    Ok(Horizon {
        source_row: row_no,
        profile_id: profile_id.clone(),
        hzid: cell(&config.hzidname),
        top,
        bottom,
        designation,
        attributes,
    })
}

/// Align site rows with `profile_ids`. Rows for unknown profiles and repeated
/// rows are dropped with a warning; profiles without a row get a bare site.
fn resolve_sites(
    table: &Table,
    config: &CollectionConfig,
    profile_ids: &[String],
    index: &HashMap<String, usize>,
) -> (Vec<Site>, Vec<String>) {
    let site_columns: Vec<String> = table
        .columns()
        .iter()
        .filter(|c| **c != config.idname)
        .cloned()
        .collect();

    let mut slots: Vec<Option<Site>> = vec![None; profile_ids.len()];
    for row in table.rows() {
        let Some(id) = row.get(&config.idname).and_then(AttrValue::to_key) else {
            log::warn!("site row without a profile id skipped");
            continue;
        };
        let Some(&pos) = index.get(&id) else {
            log::warn!("site row for unknown profile '{id}' skipped");
            continue;
        };
        if slots[pos].is_some() {
            log::warn!("duplicate site row for profile '{id}' skipped");
            continue;
        }
        let attributes = site_columns
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(AttrValue::Null)))
            .collect();
        slots[pos] = Some(Site {
            profile_id: id,
            attributes,
        });
    }

    let site = slots
        .into_iter()
        .zip(profile_ids)
        .map(|(slot, id)| slot.unwrap_or_else(|| Site::bare(id.clone())))
        .collect();
    (site, site_columns)
}
