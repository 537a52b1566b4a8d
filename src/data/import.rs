//! Schema mapping: turn an arbitrary source table into a collection.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::collection::{CollectionConfig, ProfileCollection};
use super::loader::load_file;
use super::model::AttrValue;
use super::table::{Record, Table};
use crate::error::{ProfileError, Result};

/// Designation column picked up automatically when present after renaming.
pub const DEFAULT_DESIGNATION: &str = "hzname";

/// How source columns map onto the canonical schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaTemplate {
    /// source column → canonical name ("id", "hzid", "top", "bottom", or any
    /// attribute name). Unmapped columns keep their names.
    pub rename: BTreeMap<String, String>,
    /// Canonical names of columns that describe the whole profile and belong
    /// in the site table.
    pub site_columns: BTreeSet<String>,
    /// Also move every unmapped column whose value never varies within a
    /// profile to the site table.
    pub infer_site_columns: bool,
}

impl SchemaTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.rename.insert(source.into(), target.into());
        self
    }

    pub fn site_column(mut self, name: impl Into<String>) -> Self {
        self.site_columns.insert(name.into());
        self
    }

    pub fn infer_site_columns(mut self, infer: bool) -> Self {
        self.infer_site_columns = infer;
        self
    }
}

/// Rename `source` per `template`, split site columns off, and build a
/// collection under the default role names.
pub fn import_data_sheet(source: &Table, template: &SchemaTemplate) -> Result<ProfileCollection> {
    let mut horizons = source.clone();
    horizons.rename(&template.rename);

    let mut config = CollectionConfig::default();
    if horizons.has_column(DEFAULT_DESIGNATION) {
        config = config.with_hzdesgncol(DEFAULT_DESIGNATION);
    }
    if !horizons.has_column(&config.idname) {
        return Err(ProfileError::Schema {
            table: "horizon",
            column: config.idname.clone(),
        });
    }

    let mut site_columns: Vec<String> = horizons
        .columns()
        .iter()
        .filter(|c| template.site_columns.contains(*c))
        .cloned()
        .collect();
    if let Some(missing) = template.site_columns.iter().find(|c| !horizons.has_column(c)) {
        return Err(ProfileError::Schema {
            table: "source",
            column: missing.clone(),
        });
    }
    if template.infer_site_columns {
        let mapped: BTreeSet<&String> = template.rename.values().collect();
        for col in horizons.columns() {
            let candidate = !mapped.contains(col)
                && !site_columns.contains(col)
                && config.hzdesgncol.as_deref() != Some(col.as_str())
                && ![&config.idname, &config.hzidname, &config.depthcols.0, &config.depthcols.1]
                    .contains(&col);
            if candidate && constant_within_profiles(&horizons, &config.idname, col) {
                site_columns.push(col.clone());
            }
        }
    }

    let site = if site_columns.is_empty() {
        None
    } else {
        Some(split_site(&mut horizons, &config.idname, &site_columns))
    };

    log::debug!(
        "importing {} rows; site columns {:?}",
        horizons.len(),
        site_columns
    );
    ProfileCollection::new(&horizons, site.as_ref(), config)
}

/// Load a file and import it in one step.
pub fn load_collection(path: &Path, template: &SchemaTemplate) -> anyhow::Result<ProfileCollection> {
    let table = load_file(path)?;
    let collection = import_data_sheet(&table, template)
        .with_context(|| format!("importing {}", path.display()))?;
    Ok(collection)
}

fn constant_within_profiles(table: &Table, idname: &str, column: &str) -> bool {
    let mut first: BTreeMap<&AttrValue, &AttrValue> = BTreeMap::new();
    table.rows().iter().enumerate().all(|(i, _)| {
        let id = table.value(i, idname);
        let value = table.value(i, column);
        *first.entry(id).or_insert(value) == value
    })
}

/// Move `columns` out of `horizons` into a new site table keyed by `idname`,
/// taking each profile's first value.
fn split_site(horizons: &mut Table, idname: &str, columns: &[String]) -> Table {
    let mut site = Table::new();
    site.add_column(idname.to_string());
    for c in columns {
        site.add_column(c.clone());
    }

    let mut seen = BTreeSet::new();
    for row in horizons.rows() {
        let id = row.get(idname).cloned().unwrap_or(AttrValue::Null);
        if !seen.insert(id.clone()) {
            continue;
        }
        let mut record = Record::new();
        record.insert(idname.to_string(), id);
        for c in columns {
            record.insert(c.clone(), row.get(c).cloned().unwrap_or(AttrValue::Null));
        }
        site.push_row(record);
    }

    let drop: BTreeSet<String> = columns.iter().cloned().collect();
    horizons.drop_columns(&drop);
    site
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Table {
        Table::from_columns(vec![
            ("profile_id", vec![AttrValue::from("P1"), "P1".into(), "P2".into()]),
            ("h_id", vec![1.into(), 2.into(), 3.into()]),
            ("d_top", vec![0.into(), 10.into(), 0.into()]),
            ("d_bottom", vec![10.into(), 25.into(), 15.into()]),
            ("prop", vec![5.into(), 8.into(), 9.into()]),
            ("region", vec!["north".into(), "north".into(), "south".into()]),
        ])
        .unwrap()
    }

    fn template() -> SchemaTemplate {
        SchemaTemplate::new()
            .map("profile_id", "id")
            .map("h_id", "hzid")
            .map("d_top", "top")
            .map("d_bottom", "bottom")
    }

    #[test]
    fn renamed_columns_take_their_roles() {
        let spc = import_data_sheet(&source(), &template()).unwrap();
        assert_eq!(spc.len(), 2);
        assert_eq!(spc.config().idname, "id");
        assert_eq!(spc.config().depthcols, ("top".to_string(), "bottom".to_string()));
        assert!(spc.horizon_columns().contains(&"prop".to_string()));
        assert!(spc.horizon_columns().contains(&"region".to_string()));
        assert_eq!(spc.horizons().len(), 3);
    }

    #[test]
    fn explicit_site_columns_move_to_site() {
        let spc = import_data_sheet(&source(), &template().site_column("region")).unwrap();
        assert!(!spc.horizon_columns().contains(&"region".to_string()));
        assert_eq!(spc.site_columns(), &["region".to_string()]);
        assert_eq!(spc.get_site("P2").unwrap().get("region"), Some(&AttrValue::from("south")));
    }

    #[test]
    fn constant_columns_are_inferred_as_site() {
        let spc = import_data_sheet(&source(), &template().infer_site_columns(true)).unwrap();
        assert_eq!(spc.site_columns(), &["region".to_string()]);
        assert!(spc.horizon_columns().contains(&"prop".to_string()));
    }

    #[test]
    fn unmapped_role_is_a_schema_error() {
        let t = SchemaTemplate::new().map("profile_id", "id");
        let err = import_data_sheet(&source(), &t).unwrap_err();
        assert!(matches!(err, ProfileError::Schema { .. }));
    }

    #[test]
    fn designation_is_detected() {
        let mut src = source();
        src.rename(&BTreeMap::from([("region".to_string(), "hzname".to_string())]));
        let spc = import_data_sheet(&src, &template()).unwrap();
        assert_eq!(spc.config().hzdesgncol.as_deref(), Some("hzname"));
        assert_eq!(spc.get_profile("P2").unwrap()[0].designation.as_deref(), Some("south"));
    }
}
