use std::collections::{BTreeMap, BTreeSet};

use super::collection::ProfileCollection;
use super::model::{AttrValue, Site};

// ---------------------------------------------------------------------------
// Site filter: which unique values are selected per site column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// A column absent from the map is unconstrained; a present but empty set
/// selects nothing.
pub type FilterState = BTreeMap<String, BTreeSet<AttrValue>>;

/// Sorted distinct values of every site column (nulls included).
pub fn site_unique_values(collection: &ProfileCollection) -> FilterState {
    collection
        .site_columns()
        .iter()
        .map(|col| {
            let values = collection
                .site()
                .iter()
                .map(|s| s.get(col).cloned().unwrap_or(AttrValue::Null))
                .collect();
            (col.clone(), values)
        })
        .collect()
}

/// Initialise a [`FilterState`] with all values selected (i.e., keep everything).
pub fn init_filter_state(collection: &ProfileCollection) -> FilterState {
    site_unique_values(collection)
}

/// Whether one site row passes every active column filter.
pub fn site_matches(site: &Site, filters: &FilterState) -> bool {
    filters.iter().all(|(col, selected)| {
        let value = site.get(col).unwrap_or(&AttrValue::Null);
        selected.contains(value)
    })
}

/// Subset `collection` to profiles whose site row passes `filters`,
/// preserving collection order.
pub fn filtered_collection(collection: &ProfileCollection, filters: &FilterState) -> ProfileCollection {
    collection.filter_sites(|site| site_matches(site, filters))
}
