//! Soil profile collections.
//!
//! A [`ProfileCollection`] holds horizon rows (depth-bounded layers) and
//! optional site rows for a set of soil profiles. Construction validates that
//! each profile's horizons stack without gaps or overlaps; afterwards the
//! collection supports subsetting, per-profile reductions, and "glom", which
//! re-slices every profile onto shared depth intervals.

pub mod color;
pub mod data;
pub mod error;
pub mod render;

pub use data::collection::{
    CollectionConfig, DepthSummary, HorizonThickness, ProfileCollection, ProfileDepth, Selection,
};
pub use data::glom::{Aggregation, GlomFrame, GlomOptions, GlomRow};
pub use data::import::{import_data_sheet, load_collection, SchemaTemplate};
pub use data::model::{AttrValue, Horizon, Site};
pub use data::table::{Record, Table};
pub use error::{ProfileError, Result};
