//! What a plotting surface needs to draw profile sketches.
//!
//! The data here is renderer-agnostic: per profile, an ordered list of depth
//! spans with a colour and an optional label. The desktop viewer draws these
//! with `egui_plot`; any other surface can consume the same structs.

use std::collections::BTreeSet;

use crate::color::{parse_color, ColorMap, Rgb8, MISSING_COLOR};
use crate::data::collection::ProfileCollection;
use crate::data::model::AttrValue;
use crate::error::{ProfileError, Result};

/// How horizons are coloured.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpec {
    /// Colour by a horizon column (literal colours or categories).
    Column(String),
    /// One colour for every horizon.
    Fixed(Rgb8),
}

impl ColorSpec {
    /// Interpret `s` as a horizon column when the collection has one by that
    /// name, otherwise as a colour. `None` if it is neither.
    pub fn resolve(s: &str, collection: &ProfileCollection) -> Option<Self> {
        if collection.has_horizon_column(s) {
            Some(ColorSpec::Column(s.to_string()))
        } else {
            parse_color(s).map(ColorSpec::Fixed)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HorizonSpan {
    pub top: f64,
    pub bottom: f64,
    pub color: Rgb8,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSketch {
    pub profile_id: String,
    pub max_depth: f64,
    pub spans: Vec<HorizonSpan>,
}

fn column_color_map(collection: &ProfileCollection, name: &str) -> Result<ColorMap> {
    if !collection.has_horizon_column(name) {
        return Err(ProfileError::AttributeNotFound(name.to_string()));
    }
    let values: BTreeSet<AttrValue> = collection
        .horizons()
        .iter()
        .filter_map(|h| collection.horizon_value(h, name))
        .collect();
    Ok(ColorMap::new(name, &values))
}

/// Legend entries for a colour choice. Empty for a fixed colour or when the
/// column's values are colours themselves.
pub fn color_legend(collection: &ProfileCollection, color: &ColorSpec) -> Result<Vec<(String, Rgb8)>> {
    match color {
        ColorSpec::Column(name) => {
            let cm = column_color_map(collection, name)?;
            Ok(if cm.is_literal() { Vec::new() } else { cm.legend_entries() })
        }
        ColorSpec::Fixed(_) => Ok(Vec::new()),
    }
}

/// Build one sketch per profile, in collection order.
pub fn sketch_profiles(
    collection: &ProfileCollection,
    color: &ColorSpec,
    label_hz: bool,
) -> Result<Vec<ProfileSketch>> {
    let color_map = match color {
        ColorSpec::Column(name) => Some(column_color_map(collection, name)?),
        ColorSpec::Fixed(_) => None,
    };

    let sketches = collection
        .profiles()
        .map(|(id, horizons)| {
            let spans = horizons
                .iter()
                .map(|h| {
                    let rgb = match (color, &color_map) {
                        (ColorSpec::Fixed(c), _) => *c,
                        (ColorSpec::Column(name), Some(cm)) => collection
                            .horizon_value(h, name)
                            .map(|v| cm.color_for(&v))
                            .unwrap_or(MISSING_COLOR),
                        (ColorSpec::Column(_), None) => MISSING_COLOR,
                    };
                    HorizonSpan {
                        top: h.top,
                        bottom: h.bottom,
                        color: rgb,
                        label: if label_hz { h.designation.clone() } else { None },
                    }
                })
                .collect::<Vec<_>>();
            ProfileSketch {
                profile_id: id.to_string(),
                max_depth: spans.last().map(|s| s.bottom).unwrap_or(0.0),
                spans,
            }
        })
        .collect();
    Ok(sketches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::collection::CollectionConfig;
    use crate::data::table::Table;

    fn spc() -> ProfileCollection {
        let t = Table::from_columns(vec![
            ("id", vec![AttrValue::from("P1"), "P1".into(), "P2".into()]),
            ("hzid", vec![AttrValue::from(1), 2.into(), 3.into()]),
            ("top", vec![AttrValue::from(0), 10.into(), 0.into()]),
            ("bottom", vec![AttrValue::from(10), 30.into(), 20.into()]),
            ("hzname", vec![AttrValue::from("A"), "Bt".into(), "A".into()]),
            ("texture", vec![AttrValue::from("loam"), AttrValue::Null, "sand".into()]),
        ])
        .unwrap();
        ProfileCollection::new(&t, None, CollectionConfig::default().with_hzdesgncol("hzname")).unwrap()
    }

    #[test]
    fn categories_share_colours_across_profiles() {
        let spc = spc();
        let sketches = sketch_profiles(&spc, &ColorSpec::Column("hzname".into()), true).unwrap();
        assert_eq!(sketches[0].spans[0].color, sketches[1].spans[0].color);
        assert_ne!(sketches[0].spans[0].color, sketches[0].spans[1].color);
        assert_eq!(sketches[1].max_depth, 20.0);
    }

    #[test]
    fn missing_values_are_grey() {
        let spc = spc();
        let sketches = sketch_profiles(&spc, &ColorSpec::Column("texture".into()), false).unwrap();
        assert_eq!(sketches[0].spans[1].color, MISSING_COLOR);
        assert!(sketches[0].spans[0].label.is_none());
    }

    #[test]
    fn legend_lists_categories_only() {
        let spc = spc();
        let legend = color_legend(&spc, &ColorSpec::Column("texture".into())).unwrap();
        assert_eq!(
            legend.iter().map(|(v, _)| v.as_str()).collect::<Vec<_>>(),
            vec!["loam", "sand"]
        );
        assert!(color_legend(&spc, &ColorSpec::Fixed(MISSING_COLOR)).unwrap().is_empty());
    }

    #[test]
    fn unknown_colour_column_fails() {
        let err = sketch_profiles(&spc(), &ColorSpec::Column("ph".into()), true).unwrap_err();
        assert_eq!(err, ProfileError::AttributeNotFound("ph".into()));
    }
}
