//! End-to-end checks on a three-profile collection.

use std::collections::BTreeMap;

use rusty_pedon::render::{sketch_profiles, ColorSpec};
use rusty_pedon::{
    import_data_sheet, AttrValue, CollectionConfig, DepthSummary, GlomOptions, Horizon,
    ProfileCollection, ProfileError, SchemaTemplate, Table,
};

fn text(values: &[&str]) -> Vec<AttrValue> {
    values.iter().map(|v| AttrValue::from(*v)).collect()
}

fn ints(values: &[i64]) -> Vec<AttrValue> {
    values.iter().map(|v| AttrValue::from(*v)).collect()
}

fn horizons() -> Table {
    Table::from_columns(vec![
        ("id", text(&["P1", "P1", "P1", "P1", "P2", "P2", "P2", "P3", "P3"])),
        ("hzid", text(&["H1", "H2", "H3", "H4", "H5", "H6", "H7", "H8", "H9"])),
        ("top", ints(&[0, 10, 25, 50, 0, 15, 40, 0, 5])),
        ("bottom", ints(&[10, 25, 50, 80, 15, 40, 100, 5, 20])),
        ("hzname", text(&["A", "Bt1", "Bt2", "C", "Ap", "Bw", "BC", "O", "R"])),
        ("clay", ints(&[15, 35, 40, 20, 20, 28, 25, 5, 2])),
        (
            "color",
            text(&[
                "#A0522D", "#8B4513", "#8B4513", "#D2B48C", "#654321", "#A0522D", "#CD853F", "#000000",
                "#808080",
            ]),
        ),
    ])
    .unwrap()
}

fn site() -> Table {
    Table::from_columns(vec![
        ("id", text(&["P1", "P2", "P3"])),
        ("x", ints(&[100, 150, 120])),
        ("y", ints(&[200, 210, 190])),
        ("site_name", text(&["Site Alpha", "Site Beta", "Site Gamma"])),
    ])
    .unwrap()
}

fn sample_spc() -> ProfileCollection {
    let config = CollectionConfig::default()
        .with_idname("id")
        .with_hzidname("hzid")
        .with_depthcols("top", "bottom")
        .with_hzdesgncol("hzname");
    let metadata = BTreeMap::from([
        ("project".to_string(), "Demo".to_string()),
        ("location".to_string(), "Test Area".to_string()),
    ]);
    ProfileCollection::new(&horizons(), Some(&site()), config)
        .unwrap()
        .with_metadata(metadata)
        .with_crs("EPSG:4326")
}

fn ids(spc: &ProfileCollection) -> Vec<&str> {
    spc.profile_ids().iter().map(String::as_str).collect()
}

fn two_horizon_table(tops: [i64; 2], bottoms: [i64; 2], id: &str) -> Table {
    Table::from_columns(vec![
        ("id", text(&[id, id])),
        ("hzid", text(&["a", "b"])),
        ("top", ints(&tops)),
        ("bottom", ints(&bottoms)),
    ])
    .unwrap()
}

// ─── Construction ───────────────────────────────────────────────────────────

#[test]
fn creation_and_properties() {
    let spc = sample_spc();
    assert_eq!(spc.len(), 3);
    assert_eq!(ids(&spc), vec!["P1", "P2", "P3"]);
    assert_eq!(spc.crs(), Some("EPSG:4326"));
    assert_eq!(spc.metadata().get("project").map(String::as_str), Some("Demo"));
    assert!(spc.site_columns().contains(&"site_name".to_string()));
    assert_eq!(spc.horizon_columns(), &["clay".to_string(), "color".to_string()]);
}

#[test]
fn overlapping_horizons_are_rejected() {
    let t = two_horizon_table([0, 10], [15, 20], "P_overlap");
    let err = ProfileCollection::new(&t, None, CollectionConfig::default()).unwrap_err();
    assert!(matches!(err, ProfileError::Overlap { .. }));
    assert!(err.to_string().contains("P_overlap"));
    assert!(err.to_string().contains("has overlapping horizons"));
}

#[test]
fn gapped_horizons_are_rejected() {
    let t = two_horizon_table([0, 20], [10, 30], "P_gap");
    let err = ProfileCollection::new(&t, None, CollectionConfig::default()).unwrap_err();
    assert!(matches!(err, ProfileError::Gap { .. }));
    assert!(err.to_string().contains("P_gap"));
    assert!(err.to_string().contains("has depth gaps between horizons"));
}

#[test]
fn shared_top_depth_is_an_overlap() {
    let t = two_horizon_table([0, 0], [10, 20], "P_same_top");
    let err = ProfileCollection::new(&t, None, CollectionConfig::default()).unwrap_err();
    assert!(matches!(err, ProfileError::Overlap { ref profile_id, .. } if profile_id == "P_same_top"));
}

#[test]
fn horizon_ids_may_repeat_across_profiles() {
    let t = Table::from_columns(vec![
        ("id", text(&["P", "Q"])),
        ("hzid", ints(&[1, 1])),
        ("top", ints(&[0, 0])),
        ("bottom", ints(&[10, 20])),
    ])
    .unwrap();
    let spc = ProfileCollection::new(&t, None, CollectionConfig::default()).unwrap();
    assert_eq!(spc.len(), 2);

    let dup = Table::from_columns(vec![
        ("id", text(&["P", "P"])),
        ("hzid", ints(&[1, 1])),
        ("top", ints(&[0, 10])),
        ("bottom", ints(&[10, 20])),
    ])
    .unwrap();
    let err = ProfileCollection::new(&dup, None, CollectionConfig::default()).unwrap_err();
    assert!(matches!(err, ProfileError::DuplicateHorizonId { .. }));
}

#[test]
fn single_horizon_profile_is_valid_anywhere() {
    let t = Table::from_columns(vec![
        ("id", text(&["deep"])),
        ("hzid", text(&["only"])),
        ("top", ints(&[130])),
        ("bottom", ints(&[131])),
    ])
    .unwrap();
    let spc = ProfileCollection::new(&t, None, CollectionConfig::default()).unwrap();
    assert_eq!(spc.len(), 1);
}

// ─── Queries ────────────────────────────────────────────────────────────────

#[test]
fn depths_thickness_and_get_profile() {
    let spc = sample_spc();

    let depths = spc.depths(DepthSummary::Max);
    assert_eq!(depths.len(), 3);
    assert_eq!(depths[0].profile_id, "P1");
    assert_eq!(depths[0].depth, 80.0);
    assert_eq!(depths[1].depth, 100.0);
    assert_eq!(depths[2].depth, 20.0);

    let thickness = spc.thickness();
    assert_eq!(thickness.len(), 9);
    assert_eq!(thickness[0].thickness, 10.0);
    assert_eq!(thickness[6].thickness, 60.0);

    let p1 = spc.get_profile("P1").unwrap();
    assert_eq!(p1.len(), 4);
    assert_eq!(p1[1].designation.as_deref(), Some("Bt1"));
    assert_eq!(spc.get_profile_table("P1").unwrap().len(), 4);

    assert_eq!(
        spc.get_profile("P9").unwrap_err(),
        ProfileError::NotFound("P9".into())
    );
}

#[test]
fn profile_apply_matches_direct_mean() {
    let spc = sample_spc();
    let mean_clay = |hz: &[Horizon]| -> Option<f64> {
        let values: Vec<f64> = hz
            .iter()
            .filter_map(|h| h.get("clay").and_then(AttrValue::as_f64))
            .collect();
        (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
    };

    let result = spc.profile_apply(mean_clay);
    assert_eq!(
        result.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
        vec!["P1", "P2", "P3"]
    );
    assert!((result[0].1.unwrap() - 27.5).abs() < 1e-9);
    assert!((result[1].1.unwrap() - 24.333333333333332).abs() < 1e-9);
    assert!((result[2].1.unwrap() - 3.5).abs() < 1e-9);
}

// ─── Subsetting ─────────────────────────────────────────────────────────────

#[test]
fn subset_by_position_ids_slice_and_mask() {
    let spc = sample_spc();

    let first = spc.subset(0usize).unwrap();
    assert_eq!(ids(&first), vec!["P1"]);

    let named = spc.subset(["P3", "P1"]).unwrap();
    assert_eq!(ids(&named), vec!["P3", "P1"]);
    assert_eq!(named.horizons().len(), 6);
    assert_eq!(named.site()[0].profile_id, "P3");

    let sliced = spc.subset(1usize..3).unwrap();
    assert_eq!(ids(&sliced), vec!["P2", "P3"]);

    let by_site = spc.filter_sites(|s| {
        s.get("site_name")
            .and_then(AttrValue::as_str)
            .is_some_and(|name| name.contains("Beta") || name.contains("Gamma"))
    });
    assert_eq!(ids(&by_site), vec!["P2", "P3"]);

    let masked = spc.subset_mask(&[false, true, true]).unwrap();
    assert_eq!(ids(&masked), ids(&by_site));
}

#[test]
fn subsets_are_independent_of_the_parent() {
    let spc = sample_spc();
    let sub = spc.subset(vec![2usize, 0]).unwrap();
    drop(sub.subset(0usize).unwrap());

    assert_eq!(ids(&spc), vec!["P1", "P2", "P3"]);
    assert_eq!(spc.horizons().len(), 9);
    assert_eq!(sub.len(), 2);
    assert_eq!(sub.crs(), Some("EPSG:4326"));
    assert_eq!(sub.get_profile("P3").unwrap().len(), 2);
    assert!(sub.get_profile("P2").is_err());
}

// ─── Glom ───────────────────────────────────────────────────────────────────

const BREAKS: [f64; 5] = [0.0, 15.0, 30.0, 60.0, 100.0];

#[test]
fn glom_dominant_clay_for_p1() {
    let spc = sample_spc();
    let out = spc.glom(&GlomOptions::new(BREAKS).var("clay")).unwrap();
    let p1: Vec<AttrValue> = out.values_for("P1", "clay").into_iter().map(|(_, _, v)| v).collect();
    assert_eq!(p1, ints(&[15, 35, 40, 20]));
}

#[test]
fn glom_dominant_designation_and_pivot() {
    let spc = sample_spc();
    let out = spc.glom(&GlomOptions::new(BREAKS).var("hzname")).unwrap();

    let wide = out.pivot("hzname").unwrap();
    assert_eq!(wide.len(), 4);
    assert_eq!(wide.columns().len(), 5);
    assert_eq!(wide.value(0, "P1"), &AttrValue::from("A"));
    assert_eq!(wide.value(0, "P2"), &AttrValue::from("Ap"));
    // P3's [0,15) overlaps O by 5 and R by 10.
    assert_eq!(wide.value(0, "P3"), &AttrValue::from("R"));
    assert_eq!(wide.value(1, "P3"), &AttrValue::from("R"));
    assert_eq!(wide.value(2, "P3"), &AttrValue::Null);
}

#[test]
fn glom_fill_decides_rows_past_the_bottom() {
    let spc = sample_spc();

    let filled = spc.glom(&GlomOptions::new(BREAKS).var("clay").fill(true)).unwrap();
    assert_eq!(filled.len(), 3 * 4);
    assert_eq!(filled.value("P3", 60.0, "clay"), Some(&AttrValue::Null));

    let trimmed = spc.glom(&GlomOptions::new(BREAKS).var("clay").fill(false)).unwrap();
    assert_eq!(trimmed.len(), 4 + 4 + 2);
    assert_eq!(trimmed.value("P3", 60.0, "clay"), None);
}

#[test]
fn glom_without_vars_uses_every_attribute() {
    let spc = sample_spc();
    let out = spc
        .glom(&GlomOptions::new(vec![0.0, 20.0, 50.0]).fill(false))
        .unwrap();
    assert_eq!(out.variables, vec!["hzname", "clay", "color"]);

    let wide = out.to_wide();
    assert_eq!(wide.columns(), &["id", "top", "bottom", "hzname", "clay", "color"].map(String::from));
    // P1 [20,50): Bt1 5, Bt2 25.
    assert_eq!(wide.value(1, "hzname"), &AttrValue::from("Bt2"));
    assert_eq!(wide.value(1, "clay"), &AttrValue::Integer(40));
    // P3 reaches only the first interval.
    assert_eq!(out.values_for("P3", "clay").len(), 1);
}

// ─── Rendering contract ─────────────────────────────────────────────────────

#[test]
fn sketches_use_literal_colour_column_and_labels() {
    let spc = sample_spc();
    let color = ColorSpec::resolve("color", &spc).unwrap();
    assert_eq!(color, ColorSpec::Column("color".into()));

    let sketches = sketch_profiles(&spc, &color, true).unwrap();
    assert_eq!(sketches.len(), 3);
    assert_eq!(sketches[0].max_depth, 80.0);
    let a = &sketches[0].spans[0];
    assert_eq!((a.color.red, a.color.green, a.color.blue), (0xa0, 0x52, 0x2d));
    assert_eq!(a.label.as_deref(), Some("A"));
}

#[test]
fn fixed_colour_overrides_and_hides_labels() {
    let spc = sample_spc().subset(["P1", "P3"]).unwrap();
    let color = ColorSpec::resolve("sandybrown", &spc).unwrap();
    let sketches = sketch_profiles(&spc, &color, false).unwrap();
    assert!(sketches
        .iter()
        .flat_map(|s| &s.spans)
        .all(|span| span.label.is_none() && (span.color.red, span.color.green, span.color.blue) == (244, 164, 96)));
    assert!(ColorSpec::resolve("not a colour", &spc).is_none());
}

// ─── Import ─────────────────────────────────────────────────────────────────

#[test]
fn import_with_schema_template() {
    let source = Table::from_columns(vec![
        ("profile_id", text(&["P1", "P1", "P2"])),
        ("h_id", ints(&[1, 2, 3])),
        ("d_top", ints(&[0, 10, 0])),
        ("d_bottom", ints(&[10, 25, 15])),
        ("prop", ints(&[5, 8, 9])),
    ])
    .unwrap();
    let template = SchemaTemplate::new()
        .map("profile_id", "id")
        .map("h_id", "hzid")
        .map("d_top", "top")
        .map("d_bottom", "bottom");

    let spc = import_data_sheet(&source, &template).unwrap();
    assert_eq!(spc.len(), 2);
    assert_eq!(spc.config().idname, "id");
    assert_eq!(spc.config().hzidname, "hzid");
    assert_eq!(spc.config().depthcols, ("top".to_string(), "bottom".to_string()));
    assert!(spc.horizon_columns().contains(&"prop".to_string()));
    assert_eq!(spc.horizon_table().len(), 3);
}
