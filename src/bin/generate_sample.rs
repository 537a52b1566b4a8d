//! Writes `sample_horizons.parquet`: a handful of synthetic soil profiles in
//! the flat horizon layout the viewer imports.

use std::sync::Arc;

use anyhow::{Context, Result};

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Horizon sequences to draw from: (designation, clay %, colour).
const SEQUENCES: &[&[(&str, f64, &str)]] = &[
    &[("A", 15.0, "#5c4033"), ("Bt1", 35.0, "#8b4513"), ("Bt2", 40.0, "#a0522d"), ("C", 20.0, "#d2b48c")],
    &[("Ap", 20.0, "#654321"), ("Bw", 28.0, "#a0522d"), ("BC", 25.0, "#cd853f")],
    &[("O", 5.0, "#000000"), ("R", 2.0, "#808080")],
    &[("A", 18.0, "#3b2f2f"), ("E", 10.0, "#c2b280"), ("Bhs", 12.0, "#8b4000"), ("C", 8.0, "#deb887")],
];

const LANDFORMS: &[&str] = &["ridge", "shoulder", "backslope", "footslope", "valley"];

/// Small deterministic generator (64-bit LCG), enough for jittering depths.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_unit()
    }
}

fn main() -> Result<()> {
    let mut rng = Lcg(7);

    let mut ids = Vec::new();
    let mut hzids = Vec::new();
    let mut tops = Vec::new();
    let mut bottoms = Vec::new();
    let mut names = Vec::new();
    let mut clays = Vec::new();
    let mut colors = Vec::new();
    let mut landforms = Vec::new();

    let mut hz_counter: i64 = 0;
    for p in 0..12 {
        let id = format!("P{:02}", p + 1);
        let sequence = SEQUENCES[p % SEQUENCES.len()];
        let landform = LANDFORMS[p % LANDFORMS.len()];

        let mut top = 0.0;
        for &(name, clay, color) in sequence {
            // Whole-centimetre boundaries keep adjacent horizons exactly contiguous.
            let bottom = top + rng.range(5.0, 40.0).round();
            ids.push(id.clone());
            hzids.push(hz_counter);
            tops.push(top);
            bottoms.push(bottom);
            names.push(name);
            clays.push((clay + rng.range(-4.0, 4.0)).max(0.0));
            colors.push(color);
            landforms.push(landform);
            hz_counter += 1;
            top = bottom;
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("hzid", DataType::Int64, false),
        Field::new("top", DataType::Float64, false),
        Field::new("bottom", DataType::Float64, false),
        Field::new("hzname", DataType::Utf8, false),
        Field::new("clay", DataType::Float64, false),
        Field::new("color", DataType::Utf8, false),
        Field::new("landform", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(Int64Array::from(hzids)),
            Arc::new(Float64Array::from(tops)),
            Arc::new(Float64Array::from(bottoms)),
            Arc::new(StringArray::from(names)),
            Arc::new(Float64Array::from(clays)),
            Arc::new(StringArray::from(colors)),
            Arc::new(StringArray::from(landforms)),
        ],
    )
    .context("building record batch")?;

    let output_path = "sample_horizons.parquet";
    let file = std::fs::File::create(output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {hz_counter} horizons in 12 profiles to {output_path}");
    Ok(())
}
