use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::AttrValue;

/// 8-bit sRGB colour, the unit every renderer receives.
pub type Rgb8 = Srgb<u8>;

/// Used for horizons whose colour value is missing.
pub const MISSING_COLOR: Rgb8 = Srgb::new(160, 160, 160);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb8> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.55, 0.5);
            let rgb: Srgb = hsl.into_color();
            rgb.into_format()
        })
        .collect()
}

/// Parse a colour given as `#rrggbb` / `#rgb` hex or a CSS colour name
/// (e.g. "sandybrown").
pub fn parse_color(s: &str) -> Option<Rgb8> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return hex.parse::<Rgb8>().ok();
    }
    palette::named::from_str(&s.to_ascii_lowercase())
}

/// Lowercase `#rrggbb` form.
pub fn to_hex(c: Rgb8) -> String {
    format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: attribute value → colour
// ---------------------------------------------------------------------------

/// Maps the values of one horizon column to colours.
///
/// When every non-null value already names a colour (a Munsell-converted hex
/// column, say) those colours are used as-is; otherwise each distinct value
/// gets a palette colour.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<AttrValue, Rgb8>,
    literal: bool,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<AttrValue>) -> Self {
        let present: Vec<&AttrValue> = unique_values.iter().filter(|v| !v.is_null()).collect();

        let literal: Option<BTreeMap<AttrValue, Rgb8>> = (!present.is_empty())
            .then(|| {
                present
                    .iter()
                    .map(|v| Some(((*v).clone(), parse_color(v.as_str()?)?)))
                    .collect()
            })
            .flatten();

        let (mapping, literal) = match literal {
            Some(mapping) => (mapping, true),
            None => {
                let palette = generate_palette(present.len());
                let mapping = present
                    .into_iter()
                    .cloned()
                    .zip(palette)
                    .collect();
                (mapping, false)
            }
        };

        ColorMap {
            column: column.to_string(),
            mapping,
            literal,
        }
    }

    /// Whether the column's values were colours themselves.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &AttrValue) -> Rgb8 {
        self.mapping.get(value).copied().unwrap_or(MISSING_COLOR)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Rgb8)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_names() {
        assert_eq!(parse_color("#A0522D"), Some(Srgb::new(0xa0, 0x52, 0x2d)));
        assert_eq!(parse_color("#fff"), Some(Srgb::new(255, 255, 255)));
        assert_eq!(parse_color("SandyBrown"), Some(Srgb::new(244, 164, 96)));
        assert_eq!(parse_color("clay loam"), None);
        // Bare hex digits are not accepted as colours.
        assert_eq!(parse_color("add"), None);
    }

    #[test]
    fn hex_round_trip() {
        let c = Srgb::new(0x8b, 0x45, 0x13);
        assert_eq!(to_hex(c), "#8b4513");
        assert_eq!(parse_color(&to_hex(c)), Some(c));
    }

    #[test]
    fn colour_columns_are_used_literally() {
        let values: BTreeSet<AttrValue> = ["#000000", "#808080"].into_iter().map(AttrValue::from).collect();
        let cm = ColorMap::new("color", &values);
        assert!(cm.is_literal());
        assert_eq!(cm.color_for(&AttrValue::from("#808080")), Srgb::new(128, 128, 128));
        assert_eq!(cm.color_for(&AttrValue::Null), MISSING_COLOR);
    }

    #[test]
    fn categories_get_distinct_palette_colours() {
        let values: BTreeSet<AttrValue> = ["A", "Bt1", "C"].into_iter().map(AttrValue::from).collect();
        let cm = ColorMap::new("hzname", &values);
        assert!(!cm.is_literal());
        let legend = cm.legend_entries();
        assert_eq!(legend.len(), 3);
        assert_ne!(legend[0].1, legend[1].1);
        assert_ne!(legend[1].1, legend[2].1);
    }

    #[test]
    fn empty_palette() {
        assert!(generate_palette(0).is_empty());
    }
}
