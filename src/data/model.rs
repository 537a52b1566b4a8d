use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AttrValue – a single cell in a horizon or site table
// ---------------------------------------------------------------------------

/// A tagged attribute value. Numeric and categorical data are told apart once,
/// when a row is built, so downstream code never has to sniff types.
/// Used as a key in `BTreeMap` / `BTreeSet` and hash sets, so equality,
/// ordering and hashing are all defined by hand on top of `total_cmp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for AttrValue {}

impl PartialOrd for AttrValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use AttrValue::*;
        fn rank(v: &AttrValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) | Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Numeric ties keep Integer before Float so Ord agrees with Eq.
            (Integer(a), Float(b)) => (*a as f64)
                .total_cmp(b)
                .then(std::cmp::Ordering::Less),
            (Float(a), Integer(b)) => a
                .total_cmp(&(*b as f64))
                .then(std::cmp::Ordering::Greater),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for AttrValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            AttrValue::Text(s) => s.hash(state),
            AttrValue::Integer(i) => i.hash(state),
            AttrValue::Float(f) => f.to_bits().hash(state),
            AttrValue::Bool(b) => b.hash(state),
            AttrValue::Null => {}
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{s}"),
            AttrValue::Integer(i) => write!(f, "{i}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Integer(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Integer(i as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

impl AttrValue {
    /// Numeric view of the value; `None` for categorical data and nulls.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Render the value as an identifier. Nulls and blank strings have none.
    pub fn to_key(&self) -> Option<String> {
        match self {
            AttrValue::Null => None,
            AttrValue::Text(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Horizon – one depth-bounded layer of a profile
// ---------------------------------------------------------------------------

/// A horizon row with its role columns resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    /// Row number in the horizon table the collection was built from.
    #[serde(default)]
    pub source_row: usize,
    pub profile_id: String,
    /// Unique within the owning profile.
    pub hzid: AttrValue,
    pub top: f64,
    pub bottom: f64,
    /// Horizon designation (e.g. "Bt1") when a designation column is configured.
    pub designation: Option<String>,
    /// Every non-role column: column_name → value.
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Horizon {
    pub fn thickness(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Length of the part of this horizon inside `[top, bottom)`.
    pub fn overlap(&self, top: f64, bottom: f64) -> f64 {
        (self.bottom.min(bottom) - self.top.max(top)).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Site – profile-level attributes
// ---------------------------------------------------------------------------

/// One row of profile-level (non depth-varying) data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub profile_id: String,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Site {
    /// A site row carrying nothing but the profile id.
    pub fn bare(profile_id: impl Into<String>) -> Self {
        Site {
            profile_id: profile_id.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert!(AttrValue::Integer(2) < AttrValue::Float(2.5));
        assert!(AttrValue::Float(10.0) > AttrValue::Integer(3));
        assert!(AttrValue::Null < AttrValue::Bool(false));
        assert!(AttrValue::Integer(1_000) < AttrValue::from("a"));
    }

    #[test]
    fn float_equality_hashing_and_order_agree() {
        use std::collections::{BTreeSet, HashSet};

        let zeros = [AttrValue::Float(0.0), AttrValue::Float(-0.0)];
        assert_ne!(zeros[0], zeros[1]);
        assert_eq!(zeros.iter().cloned().collect::<HashSet<_>>().len(), 2);
        assert_eq!(zeros.iter().cloned().collect::<BTreeSet<_>>().len(), 2);

        let nan = AttrValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(AttrValue::Integer(2), AttrValue::Float(2.0));
    }

    #[test]
    fn blank_values_have_no_key() {
        assert_eq!(AttrValue::Null.to_key(), None);
        assert_eq!(AttrValue::from("  ").to_key(), None);
        assert_eq!(AttrValue::from(7).to_key().as_deref(), Some("7"));
        assert_eq!(AttrValue::from("P1").to_key().as_deref(), Some("P1"));
    }

    #[test]
    fn horizon_overlap_is_clamped() {
        let h = Horizon {
            source_row: 0,
            profile_id: "P1".into(),
            hzid: "H1".into(),
            top: 10.0,
            bottom: 25.0,
            designation: None,
            attributes: BTreeMap::new(),
        };
        assert_eq!(h.overlap(0.0, 15.0), 5.0);
        assert_eq!(h.overlap(15.0, 30.0), 10.0);
        assert_eq!(h.overlap(30.0, 60.0), 0.0);
        assert_eq!(h.thickness(), 15.0);
    }

    #[test]
    fn json_round_trip_keeps_tags() {
        let values = vec![
            AttrValue::Null,
            AttrValue::Integer(3),
            AttrValue::Float(2.5),
            AttrValue::from("Bt1"),
        ];
        let text = serde_json::to_string(&values).unwrap();
        assert_eq!(text, r#"[null,3,2.5,"Bt1"]"#);
        let back: Vec<AttrValue> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, values);
    }
}
