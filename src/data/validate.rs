//! Depth-contiguity checks for a single profile.

use std::collections::BTreeSet;

use super::model::Horizon;
use crate::error::{ProfileError, Result};

/// What is wrong between horizon `index - 1` and horizon `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Defect {
    Overlap { index: usize },
    Gap { index: usize },
}

/// Scan top-sorted `(top, bottom)` spans and report the first adjacent pair
/// whose boundary does not line up exactly. A single span has no pair and
/// always passes.
pub fn check_contiguity(spans: &[(f64, f64)]) -> Option<Defect> {
    spans
        .windows(2)
        .enumerate()
        .find_map(|(i, pair)| {
            let (_, prev_bottom) = pair[0];
            let (next_top, _) = pair[1];
            if next_top < prev_bottom {
                Some(Defect::Overlap { index: i + 1 })
            } else if next_top > prev_bottom {
                Some(Defect::Gap { index: i + 1 })
            } else {
                None
            }
        })
}

/// Validate one profile's horizons, already sorted by top depth.
///
/// Checks, in order: per-horizon depths (finite, non-negative, top < bottom),
/// horizon id uniqueness, then adjacent-pair contiguity.
pub fn validate_profile(profile_id: &str, horizons: &[Horizon]) -> Result<()> {
    for h in horizons {
        let sane = h.top.is_finite() && h.bottom.is_finite() && h.top >= 0.0 && h.top < h.bottom;
        if !sane {
            return Err(ProfileError::InvalidDepth {
                profile_id: profile_id.to_string(),
                hzid: h.hzid.to_string(),
                top: h.top,
                bottom: h.bottom,
            });
        }
    }

    let mut seen = BTreeSet::new();
    for h in horizons {
        if !seen.insert(&h.hzid) {
            return Err(ProfileError::DuplicateHorizonId {
                profile_id: profile_id.to_string(),
                hzid: h.hzid.to_string(),
            });
        }
    }

    let spans: Vec<(f64, f64)> = horizons.iter().map(|h| (h.top, h.bottom)).collect();
    match check_contiguity(&spans) {
        None => Ok(()),
        Some(Defect::Overlap { index }) => {
            let (upper, lower) = (&horizons[index - 1], &horizons[index]);
            Err(ProfileError::Overlap {
                profile_id: profile_id.to_string(),
                upper: upper.hzid.to_string(),
                lower: lower.hzid.to_string(),
                bottom: upper.bottom,
                top: lower.top,
            })
        }
        Some(Defect::Gap { index }) => {
            let (upper, lower) = (&horizons[index - 1], &horizons[index]);
            Err(ProfileError::Gap {
                profile_id: profile_id.to_string(),
                upper: upper.hzid.to_string(),
                lower: lower.hzid.to_string(),
                bottom: upper.bottom,
                top: lower.top,
            })
        }
    }
}
