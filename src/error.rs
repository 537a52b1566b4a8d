use thiserror::Error;

// ---------------------------------------------------------------------------
// ProfileError – everything the data layer can reject
// ---------------------------------------------------------------------------

/// Errors raised while building or querying a profile collection.
///
/// Structural errors (`Schema`, `Overlap`, `Gap`, `InvalidDepth`,
/// `DuplicateHorizonId`) only ever come out of construction: a collection that
/// exists is known to be valid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("{table} table is missing required column '{column}'")]
    Schema { table: &'static str, column: String },

    #[error("profile '{profile_id}' has overlapping horizons: '{upper}' ends at {bottom} but '{lower}' starts at {top}")]
    Overlap {
        profile_id: String,
        upper: String,
        lower: String,
        bottom: f64,
        top: f64,
    },

    #[error("profile '{profile_id}' has depth gaps between horizons: '{upper}' ends at {bottom} but '{lower}' starts at {top}")]
    Gap {
        profile_id: String,
        upper: String,
        lower: String,
        bottom: f64,
        top: f64,
    },

    #[error("profile '{profile_id}', horizon '{hzid}': invalid depths top={top} bottom={bottom}")]
    InvalidDepth {
        profile_id: String,
        hzid: String,
        top: f64,
        bottom: f64,
    },

    #[error("profile '{profile_id}', column '{column}': depth value '{value}' is not numeric")]
    DepthNotNumeric {
        profile_id: String,
        column: String,
        value: String,
    },

    #[error("profile '{profile_id}' has duplicate horizon id '{hzid}'")]
    DuplicateHorizonId { profile_id: String, hzid: String },

    #[error("column '{column}' has {got} values, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("row {row} has an empty profile id")]
    MissingProfileId { row: usize },

    #[error("profile not found: {0}")]
    NotFound(String),

    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    #[error("position {index} is out of range for a collection of {len} profiles")]
    PositionOutOfRange { index: usize, len: usize },

    #[error("mask has {got} entries but the collection has {expected} profiles")]
    MaskLength { expected: usize, got: usize },

    #[error("invalid glom intervals: {0}")]
    InvalidIntervals(String),

    #[error("glom variable '{0}' clashes with an id or depth column of the output")]
    ReservedVariable(String),

    #[error("unknown aggregation function: {0:?}")]
    UnknownAggregation(String),

    #[error("unknown depth summary: {0:?} (expected \"max\" or \"min\")")]
    UnknownDepthSummary(String),
}

impl ProfileError {
    /// The profile a structural error refers to, if any.
    pub fn profile_id(&self) -> Option<&str> {
        match self {
            ProfileError::Overlap { profile_id, .. }
            | ProfileError::Gap { profile_id, .. }
            | ProfileError::InvalidDepth { profile_id, .. }
            | ProfileError::DepthNotNumeric { profile_id, .. }
            | ProfileError::DuplicateHorizonId { profile_id, .. } => Some(profile_id),
            ProfileError::NotFound(id) => Some(id),
            _ => None,
        }
    }
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;
