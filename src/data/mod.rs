//! Data layer: tables, profile collections, validation, and glom.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table (columns + records)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  import   │  rename columns, split site columns
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────────────┐
//!   │ ProfileCollection  │  typed horizons + sites, validated per profile
//!   └───────────────────┘
//!        │            │
//!        ▼            ▼
//!   ┌──────────┐  ┌──────────┐
//!   │  filter   │  │   glom    │  site predicates / depth re-slicing
//!   └──────────┘  └──────────┘
//! ```

pub mod collection;
pub mod filter;
pub mod glom;
pub mod import;
pub mod loader;
pub mod model;
pub mod table;
pub mod validate;
