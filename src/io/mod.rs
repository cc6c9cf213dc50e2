//! Input helpers.
//!
//! - tabular theory/data ingest + schema validation (`table`)

pub mod table;

pub use table::*;
