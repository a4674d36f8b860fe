pub mod document;
pub mod enums;
pub mod extraction_model;
pub mod metric;
pub mod record;
pub mod taxonomy;

pub use document::*;
pub use enums::*;
pub use extraction_model::*;
pub use metric::*;
pub use record::*;
pub use taxonomy::*;

use std::collections::BTreeMap;

/// Field name → string value, as produced by extractors and consumed by
/// post-processing and assignment.
pub type FieldValues = BTreeMap<String, String>;
