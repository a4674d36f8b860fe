//! Validation of extracted values.
//!
//! `field` holds the single-value rules, `document` the rules over a whole
//! document's predictions. Validation never persists anything.

pub mod calendar;
pub mod checksum;
pub mod document;
pub mod field;

pub use calendar::HolidayCalendar;
pub use document::{validate_document, DocumentRule, RuleOutcome, ValidationReport};
pub use field::{FieldRule, TypeRules};

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Model taxonomy {model_taxonomy} does not match taxonomy {document_taxonomy} of document {document_id}")]
    TaxonomyMismatch {
        document_id: Uuid,
        document_taxonomy: Uuid,
        model_taxonomy: Uuid,
    },

    #[error("Document {document_id} has no taxonomy")]
    NoTaxonomy { document_id: Uuid },
}
