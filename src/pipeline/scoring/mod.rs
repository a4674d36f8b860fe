//! Scoring: predictions against labels.
//!
//! `comparison` builds per-document results, `metrics` aggregates them, and
//! `run` persists the aggregates as metrics of an extraction model.

pub mod comparison;
pub mod metrics;
pub mod run;

pub use comparison::{compare, compare_records, DocumentComparison, FieldComparison};
pub use metrics::{field_accuracy, overall_accuracy, percent_fully_correct, ScoreSummary};
pub use run::{score_labeled_documents, score_model, ScoreReport};

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Model {model_id} does not target the taxonomy of document {document_id}")]
    TaxonomyMismatch { document_id: Uuid, model_id: Uuid },

    #[error("Document {document_id} has no labels; accuracy is undefined")]
    NoLabels { document_id: Uuid },

    #[error("No comparison results to aggregate")]
    NoResults,

    #[error("Document {document_id} has fields [{}], expected [{}]", found.join(", "), expected.join(", "))]
    HeterogeneousFields {
        document_id: Uuid,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl From<rusqlite::Error> for ScoringError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}
