//! Extraction stage: pluggable extractors turning a document into field values.
//!
//! - `traits`: the `DocumentExtractor` contract and its call context
//! - `extractors`: deterministic built-in strategies
//! - `remote`: workflow-based HTTP backend
//! - `runner`: extract → post-process → store, per document or batch

pub mod extractors;
pub mod remote;
pub mod runner;
pub mod traits;

pub use extractors::{HardcodedValuesExtractor, PassingExtractor};
pub use remote::{RemoteConfig, RemoteExtractor};
pub use runner::{BatchOutcome, DocumentOutcome, ExtractionRunner};
pub use traits::{DocumentExtractor, ExtractionContext};

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::pipeline::assignment::AssignmentError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    #[error("Model {model_id} does not target the taxonomy of document {document_id}")]
    TaxonomyMismatch { document_id: Uuid, model_id: Uuid },

    #[error("Extraction backend is not reachable at {0}")]
    BackendConnection(String),

    #[error("Extraction backend timed out after {0}s")]
    BackendTimeout(u64),

    #[error("Extraction backend returned error (status {status}): {body}")]
    BackendStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed backend response: {0}")]
    BackendResponse(String),

    #[error("Extraction job {job_id} failed: {detail}")]
    JobFailed { job_id: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractionError {
    /// Failures of the extraction backend itself, as opposed to local
    /// contract or storage errors.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendConnection(_)
                | Self::BackendTimeout(_)
                | Self::BackendStatus { .. }
                | Self::HttpClient(_)
                | Self::BackendResponse(_)
                | Self::JobFailed { .. }
        )
    }
}
