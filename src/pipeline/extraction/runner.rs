//! ExtractionRunner: extract → post-process → store, one document at a time.
//!
//! Document status moves `processing` → `extracted`, or `failed` when any step
//! after the taxonomy check errors. An extractor that succeeds with no values
//! still counts as extracted; required-field coverage is checked by the
//! document validators.

use std::time::Instant;

use rusqlite::Connection;
use uuid::Uuid;

use super::traits::{DocumentExtractor, ExtractionContext};
use super::ExtractionError;
use crate::db;
use crate::models::{DocumentStatus, Prediction};
use crate::pipeline::assignment::add_predictions;
use crate::pipeline::postprocess::PostProcessor;

pub struct ExtractionRunner {
    extractor: Box<dyn DocumentExtractor>,
    post_processor: PostProcessor,
}

/// Result of one document inside a batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub document_id: Uuid,
    pub result: Result<Vec<Prediction>, ExtractionError>,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub outcomes: Vec<DocumentOutcome>,
    pub duration_ms: u64,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

impl ExtractionRunner {
    pub fn new(extractor: Box<dyn DocumentExtractor>, post_processor: PostProcessor) -> Self {
        Self {
            extractor,
            post_processor,
        }
    }

    /// Extract one document with `model_id` and replace its stored predictions.
    pub fn run_extraction(
        &self,
        conn: &Connection,
        document_id: &Uuid,
        model_id: &Uuid,
        context: &ExtractionContext,
    ) -> Result<Vec<Prediction>, ExtractionError> {
        let view = db::load_document_view(conn, document_id)?;
        let model = db::get_extraction_model(conn, model_id)?;

        if view.document.taxonomy_id != Some(model.taxonomy_id) {
            return Err(ExtractionError::TaxonomyMismatch {
                document_id: *document_id,
                model_id: *model_id,
            });
        }

        db::update_document_status(conn, document_id, DocumentStatus::Processing)?;

        let stored = self
            .extractor
            .extract(&view, &model, context)
            .map(|raw| self.post_processor.process(&raw))
            .and_then(|values| {
                add_predictions(conn, document_id, &model, &values).map_err(ExtractionError::from)
            });

        match stored {
            Ok(predictions) => {
                db::update_document_status(conn, document_id, DocumentStatus::Extracted)?;
                tracing::info!(
                    document_id = %document_id,
                    model_id = %model_id,
                    extractor = self.extractor.name(),
                    predictions = predictions.len(),
                    "Document extracted"
                );
                Ok(predictions)
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %document_id,
                    model_id = %model_id,
                    extractor = self.extractor.name(),
                    backend = e.is_backend_failure(),
                    error = %e,
                    "Extraction failed"
                );
                if let Err(status_err) = db::update_document_status(conn, document_id, DocumentStatus::Failed) {
                    tracing::warn!(document_id = %document_id, error = %status_err, "Could not mark document failed");
                }
                Err(e)
            }
        }
    }

    /// Run every document in order. A failing document is recorded and the
    /// batch moves on.
    pub fn run_extraction_batch(
        &self,
        conn: &Connection,
        document_ids: &[Uuid],
        model_id: &Uuid,
        context: &ExtractionContext,
    ) -> BatchOutcome {
        let start = Instant::now();

        let outcomes: Vec<DocumentOutcome> = document_ids
            .iter()
            .map(|id| DocumentOutcome {
                document_id: *id,
                result: self.run_extraction(conn, id, model_id, context),
            })
            .collect();

        let batch = BatchOutcome {
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            model_id = %model_id,
            documents = document_ids.len(),
            succeeded = batch.succeeded(),
            failed = batch.failed(),
            duration_ms = batch.duration_ms,
            "Extraction batch complete"
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::DatabaseError;
    use crate::models::*;
    use crate::pipeline::extraction::{HardcodedValuesExtractor, PassingExtractor};
    use crate::pipeline::postprocess::Transform;
    use crate::pipeline::validation::DocumentRule;

    struct UnreachableBackend;

    impl DocumentExtractor for UnreachableBackend {
        fn name(&self) -> &str {
            "unreachable"
        }

        fn extract(
            &self,
            _document: &DocumentView,
            _model: &ExtractionModel,
            _context: &ExtractionContext,
        ) -> Result<FieldValues, ExtractionError> {
            Err(ExtractionError::BackendConnection("http://127.0.0.1:9".into()))
        }
    }

    /// Succeeds without finding anything.
    struct NothingFound;

    impl DocumentExtractor for NothingFound {
        fn name(&self) -> &str {
            "nothing-found"
        }

        fn extract(
            &self,
            _document: &DocumentView,
            _model: &ExtractionModel,
            _context: &ExtractionContext,
        ) -> Result<FieldValues, ExtractionError> {
            Ok(FieldValues::new())
        }
    }

    fn status_of(conn: &Connection, id: &Uuid) -> DocumentStatus {
        db::get_document(conn, id).unwrap().status
    }

    #[test]
    fn passing_run_stores_predictions() {
        let conn = test_db();
        let seeded = seed(&conn, 1);
        let doc = &seeded.documents[0];
        let runner = ExtractionRunner::new(Box::new(PassingExtractor::new()), PostProcessor::default());

        let predictions = runner
            .run_extraction(&conn, &doc.id, &seeded.model.id, &ExtractionContext::new())
            .unwrap();

        assert_eq!(predictions.len(), 3);
        assert_eq!(status_of(&conn, &doc.id), DocumentStatus::Extracted);
        let stored = db::get_predictions_for_document_and_model(&conn, &doc.id, &seeded.model.id).unwrap();
        assert!(stored.iter().all(|p| p.value == "PASS"));
    }

    #[test]
    fn values_are_post_processed_before_storage() {
        let conn = test_db();
        let seeded = seed(&conn, 1);
        let doc = &seeded.documents[0];
        let post = PostProcessor::default()
            .with("document_type", Transform::NormalizeWhitespace)
            .with("issue_date", Transform::standardize_date());
        let runner = ExtractionRunner::new(Box::new(HardcodedValuesExtractor::new()), post);
        let ctx = ExtractionContext::new()
            .with("document_type", "  Invoice   copy ")
            .with("issue_date", "01/15/2021");

        runner.run_extraction(&conn, &doc.id, &seeded.model.id, &ctx).unwrap();

        let view = db::load_document_view(&conn, &doc.id).unwrap();
        let value = |name: &str| {
            view.predictions
                .iter()
                .find(|p| p.field_name == name)
                .map(|p| p.value.clone())
                .unwrap()
        };
        assert_eq!(value("document_type"), "Invoice copy");
        assert_eq!(value("issue_date"), "2021-01-15");
        assert_eq!(value("reference_number"), "N/A");
    }

    #[test]
    fn backend_failure_marks_document_failed() {
        let conn = test_db();
        let seeded = seed(&conn, 1);
        let doc = &seeded.documents[0];
        let runner = ExtractionRunner::new(Box::new(UnreachableBackend), PostProcessor::default());

        let err = runner
            .run_extraction(&conn, &doc.id, &seeded.model.id, &ExtractionContext::new())
            .unwrap_err();

        assert!(err.is_backend_failure());
        assert_eq!(status_of(&conn, &doc.id), DocumentStatus::Failed);
        assert!(db::get_predictions_for_document(&conn, &doc.id).unwrap().is_empty());
    }

    #[test]
    fn foreign_model_is_rejected_before_extraction() {
        let conn = test_db();
        let seeded = seed(&conn, 1);
        let doc = &seeded.documents[0];

        let other = Taxonomy::new("Trade Confirmation").with_field("isin", DataType::Isin, true);
        db::insert_taxonomy(&conn, &other).unwrap();
        let foreign = ExtractionModel::new("Trade Model", other.id);
        db::insert_extraction_model(&conn, &foreign).unwrap();

        let runner = ExtractionRunner::new(Box::new(PassingExtractor::new()), PostProcessor::default());
        let err = runner
            .run_extraction(&conn, &doc.id, &foreign.id, &ExtractionContext::new())
            .unwrap_err();

        assert!(matches!(err, ExtractionError::TaxonomyMismatch { .. }));
        assert_eq!(status_of(&conn, &doc.id), DocumentStatus::Pending);
    }

    #[test]
    fn batch_continues_past_failures() {
        let conn = test_db();
        let seeded = seed(&conn, 2);
        let missing = Uuid::new_v4();
        let ids = vec![seeded.documents[0].id, missing, seeded.documents[1].id];
        let runner = ExtractionRunner::new(Box::new(PassingExtractor::new()), PostProcessor::default());

        let batch = runner.run_extraction_batch(&conn, &ids, &seeded.model.id, &ExtractionContext::new());

        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed(), 1);
        assert_eq!(batch.outcomes[1].document_id, missing);
        assert!(matches!(
            batch.outcomes[1].result,
            Err(ExtractionError::Database(DatabaseError::NotFound { .. }))
        ));
        assert_eq!(status_of(&conn, &seeded.documents[1].id), DocumentStatus::Extracted);
    }

    #[test]
    fn empty_extraction_is_not_a_failure() {
        let conn = test_db();
        let seeded = seed(&conn, 1);
        let doc = &seeded.documents[0];
        let runner = ExtractionRunner::new(Box::new(NothingFound), PostProcessor::default());

        let predictions = runner
            .run_extraction(&conn, &doc.id, &seeded.model.id, &ExtractionContext::new())
            .unwrap();

        assert!(predictions.is_empty());
        assert_eq!(status_of(&conn, &doc.id), DocumentStatus::Extracted);

        // the gap surfaces in validation instead
        let view = db::load_document_view(&conn, &doc.id).unwrap();
        assert!(!DocumentRule::RequiredFields.validate(&view, &seeded.model));
    }
}
