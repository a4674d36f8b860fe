use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comparison::{compare, DocumentComparison};
use super::metrics::ScoreSummary;
use super::ScoringError;
use crate::db;
use crate::models::Metric;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub model_id: Uuid,
    pub summary: ScoreSummary,
    pub comparisons: Vec<DocumentComparison>,
    /// Stored metric rows after the upsert.
    pub metrics: Vec<Metric>,
}

/// Compare every document with the model's predictions, aggregate, and store
/// the aggregates as metrics of the model. All metric writes share one
/// transaction; a failing comparison writes nothing.
pub fn score_model(conn: &Connection, model_id: &Uuid, document_ids: &[Uuid]) -> Result<ScoreReport, ScoringError> {
    db::get_extraction_model(conn, model_id)?;

    let comparisons = document_ids
        .iter()
        .map(|id| compare(conn, id, model_id))
        .collect::<Result<Vec<_>, _>>()?;
    let summary = ScoreSummary::from_results(&comparisons)?;

    let tx = conn.unchecked_transaction()?;
    let mut metrics = Vec::new();
    for request in summary.metric_requests(*model_id) {
        metrics.push(db::upsert_metric(&tx, &request)?);
    }
    tx.commit()?;

    tracing::info!(
        model_id = %model_id,
        documents = summary.sample_size,
        overall_accuracy = summary.overall_accuracy,
        percent_fully_correct = summary.percent_fully_correct,
        "Model scored"
    );

    Ok(ScoreReport {
        model_id: *model_id,
        summary,
        comparisons,
        metrics,
    })
}

/// Score the model against every labeled document of its taxonomy.
pub fn score_labeled_documents(conn: &Connection, model_id: &Uuid) -> Result<ScoreReport, ScoringError> {
    let model = db::get_extraction_model(conn, model_id)?;
    let document_ids: Vec<Uuid> = db::get_documents_for_taxonomy(conn, &model.taxonomy_id)?
        .into_iter()
        .filter(|d| d.is_labeled)
        .map(|d| d.id)
        .collect();
    score_model(conn, model_id, &document_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::models::*;
    use crate::pipeline::assignment::{assign_labels, store_predictions};

    /// Two labeled documents; the model gets `document_type` wrong on the second.
    fn scored_fixture(conn: &Connection) -> Seeded {
        let seeded = seed(conn, 2);
        let labels = [
            values(&[("document_type", "Invoice"), ("issue_date", "2021-01-15")]),
            values(&[("document_type", "Receipt"), ("issue_date", "2021-02-20")]),
        ];
        let predictions = [
            values(&[("document_type", "Invoice"), ("issue_date", "2021-01-15")]),
            values(&[("document_type", "Invoice"), ("issue_date", "2021-02-20")]),
        ];
        for ((doc, l), p) in seeded.documents.iter().zip(&labels).zip(&predictions) {
            assign_labels(conn, &doc.id, &seeded.taxonomy.id, l).unwrap();
            store_predictions(conn, &doc.id, &seeded.model, p).unwrap();
        }
        seeded
    }

    fn metric_value(metrics: &[Metric], name: &str) -> f64 {
        metrics.iter().find(|m| m.name == name).map(|m| m.value).unwrap()
    }

    #[test]
    fn scoring_upserts_all_aggregates() {
        let conn = test_db();
        let seeded = scored_fixture(&conn);
        let ids: Vec<_> = seeded.documents.iter().map(|d| d.id).collect();

        let report = score_model(&conn, &seeded.model.id, &ids).unwrap();

        assert_eq!(report.summary.field_accuracy["document_type"], 50.0);
        assert_eq!(report.summary.field_accuracy["issue_date"], 100.0);
        assert_eq!(report.summary.overall_accuracy, 75.0);
        assert_eq!(report.summary.percent_fully_correct, 50.0);

        let stored = db::get_metrics_for_model(&conn, &seeded.model.id).unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|m| m.sample_size == 2));
        assert_eq!(metric_value(&stored, "document_type_accuracy"), 50.0);
        assert_eq!(metric_value(&stored, "perc_of_full_correct"), 50.0);
    }

    #[test]
    fn rescoring_overwrites_in_place() {
        let conn = test_db();
        let seeded = scored_fixture(&conn);
        let ids: Vec<_> = seeded.documents.iter().map(|d| d.id).collect();
        let first = score_model(&conn, &seeded.model.id, &ids).unwrap();

        // fix the wrong prediction and score again
        store_predictions(
            &conn,
            &ids[1],
            &seeded.model,
            &values(&[("document_type", "Receipt"), ("issue_date", "2021-02-20")]),
        )
        .unwrap();
        let second = score_model(&conn, &seeded.model.id, &ids).unwrap();

        let stored = db::get_metrics_for_model(&conn, &seeded.model.id).unwrap();
        assert_eq!(stored.len(), 4);
        assert_eq!(metric_value(&stored, "overall_accuracy"), 100.0);

        let first_overall = first.metrics.iter().find(|m| m.name == "overall_accuracy").unwrap();
        let second_overall = second.metrics.iter().find(|m| m.name == "overall_accuracy").unwrap();
        assert_eq!(first_overall.id, second_overall.id);
    }

    #[test]
    fn failed_comparison_writes_nothing() {
        let conn = test_db();
        let seeded = scored_fixture(&conn);
        let unlabeled = Document {
            taxonomy_id: Some(seeded.taxonomy.id),
            ..Document::new("unlabeled.txt")
        };
        db::insert_document(&conn, &unlabeled).unwrap();

        let ids = vec![seeded.documents[0].id, unlabeled.id];
        let err = score_model(&conn, &seeded.model.id, &ids).unwrap_err();

        assert!(matches!(err, ScoringError::HeterogeneousFields { .. }));
        assert!(db::get_metrics_for_model(&conn, &seeded.model.id).unwrap().is_empty());
    }

    #[test]
    fn nothing_to_score() {
        let conn = test_db();
        let seeded = seed(&conn, 1);

        assert!(matches!(score_model(&conn, &seeded.model.id, &[]), Err(ScoringError::NoResults)));
        assert!(matches!(
            score_labeled_documents(&conn, &seeded.model.id),
            Err(ScoringError::NoResults)
        ));
    }

    #[test]
    fn labeled_documents_are_selected() {
        let conn = test_db();
        let seeded = scored_fixture(&conn);
        let extra = Document {
            taxonomy_id: Some(seeded.taxonomy.id),
            ..Document::new("not-yet-labeled.txt")
        };
        db::insert_document(&conn, &extra).unwrap();

        let report = score_labeled_documents(&conn, &seeded.model.id).unwrap();
        assert_eq!(report.summary.sample_size, 2);
        assert_eq!(report.comparisons.len(), 2);
    }
}
