//! Per-document comparison of one model's predictions with the labels.
//!
//! Iteration is label-driven: a predicted field without a label is not part
//! of the result. Matching is exact string equality; normalization belongs
//! to the post-processor.

use std::collections::{BTreeMap, HashMap};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ScoringError;
use crate::db;
use crate::models::{Label, Prediction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field_name: String,
    pub label_value: String,
    /// Empty when the model produced no value for this field.
    pub prediction_value: String,
    pub matched: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentComparison {
    pub document_id: Uuid,
    pub model_id: Uuid,
    pub field_results: BTreeMap<String, FieldComparison>,
}

impl DocumentComparison {
    /// True when no labeled field mismatched. Vacuously true without labels.
    pub fn all_fields_correct(&self) -> bool {
        self.field_results.values().all(|f| f.matched)
    }

    pub fn correct_fields(&self) -> Vec<&FieldComparison> {
        self.field_results.values().filter(|f| f.matched).collect()
    }

    pub fn incorrect_fields(&self) -> Vec<&FieldComparison> {
        self.field_results.values().filter(|f| !f.matched).collect()
    }

    pub fn incorrect_fields_summary(&self) -> String {
        let names: Vec<&str> = self
            .incorrect_fields()
            .into_iter()
            .map(|f| f.field_name.as_str())
            .collect();
        format!("Incorrect fields: {}", names.join(", "))
    }

    /// Fraction of labeled fields that matched, in `[0, 1]`.
    pub fn accuracy_rate(&self) -> Result<f64, ScoringError> {
        if self.field_results.is_empty() {
            return Err(ScoringError::NoLabels {
                document_id: self.document_id,
            });
        }
        Ok(self.correct_fields().len() as f64 / self.field_results.len() as f64)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_results.keys().map(String::as_str)
    }
}

/// Compare already-loaded labels and predictions.
pub fn compare_records(
    document_id: Uuid,
    model_id: Uuid,
    labels: &[Label],
    predictions: &[Prediction],
) -> DocumentComparison {
    let mut predicted: HashMap<&str, &str> = HashMap::new();
    for p in predictions.iter().filter(|p| p.model_id == model_id) {
        predicted.entry(p.field_name.as_str()).or_insert(p.value.as_str());
    }

    let field_results = labels
        .iter()
        .map(|label| {
            let prediction = predicted.get(label.field_name.as_str()).copied();
            let result = FieldComparison {
                field_name: label.field_name.clone(),
                label_value: label.value.clone(),
                prediction_value: prediction.unwrap_or_default().to_string(),
                matched: prediction == Some(label.value.as_str()),
            };
            (label.field_name.clone(), result)
        })
        .collect();

    DocumentComparison {
        document_id,
        model_id,
        field_results,
    }
}

/// Load and compare the labels of a document with the predictions of a model.
pub fn compare(conn: &Connection, document_id: &Uuid, model_id: &Uuid) -> Result<DocumentComparison, ScoringError> {
    let document = db::get_document(conn, document_id)?;
    let model = db::get_extraction_model(conn, model_id)?;
    if document.taxonomy_id != Some(model.taxonomy_id) {
        return Err(ScoringError::TaxonomyMismatch {
            document_id: *document_id,
            model_id: *model_id,
        });
    }

    let labels = db::get_labels_for_document(conn, document_id)?;
    let predictions = db::get_predictions_for_document_and_model(conn, document_id, model_id)?;
    let result = compare_records(*document_id, *model_id, &labels, &predictions);

    if !result.all_fields_correct() {
        tracing::debug!(
            document_id = %document_id,
            model_id = %model_id,
            summary = %result.incorrect_fields_summary(),
            "Prediction mismatches"
        );
    }
    Ok(result)
}
