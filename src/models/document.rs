use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DocumentStatus;
use super::extraction_model::ExtractionModel;
use super::record::{Label, Prediction};
use super::taxonomy::{Field, Taxonomy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub taxonomy_id: Option<Uuid>,
    pub is_labeled: bool,
    pub status: DocumentStatus,
}

impl Document {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            taxonomy_id: None,
            is_labeled: false,
            status: DocumentStatus::Pending,
        }
    }
}

/// A document with its taxonomy, labels and predictions attached.
///
/// This is the read model extractors and document validators work on; it is
/// assembled by `db::load_document_view` or built directly in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub document: Document,
    pub taxonomy: Option<Taxonomy>,
    pub labels: Vec<Label>,
    pub predictions: Vec<Prediction>,
}

impl DocumentView {
    pub fn new(document: Document, taxonomy: Option<Taxonomy>) -> Self {
        Self {
            document,
            taxonomy,
            labels: Vec::new(),
            predictions: Vec::new(),
        }
    }

    /// Taxonomy fields, empty when no taxonomy is attached.
    pub fn fields(&self) -> &[Field] {
        self.taxonomy.as_ref().map(|t| t.fields.as_slice()).unwrap_or(&[])
    }

    /// Fields `model` may extract: the taxonomy fields when the model targets
    /// the document's taxonomy, otherwise none.
    pub fn fields_for_model(&self, model: &ExtractionModel) -> &[Field] {
        match &self.taxonomy {
            Some(taxonomy) if taxonomy.id == model.taxonomy_id => &taxonomy.fields,
            _ => &[],
        }
    }

    pub fn field(&self, field_id: Uuid) -> Option<&Field> {
        self.fields().iter().find(|f| f.id == field_id)
    }

    pub fn predictions_for(&self, model_id: Uuid) -> impl Iterator<Item = &Prediction> {
        self.predictions.iter().filter(move |p| p.model_id == model_id)
    }
}
