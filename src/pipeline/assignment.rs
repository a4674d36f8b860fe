//! Label and prediction assignment.
//!
//! Every operation replaces whatever was stored before for the same scope and
//! checks that each value names a field of the taxonomy. `assign_labels` and
//! `store_predictions` also require every required field; `add_predictions`
//! stores extractor output as-is and leaves coverage to the validators.
//! Nothing is written when a check fails.

use std::collections::BTreeSet;

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::*;

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingRequiredFields { fields: Vec<String> },

    #[error("Field '{field}' is not part of taxonomy {taxonomy_id}")]
    UnknownField { field: String, taxonomy_id: Uuid },

    #[error("Document {document_id} has no taxonomy")]
    NoTaxonomy { document_id: Uuid },

    #[error("Model {model_id} targets a different taxonomy than document {document_id}")]
    TaxonomyMismatch { document_id: Uuid, model_id: Uuid },
}

impl From<rusqlite::Error> for AssignmentError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Database(DatabaseError::Sqlite(e))
    }
}

/// Resolve every value to a taxonomy field.
fn resolve_fields<'a>(
    taxonomy: &'a Taxonomy,
    values: &'a FieldValues,
) -> Result<Vec<(&'a Field, &'a str)>, AssignmentError> {
    values
        .iter()
        .map(|(name, value)| {
            taxonomy
                .field_by_name(name)
                .map(|field| (field, value.as_str()))
                .ok_or_else(|| AssignmentError::UnknownField {
                    field: name.clone(),
                    taxonomy_id: taxonomy.id,
                })
        })
        .collect()
}

fn require_coverage(taxonomy: &Taxonomy, values: &FieldValues) -> Result<(), AssignmentError> {
    let missing: BTreeSet<&str> = taxonomy
        .required_fields()
        .filter(|f| !values.contains_key(&f.name))
        .map(|f| f.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(AssignmentError::MissingRequiredFields {
            fields: missing.into_iter().map(String::from).collect(),
        });
    }
    Ok(())
}

/// Replace the ground-truth labels of a document.
///
/// Binds the document to `taxonomy_id` and marks it labeled.
pub fn assign_labels(
    conn: &Connection,
    document_id: &Uuid,
    taxonomy_id: &Uuid,
    labels: &FieldValues,
) -> Result<Vec<Label>, AssignmentError> {
    // existence checks before any write
    db::get_document(conn, document_id)?;
    let taxonomy = db::get_taxonomy(conn, taxonomy_id)?;
    let resolved = resolve_fields(&taxonomy, labels)?;
    require_coverage(&taxonomy, labels)?;

    let rows: Vec<Label> = resolved
        .into_iter()
        .map(|(field, value)| Label {
            id: Uuid::new_v4(),
            document_id: *document_id,
            field_id: field.id,
            field_name: field.name.clone(),
            value: value.to_string(),
            occurrence: 1,
        })
        .collect();

    let tx = conn.unchecked_transaction()?;
    let replaced = db::delete_labels_for_document(&tx, document_id)?;
    for label in &rows {
        db::insert_label(&tx, label)?;
    }
    db::set_document_taxonomy(&tx, document_id, taxonomy_id)?;
    db::set_document_labeled(&tx, document_id, true)?;
    tx.commit()?;

    tracing::info!(
        document_id = %document_id,
        taxonomy_id = %taxonomy_id,
        labels = rows.len(),
        replaced,
        "Labels assigned"
    );
    Ok(rows)
}

/// Replace the predictions of `model` for a document. Every required field
/// must have a value.
pub fn store_predictions(
    conn: &Connection,
    document_id: &Uuid,
    model: &ExtractionModel,
    values: &FieldValues,
) -> Result<Vec<Prediction>, AssignmentError> {
    write_predictions(conn, document_id, model, values, true)
}

/// Replace the predictions of `model` for a document without the required
/// field check. An empty mapping clears the previous predictions.
pub fn add_predictions(
    conn: &Connection,
    document_id: &Uuid,
    model: &ExtractionModel,
    values: &FieldValues,
) -> Result<Vec<Prediction>, AssignmentError> {
    write_predictions(conn, document_id, model, values, false)
}

fn write_predictions(
    conn: &Connection,
    document_id: &Uuid,
    model: &ExtractionModel,
    values: &FieldValues,
    require_all: bool,
) -> Result<Vec<Prediction>, AssignmentError> {
    let document = db::get_document(conn, document_id)?;
    match document.taxonomy_id {
        None => return Err(AssignmentError::NoTaxonomy { document_id: *document_id }),
        Some(id) if id != model.taxonomy_id => {
            return Err(AssignmentError::TaxonomyMismatch {
                document_id: *document_id,
                model_id: model.id,
            })
        }
        Some(_) => {}
    }

    let taxonomy = db::get_taxonomy(conn, &model.taxonomy_id)?;
    let resolved = resolve_fields(&taxonomy, values)?;
    if require_all {
        require_coverage(&taxonomy, values)?;
    }

    let created_at = Utc::now();
    let rows: Vec<Prediction> = resolved
        .into_iter()
        .map(|(field, value)| Prediction {
            id: Uuid::new_v4(),
            document_id: *document_id,
            model_id: model.id,
            field_id: field.id,
            field_name: field.name.clone(),
            value: value.to_string(),
            occurrence: 1,
            created_at,
        })
        .collect();

    let tx = conn.unchecked_transaction()?;
    db::delete_predictions_for_document_and_model(&tx, document_id, &model.id)?;
    for prediction in &rows {
        db::insert_prediction(&tx, prediction)?;
    }
    tx.commit()?;

    tracing::debug!(
        document_id = %document_id,
        model_id = %model.id,
        predictions = rows.len(),
        "Predictions stored"
    );
    Ok(rows)
}
