use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{get_labels_for_document, get_predictions_for_document, get_taxonomy, parse_id};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, name, taxonomy_id, is_labeled, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            doc.id.to_string(),
            doc.name,
            doc.taxonomy_id.map(|id| id.to_string()),
            doc.is_labeled,
            doc.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Document, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, taxonomy_id, is_labeled, status FROM documents WHERE id = ?1",
            params![id.to_string()],
            document_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::not_found("document", id))?;
    document_from_row(row)
}

/// Documents bound to a taxonomy, oldest first.
pub fn get_documents_for_taxonomy(
    conn: &Connection,
    taxonomy_id: &Uuid,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, taxonomy_id, is_labeled, status
         FROM documents WHERE taxonomy_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![taxonomy_id.to_string()], document_row_from_rusqlite)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

pub fn set_document_taxonomy(
    conn: &Connection,
    document_id: &Uuid,
    taxonomy_id: &Uuid,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET taxonomy_id = ?1 WHERE id = ?2",
        params![taxonomy_id.to_string(), document_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("document", document_id));
    }
    Ok(())
}

pub fn set_document_labeled(
    conn: &Connection,
    document_id: &Uuid,
    is_labeled: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET is_labeled = ?1 WHERE id = ?2",
        params![is_labeled, document_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("document", document_id));
    }
    Ok(())
}

pub fn update_document_status(
    conn: &Connection,
    document_id: &Uuid,
    status: DocumentStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE documents SET status = ?1 WHERE id = ?2",
        params![status.as_str(), document_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::not_found("document", document_id));
    }
    Ok(())
}

/// Load a document with its taxonomy, labels and every model's predictions.
pub fn load_document_view(conn: &Connection, document_id: &Uuid) -> Result<DocumentView, DatabaseError> {
    let document = get_document(conn, document_id)?;
    let taxonomy = document
        .taxonomy_id
        .map(|id| get_taxonomy(conn, &id))
        .transpose()?;

    Ok(DocumentView {
        labels: get_labels_for_document(conn, document_id)?,
        predictions: get_predictions_for_document(conn, document_id)?,
        document,
        taxonomy,
    })
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    name: String,
    taxonomy_id: Option<String>,
    is_labeled: bool,
    status: String,
}

fn document_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<DocumentRow, rusqlite::Error> {
    Ok(DocumentRow {
        id: row.get(0)?,
        name: row.get(1)?,
        taxonomy_id: row.get(2)?,
        is_labeled: row.get(3)?,
        status: row.get(4)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: parse_id(&row.id)?,
        name: row.name,
        taxonomy_id: row.taxonomy_id.as_deref().map(parse_id).transpose()?,
        is_labeled: row.is_labeled,
        status: DocumentStatus::from_str(&row.status)?,
    })
}
