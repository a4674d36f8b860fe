use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_label(conn: &Connection, label: &Label) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO labels (id, document_id, field_id, field_name, value, occurrence)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            label.id.to_string(),
            label.document_id.to_string(),
            label.field_id.to_string(),
            label.field_name,
            label.value,
            label.occurrence,
        ],
    )?;
    Ok(())
}

/// Remove every label of a document. Returns the number of rows deleted.
pub fn delete_labels_for_document(conn: &Connection, document_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM labels WHERE document_id = ?1",
        params![document_id.to_string()],
    )?;
    Ok(deleted)
}

pub fn get_labels_for_document(conn: &Connection, document_id: &Uuid) -> Result<Vec<Label>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, field_id, field_name, value, occurrence
         FROM labels WHERE document_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![document_id.to_string()], |row| {
        Ok(LabelRow {
            id: row.get(0)?,
            document_id: row.get(1)?,
            field_id: row.get(2)?,
            field_name: row.get(3)?,
            value: row.get(4)?,
            occurrence: row.get(5)?,
        })
    })?;

    let mut labels = Vec::new();
    for row in rows {
        let row = row?;
        labels.push(Label {
            id: parse_id(&row.id)?,
            document_id: parse_id(&row.document_id)?,
            field_id: parse_id(&row.field_id)?,
            field_name: row.field_name,
            value: row.value,
            occurrence: row.occurrence,
        });
    }
    Ok(labels)
}

struct LabelRow {
    id: String,
    document_id: String,
    field_id: String,
    field_name: String,
    value: String,
    occurrence: u32,
}
