use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_id, parse_timestamp, timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_extraction_model(conn: &Connection, model: &ExtractionModel) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO extraction_models (id, name, version, description, taxonomy_id, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            model.id.to_string(),
            model.name,
            model.version,
            model.description,
            model.taxonomy_id.to_string(),
            model.is_active,
            timestamp(&model.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_extraction_model(conn: &Connection, id: &Uuid) -> Result<ExtractionModel, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, version, description, taxonomy_id, is_active, created_at
             FROM extraction_models WHERE id = ?1",
            params![id.to_string()],
            model_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::not_found("extraction_model", id))?;
    model_from_row(row)
}

/// Most recently created model with the given name.
pub fn get_extraction_model_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<ExtractionModel>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, version, description, taxonomy_id, is_active, created_at
         FROM extraction_models WHERE name = ?1 ORDER BY created_at DESC LIMIT 1",
        params![name],
        model_row_from_rusqlite,
    )
    .optional()?
    .map(model_from_row)
    .transpose()
}

struct ModelRow {
    id: String,
    name: String,
    version: Option<String>,
    description: Option<String>,
    taxonomy_id: String,
    is_active: bool,
    created_at: String,
}

fn model_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ModelRow, rusqlite::Error> {
    Ok(ModelRow {
        id: row.get(0)?,
        name: row.get(1)?,
        version: row.get(2)?,
        description: row.get(3)?,
        taxonomy_id: row.get(4)?,
        is_active: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn model_from_row(row: ModelRow) -> Result<ExtractionModel, DatabaseError> {
    Ok(ExtractionModel {
        id: parse_id(&row.id)?,
        name: row.name,
        version: row.version,
        description: row.description,
        taxonomy_id: parse_id(&row.taxonomy_id)?,
        is_active: row.is_active,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
