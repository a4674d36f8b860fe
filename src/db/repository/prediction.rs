use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_id, parse_timestamp, timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const PREDICTION_COLUMNS: &str =
    "id, document_id, model_id, field_id, field_name, value, occurrence, created_at";

pub fn insert_prediction(conn: &Connection, prediction: &Prediction) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO predictions (id, document_id, model_id, field_id, field_name, value, occurrence, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            prediction.id.to_string(),
            prediction.document_id.to_string(),
            prediction.model_id.to_string(),
            prediction.field_id.to_string(),
            prediction.field_name,
            prediction.value,
            prediction.occurrence,
            timestamp(&prediction.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_predictions_for_document(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Vec<Prediction>, DatabaseError> {
    query_predictions(
        conn,
        &format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE document_id = ?1 ORDER BY rowid"),
        &[&document_id.to_string()],
    )
}

pub fn get_predictions_for_document_and_model(
    conn: &Connection,
    document_id: &Uuid,
    model_id: &Uuid,
) -> Result<Vec<Prediction>, DatabaseError> {
    query_predictions(
        conn,
        &format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions
             WHERE document_id = ?1 AND model_id = ?2 ORDER BY rowid"
        ),
        &[&document_id.to_string(), &model_id.to_string()],
    )
}

pub fn get_predictions_for_model(conn: &Connection, model_id: &Uuid) -> Result<Vec<Prediction>, DatabaseError> {
    query_predictions(
        conn,
        &format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE model_id = ?1 ORDER BY rowid"),
        &[&model_id.to_string()],
    )
}

/// Returns true if any predictions were deleted.
pub fn delete_predictions_for_document_and_model(
    conn: &Connection,
    document_id: &Uuid,
    model_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM predictions WHERE document_id = ?1 AND model_id = ?2",
        params![document_id.to_string(), model_id.to_string()],
    )?;
    Ok(deleted > 0)
}

fn query_predictions(
    conn: &Connection,
    sql: &str,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<Prediction>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, |row| {
        Ok(PredictionRow {
            id: row.get(0)?,
            document_id: row.get(1)?,
            model_id: row.get(2)?,
            field_id: row.get(3)?,
            field_name: row.get(4)?,
            value: row.get(5)?,
            occurrence: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut predictions = Vec::new();
    for row in rows {
        predictions.push(prediction_from_row(row?)?);
    }
    Ok(predictions)
}

struct PredictionRow {
    id: String,
    document_id: String,
    model_id: String,
    field_id: String,
    field_name: String,
    value: String,
    occurrence: u32,
    created_at: String,
}

fn prediction_from_row(row: PredictionRow) -> Result<Prediction, DatabaseError> {
    Ok(Prediction {
        id: parse_id(&row.id)?,
        document_id: parse_id(&row.document_id)?,
        model_id: parse_id(&row.model_id)?,
        field_id: parse_id(&row.field_id)?,
        field_name: row.field_name,
        value: row.value,
        occurrence: row.occurrence,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
