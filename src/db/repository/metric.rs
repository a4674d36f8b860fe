use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{parse_id, parse_timestamp, timestamp};
use crate::db::DatabaseError;
use crate::models::*;

const METRIC_COLUMNS: &str = "id, model_id, name, value, sample_size, created_at, updated_at";

/// Create the metric for (model, name) or overwrite its value and sample size.
///
/// A single `INSERT ... ON CONFLICT DO UPDATE` statement, so concurrent scoring
/// runs for the same model never produce duplicate rows; the last writer wins.
pub fn upsert_metric(conn: &Connection, request: &MetricUpsert) -> Result<Metric, DatabaseError> {
    if request.sample_size == 0 {
        return Err(DatabaseError::ConstraintViolation(format!(
            "Metric '{}' sample_size must be positive",
            request.name
        )));
    }

    let now = timestamp(&Utc::now());
    let row = conn.query_row(
        &format!(
            "INSERT INTO metrics (id, model_id, name, value, sample_size, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT (model_id, name) DO UPDATE SET
                 value = excluded.value,
                 sample_size = excluded.sample_size,
                 updated_at = excluded.updated_at
             RETURNING {METRIC_COLUMNS}"
        ),
        params![
            Uuid::new_v4().to_string(),
            request.model_id.to_string(),
            request.name,
            request.value,
            request.sample_size,
            now,
        ],
        metric_row_from_rusqlite,
    )?;
    metric_from_row(row)
}

pub fn get_metric_by_model_and_name(
    conn: &Connection,
    model_id: &Uuid,
    name: &str,
) -> Result<Option<Metric>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {METRIC_COLUMNS} FROM metrics WHERE model_id = ?1 AND name = ?2"),
        params![model_id.to_string(), name],
        metric_row_from_rusqlite,
    )
    .optional()?
    .map(metric_from_row)
    .transpose()
}

/// All metrics of a model, ordered by name.
pub fn get_metrics_for_model(conn: &Connection, model_id: &Uuid) -> Result<Vec<Metric>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {METRIC_COLUMNS} FROM metrics WHERE model_id = ?1 ORDER BY name"
    ))?;
    let rows = stmt.query_map(params![model_id.to_string()], metric_row_from_rusqlite)?;

    let mut metrics = Vec::new();
    for row in rows {
        metrics.push(metric_from_row(row?)?);
    }
    Ok(metrics)
}

pub fn delete_metric(conn: &Connection, metric_id: &Uuid) -> Result<(), DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM metrics WHERE id = ?1",
        params![metric_id.to_string()],
    )?;
    if deleted == 0 {
        return Err(DatabaseError::not_found("metric", metric_id));
    }
    Ok(())
}

struct MetricRow {
    id: String,
    model_id: String,
    name: String,
    value: f64,
    sample_size: u32,
    created_at: String,
    updated_at: String,
}

fn metric_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MetricRow, rusqlite::Error> {
    Ok(MetricRow {
        id: row.get(0)?,
        model_id: row.get(1)?,
        name: row.get(2)?,
        value: row.get(3)?,
        sample_size: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn metric_from_row(row: MetricRow) -> Result<Metric, DatabaseError> {
    Ok(Metric {
        id: parse_id(&row.id)?,
        model_id: parse_id(&row.model_id)?,
        name: row.name,
        value: row.value,
        sample_size: row.sample_size,
        created_at: parse_timestamp(&row.created_at)?,
        updated_at: parse_timestamp(&row.updated_at)?,
    })
}
