use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::parse_id;
use crate::db::DatabaseError;
use crate::models::*;

/// Insert a taxonomy together with its fields, atomically.
pub fn insert_taxonomy(conn: &Connection, taxonomy: &Taxonomy) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO taxonomies (id, name, description, version, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            taxonomy.id.to_string(),
            taxonomy.name,
            taxonomy.description,
            taxonomy.version,
            taxonomy.is_active,
        ],
    )?;
    for field in &taxonomy.fields {
        if field.taxonomy_id != taxonomy.id {
            return Err(DatabaseError::ConstraintViolation(format!(
                "Field '{}' belongs to taxonomy {}, not {}",
                field.name, field.taxonomy_id, taxonomy.id
            )));
        }
        insert_field(&tx, field)?;
    }
    tx.commit()?;
    Ok(())
}

pub fn insert_field(conn: &Connection, field: &Field) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO fields (id, taxonomy_id, name, data_type, description, is_required)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            field.id.to_string(),
            field.taxonomy_id.to_string(),
            field.name,
            field.data_type.as_str(),
            field.description,
            field.is_required,
        ],
    )?;
    Ok(())
}

/// Load a taxonomy with its fields. Missing taxonomy → `NotFound`.
pub fn get_taxonomy(conn: &Connection, id: &Uuid) -> Result<Taxonomy, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, version, is_active FROM taxonomies WHERE id = ?1",
            params![id.to_string()],
            taxonomy_row_from_rusqlite,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::not_found("taxonomy", id))?;
    taxonomy_from_row(conn, row)
}

pub fn get_taxonomy_by_name(conn: &Connection, name: &str) -> Result<Option<Taxonomy>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, version, is_active FROM taxonomies WHERE name = ?1",
            params![name],
            taxonomy_row_from_rusqlite,
        )
        .optional()?;
    row.map(|r| taxonomy_from_row(conn, r)).transpose()
}

/// Fields of a taxonomy in insertion order.
pub fn get_fields_for_taxonomy(conn: &Connection, taxonomy_id: &Uuid) -> Result<Vec<Field>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, taxonomy_id, name, data_type, description, is_required
         FROM fields WHERE taxonomy_id = ?1 ORDER BY rowid",
    )?;

    let rows = stmt.query_map(params![taxonomy_id.to_string()], |row| {
        Ok(FieldRow {
            id: row.get(0)?,
            taxonomy_id: row.get(1)?,
            name: row.get(2)?,
            data_type: row.get(3)?,
            description: row.get(4)?,
            is_required: row.get(5)?,
        })
    })?;

    let mut fields = Vec::new();
    for row in rows {
        let row = row?;
        fields.push(Field {
            id: parse_id(&row.id)?,
            taxonomy_id: parse_id(&row.taxonomy_id)?,
            name: row.name,
            data_type: DataType::parse(&row.data_type),
            description: row.description,
            is_required: row.is_required,
        });
    }
    Ok(fields)
}

// Internal row types
struct TaxonomyRow {
    id: String,
    name: String,
    description: Option<String>,
    version: Option<String>,
    is_active: bool,
}

struct FieldRow {
    id: String,
    taxonomy_id: String,
    name: String,
    data_type: String,
    description: Option<String>,
    is_required: bool,
}

fn taxonomy_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<TaxonomyRow, rusqlite::Error> {
    Ok(TaxonomyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        version: row.get(3)?,
        is_active: row.get(4)?,
    })
}

fn taxonomy_from_row(conn: &Connection, row: TaxonomyRow) -> Result<Taxonomy, DatabaseError> {
    let id = parse_id(&row.id)?;
    Ok(Taxonomy {
        id,
        name: row.name,
        description: row.description,
        version: row.version,
        is_active: row.is_active,
        fields: get_fields_for_taxonomy(conn, &id)?,
    })
}
