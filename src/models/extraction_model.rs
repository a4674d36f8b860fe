use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A versioned configuration identifying one batch of predictions against a taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionModel {
    pub id: Uuid,
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub taxonomy_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ExtractionModel {
    pub fn new(name: &str, taxonomy_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version: None,
            description: None,
            taxonomy_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
