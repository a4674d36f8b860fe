use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Human-verified ground truth for one (document, field). At most one per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub id: Uuid,
    pub document_id: Uuid,
    pub field_id: Uuid,
    pub field_name: String,
    pub value: String,
    pub occurrence: u32,
}

/// Machine-produced value for one (document, model, field). At most one per triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub document_id: Uuid,
    pub model_id: Uuid,
    pub field_id: Uuid,
    pub field_name: String,
    pub value: String,
    /// Counter for repeated fields such as line items.
    pub occurrence: u32,
    pub created_at: DateTime<Utc>,
}
