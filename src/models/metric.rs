use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named measurement for one extraction model. Unique per (model, name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: Uuid,
    pub model_id: Uuid,
    pub name: String,
    pub value: f64,
    pub sample_size: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create or overwrite the metric `name` of `model_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricUpsert {
    pub name: String,
    pub value: f64,
    pub sample_size: u32,
    pub model_id: Uuid,
}
