//! Deterministic extractors for exercising validation and scoring without a
//! real backend.

use super::traits::{DocumentExtractor, ExtractionContext};
use super::ExtractionError;
use crate::models::{DocumentView, ExtractionModel, FieldValues};

pub const PASS_SENTINEL: &str = "PASS";
pub const NOT_AVAILABLE_SENTINEL: &str = "N/A";

/// Assigns one fixed value to every field of the model's taxonomy.
pub struct PassingExtractor {
    sentinel: String,
}

impl PassingExtractor {
    pub fn new() -> Self {
        Self::with_sentinel(PASS_SENTINEL)
    }

    pub fn with_sentinel(sentinel: &str) -> Self {
        Self {
            sentinel: sentinel.to_string(),
        }
    }
}

impl Default for PassingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for PassingExtractor {
    fn name(&self) -> &str {
        "passing"
    }

    fn extract(
        &self,
        document: &DocumentView,
        model: &ExtractionModel,
        _context: &ExtractionContext,
    ) -> Result<FieldValues, ExtractionError> {
        Ok(document
            .fields_for_model(model)
            .iter()
            .map(|f| (f.name.clone(), self.sentinel.clone()))
            .collect())
    }
}

/// Takes each field's value from the call context, falling back to a
/// sentinel for fields the context does not mention. Context keys that are
/// not taxonomy fields are ignored.
pub struct HardcodedValuesExtractor {
    fallback: String,
}

impl HardcodedValuesExtractor {
    pub fn new() -> Self {
        Self::with_fallback(NOT_AVAILABLE_SENTINEL)
    }

    pub fn with_fallback(fallback: &str) -> Self {
        Self {
            fallback: fallback.to_string(),
        }
    }
}

impl Default for HardcodedValuesExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentExtractor for HardcodedValuesExtractor {
    fn name(&self) -> &str {
        "hardcoded"
    }

    fn extract(
        &self,
        document: &DocumentView,
        model: &ExtractionModel,
        context: &ExtractionContext,
    ) -> Result<FieldValues, ExtractionError> {
        Ok(document
            .fields_for_model(model)
            .iter()
            .map(|f| {
                let value = context.get(&f.name).unwrap_or(self.fallback.as_str());
                (f.name.clone(), value.to_string())
            })
            .collect())
    }
}
