use crate::models::{DocumentView, ExtractionModel, FieldValues};

use super::ExtractionError;

/// Caller-supplied keyword values, keyed by field name.
///
/// Extractors decide what the values mean; the hard-coded extractor uses them
/// as overrides, the others ignore them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionContext {
    values: FieldValues,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.values.insert(field.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<FieldValues> for ExtractionContext {
    fn from(values: FieldValues) -> Self {
        Self { values }
    }
}

/// Produces field values for one document under one extraction model.
///
/// Implementations return values only for fields of the model's taxonomy and
/// never write anything. A document without a taxonomy yields an empty map,
/// not an error. `Err` is reserved for failures of the extractor itself, so
/// an empty `Ok` always means "ran and found nothing".
pub trait DocumentExtractor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn extract(
        &self,
        document: &DocumentView,
        model: &ExtractionModel,
        context: &ExtractionContext,
    ) -> Result<FieldValues, ExtractionError>;
}
