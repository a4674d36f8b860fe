//! Document-level rules over one model's predictions.
//!
//! Each rule is independent; `validate_document` runs a caller-chosen set and
//! reports which ones failed and why.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field::TypeRules;
use super::ValidationError;
use crate::models::{DocumentView, ExtractionModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum DocumentRule {
    /// Every required taxonomy field has a prediction.
    RequiredFields,
    /// Every prediction passes the rule for its field's data type.
    FieldTypes {
        #[serde(default)]
        rules: TypeRules,
    },
    /// Every taxonomy field, required or not, has a prediction.
    MissingFields,
}

impl DocumentRule {
    pub fn field_types() -> Self {
        Self::FieldTypes {
            rules: TypeRules::default(),
        }
    }

    /// The three built-in rules with default type rules.
    pub fn all() -> Vec<Self> {
        vec![Self::RequiredFields, Self::field_types(), Self::MissingFields]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::RequiredFields => "required_fields",
            Self::FieldTypes { .. } => "field_types",
            Self::MissingFields => "missing_fields",
        }
    }

    /// Offending field names for this rule; empty when the rule passes.
    pub fn violations(&self, view: &DocumentView, model: &ExtractionModel) -> Vec<String> {
        match self {
            Self::RequiredFields => missing_required_fields(view, model),
            Self::FieldTypes { rules } => invalid_fields(view, model, rules),
            Self::MissingFields => missing_fields(view, model),
        }
    }

    /// False as well when the document has no taxonomy or the model targets a
    /// different one.
    pub fn validate(&self, view: &DocumentView, model: &ExtractionModel) -> bool {
        if let Err(e) = check_taxonomy(view, model) {
            tracing::debug!(rule = self.name(), error = %e, "Document rule not applicable");
            return false;
        }
        self.violations(view, model).is_empty()
    }
}

fn predicted_field_ids(view: &DocumentView, model: &ExtractionModel) -> BTreeSet<Uuid> {
    view.predictions_for(model.id).map(|p| p.field_id).collect()
}

/// Required fields with no prediction from `model`.
pub fn missing_required_fields(view: &DocumentView, model: &ExtractionModel) -> Vec<String> {
    let predicted = predicted_field_ids(view, model);
    view.fields()
        .iter()
        .filter(|f| f.is_required && !predicted.contains(&f.id))
        .map(|f| f.name.clone())
        .collect()
}

/// Taxonomy fields with no prediction from `model`.
pub fn missing_fields(view: &DocumentView, model: &ExtractionModel) -> Vec<String> {
    let predicted = predicted_field_ids(view, model);
    view.fields()
        .iter()
        .filter(|f| !predicted.contains(&f.id))
        .map(|f| f.name.clone())
        .collect()
}

/// Predictions whose value fails their field's type rule. A prediction whose
/// field is not in the document's taxonomy counts as invalid.
pub fn invalid_fields(view: &DocumentView, model: &ExtractionModel, rules: &TypeRules) -> Vec<String> {
    view.predictions_for(model.id)
        .filter(|p| match view.field(p.field_id) {
            Some(field) => !rules.check(&field.data_type, &p.value),
            None => {
                tracing::warn!(
                    document_id = %view.document.id,
                    field = %p.field_name,
                    "Prediction references a field outside the document taxonomy"
                );
                true
            }
        })
        .map(|p| p.field_name.clone())
        .collect()
}

fn check_taxonomy(view: &DocumentView, model: &ExtractionModel) -> Result<(), ValidationError> {
    match &view.taxonomy {
        Some(taxonomy) if taxonomy.id != model.taxonomy_id => Err(ValidationError::TaxonomyMismatch {
            document_id: view.document.id,
            document_taxonomy: taxonomy.id,
            model_taxonomy: model.taxonomy_id,
        }),
        Some(_) => Ok(()),
        None => Err(ValidationError::NoTaxonomy {
            document_id: view.document.id,
        }),
    }
}

/// Outcome of one rule inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub passed: bool,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub document_id: Uuid,
    pub model_id: Uuid,
    pub outcomes: Vec<RuleOutcome>,
}

impl ValidationReport {
    /// Conjunction of every rule in the report.
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failed_rules(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.rule.as_str())
            .collect()
    }
}

/// Run `rules` against one model's predictions for a document.
///
/// A document without a taxonomy, or a model from another taxonomy, is a
/// caller error, not a failed rule.
pub fn validate_document(
    view: &DocumentView,
    model: &ExtractionModel,
    rules: &[DocumentRule],
) -> Result<ValidationReport, ValidationError> {
    check_taxonomy(view, model)?;

    let outcomes: Vec<RuleOutcome> = rules
        .iter()
        .map(|rule| {
            let fields = rule.violations(view, model);
            RuleOutcome {
                rule: rule.name().to_string(),
                passed: fields.is_empty(),
                fields,
            }
        })
        .collect();

    let report = ValidationReport {
        document_id: view.document.id,
        model_id: model.id,
        outcomes,
    };

    if !report.passed() {
        tracing::debug!(
            document_id = %report.document_id,
            model_id = %report.model_id,
            failed = ?report.failed_rules(),
            "Document validation failed"
        );
    }

    Ok(report)
}
