//! Post-processing of raw extracted values.
//!
//! Each field maps to an ordered list of named transformations. The list is
//! plain data (serde), so per-field chains can live in configuration files
//! rather than code. Chains apply left to right: `[f, g]` yields `g(f(x))`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::FieldValues;

/// Canonical output format of `StandardizeDate`.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Input formats tried, in order, when none are configured.
pub const DEFAULT_DATE_INPUT_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// A unary string transformation, identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Transform {
    /// Collapse whitespace runs to one space and trim both ends.
    NormalizeWhitespace,
    /// Trim leading and trailing whitespace only.
    Trim,
    /// Drop everything except ASCII letters, digits, whitespace and `keep`.
    RemoveSpecialCharacters {
        #[serde(default)]
        keep: String,
    },
    /// Rewrite a date to `YYYY-MM-DD`; values no format matches pass through unchanged.
    StandardizeDate {
        #[serde(default = "default_input_formats")]
        input_formats: Vec<String>,
    },
    /// Keep the first `max_chars` characters.
    Truncate { max_chars: usize },
    Uppercase,
    Lowercase,
}

fn default_input_formats() -> Vec<String> {
    DEFAULT_DATE_INPUT_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Transform {
    pub fn standardize_date() -> Self {
        Self::StandardizeDate {
            input_formats: default_input_formats(),
        }
    }

    pub fn remove_special_characters(keep: &str) -> Self {
        Self::RemoveSpecialCharacters {
            keep: keep.to_string(),
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            Self::NormalizeWhitespace => normalize_whitespace(value),
            Self::Trim => value.trim().to_string(),
            Self::RemoveSpecialCharacters { keep } => remove_special_characters(value, keep),
            Self::StandardizeDate { input_formats } => standardize_date(value, input_formats.as_slice())
                .unwrap_or_else(|| {
                    tracing::debug!(value, "No date format matched, value left unchanged");
                    value.to_string()
                }),
            Self::Truncate { max_chars } => value.chars().take(*max_chars).collect(),
            Self::Uppercase => value.to_uppercase(),
            Self::Lowercase => value.to_lowercase(),
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn remove_special_characters(text: &str, keep: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || keep.contains(*c))
        .collect()
}

/// Parse `text` with the first matching format and render it as `YYYY-MM-DD`.
/// `None` when no format matches.
pub fn standardize_date<S: AsRef<str>>(text: &str, input_formats: &[S]) -> Option<String> {
    let text = text.trim();
    input_formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt.as_ref()).ok())
        .map(|date| date.format(CANONICAL_DATE_FORMAT).to_string())
}

/// Per-field transformation chains.
pub type PostProcessingConfig = BTreeMap<String, Vec<Transform>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostProcessor {
    operations: PostProcessingConfig,
}

impl PostProcessor {
    pub fn new(operations: PostProcessingConfig) -> Self {
        Self { operations }
    }

    /// Load a configuration such as `{"issue_date": [{"op": "truncate", "max_chars": 10}]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Append a transformation to a field's chain.
    pub fn with(mut self, field: &str, transform: Transform) -> Self {
        self.operations.entry(field.to_string()).or_default().push(transform);
        self
    }

    pub fn chain(&self, field: &str) -> &[Transform] {
        self.operations.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Run one value through its field's chain.
    pub fn apply(&self, field: &str, value: &str) -> String {
        self.chain(field)
            .iter()
            .fold(value.to_string(), |acc, transform| transform.apply(&acc))
    }

    /// Apply every configured chain. Fields without a chain pass through;
    /// configured fields absent from `predictions` are ignored.
    pub fn process(&self, predictions: &FieldValues) -> FieldValues {
        predictions
            .iter()
            .map(|(field, value)| (field.clone(), self.apply(field, value)))
            .collect()
    }
}
