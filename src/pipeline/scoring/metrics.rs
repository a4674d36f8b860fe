//! Aggregate statistics over a set of document comparisons.
//!
//! All values are percentages in `[0, 100]`. An empty input has no defined
//! aggregate and is an error rather than zero.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comparison::DocumentComparison;
use super::ScoringError;
use crate::models::MetricUpsert;

pub const OVERALL_ACCURACY: &str = "overall_accuracy";
pub const PERCENT_FULLY_CORRECT: &str = "perc_of_full_correct";

/// Metric name for one field's accuracy, e.g. `issue_date_accuracy`.
pub fn field_metric_name(field: &str) -> String {
    format!("{field}_accuracy")
}

fn ensure_results(results: &[DocumentComparison]) -> Result<(), ScoringError> {
    if results.is_empty() {
        return Err(ScoringError::NoResults);
    }
    Ok(())
}

/// Per-field match percentage across documents.
///
/// Every result must carry the same labeled field set; a document labeled on
/// different fields is rejected rather than silently scored.
pub fn field_accuracy(results: &[DocumentComparison]) -> Result<BTreeMap<String, f64>, ScoringError> {
    ensure_results(results)?;

    let expected: Vec<&str> = results[0].field_names().collect();
    for result in &results[1..] {
        let found: Vec<&str> = result.field_names().collect();
        if found != expected {
            return Err(ScoringError::HeterogeneousFields {
                document_id: result.document_id,
                expected: expected.iter().map(|s| s.to_string()).collect(),
                found: found.iter().map(|s| s.to_string()).collect(),
            });
        }
    }

    let total = results.len() as f64;
    Ok(expected
        .into_iter()
        .map(|field| {
            let matches = results
                .iter()
                .filter(|r| r.field_results.get(field).is_some_and(|f| f.matched))
                .count();
            (field.to_string(), matches as f64 / total * 100.0)
        })
        .collect())
}

/// Mean of the per-document accuracy rates.
pub fn overall_accuracy(results: &[DocumentComparison]) -> Result<f64, ScoringError> {
    ensure_results(results)?;
    let mut sum = 0.0;
    for result in results {
        sum += result.accuracy_rate()?;
    }
    Ok(sum / results.len() as f64 * 100.0)
}

/// Share of documents where every labeled field matched.
pub fn percent_fully_correct(results: &[DocumentComparison]) -> Result<f64, ScoringError> {
    ensure_results(results)?;
    let correct = results.iter().filter(|r| r.all_fields_correct()).count();
    Ok(correct as f64 / results.len() as f64 * 100.0)
}

/// The three aggregates over one set of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub field_accuracy: BTreeMap<String, f64>,
    pub overall_accuracy: f64,
    pub percent_fully_correct: f64,
    /// Number of documents aggregated.
    pub sample_size: u32,
}

impl ScoreSummary {
    pub fn from_results(results: &[DocumentComparison]) -> Result<Self, ScoringError> {
        Ok(Self {
            field_accuracy: field_accuracy(results)?,
            overall_accuracy: overall_accuracy(results)?,
            percent_fully_correct: percent_fully_correct(results)?,
            sample_size: u32::try_from(results.len()).unwrap_or(u32::MAX),
        })
    }

    /// Upsert requests for every aggregate, all with the same sample size.
    pub fn metric_requests(&self, model_id: Uuid) -> Vec<MetricUpsert> {
        let request = |name: String, value: f64| MetricUpsert {
            name,
            value,
            sample_size: self.sample_size,
            model_id,
        };

        let mut requests = vec![
            request(OVERALL_ACCURACY.to_string(), self.overall_accuracy),
            request(PERCENT_FULLY_CORRECT.to_string(), self.percent_fully_correct),
        ];
        requests.extend(
            self.field_accuracy
                .iter()
                .map(|(field, value)| request(field_metric_name(field), *value)),
        );
        requests
    }
}
