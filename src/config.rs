use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::extractors::{NOT_AVAILABLE_SENTINEL, PASS_SENTINEL};
use crate::pipeline::extraction::{HardcodedValuesExtractor, PassingExtractor};
use crate::pipeline::validation::field::{
    DEFAULT_DATE_FORMAT, DEFAULT_STRING_MAX_LENGTH, DEFAULT_STRING_MIN_LENGTH,
};
use crate::pipeline::validation::{HolidayCalendar, TypeRules};

/// Application-level constants
pub const APP_NAME: &str = "FieldCheck";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 60;
const DATABASE_FILE: &str = "fieldcheck.db";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "fieldcheck=info,warn"
}

/// ~/FieldCheck/, or ./FieldCheck/ when no home directory can be determined.
pub fn app_data_dir() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_else(|| {
        tracing::warn!("Cannot determine home directory, using working directory");
        PathBuf::from(".")
    });
    base.join(APP_NAME)
}

/// Runtime settings. Every field has a default; JSON documents and
/// `FIELDCHECK_*` environment variables override individual values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_path: PathBuf,
    pub backend_url: Option<String>,
    pub backend_api_key: Option<String>,
    pub backend_timeout_secs: u64,
    pub string_min_length: usize,
    pub string_max_length: usize,
    pub date_format: String,
    pub pass_sentinel: String,
    pub missing_sentinel: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: app_data_dir().join(DATABASE_FILE),
            backend_url: None,
            backend_api_key: None,
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
            string_min_length: DEFAULT_STRING_MIN_LENGTH,
            string_max_length: DEFAULT_STRING_MAX_LENGTH,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            pass_sentinel: PASS_SENTINEL.to_string(),
            missing_sentinel: NOT_AVAILABLE_SENTINEL.to_string(),
        }
    }
}

impl Settings {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Apply `FIELDCHECK_*` overrides from `lookup`. Unparsable numbers are
    /// ignored with a warning.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup("FIELDCHECK_DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("FIELDCHECK_BACKEND_URL") {
            self.backend_url = Some(url);
        }
        if let Some(key) = lookup("FIELDCHECK_BACKEND_API_KEY") {
            self.backend_api_key = Some(key);
        }
        if let Some(raw) = lookup("FIELDCHECK_BACKEND_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.backend_timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "Ignoring invalid FIELDCHECK_BACKEND_TIMEOUT_SECS"),
            }
        }
        self
    }

    /// Field-type dispatch table built from these settings.
    pub fn type_rules(&self) -> TypeRules {
        TypeRules {
            string_min_length: self.string_min_length,
            string_max_length: self.string_max_length,
            date_format: self.date_format.clone(),
            calendar: HolidayCalendar::default(),
        }
    }

    pub fn passing_extractor(&self) -> PassingExtractor {
        PassingExtractor::with_sentinel(&self.pass_sentinel)
    }

    pub fn hardcoded_extractor(&self) -> HardcodedValuesExtractor {
        HardcodedValuesExtractor::with_fallback(&self.missing_sentinel)
    }
}
