//! Single-value validation rules.
//!
//! Rules never error: a value that fails to parse simply fails the rule.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::calendar::HolidayCalendar;
use super::checksum::{is_valid_cusip, is_valid_isin};
use crate::models::DataType;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_STRING_MIN_LENGTH: usize = 1;
pub const DEFAULT_STRING_MAX_LENGTH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Parses as a finite decimal number.
    Decimal,
    /// Numeric and within `[min, max]`, either bound optional.
    Range {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Character count within `[min, max]`, either bound optional.
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    DateFormat {
        #[serde(default = "default_date_format")]
        format: String,
    },
    /// Pattern matches at the start of the value.
    Regex { pattern: String },
    Isin,
    Cusip,
    /// `YYYY-MM-DD` date that falls on a business day of `calendar`.
    TradeDate {
        #[serde(default)]
        calendar: HolidayCalendar,
    },
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl FieldRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Decimal => "decimal",
            Self::Range { .. } => "range",
            Self::Length { .. } => "length",
            Self::DateFormat { .. } => "date_format",
            Self::Regex { .. } => "regex",
            Self::Isin => "isin",
            Self::Cusip => "cusip",
            Self::TradeDate { .. } => "trade_date",
        }
    }

    pub fn validate(&self, value: &str) -> bool {
        match self {
            Self::Decimal => is_decimal(value),
            Self::Range { min, max } => in_range(value, *min, *max),
            Self::Length { min, max } => length_within(value, *min, *max),
            Self::DateFormat { format } => matches_date_format(value, format),
            Self::Regex { pattern } => matches_regex(value, pattern),
            Self::Isin => is_valid_isin(value),
            Self::Cusip => is_valid_cusip(value),
            Self::TradeDate { calendar } => is_trade_date(value, calendar),
        }
    }
}

fn parse_decimal(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_decimal(value: &str) -> bool {
    parse_decimal(value).is_some()
}

pub fn in_range(value: &str, min: Option<f64>, max: Option<f64>) -> bool {
    let Some(v) = parse_decimal(value) else {
        return false;
    };
    min.map_or(true, |m| v >= m) && max.map_or(true, |m| v <= m)
}

/// Length in characters, not bytes.
pub fn length_within(value: &str, min: Option<usize>, max: Option<usize>) -> bool {
    let len = value.chars().count();
    min.map_or(true, |m| len >= m) && max.map_or(true, |m| len <= m)
}

/// Whole value parses under `format` (strftime syntax). Formats carrying a
/// time component are accepted too.
pub fn matches_date_format(value: &str, format: &str) -> bool {
    NaiveDate::parse_from_str(value, format).is_ok()
        || NaiveDateTime::parse_from_str(value, format).is_ok()
}

/// An invalid pattern fails validation rather than erroring.
pub fn matches_regex(value: &str, pattern: &str) -> bool {
    match Regex::new(&format!("^(?:{pattern})")) {
        Ok(re) => re.is_match(value),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "Invalid validation pattern");
            false
        }
    }
}

pub fn is_trade_date(value: &str, calendar: &HolidayCalendar) -> bool {
    NaiveDate::parse_from_str(value, DEFAULT_DATE_FORMAT)
        .is_ok_and(|date| calendar.is_business_day(date))
}

/// Data-type → rule dispatch table used by the field-type document rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeRules {
    pub string_min_length: usize,
    pub string_max_length: usize,
    pub date_format: String,
    pub calendar: HolidayCalendar,
}

impl Default for TypeRules {
    fn default() -> Self {
        Self {
            string_min_length: DEFAULT_STRING_MIN_LENGTH,
            string_max_length: DEFAULT_STRING_MAX_LENGTH,
            date_format: default_date_format(),
            calendar: HolidayCalendar::default(),
        }
    }
}

impl TypeRules {
    /// Rule for a declared type; `None` means the type is not checked.
    pub fn rule_for(&self, data_type: &DataType) -> Option<FieldRule> {
        match data_type {
            DataType::Number => Some(FieldRule::Decimal),
            DataType::Date => Some(FieldRule::DateFormat {
                format: self.date_format.clone(),
            }),
            DataType::String => Some(FieldRule::Length {
                min: Some(self.string_min_length),
                max: Some(self.string_max_length),
            }),
            DataType::Isin => Some(FieldRule::Isin),
            DataType::Cusip => Some(FieldRule::Cusip),
            DataType::TradeDate => Some(FieldRule::TradeDate {
                calendar: self.calendar.clone(),
            }),
            DataType::Other(_) => None,
        }
    }

    /// Whether `value` satisfies the rule for `data_type`. Unchecked types pass.
    pub fn check(&self, data_type: &DataType, value: &str) -> bool {
        self.rule_for(data_type).map_or(true, |rule| rule.validate(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_values() {
        assert!(is_decimal("42"));
        assert!(is_decimal("-3.75"));
        assert!(is_decimal(" 1e3 "));
        assert!(!is_decimal("12,50"));
        assert!(!is_decimal("N/A"));
        assert!(!is_decimal(""));
        assert!(!is_decimal("NaN"));
        assert!(!is_decimal("inf"));
    }

    #[test]
    fn range_bounds_inclusive() {
        assert!(in_range("10", Some(10.0), Some(20.0)));
        assert!(in_range("20", Some(10.0), Some(20.0)));
        assert!(!in_range("20.01", Some(10.0), Some(20.0)));
        assert!(!in_range("9.99", Some(10.0), None));
        assert!(in_range("1000000", Some(10.0), None));
        assert!(in_range("-5", None, None));
        assert!(!in_range("ten", None, None));
    }

    #[test]
    fn length_counts_characters() {
        assert!(length_within("Invoice", Some(1), Some(1000)));
        assert!(!length_within("", Some(1), Some(1000)));
        assert!(length_within("Zürich", Some(6), Some(6)));
        assert!(!length_within("abcdef", None, Some(5)));
        assert!(length_within("", None, None));
    }

    #[test]
    fn date_format_checks() {
        assert!(matches_date_format("2023-01-01", "%Y-%m-%d"));
        assert!(!matches_date_format("01/01/2023", "%Y-%m-%d"));
        assert!(matches_date_format("01/01/2023", "%m/%d/%Y"));
        assert!(!matches_date_format("2023-02-30", "%Y-%m-%d"));
        assert!(matches_date_format("2023-01-01 09:30", "%Y-%m-%d %H:%M"));
    }

    #[test]
    fn regex_prefix_match() {
        assert!(matches_regex("INV-001", r"INV-\d{3}"));
        assert!(matches_regex("INV-001-extra", r"INV-\d{3}"));
        assert!(!matches_regex("XINV-001", r"INV-\d{3}"));
        assert!(matches_regex("INV-001", r"INV-\d{3}$"));
        // alternation must not escape the anchor
        assert!(!matches_regex("xb", "a|b"));
    }

    #[test]
    fn invalid_regex_is_a_failure_not_an_error() {
        assert!(!matches_regex("anything", "(unclosed"));
    }

    #[test]
    fn trade_dates() {
        let cal = HolidayCalendar::default();
        assert!(is_trade_date("2023-07-05", &cal));
        assert!(!is_trade_date("2023-07-04", &cal)); // Independence Day
        assert!(!is_trade_date("2023-12-25", &cal)); // Christmas
        assert!(!is_trade_date("2024-01-01", &cal)); // New Year's Day
        assert!(!is_trade_date("2023-01-07", &cal)); // Saturday
        assert!(!is_trade_date("2023-02-29", &cal)); // not a date
        assert!(!is_trade_date("07/05/2023", &cal));
    }

    #[test]
    fn rules_dispatch_by_variant() {
        assert!(FieldRule::Isin.validate("US0378331005"));
        assert!(FieldRule::Cusip.validate("037833100"));
        assert!(!FieldRule::Cusip.validate("037833101"));
        assert!(FieldRule::Range { min: Some(0.0), max: Some(1.0) }.validate("0.5"));
        assert!(FieldRule::Regex { pattern: "^[A-Z]{3}$".into() }.validate("USD"));
    }

    #[test]
    fn rules_load_from_json() {
        let rules: Vec<FieldRule> = serde_json::from_str(
            r#"[
                {"rule": "range", "min": 0},
                {"rule": "date_format"},
                {"rule": "trade_date"},
                {"rule": "regex", "pattern": "\\d+"}
            ]"#,
        )
        .unwrap();

        assert_eq!(rules[0], FieldRule::Range { min: Some(0.0), max: None });
        assert_eq!(rules[1], FieldRule::DateFormat { format: "%Y-%m-%d".into() });
        assert_eq!(rules[2], FieldRule::TradeDate { calendar: HolidayCalendar::minimal_us() });
        assert_eq!(rules[3].name(), "regex");
    }

    #[test]
    fn type_dispatch_table() {
        let rules = TypeRules::default();
        assert_eq!(rules.rule_for(&DataType::Number), Some(FieldRule::Decimal));
        assert_eq!(
            rules.rule_for(&DataType::String),
            Some(FieldRule::Length { min: Some(1), max: Some(1000) })
        );
        assert_eq!(rules.rule_for(&DataType::Other("currency".into())), None);
    }

    #[test]
    fn type_check_uses_dispatch() {
        let rules = TypeRules::default();
        assert!(rules.check(&DataType::Number, "12.5"));
        assert!(!rules.check(&DataType::Number, "PASS"));
        assert!(rules.check(&DataType::Date, "2021-01-15"));
        assert!(!rules.check(&DataType::Date, "15/01/2021"));
        assert!(!rules.check(&DataType::String, ""));
        assert!(rules.check(&DataType::Other("anything".into()), ""));
    }
}
