//! Query requests, scalar parameter values, and canonical cache keys.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Closed scalar value used for request parameters and response cells.
///
/// Untagged serde representation matches the JSON wire shape directly:
/// strings, numbers, booleans, and null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
}

impl Scalar {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            // Whole numbers render without a trailing ".0" so canonical keys
            // stay stable across integer/float construction.
            Self::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Null => Ok(()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A named remote query plus its parameter mapping.
///
/// Parameters live in a `BTreeMap` so canonical serialization is ordered by
/// key with no extra sorting pass, and two requests that differ only in
/// parameter insertion order are identical values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    operation: String,
    params: BTreeMap<String, Scalar>,
}

impl QueryRequest {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn params(&self) -> &BTreeMap<String, Scalar> {
        &self.params
    }

    /// Canonical cache key: the operation alone when there are no parameters,
    /// otherwise `operation?k1=v1&k2=v2` with keys in lexicographic order.
    /// Null parameters do not contribute to the key.
    pub fn cache_key(&self) -> String {
        let mut pairs = self
            .params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .peekable();

        if pairs.peek().is_none() {
            return self.operation.clone();
        }

        let query = pairs
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.operation)
    }

    /// Validate the request before dispatch.
    ///
    /// Date-like parameters must match `YYYYMMDD` or `YYYY-MM-DD`; numeric
    /// values are checked against their canonical rendering, so `20240131`
    /// as a number passes like its text form. When both a start and end date
    /// are present the range must not be inverted.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the malformed field; validation is
    /// synchronous and side-effect-free.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.operation.trim().is_empty() {
            return Err(ValidationError::EmptyOperation);
        }

        for (key, value) in &self.params {
            if !is_date_field(key) {
                continue;
            }
            let Some(rendered) = date_value(value) else {
                continue;
            };
            if !is_valid_date(&rendered) {
                return Err(ValidationError::InvalidDate {
                    field: key.clone(),
                    value: rendered,
                });
            }
        }

        if let (Some(start), Some(end)) = (self.date_param("start_date"), self.date_param("end_date"))
        {
            let start_compact = start.replace('-', "");
            let end_compact = end.replace('-', "");
            if start_compact > end_compact {
                return Err(ValidationError::DateRangeInverted { start, end });
            }
        }

        Ok(())
    }

    fn date_param(&self, key: &str) -> Option<String> {
        self.params.get(key).and_then(date_value)
    }
}

/// Canonical rendering of a date-like value; null contributes nothing.
fn date_value(value: &Scalar) -> Option<String> {
    match value {
        Scalar::Null => None,
        other => Some(other.to_string()),
    }
}

/// A parameter is date-like when it is named `date` or ends in `_date`.
fn is_date_field(key: &str) -> bool {
    key == "date" || key.ends_with("_date")
}

/// Accepts the 8-digit compact form or the hyphenated calendar form.
fn is_valid_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.len() {
        8 => bytes.iter().all(u8::is_ascii_digit),
        10 => {
            bytes[4] == b'-'
                && bytes[7] == b'-'
                && bytes
                    .iter()
                    .enumerate()
                    .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_for_bare_operation_is_the_operation() {
        let request = QueryRequest::new("market.quote");
        assert_eq!(request.cache_key(), "market.quote");
    }

    #[test]
    fn cache_key_sorts_parameters_lexicographically() {
        let request = QueryRequest::new("market.bars")
            .with_param("symbol", "AAPL")
            .with_param("interval", "1d")
            .with_param("limit", 30i64);

        assert_eq!(
            request.cache_key(),
            "market.bars?interval=1d&limit=30&symbol=AAPL"
        );
    }

    #[test]
    fn cache_key_ignores_insertion_order() {
        let a = QueryRequest::new("op")
            .with_param("x", 1i64)
            .with_param("y", 2i64);
        let b = QueryRequest::new("op")
            .with_param("y", 2i64)
            .with_param("x", 1i64);
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn null_parameters_are_excluded_from_the_key() {
        let request = QueryRequest::new("op")
            .with_param("a", Scalar::Null)
            .with_param("b", "v");
        assert_eq!(request.cache_key(), "op?b=v");

        let only_null = QueryRequest::new("op").with_param("a", Scalar::Null);
        assert_eq!(only_null.cache_key(), "op");
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        let request = QueryRequest::new("op")
            .with_param("count", 10.0)
            .with_param("ratio", 0.5);
        assert_eq!(request.cache_key(), "op?count=10&ratio=0.5");
    }

    #[test]
    fn empty_operation_is_rejected() {
        assert_eq!(
            QueryRequest::new("  ").validate(),
            Err(ValidationError::EmptyOperation)
        );
    }

    #[test]
    fn compact_and_hyphenated_dates_are_accepted() {
        let compact = QueryRequest::new("op").with_param("start_date", "20240131");
        assert_eq!(compact.validate(), Ok(()));

        let hyphenated = QueryRequest::new("op").with_param("start_date", "2024-01-31");
        assert_eq!(hyphenated.validate(), Ok(()));
    }

    #[test]
    fn malformed_dates_name_the_field() {
        let request = QueryRequest::new("op").with_param("trade_date", "Jan 31 2024");
        assert_eq!(
            request.validate(),
            Err(ValidationError::InvalidDate {
                field: String::from("trade_date"),
                value: String::from("Jan 31 2024"),
            })
        );

        let request = QueryRequest::new("op").with_param("date", "2024131");
        assert!(request.validate().is_err());
    }

    #[test]
    fn numeric_dates_validate_by_canonical_rendering() {
        let compact = QueryRequest::new("op").with_param("start_date", 20240131i64);
        assert_eq!(compact.validate(), Ok(()));

        // Seven digits render as "2024131", which matches neither form.
        let short = QueryRequest::new("op").with_param("start_date", 2024131i64);
        assert!(matches!(
            short.validate(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn numeric_and_text_dates_compare_in_range_checks() {
        let inverted = QueryRequest::new("op")
            .with_param("start_date", 20240201i64)
            .with_param("end_date", "2024-01-31");
        assert!(matches!(
            inverted.validate(),
            Err(ValidationError::DateRangeInverted { .. })
        ));

        let ordered = QueryRequest::new("op")
            .with_param("start_date", 20240101i64)
            .with_param("end_date", "2024-01-31");
        assert_eq!(ordered.validate(), Ok(()));
    }

    #[test]
    fn boolean_date_parameters_are_rejected() {
        let request = QueryRequest::new("op").with_param("date", true);
        assert!(matches!(
            request.validate(),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn non_date_parameters_are_not_date_checked() {
        let request = QueryRequest::new("op").with_param("update", "not a date");
        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn inverted_ranges_are_rejected_across_both_forms() {
        let request = QueryRequest::new("op")
            .with_param("start_date", "2024-02-01")
            .with_param("end_date", "20240131");
        assert_eq!(
            request.validate(),
            Err(ValidationError::DateRangeInverted {
                start: String::from("2024-02-01"),
                end: String::from("20240131"),
            })
        );

        let ordered = QueryRequest::new("op")
            .with_param("start_date", "20240101")
            .with_param("end_date", "2024-01-31");
        assert_eq!(ordered.validate(), Ok(()));

        let equal = QueryRequest::new("op")
            .with_param("start_date", "20240115")
            .with_param("end_date", "2024-01-15");
        assert_eq!(equal.validate(), Ok(()));
    }
}
