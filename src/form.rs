use std::ops::RangeInclusive;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::api::SearchRequest;
use crate::surface::InputField;

pub const DEFAULT_MAX_RESULTS: u32 = 50;

/// Bounds of the max-results input.
pub const MAX_RESULTS_RANGE: RangeInclusive<u32> = 1..=200;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please enter a search term")]
    EmptyQuery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchForm {
    pub query: String,
    pub max_results: u32,
}

impl SearchForm {
    pub fn read(query: &dyn InputField, max_results: &dyn InputField, default_max: u32) -> Self {
        Self {
            query: query.value().trim().to_string(),
            max_results: parse_max_results(&max_results.value(), default_max),
        }
    }

    pub fn validate(&self) -> Result<SearchRequest, FormError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(FormError::EmptyQuery);
        }
        Ok(SearchRequest {
            search_query: query.to_string(),
            max_results: self.max_results,
        })
    }
}

fn int_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[+-]?\d+").unwrap())
}

/// Reads the numeric input the way a browser form does: leading integer
/// ("25 results" -> 25), `default` when there is none, then clamped to
/// [`MAX_RESULTS_RANGE`].
pub fn parse_max_results(raw: &str, default: u32) -> u32 {
    let parsed = int_prefix()
        .find(raw.trim())
        .and_then(|m| m.as_str().parse::<i64>().ok());
    let value = match parsed {
        Some(v) => v.clamp(
            i64::from(*MAX_RESULTS_RANGE.start()),
            i64::from(*MAX_RESULTS_RANGE.end()),
        ),
        None => return default.clamp(*MAX_RESULTS_RANGE.start(), *MAX_RESULTS_RANGE.end()),
    };
    u32::try_from(value).unwrap_or(default)
}
