//! Criteria for bulk expense retrieval.
//!
//! All criteria are ANDed. Empty text, non-positive amounts and values that
//! fail to parse are treated as absent rather than as errors.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::expense::Expense;

pub const CATEGORY: &str = "category";
pub const DESCRIPTION: &str = "description";
pub const DATE_FROM: &str = "date_from";
pub const DATE_TO: &str = "date_to";
pub const MIN_AMOUNT: &str = "min_amount";
pub const MAX_AMOUNT: &str = "max_amount";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive substring of the category.
    pub category: Option<String>,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    /// Inclusive lower bound on `date`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `date`.
    pub date_to: Option<DateTime<Utc>>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

impl ExpenseFilter {
    /// Collects the recognised keys of a query string mapping.
    ///
    /// Unknown keys are ignored and unparseable values are dropped.
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            params
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
        };
        let amount = |key: &str| params.get(key).and_then(|value| value.trim().parse::<f64>().ok());
        let date = |key: &str| params.get(key).and_then(|value| parse_date(value));

        Self {
            category: text(CATEGORY),
            description: text(DESCRIPTION),
            date_from: date(DATE_FROM),
            date_to: date(DATE_TO),
            min_amount: amount(MIN_AMOUNT),
            max_amount: amount(MAX_AMOUNT),
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    pub fn min_amount(&self) -> Option<f64> {
        self.min_amount.filter(|amount| *amount > 0.0)
    }

    pub fn max_amount(&self) -> Option<f64> {
        self.max_amount.filter(|amount| *amount > 0.0)
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.category().is_none()
            && self.description().is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.min_amount().is_none()
            && self.max_amount().is_none()
    }

    /// Evaluates the filter against a single expense.
    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = self.category() {
            if !contains_ignore_case(&expense.category, category) {
                return false;
            }
        }

        if let Some(description) = self.description() {
            if !contains_ignore_case(&expense.description, description) {
                return false;
            }
        }

        if self.date_from.map_or(false, |from| expense.date < from) {
            return false;
        }

        if self.date_to.map_or(false, |to| expense.date > to) {
            return false;
        }

        if self.min_amount().map_or(false, |min| expense.amount < min) {
            return false;
        }

        if self.max_amount().map_or(false, |max| expense.amount > max) {
            return false;
        }

        true
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
