//! Expense domain entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValidationError;

/// Unix timestamp of `0001-01-01T00:00:00Z`, the wire value of an unset date.
pub const UNSET_DATE_TIMESTAMP: i64 = -62_135_596_800;

/// Returns true when `date` is the "zero" instant that stands for "no date".
pub fn is_unset_date(date: &DateTime<Utc>) -> bool {
    date.timestamp() == UNSET_DATE_TIMESTAMP && date.timestamp_subsec_nanos() == 0
}

/// A single personal expense record.
///
/// `created_at` and `updated_at` are owned by the storage layer; the values
/// assigned by [`Expense::new`] are provisional until the record is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field replacements for a partial update.
///
/// A field counts as supplied only when it is `Some` and carries a non-zero
/// value: a non-empty string, an amount above zero, or a date other than the
/// unset instant. Anything else leaves the current value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Expense {
    /// Builds a new expense with a fresh id, rejecting it on the first rule it
    /// breaks (description, amount, category, date).
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        let expense = Self {
            id: Uuid::new_v4(),
            description: description.into(),
            amount,
            category: category.into(),
            date,
            created_at: now,
            updated_at: now,
        };

        expense.validate()?;
        Ok(expense)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.is_empty() {
            return Err(ValidationError::InvalidDescription);
        }

        if !(self.amount > 0.0) || !self.amount.is_finite() {
            return Err(ValidationError::InvalidAmount);
        }

        if self.category.is_empty() {
            return Err(ValidationError::InvalidCategory);
        }

        if is_unset_date(&self.date) {
            return Err(ValidationError::InvalidDate);
        }

        Ok(())
    }

    /// Applies the supplied fields of `changes`, then re-validates.
    ///
    /// On error the expense is left untouched.
    pub fn apply_changes(&mut self, changes: ExpenseChanges) -> Result<(), ValidationError> {
        let mut candidate = self.clone();

        if let Some(description) = changes.description.filter(|d| !d.is_empty()) {
            candidate.description = description;
        }

        if let Some(amount) = changes.amount.filter(|a| *a > 0.0) {
            candidate.amount = amount;
        }

        if let Some(category) = changes.category.filter(|c| !c.is_empty()) {
            candidate.category = category;
        }

        if let Some(date) = changes.date.filter(|d| !is_unset_date(d)) {
            candidate.date = date;
        }

        candidate.validate()?;
        *self = candidate;
        Ok(())
    }
}
