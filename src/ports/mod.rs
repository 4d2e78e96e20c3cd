//! Storage port: the persistence contract the service layer depends on.
//!
//! Implementations live in [`crate::adapters`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::context::Context;
use crate::domain::{Expense, ExpenseFilter};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("expense not found: {0}")]
    NotFound(String),

    #[error("invalid UUID format: {0}")]
    InvalidIdentifier(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Parses a caller-supplied identifier; malformed input is
/// [`RepositoryError::InvalidIdentifier`], never `NotFound`.
pub fn parse_expense_id(id: &str) -> RepositoryResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|e| RepositoryError::InvalidIdentifier(format!("{id}: {e}")))
}

/// Persistence operations for expenses.
///
/// Every call takes the request [`Context`] and must abort promptly once it is
/// cancelled or past its deadline. `created_at` is set on insert and
/// `updated_at` is refreshed on every successful write; the stored record is
/// returned so callers observe those values.
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Inserts a new, already validated expense.
    async fn create(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense>;

    async fn get_by_id(&self, ctx: &Context, id: &str) -> RepositoryResult<Expense>;

    /// Returns every expense matching `filter`, most recent `date` first.
    async fn get_all(&self, ctx: &Context, filter: &ExpenseFilter) -> RepositoryResult<Vec<Expense>>;

    /// Replaces a stored expense. Existence is the caller's concern.
    async fn update(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense>;

    /// Removes an expense; `NotFound` when nothing was deleted.
    async fn delete(&self, ctx: &Context, id: &str) -> RepositoryResult<()>;

    async fn exists(&self, ctx: &Context, id: &str) -> RepositoryResult<bool>;

    /// Connectivity probe used by the health endpoint.
    async fn ping(&self, ctx: &Context) -> RepositoryResult<()> {
        ctx.check()
    }
}
