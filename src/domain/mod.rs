//! Framework-agnostic expense domain: the entity, its invariants and the
//! filter criteria used for bulk retrieval.

pub mod error;
pub mod expense;
pub mod filter;

pub use error::ValidationError;
pub use expense::{is_unset_date, Expense, ExpenseChanges, UNSET_DATE_TIMESTAMP};
pub use filter::ExpenseFilter;
