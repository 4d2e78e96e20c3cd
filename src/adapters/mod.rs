//! Storage port implementations.

pub mod memory_expense_repository;
pub mod postgres_expense_repository;

pub use memory_expense_repository::MemoryExpenseRepository;
pub use postgres_expense_repository::PostgresExpenseRepository;
