//! In-process implementation of ExpenseRepository.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::context::Context;
use crate::domain::{Expense, ExpenseFilter};
use crate::ports::{parse_expense_id, ExpenseRepository, RepositoryError, RepositoryResult};

/// Expense store backed by a shared map. Cloning shares the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryExpenseRepository {
    records: Arc<RwLock<HashMap<Uuid, Expense>>>,
}

impl MemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned() -> RepositoryError {
    RepositoryError::Storage("expense store lock poisoned".to_string())
}

#[async_trait]
impl ExpenseRepository for MemoryExpenseRepository {
    async fn create(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
        ctx.run(async {
            let mut records = self.records.write().map_err(|_| lock_poisoned())?;
            if records.contains_key(&expense.id) {
                return Err(RepositoryError::Storage(format!(
                    "duplicate key value violates unique constraint: {}",
                    expense.id
                )));
            }

            let now = Utc::now();
            let stored = Expense {
                created_at: now,
                updated_at: now,
                ..expense.clone()
            };
            records.insert(stored.id, stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn get_by_id(&self, ctx: &Context, id: &str) -> RepositoryResult<Expense> {
        let uuid = parse_expense_id(id)?;
        ctx.run(async {
            let records = self.records.read().map_err(|_| lock_poisoned())?;
            records
                .get(&uuid)
                .cloned()
                .ok_or_else(|| RepositoryError::NotFound(uuid.to_string()))
        })
        .await
    }

    async fn get_all(&self, ctx: &Context, filter: &ExpenseFilter) -> RepositoryResult<Vec<Expense>> {
        ctx.run(async {
            let records = self.records.read().map_err(|_| lock_poisoned())?;
            let mut expenses: Vec<Expense> = records
                .values()
                .filter(|expense| filter.matches(expense))
                .cloned()
                .collect();

            expenses.sort_by(|a, b| {
                b.date
                    .cmp(&a.date)
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| b.id.cmp(&a.id))
            });
            Ok(expenses)
        })
        .await
    }

    async fn update(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
        ctx.run(async {
            let mut records = self.records.write().map_err(|_| lock_poisoned())?;
            let current = records
                .get(&expense.id)
                .ok_or_else(|| RepositoryError::NotFound(expense.id.to_string()))?;

            // updated_at must move forward even when the clock has not.
            let now = Utc::now();
            let updated_at = if now > current.updated_at {
                now
            } else {
                current.updated_at + Duration::microseconds(1)
            };

            let stored = Expense {
                created_at: current.created_at,
                updated_at,
                ..expense.clone()
            };
            records.insert(stored.id, stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: &str) -> RepositoryResult<()> {
        let uuid = parse_expense_id(id)?;
        ctx.run(async {
            let mut records = self.records.write().map_err(|_| lock_poisoned())?;
            match records.remove(&uuid) {
                Some(_) => Ok(()),
                None => Err(RepositoryError::NotFound(uuid.to_string())),
            }
        })
        .await
    }

    async fn exists(&self, ctx: &Context, id: &str) -> RepositoryResult<bool> {
        let uuid = parse_expense_id(id)?;
        ctx.run(async {
            let records = self.records.read().map_err(|_| lock_poisoned())?;
            Ok(records.contains_key(&uuid))
        })
        .await
    }
}
