//! Postgres implementation of ExpenseRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::context::Context;
use crate::domain::{Expense, ExpenseFilter};
use crate::ports::{parse_expense_id, ExpenseRepository, RepositoryError, RepositoryResult};

const EXPENSE_COLUMNS: &str = "id, description, amount, category, date, created_at, updated_at";

/// Postgres-backed expense repository.
#[derive(Clone)]
pub struct PostgresExpenseRepository {
    pool: PgPool,
}

impl PostgresExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PostgresExpenseRepository {
    async fn create(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
        let sql = format!(
            r#"
            INSERT INTO expenses (id, description, amount, category, date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, statement_timestamp(), statement_timestamp())
            RETURNING {EXPENSE_COLUMNS}
            "#
        );

        let row = ctx
            .run(async {
                sqlx::query_as::<_, ExpenseRow>(&sql)
                    .bind(expense.id)
                    .bind(&expense.description)
                    .bind(expense.amount)
                    .bind(&expense.category)
                    .bind(expense.date)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        Ok(row.into_domain())
    }

    async fn get_by_id(&self, ctx: &Context, id: &str) -> RepositoryResult<Expense> {
        let uuid = parse_expense_id(id)?;
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1");

        let row = ctx
            .run(async {
                sqlx::query_as::<_, ExpenseRow>(&sql)
                    .bind(uuid)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        row.map(|r| r.into_domain())
            .ok_or_else(|| RepositoryError::NotFound(uuid.to_string()))
    }

    async fn get_all(&self, ctx: &Context, filter: &ExpenseFilter) -> RepositoryResult<Vec<Expense>> {
        let mut query = select_filtered(filter);

        let rows = ctx
            .run(async {
                query
                    .build_query_as::<ExpenseRow>()
                    .fetch_all(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    async fn update(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
        let sql = format!(
            r#"
            UPDATE expenses
            SET description = $2,
                amount = $3,
                category = $4,
                date = $5,
                updated_at = GREATEST(clock_timestamp(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1
            RETURNING {EXPENSE_COLUMNS}
            "#
        );

        let row = ctx
            .run(async {
                sqlx::query_as::<_, ExpenseRow>(&sql)
                    .bind(expense.id)
                    .bind(&expense.description)
                    .bind(expense.amount)
                    .bind(&expense.category)
                    .bind(expense.date)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        row.map(|r| r.into_domain())
            .ok_or_else(|| RepositoryError::NotFound(expense.id.to_string()))
    }

    async fn delete(&self, ctx: &Context, id: &str) -> RepositoryResult<()> {
        let uuid = parse_expense_id(id)?;

        let result = ctx
            .run(async {
                sqlx::query("DELETE FROM expenses WHERE id = $1")
                    .bind(uuid)
                    .execute(&self.pool)
                    .await
                    .map_err(RepositoryError::from)
            })
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(uuid.to_string()));
        }

        Ok(())
    }

    async fn exists(&self, ctx: &Context, id: &str) -> RepositoryResult<bool> {
        let uuid = parse_expense_id(id)?;

        ctx.run(async {
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM expenses WHERE id = $1)")
                .bind(uuid)
                .fetch_one(&self.pool)
                .await
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn ping(&self, ctx: &Context) -> RepositoryResult<()> {
        ctx.run(async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(RepositoryError::from)
        })
        .await
    }
}

/// Builds the filtered, date-ordered SELECT for `get_all`.
fn select_filtered(filter: &ExpenseFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE TRUE"));

    if let Some(category) = filter.category() {
        query.push(" AND category ILIKE ").push_bind(like_pattern(category));
    }
    if let Some(description) = filter.description() {
        query.push(" AND description ILIKE ").push_bind(like_pattern(description));
    }
    if let Some(date_from) = filter.date_from {
        query.push(" AND date >= ").push_bind(date_from);
    }
    if let Some(date_to) = filter.date_to {
        query.push(" AND date <= ").push_bind(date_to);
    }
    if let Some(min_amount) = filter.min_amount() {
        query.push(" AND amount >= ").push_bind(min_amount);
    }
    if let Some(max_amount) = filter.max_amount() {
        query.push(" AND amount <= ").push_bind(max_amount);
    }

    query.push(" ORDER BY date DESC, created_at DESC, id DESC");
    query
}

/// Wraps `needle` for a substring ILIKE, escaping LIKE metacharacters.
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct ExpenseRow {
    id: Uuid,
    description: String,
    amount: f64,
    category: String,
    date: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl ExpenseRow {
    fn into_domain(self) -> Expense {
        Expense {
            id: self.id,
            description: self.description,
            amount: self.amount,
            category: self.category,
            date: self.date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
