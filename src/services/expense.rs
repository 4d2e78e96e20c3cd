//! Expense use cases: validation, existence checks and persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::context::Context;
use crate::domain::{Expense, ExpenseChanges, ExpenseFilter, ValidationError};
use crate::ports::{ExpenseRepository, RepositoryError};

/// Body of a create request. Every field is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: f64,
    pub category: String,
    pub date: DateTime<Utc>,
}

/// Body of a partial update. Omitted, empty or zero fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl From<UpdateExpenseRequest> for ExpenseChanges {
    fn from(req: UpdateExpenseRequest) -> Self {
        ExpenseChanges {
            description: req.description,
            amount: req.amount,
            category: req.category,
            date: req.date,
        }
    }
}

/// What went wrong, independent of where it was wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidIdentifier,
    Storage,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{context}: {source}")]
    Validation {
        context: &'static str,
        source: ValidationError,
    },

    #[error("expense not found")]
    NotFound,

    #[error("{context}: {source}")]
    Repository {
        context: &'static str,
        source: RepositoryError,
    },
}

impl ServiceError {
    fn validation(context: &'static str) -> impl FnOnce(ValidationError) -> Self {
        move |source| ServiceError::Validation { context, source }
    }

    fn repository(context: &'static str) -> impl FnOnce(RepositoryError) -> Self {
        move |source| ServiceError::Repository { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation { .. } => ErrorKind::Validation,
            ServiceError::NotFound => ErrorKind::NotFound,
            ServiceError::Repository { source, .. } => match source {
                RepositoryError::NotFound(_) => ErrorKind::NotFound,
                RepositoryError::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
                _ => ErrorKind::Storage,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The underlying rule violation, if this is a validation failure.
    pub fn validation_error(&self) -> Option<ValidationError> {
        match self {
            ServiceError::Validation { source, .. } => Some(*source),
            _ => None,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Stateless orchestration over a storage port.
#[derive(Clone)]
pub struct ExpenseService {
    repository: Arc<dyn ExpenseRepository>,
}

impl ExpenseService {
    pub fn new(repository: Arc<dyn ExpenseRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn ExpenseRepository> {
        &self.repository
    }

    #[tracing::instrument(skip_all)]
    pub async fn create_expense(
        &self,
        ctx: &Context,
        req: CreateExpenseRequest,
    ) -> ServiceResult<Expense> {
        let expense = Expense::new(req.description, req.amount, req.category, req.date)
            .map_err(ServiceError::validation("failed to create expense"))?;

        let saved = self
            .repository
            .create(ctx, &expense)
            .await
            .map_err(ServiceError::repository("failed to save expense"))?;

        tracing::info!(expense_id = %saved.id, category = %saved.category, "Expense created");
        Ok(saved)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_expense(&self, ctx: &Context, id: &str) -> ServiceResult<Expense> {
        self.repository
            .get_by_id(ctx, id)
            .await
            .map_err(ServiceError::repository("failed to get expense"))
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_all_expenses(
        &self,
        ctx: &Context,
        filter: &ExpenseFilter,
    ) -> ServiceResult<Vec<Expense>> {
        self.repository
            .get_all(ctx, filter)
            .await
            .map_err(ServiceError::repository("failed to get expenses"))
    }

    /// Checks existence before fetching so a missing id is always a clean
    /// [`ServiceError::NotFound`].
    #[tracing::instrument(skip(self, ctx, req))]
    pub async fn update_expense(
        &self,
        ctx: &Context,
        id: &str,
        req: UpdateExpenseRequest,
    ) -> ServiceResult<Expense> {
        self.ensure_exists(ctx, id).await?;

        let mut expense = self
            .repository
            .get_by_id(ctx, id)
            .await
            .map_err(ServiceError::repository("failed to get expense"))?;

        expense
            .apply_changes(req.into())
            .map_err(ServiceError::validation("failed to update expense"))?;

        let saved = self
            .repository
            .update(ctx, &expense)
            .await
            .map_err(ServiceError::repository("failed to save updated expense"))?;

        tracing::info!(expense_id = %saved.id, "Expense updated");
        Ok(saved)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_expense(&self, ctx: &Context, id: &str) -> ServiceResult<()> {
        self.ensure_exists(ctx, id).await?;

        self.repository
            .delete(ctx, id)
            .await
            .map_err(ServiceError::repository("failed to delete expense"))?;

        tracing::info!(expense_id = %id, "Expense deleted");
        Ok(())
    }

    async fn ensure_exists(&self, ctx: &Context, id: &str) -> ServiceResult<()> {
        let exists = self
            .repository
            .exists(ctx, id)
            .await
            .map_err(ServiceError::repository("failed to check expense existence"))?;

        if !exists {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryExpenseRepository;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    use crate::ports::RepositoryResult;

    /// Delegates to an in-memory store and records the order of calls.
    #[derive(Default)]
    struct RecordingRepository {
        inner: MemoryExpenseRepository,
        calls: Mutex<Vec<&'static str>>,
        fail_writes: bool,
    }

    impl RecordingRepository {
        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn write_result(&self) -> RepositoryResult<()> {
            if self.fail_writes {
                return Err(RepositoryError::Storage("connection reset".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ExpenseRepository for RecordingRepository {
        async fn create(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
            self.record("create");
            self.write_result()?;
            self.inner.create(ctx, expense).await
        }

        async fn get_by_id(&self, ctx: &Context, id: &str) -> RepositoryResult<Expense> {
            self.record("get_by_id");
            self.inner.get_by_id(ctx, id).await
        }

        async fn get_all(
            &self,
            ctx: &Context,
            filter: &ExpenseFilter,
        ) -> RepositoryResult<Vec<Expense>> {
            self.record("get_all");
            self.inner.get_all(ctx, filter).await
        }

        async fn update(&self, ctx: &Context, expense: &Expense) -> RepositoryResult<Expense> {
            self.record("update");
            self.write_result()?;
            self.inner.update(ctx, expense).await
        }

        async fn delete(&self, ctx: &Context, id: &str) -> RepositoryResult<()> {
            self.record("delete");
            self.write_result()?;
            self.inner.delete(ctx, id).await
        }

        async fn exists(&self, ctx: &Context, id: &str) -> RepositoryResult<bool> {
            self.record("exists");
            self.inner.exists(ctx, id).await
        }
    }

    fn request(description: &str, amount: f64, category: &str, day: u32) -> CreateExpenseRequest {
        CreateExpenseRequest {
            description: description.to_string(),
            amount,
            category: category.to_string(),
            date: Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap(),
        }
    }

    fn service() -> (ExpenseService, Arc<RecordingRepository>) {
        let repo = Arc::new(RecordingRepository::default());
        (ExpenseService::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn test_create_validates_before_persisting() {
        let (service, repo) = service();
        let ctx = Context::background();

        let err = service
            .create_expense(&ctx, request("Coffee", 0.0, "Food", 15))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation_error(), Some(ValidationError::InvalidAmount));
        assert_eq!(
            err.to_string(),
            "failed to create expense: invalid amount: must be greater than 0"
        );
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_persists_and_returns_stored_expense() {
        let (service, repo) = service();
        let ctx = Context::background();

        let created = service
            .create_expense(&ctx, request("Coffee", 4.5, "Food", 15))
            .await
            .unwrap();

        assert_eq!(created.description, "Coffee");
        assert_eq!(created.amount, 4.5);
        assert_eq!(repo.calls(), vec!["create"]);

        let fetched = service
            .get_expense(&ctx, &created.id.to_string())
            .await
            .unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_context_and_kind() {
        let repo = Arc::new(RecordingRepository {
            fail_writes: true,
            ..Default::default()
        });
        let service = ExpenseService::new(repo);

        let err = service
            .create_expense(&Context::background(), request("Coffee", 4.5, "Food", 15))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(
            err.to_string(),
            "failed to save expense: storage error: connection reset"
        );
    }

    #[tokio::test]
    async fn test_get_missing_and_malformed_ids() {
        let (service, _repo) = service();
        let ctx = Context::background();

        let missing = service
            .get_expense(&ctx, &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
        assert!(missing.to_string().starts_with("failed to get expense: expense not found"));

        let malformed = service.get_expense(&ctx, "nope").await.unwrap_err();
        assert_eq!(malformed.kind(), ErrorKind::InvalidIdentifier);
    }

    #[tokio::test]
    async fn test_get_all_sorted_by_date_descending() {
        let (service, _repo) = service();
        let ctx = Context::background();

        for day in [5, 25, 12] {
            service
                .create_expense(&ctx, request("Item", 1.0, "Misc", day))
                .await
                .unwrap();
        }

        let all = service
            .get_all_expenses(&ctx, &ExpenseFilter::default())
            .await
            .unwrap();
        let days: Vec<u32> = all
            .iter()
            .map(|e| chrono::Datelike::day(&e.date))
            .collect();
        assert_eq!(days, vec![25, 12, 5]);
    }

    #[tokio::test]
    async fn test_get_all_composes_filters() {
        let (service, _repo) = service();
        let ctx = Context::background();

        service.create_expense(&ctx, request("A", 5.0, "Food", 1)).await.unwrap();
        let b = service.create_expense(&ctx, request("B", 50.0, "Food", 2)).await.unwrap();
        service.create_expense(&ctx, request("C", 20.0, "Transport", 3)).await.unwrap();

        let filter = ExpenseFilter {
            category: Some("Food".to_string()),
            min_amount: Some(10.0),
            ..Default::default()
        };
        let found = service.get_all_expenses(&ctx, &filter).await.unwrap();
        assert_eq!(found, vec![b]);
    }

    #[tokio::test]
    async fn test_update_checks_existence_first() {
        let (service, repo) = service();
        let ctx = Context::background();

        let err = service
            .update_expense(
                &ctx,
                &uuid::Uuid::new_v4().to_string(),
                UpdateExpenseRequest {
                    amount: Some(3.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::NotFound));
        assert_eq!(repo.calls(), vec!["exists"]);
    }

    #[tokio::test]
    async fn test_update_amount_only() {
        let (service, repo) = service();
        let ctx = Context::background();
        let created = service
            .create_expense(&ctx, request("Coffee", 4.5, "Food", 15))
            .await
            .unwrap();
        let id = created.id.to_string();

        let updated = service
            .update_expense(
                &ctx,
                &id,
                UpdateExpenseRequest {
                    amount: Some(5.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            repo.calls(),
            vec!["create", "exists", "get_by_id", "update"]
        );

        let fetched = service.get_expense(&ctx, &id).await.unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(fetched.amount, 5.0);
        assert_eq!(fetched.description, created.description);
        assert_eq!(fetched.category, created.category);
        assert_eq!(fetched.date, created.date);
        assert_eq!(fetched.created_at, created.created_at);
        assert!(fetched.updated_at > fetched.created_at);
    }

    #[tokio::test]
    async fn test_update_with_zero_values_changes_nothing() {
        let (service, _repo) = service();
        let ctx = Context::background();
        let created = service
            .create_expense(&ctx, request("Coffee", 4.5, "Food", 15))
            .await
            .unwrap();

        let updated = service
            .update_expense(
                &ctx,
                &created.id.to_string(),
                UpdateExpenseRequest {
                    description: Some(String::new()),
                    amount: Some(0.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.description, "Coffee");
        assert_eq!(updated.amount, 4.5);
    }

    #[tokio::test]
    async fn test_delete_checks_existence_first() {
        let (service, repo) = service();
        let ctx = Context::background();

        let err = service
            .delete_expense(&ctx, &uuid::Uuid::new_v4().to_string())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(repo.calls(), vec!["exists"]);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (service, repo) = service();
        let ctx = Context::background();
        let created = service
            .create_expense(&ctx, request("Coffee", 4.5, "Food", 15))
            .await
            .unwrap();
        let id = created.id.to_string();

        service.delete_expense(&ctx, &id).await.unwrap();
        assert_eq!(repo.calls(), vec!["create", "exists", "delete"]);

        let err = service.get_expense(&ctx, &id).await.unwrap_err();
        assert!(err.is_not_found());

        let err = service.delete_expense(&ctx, &id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[test]
    fn test_update_request_fields_are_optional() {
        let req: UpdateExpenseRequest = serde_json::from_str(r#"{"amount": 5.0}"#).unwrap();
        assert_eq!(req.amount, Some(5.0));
        assert!(req.description.is_none());
        assert!(req.date.is_none());

        let req: UpdateExpenseRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(ExpenseChanges::from(req), ExpenseChanges::default());
    }

    #[test]
    fn test_create_request_requires_every_field() {
        let missing_date = serde_json::from_str::<CreateExpenseRequest>(
            r#"{"description":"Coffee","amount":4.5,"category":"Food"}"#,
        );
        assert!(missing_date.is_err());

        let full = serde_json::from_str::<CreateExpenseRequest>(
            r#"{"description":"Coffee","amount":4.5,"category":"Food","date":"2024-01-15T08:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(full.amount, 4.5);
    }
}
