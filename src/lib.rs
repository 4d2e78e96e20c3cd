pub mod adapters;
pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::adapters::{MemoryExpenseRepository, PostgresExpenseRepository};
use crate::config::{Config, StorageBackend};
use crate::context::Context;
use crate::ports::ExpenseRepository;
use crate::services::ExpenseService;

#[derive(Clone)]
pub struct AppState {
    pub service: ExpenseService,
    pub request_timeout: Option<Duration>,
}

impl AppState {
    pub fn new(repository: Arc<dyn ExpenseRepository>, request_timeout: Option<Duration>) -> Self {
        Self {
            service: ExpenseService::new(repository),
            request_timeout,
        }
    }

    /// Fresh execution context for one request.
    pub fn context(&self) -> Context {
        Context::from_timeout(self.request_timeout)
    }
}

/// Wires the configured storage backend; Postgres is migrated before use.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let repository: Arc<dyn ExpenseRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(config).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PostgresExpenseRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; expenses are lost on restart");
            Arc::new(MemoryExpenseRepository::new())
        }
    };

    Ok(AppState::new(repository, config.request_timeout))
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/expenses",
            get(handlers::expenses::list_expenses).post(handlers::expenses::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::expenses::get_expense)
                .put(handlers::expenses::update_expense)
                .delete(handlers::expenses::delete_expense),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(
                    middleware::request_logger_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
