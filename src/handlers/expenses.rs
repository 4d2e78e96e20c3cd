use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::domain::ExpenseFilter;
use crate::error::AppError;
use crate::services::expense::{
    CreateExpenseRequest, ErrorKind, ServiceError, UpdateExpenseRequest,
};
use crate::AppState;

/// Maps a service failure onto the response taxonomy. Storage failures are
/// logged here and surface only as `public`.
fn service_failure(err: ServiceError, public: &str) -> AppError {
    match err.kind() {
        ErrorKind::NotFound => AppError::NotFound("Expense not found".to_string()),
        ErrorKind::Validation => match err.validation_error() {
            Some(rule) => AppError::invalid("Invalid expense", rule),
            None => AppError::invalid("Invalid expense", &err),
        },
        ErrorKind::InvalidIdentifier | ErrorKind::Storage => {
            tracing::error!(error = %err, "{}", public);
            AppError::Internal(public.to_string())
        }
    }
}

fn require_id(id: &str) -> Result<&str, AppError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(AppError::bad_request("Expense ID is required"));
    }
    Ok(id)
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::invalid("Invalid request body", rejection.body_text())
}

pub async fn create_expense(
    State(state): State<AppState>,
    payload: Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(invalid_body)?;

    let expense = state
        .service
        .create_expense(&state.context(), req)
        .await
        .map_err(|e| service_failure(e, "Failed to create expense"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense created successfully",
            "data": expense,
        })),
    ))
}

pub async fn list_expenses(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ExpenseFilter::from_query(&params);

    let expenses = state
        .service
        .get_all_expenses(&state.context(), &filter)
        .await
        .map_err(|e| service_failure(e, "Failed to get expenses"))?;

    Ok(Json(json!({
        "count": expenses.len(),
        "data": expenses,
    })))
}

pub async fn get_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = require_id(&id)?;

    let expense = state
        .service
        .get_expense(&state.context(), id)
        .await
        .map_err(|e| service_failure(e, "Failed to get expense"))?;

    Ok(Json(json!({ "data": expense })))
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = require_id(&id)?;
    let Json(req) = payload.map_err(invalid_body)?;

    let expense = state
        .service
        .update_expense(&state.context(), id, req)
        .await
        .map_err(|e| service_failure(e, "Failed to update expense"))?;

    Ok(Json(json!({
        "message": "Expense updated successfully",
        "data": expense,
    })))
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = require_id(&id)?;

    state
        .service
        .delete_expense(&state.context(), id)
        .await
        .map_err(|e| service_failure(e, "Failed to delete expense"))?;

    Ok(Json(json!({ "message": "Expense deleted successfully" })))
}
