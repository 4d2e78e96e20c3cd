pub mod expenses;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub const SERVICE_NAME: &str = "MyExpenses API";

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub storage: String,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.service.repository().ping(&state.context()).await;

    let (status_code, status, storage) = match storage {
        Ok(()) => (StatusCode::OK, "ok", "connected"),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy", "disconnected")
        }
    };

    (
        status_code,
        Json(HealthStatus {
            status: status.to_string(),
            service: SERVICE_NAME.to_string(),
            storage: storage.to_string(),
        }),
    )
}
