use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use reelay_core::models::EncodeJobResponse;
use reelay_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Poll an encode job's status by id.
#[utoipa::path(
    get,
    path = "/api/v0/videos/{job_id}/status",
    tag = "videos",
    params(
        ("job_id" = String, Path, description = "Encode job ID")
    ),
    responses(
        (status = 200, description = "Job status", body = EncodeJobResponse),
        (status = 404, description = "Job not found", body = ErrorResponse)
    )
)]
pub async fn get_job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<EncodeJobResponse>, HttpAppError> {
    let job = state
        .encode
        .store
        .get(&job_id)
        .await
        .map_err(HttpAppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", job_id)))?;

    Ok(Json(EncodeJobResponse::from(job)))
}
