//! Axum route handlers for job postings.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::generate_job_id;
use crate::models::job::JobPosting;
use crate::state::AppState;
use crate::store::StoreError;

/// Attempts at finding an unused job id before giving up.
const JOB_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub job_title: Option<String>,
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub message: String,
    pub job_id: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobPosting>>, AppError> {
    Ok(Json(state.store.list_jobs().await?))
}

/// POST /jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreateJobResponse>), AppError> {
    let (job_title, job_description) = match (request.job_title, request.job_description) {
        (Some(title), Some(description))
            if !title.trim().is_empty() && !description.trim().is_empty() =>
        {
            (title, description)
        }
        _ => {
            return Err(AppError::Validation(
                "Missing job_title or job_description".to_string(),
            ))
        }
    };

    let mut job = JobPosting {
        job_id: generate_job_id(),
        job_title,
        job_description,
        date_posted: Utc::now().date_naive(),
    };

    for attempt in 1..=JOB_ID_ATTEMPTS {
        match state.store.create_job(&job).await {
            Ok(()) => {
                info!(job_id = %job.job_id, "Job posting created");
                return Ok((
                    StatusCode::CREATED,
                    Json(CreateJobResponse {
                        message: "Job created successfully".to_string(),
                        job_id: job.job_id,
                    }),
                ));
            }
            Err(StoreError::Duplicate(_)) if attempt < JOB_ID_ATTEMPTS => {
                job.job_id = generate_job_id();
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique job id"
    )))
}

/// GET /jobs/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobPosting>, AppError> {
    state
        .store
        .get_job(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}

/// DELETE /jobs/:job_id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_job(&job_id).await? {
        return Err(AppError::NotFound("Job not found".to_string()));
    }
    info!(%job_id, "Job posting deleted");
    Ok(Json(MessageResponse {
        message: "Job deleted successfully".to_string(),
    }))
}
