//! Axum route handlers for application intake and status polling.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::form::read_application_form;
use crate::intake::staging::stage_upload;
use crate::models::application::{Application, ApplicationState, ApplicationStatus};
use crate::pipeline::ScoringTask;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitApplicationResponse {
    pub message: String,
    pub application_id: Uuid,
    pub status: ApplicationState,
    pub note: String,
}

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    pub min_score: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub job_id: String,
    pub min_score: i64,
    pub candidates: Vec<Application>,
}

/// POST /applicationform
///
/// Validates the submission, stages the resume and hands it to the worker
/// pool. Returns 202 before any scoring happens.
pub async fn handle_submit_application(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitApplicationResponse>), AppError> {
    let form = read_application_form(multipart).await?;

    let job = state
        .store
        .get_job(&form.job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    let application_id = Uuid::new_v4();

    // Reserve before writing anything so a rejection leaves no trace.
    let slot = state.queue.try_reserve().map_err(|e| match e {
        TrySendError::Full(()) => AppError::QueueFull,
        TrySendError::Closed(()) => {
            AppError::Internal(anyhow::anyhow!("scoring worker pool is not running"))
        }
    })?;

    let staged = stage_upload(
        &state.config.staging_dir,
        application_id,
        &form.resume.file_name,
        &form.resume.bytes,
    )
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to stage resume: {e}")))?;

    state
        .store
        .insert_status(&ApplicationStatus::pending(
            application_id,
            &job.job_id,
            &form.name,
            &form.email,
        ))
        .await?;

    slot.send(ScoringTask {
        application_id,
        job_id: job.job_id,
        candidate_name: form.name,
        candidate_email: form.email,
        job_description: job.job_description,
        staged,
    });

    info!(%application_id, "Application submitted to background processing queue");

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitApplicationResponse {
            message: "Application submitted successfully! Your application is being processed in the background.".to_string(),
            application_id,
            status: ApplicationState::Pending,
            note: "You can check the status using the application_id".to_string(),
        }),
    ))
}

/// GET /application-status/:application_id
pub async fn handle_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationStatus>, AppError> {
    let not_found = || AppError::NotFound("Application not found".to_string());
    let application_id = Uuid::parse_str(&application_id).map_err(|_| not_found())?;

    state
        .store
        .get_status(application_id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// GET /applications/:job_id
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<Application>>, AppError> {
    Ok(Json(state.store.list_applications(&job_id, None).await?))
}

/// GET /jobs/:job_id/candidates?min_score=N
pub async fn handle_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let raw = query.min_score.ok_or_else(|| {
        AppError::Validation("min_score query parameter is required".to_string())
    })?;
    let min_score: i64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("min_score must be an integer".to_string()))?;

    let candidates = state
        .store
        .list_applications(&job_id, Some(min_score as f64))
        .await?;

    Ok(Json(CandidatesResponse {
        job_id,
        min_score,
        candidates,
    }))
}
