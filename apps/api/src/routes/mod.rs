pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::intake::handlers as intake;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Job postings
        .route("/jobs", get(jobs::handle_list_jobs).post(jobs::handle_create_job))
        .route(
            "/jobs/:job_id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        .route("/jobs/:job_id/candidates", get(intake::handle_candidates))
        // Application intake
        .route(
            "/applicationform",
            post(intake::handle_submit_application).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/application-status/:application_id",
            get(intake::handle_application_status),
        )
        .route("/applications/:job_id", get(intake::handle_list_applications))
        .with_state(state)
}
