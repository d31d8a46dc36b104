//! Persistence for job postings, application status records and final
//! application records.
//!
//! Handlers and workers only see `Arc<dyn IntakeStore>`; every mutation of an
//! application is a single keyed write so concurrent workers never lose updates.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::application::{Application, ApplicationState, ApplicationStatus};
use crate::models::job::JobPosting;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Record {0} not found")]
    NotFound(String),

    #[error("Record {0} already exists")]
    Duplicate(String),

    #[error("Application {application_id} cannot move from '{from}' to '{to}'")]
    InvalidTransition {
        application_id: Uuid,
        from: ApplicationState,
        to: ApplicationState,
    },
}

#[async_trait]
pub trait IntakeStore: Send + Sync {
    async fn create_job(&self, job: &JobPosting) -> Result<(), StoreError>;

    /// Newest postings first.
    async fn list_jobs(&self) -> Result<Vec<JobPosting>, StoreError>;

    async fn get_job(&self, job_id: &str) -> Result<Option<JobPosting>, StoreError>;

    /// Returns `true` when a posting was removed.
    async fn delete_job(&self, job_id: &str) -> Result<bool, StoreError>;

    /// Inserts a freshly created `pending` record.
    async fn insert_status(&self, status: &ApplicationStatus) -> Result<(), StoreError>;

    async fn get_status(&self, application_id: Uuid)
        -> Result<Option<ApplicationStatus>, StoreError>;

    /// `pending → processing`.
    async fn mark_processing(&self, application_id: Uuid) -> Result<(), StoreError>;

    /// Writes the final application record and moves `processing → completed`
    /// as one unit. Nothing is written if the transition is not allowed.
    async fn complete(&self, application: &Application) -> Result<(), StoreError>;

    /// `pending | processing → failed`.
    async fn fail(&self, application_id: Uuid, error: &str) -> Result<(), StoreError>;

    /// Application records for a job, best score first.
    async fn list_applications(
        &self,
        job_id: &str,
        min_score: Option<f64>,
    ) -> Result<Vec<Application>, StoreError>;
}
