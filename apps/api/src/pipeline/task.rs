use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::archive::{ArchiveError, ArchiveRequest, FileArchive};
use crate::config::Config;
use crate::intake::staging::StagedFile;
use crate::models::application::Application;
use crate::pipeline::extract::{extract_text, ExtractError};
use crate::scoring_client::{ScoreRequest, ScoringError, ScoringService};
use crate::store::{IntakeStore, StoreError};

/// Typed payload for one accepted application.
#[derive(Debug)]
pub struct ScoringTask {
    pub application_id: Uuid,
    pub job_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_description: String,
    pub staged: StagedFile,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("scoring failed: {0}")]
    Scoring(#[from] ScoringError),

    #[error("archive upload failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("{stage} timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub archive_folder: String,
    pub scoring_timeout: Duration,
    pub upload_timeout: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            archive_folder: config.archive_folder.clone(),
            scoring_timeout: config.scoring_timeout,
            upload_timeout: config.upload_timeout,
        }
    }
}

/// Runs the scoring-and-archival sequence for one application, off the
/// request path.
pub struct Pipeline {
    store: Arc<dyn IntakeStore>,
    scorer: Arc<dyn ScoringService>,
    archive: Arc<dyn FileArchive>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn IntakeStore>,
        scorer: Arc<dyn ScoringService>,
        archive: Arc<dyn FileArchive>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            scorer,
            archive,
            settings,
        }
    }

    /// Processes the task to a terminal state. Never returns an error: failures
    /// end up in the status record. The staged file is removed when `task`
    /// goes out of scope.
    pub async fn run(&self, task: ScoringTask) {
        let application_id = task.application_id;
        match self.process(&task).await {
            Ok(score) => info!(%application_id, score, "Application completed"),
            Err(e) => {
                warn!(%application_id, error = %e, "Application processing failed");
                self.record_failure(application_id, &e.to_string()).await;
            }
        }
    }

    /// Moves the application to `failed`; a store error here is only logged
    /// since nobody is waiting on the result.
    pub async fn record_failure(&self, application_id: Uuid, message: &str) {
        if let Err(e) = self.store.fail(application_id, message).await {
            error!(%application_id, error = %e, "Could not record application failure");
        }
    }

    async fn process(&self, task: &ScoringTask) -> Result<f64, PipelineError> {
        let application_id = task.application_id;
        let path = task.staged.path();

        // 1. pending → processing
        self.store.mark_processing(application_id).await?;

        // 2. extract and score
        let resume_text = extract_text(path).await?;
        let file_bytes = tokio::fs::read(path).await?;
        let outcome = bounded(
            "scoring service",
            self.settings.scoring_timeout,
            self.scorer.score(ScoreRequest {
                file_name: task.staged.file_name(),
                file_bytes,
                resume_text: &resume_text,
                job_description: &task.job_description,
            }),
        )
        .await?;
        if outcome.defaulted {
            warn!(%application_id, "Scoring service omitted fields; stored defaults");
        }

        // 3. archive
        let archived = bounded(
            "archive upload",
            self.settings.upload_timeout,
            self.archive.upload(ArchiveRequest {
                path,
                file_name: task.staged.file_name(),
                application_id,
                folder: &self.settings.archive_folder,
            }),
        )
        .await?;
        debug!(%application_id, file_id = %archived.id, "Resume archived");

        // 4 + 5. application record and processing → completed, atomically
        let application = Application {
            application_id,
            job_id: task.job_id.clone(),
            name: task.candidate_name.clone(),
            email: task.candidate_email.clone(),
            resume_link: archived.link,
            score: outcome.score,
            review: outcome.summary,
            submitted_at: Utc::now(),
        };
        self.store.complete(&application).await?;

        Ok(application.score)
    }
}

/// Caps an external call at `after`.
async fn bounded<T, E, F>(stage: &'static str, after: Duration, call: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
    PipelineError: From<E>,
{
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| PipelineError::Timeout { stage, after })?
        .map_err(PipelineError::from)
}
