//! In-process stand-ins for the scoring service and the archive, shared by
//! the pipeline and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{Pipeline, PipelineSettings};
use crate::archive::{drive::view_link, ArchiveError, ArchiveRequest, ArchivedFile, FileArchive};
use crate::scoring_client::{ScoreOutcome, ScoreRequest, ScoringError, ScoringService};
use crate::store::IntakeStore;

/// Scores by resume content: "fail" → service error, "hang" → never
/// answers, anything else → 75.
#[derive(Default)]
pub struct FakeScorer {
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

#[async_trait]
impl ScoringService for FakeScorer {
    async fn score(&self, request: ScoreRequest<'_>) -> Result<ScoreOutcome, ScoringError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if request.resume_text.contains("hang") {
            std::future::pending::<()>().await;
        }
        if request.resume_text.contains("fail") {
            return Err(ScoringError::Status {
                status: 500,
                message: "crew crashed".to_string(),
            });
        }
        Ok(ScoreOutcome {
            score: 75.0,
            summary: format!("Reviewed against: {}", request.job_description),
            defaulted: false,
        })
    }
}

pub struct FakeArchive {
    pub fail: bool,
}

#[async_trait]
impl FileArchive for FakeArchive {
    async fn upload(&self, request: ArchiveRequest<'_>) -> Result<ArchivedFile, ArchiveError> {
        if self.fail {
            return Err(ArchiveError::Status {
                status: 403,
                message: "quota exceeded".to_string(),
            });
        }
        let id = format!("drive-{}", request.application_id.simple());
        Ok(ArchivedFile {
            link: view_link(&id),
            id,
        })
    }
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        archive_folder: "folder".to_string(),
        scoring_timeout: Duration::from_secs(5),
        upload_timeout: Duration::from_secs(5),
    }
}

pub fn build_pipeline(
    store: Arc<dyn IntakeStore>,
    archive_fails: bool,
) -> (Arc<Pipeline>, Arc<FakeScorer>) {
    let scorer = Arc::new(FakeScorer::default());
    let pipeline = Pipeline::new(
        store,
        scorer.clone(),
        Arc::new(FakeArchive {
            fail: archive_fails,
        }),
        settings(),
    );
    (Arc::new(pipeline), scorer)
}
