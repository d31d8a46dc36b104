use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{IntakeStore, StoreError};
use crate::models::application::{Application, ApplicationState, ApplicationStatus};
use crate::models::job::JobPosting;

/// In-process store with the same transition rules as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    jobs: Vec<JobPosting>,
    statuses: HashMap<Uuid, ApplicationStatus>,
    applications: Vec<Application>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_job(job: JobPosting) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().jobs.push(job);
        store
    }

    pub fn status_count(&self) -> usize {
        self.inner.lock().unwrap().statuses.len()
    }

    pub fn applications(&self) -> Vec<Application> {
        self.inner.lock().unwrap().applications.clone()
    }

    fn transition(
        &self,
        application_id: Uuid,
        to: ApplicationState,
        apply: impl FnOnce(&mut ApplicationStatus, &mut Vec<Application>),
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let Inner {
            statuses,
            applications,
            ..
        } = &mut *inner;
        let status = statuses
            .get_mut(&application_id)
            .ok_or_else(|| StoreError::NotFound(application_id.to_string()))?;
        if status.status.is_terminal() || !status.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                application_id,
                from: status.status,
                to,
            });
        }
        status.status = to;
        status.updated_at = Utc::now();
        apply(status, applications);
        Ok(())
    }
}

#[async_trait]
impl IntakeStore for MemoryStore {
    async fn create_job(&self, job: &JobPosting) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.jobs.iter().any(|j| j.job_id == job.job_id) {
            return Err(StoreError::Duplicate(job.job_id.clone()));
        }
        inner.jobs.push(job.clone());
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(self.inner.lock().unwrap().jobs.iter().rev().cloned().collect())
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobPosting>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().find(|j| j.job_id == job_id).cloned())
    }

    async fn delete_job(&self, job_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.jobs.len();
        inner.jobs.retain(|j| j.job_id != job_id);
        Ok(inner.jobs.len() < before)
    }

    async fn insert_status(&self, status: &ApplicationStatus) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.statuses.contains_key(&status.application_id) {
            return Err(StoreError::Duplicate(status.application_id.to_string()));
        }
        inner.statuses.insert(status.application_id, status.clone());
        Ok(())
    }

    async fn get_status(
        &self,
        application_id: Uuid,
    ) -> Result<Option<ApplicationStatus>, StoreError> {
        Ok(self.inner.lock().unwrap().statuses.get(&application_id).cloned())
    }

    async fn mark_processing(&self, application_id: Uuid) -> Result<(), StoreError> {
        self.transition(application_id, ApplicationState::Processing, |_, _| {})
    }

    async fn complete(&self, application: &Application) -> Result<(), StoreError> {
        self.transition(
            application.application_id,
            ApplicationState::Completed,
            |status, applications| {
                status.score = Some(application.score);
                status.review = Some(application.review.clone());
                status.file_link = Some(application.resume_link.clone());
                status.completed_at = Some(application.submitted_at);
                applications.push(application.clone());
            },
        )
    }

    async fn fail(&self, application_id: Uuid, error: &str) -> Result<(), StoreError> {
        self.transition(application_id, ApplicationState::Failed, |status, _| {
            status.error = Some(error.to_string());
        })
    }

    async fn list_applications(
        &self,
        job_id: &str,
        min_score: Option<f64>,
    ) -> Result<Vec<Application>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut matching: Vec<Application> = inner
            .applications
            .iter()
            .filter(|a| a.job_id == job_id && min_score.map_or(true, |min| a.score >= min))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(job_id: &str) -> ApplicationStatus {
        ApplicationStatus::pending(Uuid::new_v4(), job_id, "Ada", "ada@example.com")
    }

    fn application_for(status: &ApplicationStatus, score: f64) -> Application {
        Application {
            application_id: status.application_id,
            job_id: status.job_id.clone(),
            name: status.user_name.clone(),
            email: status.user_email.clone(),
            resume_link: "https://drive.google.com/file/d/abc/view".to_string(),
            score,
            review: "solid".to_string(),
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_complete_requires_processing() {
        let store = MemoryStore::new();
        let status = pending("JOB1");
        store.insert_status(&status).await.unwrap();

        let err = store
            .complete(&application_for(&status, 80.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidTransition {
                from: ApplicationState::Pending,
                to: ApplicationState::Completed,
                ..
            }
        ));
        assert!(store.applications().is_empty());
    }

    #[tokio::test]
    async fn test_complete_copies_result_into_status() {
        let store = MemoryStore::new();
        let status = pending("JOB1");
        store.insert_status(&status).await.unwrap();
        store.mark_processing(status.application_id).await.unwrap();
        store
            .complete(&application_for(&status, 72.5))
            .await
            .unwrap();

        let saved = store.get_status(status.application_id).await.unwrap().unwrap();
        assert_eq!(saved.status, ApplicationState::Completed);
        assert_eq!(saved.score, Some(72.5));
        assert_eq!(saved.file_link, store.applications().first().map(|a| a.resume_link.clone()));
    }

    #[tokio::test]
    async fn test_failed_is_terminal() {
        let store = MemoryStore::new();
        let status = pending("JOB1");
        store.insert_status(&status).await.unwrap();
        store.fail(status.application_id, "boom").await.unwrap();

        assert!(store.mark_processing(status.application_id).await.is_err());
        assert!(store.fail(status.application_id, "again").await.is_err());
        let saved = store.get_status(status.application_id).await.unwrap().unwrap();
        assert_eq!(saved.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_duplicate_status_rejected() {
        let store = MemoryStore::new();
        let status = pending("JOB1");
        store.insert_status(&status).await.unwrap();
        assert!(matches!(
            store.insert_status(&status).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn test_list_applications_filters_and_sorts_by_score() {
        let store = MemoryStore::new();
        for score in [40.0, 90.0, 65.0] {
            let status = pending("JOB1");
            store.insert_status(&status).await.unwrap();
            store.mark_processing(status.application_id).await.unwrap();
            store.complete(&application_for(&status, score)).await.unwrap();
        }

        let all = store.list_applications("JOB1", None).await.unwrap();
        let scores: Vec<f64> = all.iter().map(|a| a.score).collect();
        assert_eq!(scores, vec![90.0, 65.0, 40.0]);

        let strong = store.list_applications("JOB1", Some(65.0)).await.unwrap();
        assert_eq!(strong.len(), 2);
        assert!(store.list_applications("JOB2", None).await.unwrap().is_empty());
    }
}
