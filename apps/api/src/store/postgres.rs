use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{IntakeStore, StoreError};
use crate::models::application::{Application, ApplicationState, ApplicationStatus};
use crate::models::job::JobPosting;

/// PostgreSQL-backed store. Status transitions are guarded in the `WHERE`
/// clause, so each one is a single atomic row update.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Distinguishes "no such application" from "wrong state" after a guarded
    /// update touched no rows.
    async fn transition_error(&self, application_id: Uuid, to: ApplicationState) -> StoreError {
        let current: Result<Option<String>, sqlx::Error> =
            sqlx::query_scalar("SELECT status FROM application_status WHERE application_id = $1")
                .bind(application_id)
                .fetch_optional(&self.pool)
                .await;
        match current {
            Ok(Some(from)) => match from.parse::<ApplicationState>() {
                Ok(from) => StoreError::InvalidTransition {
                    application_id,
                    from,
                    to,
                },
                Err(e) => StoreError::Database(sqlx::Error::Decode(e.into())),
            },
            Ok(None) => StoreError::NotFound(application_id.to_string()),
            Err(e) => StoreError::Database(e),
        }
    }
}

#[derive(FromRow)]
struct StatusRow {
    application_id: Uuid,
    job_id: String,
    user_name: String,
    user_email: String,
    status: String,
    score: Option<f64>,
    review: Option<String>,
    file_link: Option<String>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<StatusRow> for ApplicationStatus {
    type Error = StoreError;

    fn try_from(row: StatusRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ApplicationState>()
            .map_err(|e| StoreError::Database(sqlx::Error::Decode(e.into())))?;
        Ok(ApplicationStatus {
            application_id: row.application_id,
            job_id: row.job_id,
            user_name: row.user_name,
            user_email: row.user_email,
            status,
            score: row.score,
            review: row.review,
            file_link: row.file_link,
            error: row.error,
            created_at: row.created_at,
            updated_at: row.updated_at,
            completed_at: row.completed_at,
        })
    }
}

fn map_unique_violation(err: sqlx::Error, key: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate(key),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl IntakeStore for PgStore {
    async fn create_job(&self, job: &JobPosting) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO job_postings (job_id, job_title, job_description, date_posted) VALUES ($1, $2, $3, $4)",
        )
        .bind(&job.job_id)
        .bind(&job.job_title)
        .bind(&job.job_description)
        .bind(job.date_posted)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, job.job_id.clone()))?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<JobPosting>, StoreError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            "SELECT job_id, job_title, job_description, date_posted FROM job_postings ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_job(&self, job_id: &str) -> Result<Option<JobPosting>, StoreError> {
        Ok(sqlx::query_as::<_, JobPosting>(
            "SELECT job_id, job_title, job_description, date_posted FROM job_postings WHERE job_id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, job_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM job_postings WHERE job_id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_status(&self, status: &ApplicationStatus) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO application_status
                (application_id, job_id, user_name, user_email, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(status.application_id)
        .bind(&status.job_id)
        .bind(&status.user_name)
        .bind(&status.user_email)
        .bind(status.status.as_str())
        .bind(status.created_at)
        .bind(status.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, status.application_id.to_string()))?;
        Ok(())
    }

    async fn get_status(
        &self,
        application_id: Uuid,
    ) -> Result<Option<ApplicationStatus>, StoreError> {
        let row = sqlx::query_as::<_, StatusRow>(
            "SELECT * FROM application_status WHERE application_id = $1",
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ApplicationStatus::try_from).transpose()
    }

    async fn mark_processing(&self, application_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE application_status
            SET status = 'processing', updated_at = NOW()
            WHERE application_id = $1 AND status = 'pending'
            "#,
        )
        .bind(application_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .transition_error(application_id, ApplicationState::Processing)
                .await);
        }
        Ok(())
    }

    async fn complete(&self, application: &Application) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Status row first: the guarded update takes the row lock, so a
        // concurrent transition cannot slip in between the two writes.
        let result = sqlx::query(
            r#"
            UPDATE application_status
            SET status = 'completed', score = $2, review = $3, file_link = $4,
                completed_at = $5, updated_at = $5
            WHERE application_id = $1 AND status = 'processing'
            "#,
        )
        .bind(application.application_id)
        .bind(application.score)
        .bind(&application.review)
        .bind(&application.resume_link)
        .bind(application.submitted_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            drop(tx);
            return Err(self
                .transition_error(application.application_id, ApplicationState::Completed)
                .await);
        }

        sqlx::query(
            r#"
            INSERT INTO applications
                (application_id, job_id, name, email, resume_link, score, review, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(application.application_id)
        .bind(&application.job_id)
        .bind(&application.name)
        .bind(&application.email)
        .bind(&application.resume_link)
        .bind(application.score)
        .bind(&application.review)
        .bind(application.submitted_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, application.application_id.to_string()))?;

        tx.commit().await?;
        Ok(())
    }

    async fn fail(&self, application_id: Uuid, error: &str) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE application_status
            SET status = 'failed', error = $2, updated_at = NOW()
            WHERE application_id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(application_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self
                .transition_error(application_id, ApplicationState::Failed)
                .await);
        }
        Ok(())
    }

    async fn list_applications(
        &self,
        job_id: &str,
        min_score: Option<f64>,
    ) -> Result<Vec<Application>, StoreError> {
        Ok(sqlx::query_as::<_, Application>(
            r#"
            SELECT * FROM applications
            WHERE job_id = $1 AND ($2::DOUBLE PRECISION IS NULL OR score >= $2)
            ORDER BY score DESC, submitted_at ASC
            "#,
        )
        .bind(job_id)
        .bind(min_score)
        .fetch_all(&self.pool)
        .await?)
    }
}
