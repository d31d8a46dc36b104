use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of one application. Moves forward only:
/// `pending → processing → completed | failed`, with `pending → failed`
/// allowed when a task dies before it starts processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ApplicationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationState::Pending => "pending",
            ApplicationState::Processing => "processing",
            ApplicationState::Completed => "completed",
            ApplicationState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationState::Completed | ApplicationState::Failed)
    }

    pub fn can_transition_to(&self, next: ApplicationState) -> bool {
        use ApplicationState::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Failed) | (Processing, Completed) | (Processing, Failed)
        )
    }
}

impl fmt::Display for ApplicationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationState::Pending),
            "processing" => Ok(ApplicationState::Processing),
            "completed" => Ok(ApplicationState::Completed),
            "failed" => Ok(ApplicationState::Failed),
            other => Err(format!("unknown application state '{other}'")),
        }
    }
}

/// The record clients poll while an application moves through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_id: Uuid,
    pub job_id: String,
    pub user_name: String,
    pub user_email: String,
    pub status: ApplicationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ApplicationStatus {
    pub fn pending(application_id: Uuid, job_id: &str, user_name: &str, user_email: &str) -> Self {
        let now = Utc::now();
        Self {
            application_id,
            job_id: job_id.to_string(),
            user_name: user_name.to_string(),
            user_email: user_email.to_string(),
            status: ApplicationState::Pending,
            score: None,
            review: None,
            file_link: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }
}

/// Final artifact of a scored application. Only written together with the
/// `completed` status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub application_id: Uuid,
    pub job_id: String,
    pub name: String,
    pub email: String,
    pub resume_link: String,
    pub score: f64,
    pub review: String,
    pub submitted_at: DateTime<Utc>,
}
