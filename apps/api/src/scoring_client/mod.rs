//! Client for the resume scoring service. The service owns the agent
//! pipeline; this side only ships the resume and job description and reads
//! back a score and a narrative.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

const PROCESS_RESUME_PATH: &str = "/process-resume";

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("scoring service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed scoring response: {0}")]
    MalformedResponse(String),
}

/// Everything the scoring service needs for one application.
#[derive(Debug, Clone)]
pub struct ScoreRequest<'a> {
    pub file_name: &'a str,
    pub file_bytes: Vec<u8>,
    pub resume_text: &'a str,
    pub job_description: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub score: f64,
    pub summary: String,
    /// Set when the service omitted `final_score` or `profile_summary` and the
    /// default was used.
    pub defaulted: bool,
}

/// Carried in pipeline state as `Arc<dyn ScoringService>`.
#[async_trait]
pub trait ScoringService: Send + Sync {
    async fn score(&self, request: ScoreRequest<'_>) -> Result<ScoreOutcome, ScoringError>;
}

/// Wire shape of the service response. Fields may be absent but never of the
/// wrong type.
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    final_score: Option<f64>,
    profile_summary: Option<String>,
}

/// HTTP client for `POST {base_url}/process-resume`.
#[derive(Clone)]
pub struct ScoringClient {
    client: Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(base_url: &str) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ScoringService for ScoringClient {
    async fn score(&self, request: ScoreRequest<'_>) -> Result<ScoreOutcome, ScoringError> {
        let url = format!("{}{}", self.base_url, PROCESS_RESUME_PATH);

        let form = Form::new()
            .part(
                "file",
                Part::bytes(request.file_bytes)
                    .file_name(request.file_name.to_string())
                    .mime_str(mime_for(request.file_name))?,
            )
            .text("job_description", request.job_description.to_string())
            .text("resume_text", request.resume_text.to_string());

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ScoringError::Status {
                status: status.as_u16(),
                message: body,
            });
        }

        debug!("Scoring service responded with {} bytes", body.len());
        parse_score_response(&body)
    }
}

/// Parses the service body strictly: anything that is not a JSON object with
/// a numeric `final_score` and a string `profile_summary` (each optional) is
/// rejected rather than salvaged.
pub fn parse_score_response(body: &str) -> Result<ScoreOutcome, ScoringError> {
    let parsed: ScoreResponse = serde_json::from_str(body)
        .map_err(|e| ScoringError::MalformedResponse(e.to_string()))?;

    let defaulted = parsed.final_score.is_none() || parsed.profile_summary.is_none();
    if defaulted {
        warn!(
            has_score = parsed.final_score.is_some(),
            has_summary = parsed.profile_summary.is_some(),
            "Scoring response missing fields, using defaults"
        );
    }

    let score = parsed.final_score.unwrap_or(0.0);
    if !score.is_finite() {
        return Err(ScoringError::MalformedResponse(format!(
            "final_score is not finite: {score}"
        )));
    }

    Ok(ScoreOutcome {
        score,
        summary: parsed.profile_summary.unwrap_or_default(),
        defaulted,
    })
}

fn mime_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("txt") | Some("md") => "text/plain",
        _ => "application/pdf",
    }
}
