use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;

use crate::errors::AppError;

/// The resume part of an application form.
#[derive(Debug)]
pub struct UploadedResume {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A validated application form.
#[derive(Debug)]
pub struct ApplicationForm {
    pub name: String,
    pub email: String,
    pub job_id: String,
    pub resume: UploadedResume,
}

/// Reads `name`, `email`, `job_id` and `file` from the multipart body.
/// Unknown fields are skipped.
pub async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationForm, AppError> {
    let mut name = None;
    let mut email = None;
    let mut job_id = None;
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = Some(field.text().await.map_err(multipart_error)?),
            "email" => email = Some(field.text().await.map_err(multipart_error)?),
            "job_id" => job_id = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                resume = Some(UploadedResume { file_name, bytes });
            }
            _ => {}
        }
    }

    let resume = resume.ok_or_else(|| AppError::Validation("No file part".to_string()))?;
    if resume.file_name.trim().is_empty() {
        return Err(AppError::Validation("No selected file".to_string()));
    }

    Ok(ApplicationForm {
        name: required(name, "name")?,
        email: required(email, "email")?,
        job_id: required(job_id, "job_id")?,
        resume,
    })
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("Missing required field '{field}'")))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Failed to read multipart: {}", e.body_text()))
    }
}
