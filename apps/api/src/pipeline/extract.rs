use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported resume format '{0}'")]
    Unsupported(String),

    #[error("PDF extraction error: {0}")]
    Pdf(String),

    #[error("failed to read resume: {0}")]
    Io(#[from] std::io::Error),

    #[error("resume contains no extractable text")]
    Empty,
}

/// Pulls plain text out of a staged resume. PDF parsing is CPU-bound and runs
/// on the blocking pool.
pub async fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let text = match extension.as_deref() {
        Some("pdf") => {
            let owned = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                .await
                .map_err(|e| ExtractError::Pdf(e.to_string()))?
                .map_err(|e| ExtractError::Pdf(e.to_string()))?
        }
        Some("txt") | Some("md") => tokio::fs::read_to_string(path).await?,
        other => return Err(ExtractError::Unsupported(other.unwrap_or("").to_string())),
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text)
}
