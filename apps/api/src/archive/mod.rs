//! Durable storage for submitted resumes.
//!
//! `FileArchive` is carried in pipeline state as `Arc<dyn FileArchive>`; the
//! backend is picked at startup from `ARCHIVE_BACKEND`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::ArchiveConfig;

pub mod drive;
pub mod s3;

pub use drive::DriveArchive;
pub use s3::S3Archive;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authorization failed: {0}")]
    Auth(String),

    #[error("storage returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("S3 error: {0}")]
    S3(String),

    #[error("malformed storage response: {0}")]
    MalformedResponse(String),
}

/// Durable reference to an archived file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedFile {
    pub id: String,
    pub link: String,
}

/// One file to archive.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveRequest<'a> {
    pub path: &'a Path,
    pub file_name: &'a str,
    pub application_id: Uuid,
    pub folder: &'a str,
}

#[async_trait]
pub trait FileArchive: Send + Sync {
    async fn upload(&self, request: ArchiveRequest<'_>) -> Result<ArchivedFile, ArchiveError>;
}

/// Builds the configured archive backend.
pub async fn build_archive(config: &ArchiveConfig) -> anyhow::Result<Arc<dyn FileArchive>> {
    Ok(match config {
        ArchiveConfig::Drive {
            client_id,
            client_secret,
            refresh_token,
        } => Arc::new(DriveArchive::new(
            client_id.clone(),
            client_secret.clone(),
            refresh_token.clone(),
        )?),
        ArchiveConfig::S3 {
            bucket,
            endpoint,
            public_url,
            access_key_id,
            secret_access_key,
        } => Arc::new(
            S3Archive::connect(
                bucket,
                endpoint,
                public_url,
                access_key_id,
                secret_access_key,
            )
            .await,
        ),
    })
}
