use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Upper bound on concurrent scoring tasks.
pub const MAX_WORKER_POOL_SIZE: usize = 1024;

/// Where archived resumes end up.
#[derive(Debug, Clone)]
pub enum ArchiveConfig {
    Drive {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    S3 {
        bucket: String,
        endpoint: String,
        public_url: String,
        access_key_id: String,
        secret_access_key: String,
    },
}

/// Application configuration loaded from environment variables.
/// Built once at startup and handed to each component; fails fast on missing
/// or malformed values.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub staging_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub scoring_service_url: String,
    pub scoring_timeout: Duration,
    pub upload_timeout: Duration,
    pub worker_pool_size: usize,
    pub queue_capacity: usize,
    pub archive_folder: String,
    pub archive: ArchiveConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| -> Result<String> {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let archive = match var("ARCHIVE_BACKEND").as_deref().unwrap_or("drive") {
            "drive" => ArchiveConfig::Drive {
                client_id: require("GOOGLE_CLIENT_ID")?,
                client_secret: require("GOOGLE_CLIENT_SECRET")?,
                refresh_token: require("GOOGLE_REFRESH_TOKEN")?,
            },
            "s3" => {
                let endpoint = require("S3_ENDPOINT")?;
                ArchiveConfig::S3 {
                    bucket: require("S3_BUCKET")?,
                    public_url: var("S3_PUBLIC_URL").unwrap_or_else(|| endpoint.clone()),
                    endpoint,
                    access_key_id: require("AWS_ACCESS_KEY_ID")?,
                    secret_access_key: require("AWS_SECRET_ACCESS_KEY")?,
                }
            }
            other => bail!("ARCHIVE_BACKEND must be 'drive' or 's3', got '{other}'"),
        };

        let worker_pool_size: usize = parse_or(&var, "WORKER_POOL_SIZE", 5)?;
        if !(1..=MAX_WORKER_POOL_SIZE).contains(&worker_pool_size) {
            bail!("WORKER_POOL_SIZE must be between 1 and {MAX_WORKER_POOL_SIZE}");
        }
        let queue_capacity: usize = parse_or(&var, "QUEUE_CAPACITY", 100)?;
        if queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be at least 1");
        }

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            port: parse_or(&var, "PORT", 5002)?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            staging_dir: PathBuf::from(var("STAGING_DIR").unwrap_or_else(|| "uploads".to_string())),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            scoring_service_url: var("SCORING_SERVICE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:5001".to_string()),
            scoring_timeout: Duration::from_secs(parse_or(&var, "SCORING_TIMEOUT_SECS", 120)?),
            upload_timeout: Duration::from_secs(parse_or(&var, "UPLOAD_TIMEOUT_SECS", 60)?),
            worker_pool_size,
            queue_capacity,
            archive_folder: require("ARCHIVE_FOLDER")?,
            archive,
        })
    }
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
