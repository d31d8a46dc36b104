use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ArchiveError, ArchiveRequest, ArchivedFile, FileArchive};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
/// Refresh the access token this long before Google says it expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Google Drive v3 backend. Authenticates with a long-lived OAuth refresh
/// token and keeps the short-lived access token cached between uploads.
pub struct DriveArchive {
    client: Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token: Mutex<Option<CachedToken>>,
}

impl DriveArchive {
    pub fn new(
        client_id: String,
        client_secret: String,
        refresh_token: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            client_id,
            client_secret,
            refresh_token,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, ArchiveError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Auth(format!("token refresh returned {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::MalformedResponse(e.to_string()))?;
        debug!("Refreshed Drive access token, valid for {}s", token.expires_in);

        let access_token = token.access_token.clone();
        // An expiry we cannot represent is not cached; the next upload refreshes.
        *cached = token_expiry(Instant::now(), token.expires_in).map(|expires_at| CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        Ok(access_token)
    }
}

fn token_expiry(now: Instant, expires_in: u64) -> Option<Instant> {
    now.checked_add(Duration::from_secs(expires_in))
}

#[async_trait]
impl FileArchive for DriveArchive {
    async fn upload(&self, request: ArchiveRequest<'_>) -> Result<ArchivedFile, ArchiveError> {
        let bytes = tokio::fs::read(request.path).await?;
        let access_token = self.access_token().await?;

        let boundary = format!("resume-{}", Uuid::new_v4().simple());
        let metadata = json!({
            "name": request.file_name,
            "parents": [request.folder],
        });
        let body = related_body(&boundary, &metadata, "application/octet-stream", &bytes);

        let response = self
            .client
            .post(UPLOAD_URL)
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ArchiveError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::MalformedResponse(e.to_string()))?;

        info!(
            application_id = %request.application_id,
            file_id = %uploaded.id,
            "Uploaded resume to Drive"
        );

        Ok(ArchivedFile {
            link: view_link(&uploaded.id),
            id: uploaded.id,
        })
    }
}

pub fn view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

/// `multipart/related` body for a Drive multipart upload: JSON metadata
/// first, then the media.
fn related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    media_type: &str,
    media: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + 512);
    body.extend_from_slice(
        format!("--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("--{boundary}\r\nContent-Type: {media_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_handles_absurd_lifetimes() {
        let now = Instant::now();
        assert_eq!(token_expiry(now, 3600), Some(now + Duration::from_secs(3600)));
        assert_eq!(token_expiry(now, u64::MAX), None);
    }

    #[test]
    fn test_view_link_format() {
        assert_eq!(view_link("abc123"), "https://drive.google.com/file/d/abc123/view");
    }

    #[test]
    fn test_related_body_layout() {
        let metadata = json!({"name": "cv.pdf", "parents": ["folder"]});
        let body = related_body("b0", &metadata, "application/pdf", b"%PDF-1.4");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with("--b0\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{"));
        assert!(text.contains(r#""parents":["folder"]"#));
        assert!(text.contains("--b0\r\nContent-Type: application/pdf\r\n\r\n%PDF-1.4\r\n"));
        assert!(text.ends_with("\r\n--b0--\r\n"));
    }
}
