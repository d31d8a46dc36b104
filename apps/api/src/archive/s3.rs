use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use super::{ArchiveError, ArchiveRequest, ArchivedFile, FileArchive};
use crate::intake::staging::sanitize_file_name;

/// S3 / MinIO backend. Objects land at `<folder>/<application_id>/<file_name>`.
pub struct S3Archive {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3Archive {
    /// Constructs a client configured for MinIO (local) or AWS (production).
    pub async fn connect(
        bucket: &str,
        endpoint: &str,
        public_url: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "recruitment-static",
        );

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .load()
            .await;

        // Public links are built path-style, so requests must be too.
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

/// `<folder>/<application_id>/<file_name>`. The file name is reduced to a
/// single path component so it cannot leave the application's prefix.
pub fn object_key(request: &ArchiveRequest<'_>) -> String {
    format!(
        "{}/{}/{}",
        request.folder.trim_matches('/'),
        request.application_id,
        sanitize_file_name(request.file_name)
    )
}

/// Path-style URL for `key`, with every segment percent-encoded.
pub fn public_link(public_url: &str, bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!(
        "{}/{}/{}",
        public_url,
        urlencoding::encode(bucket),
        encoded.join("/")
    )
}

#[async_trait]
impl FileArchive for S3Archive {
    async fn upload(&self, request: ArchiveRequest<'_>) -> Result<ArchivedFile, ArchiveError> {
        let key = object_key(&request);
        let body = ByteStream::from_path(request.path)
            .await
            .map_err(|e| ArchiveError::S3(format!("failed to read staged file: {e}")))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| ArchiveError::S3(format!("S3 upload failed: {e}")))?;

        info!(
            application_id = %request.application_id,
            "Uploaded resume to s3://{}/{}",
            self.bucket,
            key
        );

        Ok(ArchivedFile {
            link: public_link(&self.public_url, &self.bucket, &key),
            id: key,
        })
    }
}
