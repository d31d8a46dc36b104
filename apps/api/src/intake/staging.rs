//! Local staging of uploaded resumes.
//!
//! A `StagedFile` owns its file on disk: the intake handler creates it, the
//! worker takes it over through the task, and whoever drops it last removes
//! the file, on success, failure or unwind alike.

use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 120;

#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    file_name: String,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sanitized client file name, without the application id prefix.
    /// Everything downstream of intake uses this, never the raw name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

/// Writes `bytes` to `<dir>/<application_id>-<file name>`. The application id
/// keeps concurrent uploads from colliding; `create_new` refuses to clobber.
pub async fn stage_upload(
    dir: &Path,
    application_id: Uuid,
    file_name: &str,
    bytes: &[u8],
) -> std::io::Result<StagedFile> {
    tokio::fs::create_dir_all(dir).await?;
    let file_name = sanitize_file_name(file_name);
    let path: PathBuf = dir.join(format!("{application_id}-{file_name}"));

    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .await?;
    let guard = match TempPath::try_from_path(path.clone()) {
        Ok(guard) => guard,
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }
    };
    // From here on the guard removes the file if anything below fails.
    let staged = StagedFile {
        path: guard,
        file_name,
    };
    file.write_all(bytes).await?;
    file.flush().await?;

    Ok(staged)
}

/// Reduces a client-supplied file name to a safe final path component.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return "resume".to_string();
    }

    // Keep the extension when truncating; extraction dispatches on it.
    if cleaned.chars().count() > MAX_NAME_LEN {
        let (stem, ext) = match cleaned.rsplit_once('.') {
            Some((stem, ext)) if ext.len() <= 8 => (stem, Some(ext)),
            _ => (cleaned, None),
        };
        let keep = MAX_NAME_LEN - ext.map_or(0, |e| e.len() + 1);
        let stem: String = stem.chars().take(keep).collect();
        return match ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem,
        };
    }

    cleaned.to_string()
}
