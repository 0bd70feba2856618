//! Upload persistence.
//!
//! Image and audio uploads are written once into a flat directory under a
//! unique name and are never read back by the service; the HTTP layer may
//! expose the directory statically under `/uploads`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// URL prefix the upload directory is served under.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Longest sanitized stem kept from the client's filename.
const MAX_STEM_CHARS: usize = 64;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write upload {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where a saved upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub filename: String,
    pub file_path: PathBuf,
    /// Path under [`UPLOADS_ROUTE`] the file is reachable at.
    pub file_url: String,
}

/// Writes uploads into one directory.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Open (creating if needed) the upload directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `bytes` under a fresh name derived from `original_name`.
    pub async fn save(
        &self,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<StoredUpload, StorageError> {
        let filename = format!("{}_{}", uuid::Uuid::new_v4().simple(), sanitize(original_name));
        let file_path = self.dir.join(&filename);

        tokio::fs::write(&file_path, bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: file_path.clone(),
                source,
            })?;
        log::debug!("Saved upload {} ({} bytes)", file_path.display(), bytes.len());

        Ok(StoredUpload {
            file_url: format!("{UPLOADS_ROUTE}/{filename}"),
            filename,
            file_path,
        })
    }
}

/// Reduce a client-supplied filename to `[A-Za-z0-9._-]`, without any
/// directory part.
fn sanitize(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((s, e)) if !s.is_empty() => (s, Some(e)),
        _ => (base, None),
    };

    let clean = |s: &str, max: usize| -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
            .take(max)
            .collect()
    };

    let stem = clean(stem, MAX_STEM_CHARS);
    let stem = if stem.is_empty() { "upload".to_string() } else { stem };
    match ext.map(|e| clean(e, 8)).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{stem}.{}", ext.to_ascii_lowercase()),
        None => stem,
    }
}
