//! Filesystem blob storage for uploaded documents.
//!
//! Files land under a sharded directory hierarchy derived from a fresh UUID,
//! keeping any single directory small. The returned URL is server-relative
//! (`/files/...`) and durable for the life of the deployment.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use cairn_core::{Error, FileStorage, Result, StoredFile};

/// URL prefix under which stored files are addressed.
pub const FILE_URL_PREFIX: &str = "/files/";

/// Filesystem storage backend.
///
/// Path format: `{base_path}/{first-2-hex}/{next-2-hex}/{uuid}_{filename}`.
#[derive(Clone)]
pub struct FilesystemStorage {
    base_path: PathBuf,
}

impl FilesystemStorage {
    /// Create a storage backend rooted at `base_path`.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, url: &str) -> Option<PathBuf> {
        let rel = url.strip_prefix(FILE_URL_PREFIX)?;
        // Reject traversal; stored paths never contain dot segments.
        if rel.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..") {
            return None;
        }
        Some(self.base_path.join(rel))
    }
}

/// Strip characters that are unsafe in a stored filename.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("upload")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('_').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl FileStorage for FilesystemStorage {
    async fn store(&self, filename: &str, data: &[u8]) -> Result<StoredFile> {
        let blob_id = Uuid::new_v4();
        let hex = blob_id.simple().to_string();
        let rel = format!(
            "{}/{}/{}_{}",
            &hex[0..2],
            &hex[2..4],
            blob_id,
            sanitize_filename(filename)
        );
        let path = self.base_path.join(&rel);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("create dir failed: {}", e)))?;
        }
        fs::write(&path, data)
            .await
            .map_err(|e| Error::Storage(format!("write failed: {}", e)))?;

        debug!(
            subsystem = "storage",
            component = "filesystem",
            op = "store",
            path = %path.display(),
            size = data.len(),
            "Stored file"
        );

        Ok(StoredFile {
            url: format!("{}{}", FILE_URL_PREFIX, rel),
            size_bytes: data.len(),
        })
    }

    async fn delete(&self, url: &str) -> Result<()> {
        let Some(path) = self.resolve(url) else {
            return Err(Error::Storage(format!("unresolvable file URL: {}", url)));
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("delete failed: {}", e))),
        }
    }
}
