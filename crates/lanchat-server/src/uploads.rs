use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use lanchat_shared::constants::UPLOADS_URL_PREFIX;
use lanchat_shared::FileRef;

use crate::error::ServerError;

/// Flat directory of uploaded files, each stored under a generated name.
///
/// The original file name is only echoed back to the client; it never
/// reaches the filesystem.
#[derive(Debug, Clone)]
pub struct UploadStore {
    base_path: PathBuf,
    max_size: usize,
}

impl UploadStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ServerError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ServerError::UploadStorage(format!(
                "Failed to create upload directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Upload store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Write an upload and return the reference clients embed in a file message.
    pub async fn store(&self, original_name: &str, data: &[u8]) -> Result<FileRef, ServerError> {
        if data.is_empty() {
            return Err(ServerError::BadRequest("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ServerError::UploadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let stored_name = Uuid::new_v4().simple().to_string();
        let path = self.base_path.join(&stored_name);

        fs::write(&path, data).await.map_err(|e| {
            ServerError::UploadStorage(format!("Failed to write upload {}: {}", stored_name, e))
        })?;

        debug!(file = %stored_name, size = data.len(), "Stored upload");

        Ok(FileRef {
            name: display_name(original_name, &stored_name),
            url: format!("{UPLOADS_URL_PREFIX}/{stored_name}"),
        })
    }
}

/// Last path segment of the client-supplied name, or the stored name when
/// nothing usable is left.
fn display_name(original: &str, fallback: &str) -> String {
    let name = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        fallback.to_string()
    } else {
        name.to_string()
    }
}
