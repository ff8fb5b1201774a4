use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use reqwest::Response;
use sha2::{Digest, Sha256};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::warn;
use uuid::Uuid;

use crate::error::{BridgeError, Result};

const OWNER_DIGEST_LEN: usize = 16;

/// Root of the transient staging tree, partitioned per caller and per call.
#[derive(Clone, Debug)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the staging root exists.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| BridgeError::staging(&self.root, err))
    }

    /// Reserve `<root>/<owner digest>/<uuid>/<filename>` for one relay call.
    ///
    /// Only the directory is created; the file appears once content is written.
    pub async fn allocate(
        &self,
        owner_session: &str,
        original_filename: &str,
        content_type: &str,
    ) -> Result<StagedFile> {
        let owner_dir = self.root.join(owner_partition(owner_session));
        let dir = owner_dir.join(Uuid::new_v4().to_string());

        let mut created = tokio::fs::create_dir_all(&dir).await;
        if matches!(&created, Err(err) if err.kind() == ErrorKind::NotFound) {
            // A concurrent discard pruned the owner directory mid-creation.
            created = tokio::fs::create_dir_all(&dir).await;
        }
        created.map_err(|err| BridgeError::staging(&dir, err))?;

        let local_path = dir.join(staged_name(original_filename));

        Ok(StagedFile {
            local_path,
            dir,
            owner_dir,
            original_filename: original_filename.to_string(),
            content_type: content_type.to_string(),
            size: 0,
            discarded: false,
        })
    }
}

/// File content held on disk for the duration of a single relay call.
///
/// The owning session is recorded as the partition directory the file lives
/// under; the raw session credential is never kept.
#[derive(Debug)]
pub struct StagedFile {
    local_path: PathBuf,
    dir: PathBuf,
    owner_dir: PathBuf,
    original_filename: String,
    content_type: String,
    size: u64,
    discarded: bool,
}

impl StagedFile {
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Stream a download body into the staged file.
    pub async fn fill_from(&mut self, mut response: Response) -> Result<()> {
        let mut file = File::create(&self.local_path)
            .await
            .map_err(|err| BridgeError::staging(&self.local_path, err))?;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| BridgeError::download(format!("content stream interrupted: {err}")))?
        {
            self.size += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(|err| BridgeError::staging(&self.local_path, err))?;
        }
        file.flush()
            .await
            .map_err(|err| BridgeError::staging(&self.local_path, err))?;

        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn fill_from_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(&self.local_path, bytes)
            .await
            .map_err(|err| BridgeError::staging(&self.local_path, err))?;
        self.size = bytes.len() as u64;
        Ok(())
    }

    /// Remove the staged file and its call directory, then the owner directory
    /// if nothing else is staged there. Failures are logged only.
    pub async fn discard(mut self) -> bool {
        self.discarded = true;
        let removed = match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => true,
            Err(err) if err.kind() == ErrorKind::NotFound => true,
            Err(err) => {
                warn!(?err, path = %self.dir.display(), "failed to remove staged file");
                false
            }
        };
        // Fails harmlessly while other calls of the same owner are staged.
        let _ = tokio::fs::remove_dir(&self.owner_dir).await;
        removed
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.discarded {
            return;
        }
        // Reached only when the owning future is dropped mid-relay.
        if let Err(err) = std::fs::remove_dir_all(&self.dir) {
            if err.kind() != ErrorKind::NotFound {
                warn!(?err, path = %self.dir.display(), "failed to remove abandoned staged file");
            }
        }
        let _ = std::fs::remove_dir(&self.owner_dir);
    }
}

fn owner_partition(owner_session: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner_session.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..OWNER_DIGEST_LEN].to_string()
}

fn staged_name(original_filename: &str) -> String {
    let sanitized = sanitize_filename::sanitize(original_filename);
    if sanitized.trim().is_empty() {
        "download.bin".to_string()
    } else {
        sanitized
    }
}
