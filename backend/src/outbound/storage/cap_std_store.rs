//! Capability-scoped attachment storage on the local filesystem.
//!
//! Files land under `attachments/{uuid}/{name}` inside the configured root.
//! All access goes through a `cap_std::fs::Dir`, so storage keys can never
//! escape the root.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use uuid::Uuid;

use crate::domain::ports::{AttachmentStore, AttachmentStoreError};
use crate::domain::{StoredAttachment, ValidatedAttachment};

const ATTACHMENT_PREFIX: &str = "attachments";

/// Attachment store rooted at one directory.
#[derive(Clone)]
pub struct CapStdAttachmentStore {
    root: Arc<Dir>,
}

impl CapStdAttachmentStore {
    /// Open (creating when missing) the storage root.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the directory cannot be created or opened.
    pub fn open(root: &Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self::from_dir(dir))
    }

    /// Wrap an already-opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            root: Arc::new(dir),
        }
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, AttachmentStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> io::Result<T> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || op(&root))
            .await
            .map_err(|err| AttachmentStoreError::io(format!("storage task failed: {err}")))?
            .map_err(|err| AttachmentStoreError::io(err.to_string()))
    }
}

/// Reduce a client file name to a safe single path component.
fn sanitise_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "attachment".to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn storage_key_for(file_name: &str) -> String {
    format!(
        "{ATTACHMENT_PREFIX}/{}/{}",
        Uuid::new_v4(),
        sanitise_file_name(file_name)
    )
}

fn key_path(storage_key: &str) -> Result<PathBuf, AttachmentStoreError> {
    let path = PathBuf::from(storage_key);
    if !path.starts_with(ATTACHMENT_PREFIX) || storage_key.contains("..") {
        return Err(AttachmentStoreError::io(format!(
            "storage key outside attachment area: {storage_key}"
        )));
    }
    Ok(path)
}

#[async_trait]
impl AttachmentStore for CapStdAttachmentStore {
    async fn store(
        &self,
        attachment: &ValidatedAttachment,
    ) -> Result<StoredAttachment, AttachmentStoreError> {
        let storage_key = storage_key_for(attachment.file_name());
        let path = key_path(&storage_key)?;
        let bytes = attachment.bytes().to_vec();
        self.blocking(move |root| {
            if let Some(parent) = path.parent() {
                root.create_dir_all(parent)?;
            }
            root.write(&path, bytes)
        })
        .await?;

        let size_bytes = i64::try_from(attachment.size())
            .map_err(|_| AttachmentStoreError::io("attachment size overflow"))?;
        tracing::debug!(%storage_key, size_bytes, "attachment stored");
        Ok(StoredAttachment {
            file_name: attachment.file_name().to_owned(),
            file_type: attachment.file_type().to_owned(),
            size_bytes,
            storage_key,
        })
    }

    async fn discard(&self, storage_key: &str) -> Result<(), AttachmentStoreError> {
        let path = key_path(storage_key)?;
        self.blocking(move |root| {
            match root.remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(err) => return Err(err),
            }
            // The per-upload directory holds exactly one file.
            if let Some(parent) = path.parent() {
                match root.remove_dir(parent) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) if err.kind() == io::ErrorKind::DirectoryNotEmpty => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        })
        .await
    }
}
