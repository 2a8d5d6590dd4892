//! Port for attachment byte storage.

use async_trait::async_trait;

use crate::domain::{StoredAttachment, ValidatedAttachment};

use super::define_port_error;

define_port_error! {
    /// Errors raised by attachment storage adapters.
    pub enum AttachmentStoreError {
        /// Writing or removing a file failed.
        Io { message: String } => "attachment storage failed: {message}",
    }
}

/// Storage for attachment contents; metadata lives with the message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Write the attachment and return where it was stored.
    async fn store(
        &self,
        attachment: &ValidatedAttachment,
    ) -> Result<StoredAttachment, AttachmentStoreError>;

    /// Remove a stored file. Missing files are not an error.
    async fn discard(&self, storage_key: &str) -> Result<(), AttachmentStoreError>;
}
