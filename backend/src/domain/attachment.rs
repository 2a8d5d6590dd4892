//! Message attachment validation.
//!
//! Uploads are checked in full before any message row or file is written, so
//! a rejected attachment never leaves a partially created message behind.

use chrono::{DateTime, Utc};

use crate::domain::{AttachmentId, MessageId};

/// Largest accepted attachment, in bytes (5 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

/// Most files one message may carry.
pub const MAX_ATTACHMENTS_PER_MESSAGE: usize = 10;

/// Accepted file extensions, compared case-insensitively.
pub const ALLOWED_ATTACHMENT_EXTENSIONS: [&str; 4] = ["pdf", "jpeg", "png", "jpg"];

/// MIME type recorded when the client does not declare one.
pub const DEFAULT_ATTACHMENT_TYPE: &str = "application/octet-stream";

/// Reasons an upload is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentValidationError {
    #[error("attachment file name must not be empty")]
    MissingFileName,
    #[error("a message may carry at most {max} attachments")]
    TooMany { max: usize },
    #[error("attachment {file_name} is empty")]
    EmptyFile { file_name: String },
    #[error("attachment {file_name} is {size} bytes; the limit is {max} bytes")]
    TooLarge {
        file_name: String,
        size: usize,
        max: usize,
    },
    #[error("attachment {file_name} has an unsupported extension; allowed: pdf, jpeg, png, jpg")]
    DisallowedExtension { file_name: String },
}

/// Raw upload received from an inbound adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Upload that passed every attachment rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAttachment {
    file_name: String,
    file_type: String,
    bytes: Vec<u8>,
}

impl ValidatedAttachment {
    /// Client-declared file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared MIME type, defaulted when absent.
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    /// File contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl TryFrom<AttachmentUpload> for ValidatedAttachment {
    type Error = AttachmentValidationError;

    fn try_from(upload: AttachmentUpload) -> Result<Self, Self::Error> {
        let AttachmentUpload {
            file_name,
            content_type,
            bytes,
        } = upload;

        let file_name = file_name.trim().to_owned();
        if file_name.is_empty() {
            return Err(AttachmentValidationError::MissingFileName);
        }
        if !has_allowed_extension(&file_name) {
            return Err(AttachmentValidationError::DisallowedExtension { file_name });
        }
        if bytes.is_empty() {
            return Err(AttachmentValidationError::EmptyFile { file_name });
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentValidationError::TooLarge {
                file_name,
                size: bytes.len(),
                max: MAX_ATTACHMENT_BYTES,
            });
        }

        let file_type = content_type
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_TYPE.to_owned());

        Ok(Self {
            file_name,
            file_type,
            bytes,
        })
    }
}

fn has_allowed_extension(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| ALLOWED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()))
}

/// Attachment bytes already written to storage, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAttachment {
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
}

/// Persisted attachment metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub message_id: MessageId,
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}
