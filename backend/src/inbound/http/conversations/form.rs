//! Multipart parsing for posted messages.
//!
//! Parts are buffered with hard caps so an oversized upload is measured
//! without being held in memory. The form as a whole is capped too: at most
//! [`MAX_ATTACHMENTS_PER_MESSAGE`] files and [`MAX_FORM_FILE_BYTES`] across
//! them; the first part past either limit fails the request.

use actix_multipart::{Field, Multipart};
use futures_util::StreamExt;
use utoipa::ToSchema;

use crate::domain::{
    AttachmentUpload, AttachmentValidationError, Error, MAX_ATTACHMENT_BYTES,
    MAX_ATTACHMENTS_PER_MESSAGE, MAX_MESSAGE_CHARS, MessageValidationError,
};

const CONTENT_FIELD: &str = "content";
const FILES_FIELD: &str = "files";

/// Combined size of every file in one form (20 MiB).
pub(super) const MAX_FORM_FILE_BYTES: usize = 20 * 1024 * 1024;

/// Four bytes per character is the UTF-8 worst case.
const MAX_CONTENT_BYTES: usize = MAX_MESSAGE_CHARS * 4;

/// Multipart body of `POST /conversations/{id}/messages`.
#[derive(Debug, Default, ToSchema)]
pub struct MessageForm {
    /// Message text, at most 1000 characters.
    pub content: String,
    /// Up to 10 attachments; pdf, jpeg, png or jpg up to 5 MiB each.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub files: Vec<AttachmentUpload>,
}

/// Read the parts the message form defines; unknown parts are skipped.
pub(super) async fn read_message_form(mut payload: Multipart) -> Result<MessageForm, Error> {
    let mut form = MessageForm::default();
    let mut file_bytes = 0_usize;
    while let Some(field) = payload.next().await {
        let field = field?;
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            CONTENT_FIELD => form.content = read_content(field).await?,
            FILES_FIELD => {
                if form.files.len() == MAX_ATTACHMENTS_PER_MESSAGE {
                    let too_many = AttachmentValidationError::TooMany {
                        max: MAX_ATTACHMENTS_PER_MESSAGE,
                    };
                    return Err(Error::invalid_request(too_many.to_string()));
                }
                if let Some(upload) = read_file(field).await? {
                    file_bytes = file_bytes.saturating_add(upload.bytes.len());
                    if file_bytes > MAX_FORM_FILE_BYTES {
                        return Err(Error::invalid_request(format!(
                            "attachments total more than {MAX_FORM_FILE_BYTES} bytes"
                        )));
                    }
                    form.files.push(upload);
                }
            }
            _ => drain(field).await?,
        }
    }
    Ok(form)
}

async fn read_content(field: Field) -> Result<String, Error> {
    let (bytes, total) = read_capped(field, MAX_CONTENT_BYTES).await?;
    if total > MAX_CONTENT_BYTES {
        let too_long = MessageValidationError::TooLong {
            length: total,
            max: MAX_MESSAGE_CHARS,
        };
        return Err(Error::invalid_request(too_long.to_string()));
    }
    String::from_utf8(bytes).map_err(|_| Error::invalid_request("content must be UTF-8 text"))
}

/// Browsers send an empty, unnamed part when no file was chosen.
async fn read_file(field: Field) -> Result<Option<AttachmentUpload>, Error> {
    let file_name = field
        .content_disposition()
        .and_then(|disposition| disposition.get_filename())
        .map(str::to_owned)
        .unwrap_or_default();
    let content_type = field.content_type().map(ToString::to_string);
    let (bytes, total) = read_capped(field, MAX_ATTACHMENT_BYTES).await?;
    if file_name.is_empty() && total == 0 {
        return Ok(None);
    }
    if total > MAX_ATTACHMENT_BYTES {
        let too_large = AttachmentValidationError::TooLarge {
            file_name,
            size: total,
            max: MAX_ATTACHMENT_BYTES,
        };
        return Err(Error::invalid_request(too_large.to_string()));
    }
    Ok(Some(AttachmentUpload {
        file_name,
        content_type,
        bytes,
    }))
}

/// Buffer up to `cap` bytes and count the rest without keeping it.
async fn read_capped(mut field: Field, cap: usize) -> Result<(Vec<u8>, usize), Error> {
    let mut bytes = Vec::new();
    let mut total = 0_usize;
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        total = total.saturating_add(chunk.len());
        if total <= cap {
            bytes.extend_from_slice(&chunk);
        }
    }
    Ok((bytes, total))
}

async fn drain(mut field: Field) -> Result<(), Error> {
    while let Some(chunk) = field.next().await {
        chunk?;
    }
    Ok(())
}
