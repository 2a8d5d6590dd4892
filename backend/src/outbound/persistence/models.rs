//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live here so
//! every repository shares them.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Attachment, AttachmentId, Conversation, ConversationId, EmailAddress, Message, MessageId,
    Project, ProjectId, ProjectStatus, UserAccount, UserId,
};

use super::schema::{
    conversations, message_attachments, message_reads, messages, projects, users,
};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::parse(&row.email)
            .map_err(|err| format!("stored email for user {} is invalid: {err}", row.id))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email,
            password_hash: row.password_hash,
            is_active: row.is_active,
            is_staff: row.is_staff,
        })
    }
}

/// Row struct for reading from the projects table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: i64,
    pub owner_id: Uuid,
    pub title: String,
    pub status: String,
}

impl TryFrom<ProjectRow> for Project {
    type Error = String;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ProjectStatus>()
            .map_err(|err| format!("project {}: {err}", row.id))?;
        Ok(Self {
            id: ProjectId::new(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            title: row.title,
            status,
        })
    }
}

/// Row struct for reading from the conversations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConversationRow {
    pub id: i64,
    pub project_id: i64,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: ConversationId::new(row.id),
            project_id: ProjectId::new(row.project_id),
            is_archived: row.is_archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row struct for reading from the messages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: Uuid,
    pub content: String,
    pub has_attachment: bool,
    pub created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Combine the row with its read marks and attachments.
    pub(crate) fn into_message(
        self,
        readers: impl IntoIterator<Item = Uuid>,
        attachments: Vec<Attachment>,
    ) -> Message {
        Message {
            id: MessageId::new(self.id),
            conversation_id: ConversationId::new(self.conversation_id),
            sender_id: UserId::from_uuid(self.sender_id),
            content: self.content,
            created_at: self.created_at,
            has_attachment: self.has_attachment,
            read_by: readers
                .into_iter()
                .map(UserId::from_uuid)
                .collect::<HashSet<_>>(),
            attachments,
        }
    }
}

/// Insertable struct for creating message records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub(crate) struct NewMessageRow<'a> {
    pub conversation_id: i64,
    pub sender_id: Uuid,
    pub content: &'a str,
    pub has_attachment: bool,
}

/// Insertable struct for read marks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message_reads)]
pub(crate) struct NewMessageReadRow {
    pub message_id: i64,
    pub user_id: Uuid,
}

/// Row struct for reading from the message_attachments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = message_attachments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AttachmentRow {
    pub id: i64,
    pub message_id: i64,
    pub file_name: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Self {
            id: AttachmentId::new(row.id),
            message_id: MessageId::new(row.message_id),
            file_name: row.file_name,
            file_type: row.file_type,
            size_bytes: row.size_bytes,
            storage_key: row.storage_key,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Insertable struct for attachment metadata.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = message_attachments)]
pub(crate) struct NewAttachmentRow<'a> {
    pub message_id: i64,
    pub file_name: &'a str,
    pub file_type: &'a str,
    pub size_bytes: i64,
    pub storage_key: &'a str,
}
