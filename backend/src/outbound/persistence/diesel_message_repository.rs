//! PostgreSQL-backed `MessageRepository` implementation using Diesel ORM.
//!
//! A message, its attachment rows and the sender's read mark are written in
//! one transaction. Read marks rely on the `(message_id, user_id)` primary
//! key with `ON CONFLICT DO NOTHING`, so marking is idempotent.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{MessageRepository, MessageRepositoryError};
use crate::domain::{
    Attachment, ConversationId, Message, MessageId, MessagePageRequest, NewMessage, UserId,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violates_foreign_key,
};
use super::models::{
    AttachmentRow, MessageRow, NewAttachmentRow, NewMessageReadRow, NewMessageRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{conversations, message_attachments, message_reads, messages};

const MARK_ALL_READ_SQL: &str = "\
INSERT INTO message_reads (message_id, user_id) \
SELECT m.id, $2 FROM messages m WHERE m.conversation_id = $1 \
ON CONFLICT (message_id, user_id) DO NOTHING \
RETURNING message_id";

#[derive(QueryableByName)]
struct MarkedRow {
    #[diesel(sql_type = BigInt)]
    message_id: i64,
}

const CONVERSATION_FKEY: &str = "messages_conversation_id_fkey";

/// Diesel-backed implementation of the `MessageRepository` port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MessageRepositoryError {
    map_basic_pool_error(error, MessageRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MessageRepositoryError {
    map_basic_diesel_error(
        error,
        MessageRepositoryError::query,
        MessageRepositoryError::connection,
    )
}

/// Only the conversation reference means the conversation is gone; any
/// other missing parent, such as a deleted sender, is a plain query failure.
fn map_insert_error(error: diesel::result::Error, conversation_id: i64) -> MessageRepositoryError {
    if violates_foreign_key(&error, CONVERSATION_FKEY) {
        MessageRepositoryError::conversation_missing(conversation_id)
    } else {
        map_diesel_error(error)
    }
}

/// Attach read marks and attachment rows to their messages, keeping the
/// message order of `rows`.
fn assemble(
    rows: Vec<MessageRow>,
    reads: Vec<(i64, Uuid)>,
    attachments: Vec<AttachmentRow>,
) -> Vec<Message> {
    let mut readers: HashMap<i64, Vec<Uuid>> = HashMap::new();
    for (message_id, user_id) in reads {
        readers.entry(message_id).or_default().push(user_id);
    }
    let mut files: HashMap<i64, Vec<Attachment>> = HashMap::new();
    for row in attachments {
        files.entry(row.message_id).or_default().push(row.into());
    }

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            row.into_message(
                readers.remove(&id).unwrap_or_default(),
                files.remove(&id).unwrap_or_default(),
            )
        })
        .collect()
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn insert(&self, message: NewMessage) -> Result<Message, MessageRepositoryError> {
        use diesel_async::AsyncConnection as _;
        use diesel_async::scoped_futures::ScopedFutureExt as _;

        let conversation_id = message.conversation_id.get();
        let sender_id = *message.sender_id.as_uuid();
        let new_row = NewMessageRow {
            conversation_id,
            sender_id,
            content: message.content.as_ref(),
            has_attachment: message.has_attachment(),
        };
        let stored = &message.attachments;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (row, attachment_rows) = conn
            .transaction(|conn| {
                async move {
                    let row: MessageRow = diesel::insert_into(messages::table)
                        .values(&new_row)
                        .returning(MessageRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let attachment_rows: Vec<AttachmentRow> = if stored.is_empty() {
                        Vec::new()
                    } else {
                        let new_attachments: Vec<NewAttachmentRow<'_>> = stored
                            .iter()
                            .map(|file| NewAttachmentRow {
                                message_id: row.id,
                                file_name: file.file_name.as_str(),
                                file_type: file.file_type.as_str(),
                                size_bytes: file.size_bytes,
                                storage_key: file.storage_key.as_str(),
                            })
                            .collect();
                        diesel::insert_into(message_attachments::table)
                            .values(&new_attachments)
                            .returning(AttachmentRow::as_returning())
                            .get_results(conn)
                            .await?
                    };

                    diesel::insert_into(message_reads::table)
                        .values(&NewMessageReadRow {
                            message_id: row.id,
                            user_id: sender_id,
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;

                    diesel::update(conversations::table.filter(conversations::id.eq(conversation_id)))
                        .set(conversations::updated_at.eq(diesel::dsl::now))
                        .execute(conn)
                        .await?;

                    Ok::<_, diesel::result::Error>((row, attachment_rows))
                }
                .scope_boxed()
            })
            .await
            .map_err(|err| map_insert_error(err, conversation_id))?;

        Ok(row.into_message(
            [sender_id],
            attachment_rows.into_iter().map(Attachment::from).collect(),
        ))
    }

    async fn list_page(
        &self,
        conversation_id: ConversationId,
        page: MessagePageRequest,
    ) -> Result<Vec<Message>, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = messages::table
            .filter(messages::conversation_id.eq(conversation_id.get()))
            .order((messages::created_at.asc(), messages::id.asc()))
            .offset(page.offset())
            .limit(page.fetch_limit())
            .select(MessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let reads: Vec<(i64, Uuid)> = message_reads::table
            .filter(message_reads::message_id.eq_any(&ids))
            .select((message_reads::message_id, message_reads::user_id))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let attachments: Vec<AttachmentRow> = message_attachments::table
            .filter(message_attachments::message_id.eq_any(&ids))
            .order(message_attachments::id.asc())
            .select(AttachmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(assemble(rows, reads, attachments))
    }

    async fn mark_all_read(
        &self,
        conversation_id: ConversationId,
        reader: &UserId,
    ) -> Result<Vec<MessageId>, MessageRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let marked: Vec<MarkedRow> = sql_query(MARK_ALL_READ_SQL)
            .bind::<BigInt, _>(conversation_id.get())
            .bind::<SqlUuid, _>(*reader.as_uuid())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let mut ids: Vec<MessageId> = marked
            .into_iter()
            .map(|row| MessageId::new(row.message_id))
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use chrono::Utc;
    use rstest::rstest;

    use super::*;

    #[derive(Debug)]
    struct Violation(&'static str);

    impl diesel::result::DatabaseErrorInformation for Violation {
        fn message(&self) -> &str {
            "insert or update violates foreign key constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("messages")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn violation(constraint: &'static str) -> diesel::result::Error {
        diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::ForeignKeyViolation,
            Box::new(Violation(constraint)),
        )
    }

    #[rstest]
    fn missing_conversation_is_reported_as_such() {
        assert_eq!(
            map_insert_error(violation("messages_conversation_id_fkey"), 7),
            MessageRepositoryError::conversation_missing(7_i64)
        );
    }

    #[rstest]
    #[case("messages_sender_id_fkey")]
    #[case("message_reads_user_id_fkey")]
    fn other_missing_parents_are_query_failures(#[case] constraint: &'static str) {
        assert!(matches!(
            map_insert_error(violation(constraint), 7),
            MessageRepositoryError::Query { .. }
        ));
    }

    fn message_row(id: i64, sender: Uuid) -> MessageRow {
        MessageRow {
            id,
            conversation_id: 7,
            sender_id: sender,
            content: format!("message {id}"),
            has_attachment: id == 2,
            created_at: Utc::now(),
        }
    }

    fn attachment_row(id: i64, message_id: i64) -> AttachmentRow {
        AttachmentRow {
            id,
            message_id,
            file_name: "brief.pdf".to_owned(),
            file_type: "application/pdf".to_owned(),
            size_bytes: 128,
            storage_key: format!("2026/01/{id}-brief.pdf"),
            uploaded_at: Utc::now(),
        }
    }

    #[rstest]
    fn assemble_groups_reads_and_files_by_message() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let messages = assemble(
            vec![message_row(1, alice), message_row(2, bob)],
            vec![(1, alice), (1, bob), (2, bob)],
            vec![attachment_row(10, 2)],
        );

        assert_eq!(
            messages.iter().map(|m| m.id.get()).collect::<Vec<_>>(),
            vec![1, 2]
        );
        assert!(messages[0].is_read_by(&UserId::from_uuid(bob)));
        assert!(!messages[1].is_read_by(&UserId::from_uuid(alice)));
        assert!(messages[0].attachments.is_empty());
        assert_eq!(messages[1].attachments.len(), 1);
        assert_eq!(messages[1].attachments[0].message_id, MessageId::new(2));
    }
}
