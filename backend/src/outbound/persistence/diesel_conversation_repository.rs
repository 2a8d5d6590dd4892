//! PostgreSQL-backed `ConversationRepository` implementation using Diesel ORM.
//!
//! Unread counts are computed per viewer as messages in the conversation
//! without a matching `message_reads` row.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::{count_star, exists, not};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ConversationRepository, ConversationRepositoryError};
use crate::domain::{
    Conversation, ConversationId, ConversationRecord, ConversationSummary, ProjectId, UserId,
    Viewer,
};

use super::diesel_basic_error_mapping::{
    map_basic_diesel_error, map_basic_pool_error, violates_foreign_key,
};
use super::models::ConversationRow;
use super::pool::{DbPool, PoolError};
use super::schema::{conversations, message_reads, messages, projects};

const PROJECT_FKEY: &str = "conversations_project_id_fkey";

/// Diesel-backed implementation of the `ConversationRepository` port.
#[derive(Clone)]
pub struct DieselConversationRepository {
    pool: DbPool,
}

impl DieselConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ConversationRepositoryError {
    map_basic_pool_error(error, ConversationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ConversationRepositoryError {
    map_basic_diesel_error(
        error,
        ConversationRepositoryError::query,
        ConversationRepositoryError::connection,
    )
}

fn to_count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_default()
}

/// Join listing rows with their unread counts; conversations without unread
/// messages have no count row.
fn summarise(rows: Vec<(ConversationRow, String)>, counts: &HashMap<i64, i64>) -> Vec<ConversationSummary> {
    rows.into_iter()
        .map(|(row, project_title)| {
            let unread_count = counts.get(&row.id).copied().map(to_count).unwrap_or(0);
            ConversationSummary {
                conversation: Conversation::from(row),
                project_title,
                unread_count,
            }
        })
        .collect()
}

#[async_trait]
impl ConversationRepository for DieselConversationRepository {
    async fn find_record(
        &self,
        id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conversations::table
            .inner_join(projects::table)
            .filter(conversations::id.eq(id.get()))
            .select((
                ConversationRow::as_select(),
                projects::title,
                projects::owner_id,
            ))
            .first::<(ConversationRow, String, Uuid)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(|(conversation, project_title, owner_id)| ConversationRecord {
            conversation: conversation.into(),
            project_title,
            owner_id: UserId::from_uuid(owner_id),
        }))
    }

    async fn find_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conversations::table
            .filter(conversations::project_id.eq(project_id.get()))
            .select(ConversationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Conversation::from))
    }

    async fn list_for_viewer(
        &self,
        viewer: &Viewer,
    ) -> Result<Vec<ConversationSummary>, ConversationRepositoryError> {
        let viewer_id = *viewer.user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = conversations::table
            .inner_join(projects::table)
            .select((ConversationRow::as_select(), projects::title))
            .order((conversations::updated_at.desc(), conversations::id.desc()))
            .into_boxed();
        if !viewer.is_staff {
            query = query.filter(projects::owner_id.eq(viewer_id));
        }
        let rows: Vec<(ConversationRow, String)> =
            query.load(&mut conn).await.map_err(map_diesel_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|(row, _)| row.id).collect();
        let counts: Vec<(i64, i64)> = messages::table
            .filter(messages::conversation_id.eq_any(&ids))
            .filter(not(exists(
                message_reads::table
                    .filter(message_reads::message_id.eq(messages::id))
                    .filter(message_reads::user_id.eq(viewer_id)),
            )))
            .group_by(messages::conversation_id)
            .select((messages::conversation_id, count_star()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(summarise(rows, &counts.into_iter().collect()))
    }

    async fn unread_count(
        &self,
        id: ConversationId,
        viewer: &Viewer,
    ) -> Result<u64, ConversationRepositoryError> {
        let viewer_id = *viewer.user_id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = messages::table
            .filter(messages::conversation_id.eq(id.get()))
            .filter(not(exists(
                message_reads::table
                    .filter(message_reads::message_id.eq(messages::id))
                    .filter(message_reads::user_id.eq(viewer_id)),
            )))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(to_count(count))
    }

    async fn ensure_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Conversation, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(conversations::table)
            .values((
                conversations::project_id.eq(project_id.get()),
                conversations::is_archived.eq(false),
            ))
            .on_conflict(conversations::project_id)
            .do_update()
            .set(conversations::is_archived.eq(false))
            .returning(ConversationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| {
                if violates_foreign_key(&err, PROJECT_FKEY) {
                    ConversationRepositoryError::project_missing(project_id.get())
                } else {
                    map_diesel_error(err)
                }
            })?;
        Ok(row.into())
    }

    async fn archive_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::update(
            conversations::table.filter(conversations::project_id.eq(project_id.get())),
        )
        .set((
            conversations::is_archived.eq(true),
            conversations::updated_at.eq(diesel::dsl::now),
        ))
        .returning(ConversationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        Ok(row.map(Conversation::from))
    }
}
