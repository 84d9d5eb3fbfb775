use super::mapper::map_chat_request_row;
use super::queries::{
    ACCEPT_PENDING_CHAT_REQUEST, DELETE_LATEST_MATCHING_NOTIFICATION,
    DELETE_PENDING_CHAT_REQUEST, EXISTS_ACCEPTED_CHAT_REQUEST_BETWEEN, INSERT_CHAT_REQUEST,
    SELECT_CHAT_REQUEST_BETWEEN, SELECT_CHAT_REQUEST_BY_ID, SELECT_CHAT_REQUESTS_FOR_USER,
    SELECT_PENDING_CHAT_REQUESTS_FOR_RECEIVER,
};
use super::{SqliteRepository, conflict_on_unique, to_millis};
use crate::application::ports::repositories::ChatRequestRepository;
use crate::domain::entities::{
    ChatRequest, ChatRequestStatus, NewChatRequest, NotificationCleanup,
};
use crate::domain::value_objects::{ChatRequestId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

#[async_trait]
impl ChatRequestRepository for SqliteRepository {
    async fn create_request(&self, request: &NewChatRequest) -> Result<ChatRequest, AppError> {
        let result = sqlx::query(INSERT_CHAT_REQUEST)
            .bind(request.sender_id.as_i64())
            .bind(request.receiver_id.as_i64())
            .bind(to_millis(request.created_at))
            .execute(self.pool.get_pool())
            .await
            .map_err(|err| {
                conflict_on_unique(err, "A chat request already exists between these users")
            })?;

        Ok(ChatRequest {
            id: ChatRequestId::new(result.last_insert_rowid()),
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            status: ChatRequestStatus::Pending,
            created_at: request.created_at,
            updated_at: request.created_at,
        })
    }

    async fn get_request(&self, id: ChatRequestId) -> Result<Option<ChatRequest>, AppError> {
        let row = sqlx::query(SELECT_CHAT_REQUEST_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_chat_request_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_between(&self, a: UserId, b: UserId) -> Result<Option<ChatRequest>, AppError> {
        let row = sqlx::query(SELECT_CHAT_REQUEST_BETWEEN)
            .bind(a.as_i64())
            .bind(b.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_chat_request_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn exists_accepted_between(&self, a: UserId, b: UserId) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(EXISTS_ACCEPTED_CHAT_REQUEST_BETWEEN)
            .bind(a.as_i64())
            .bind(b.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(exists)
    }

    async fn accept_pending(
        &self,
        id: ChatRequestId,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ChatRequest>, AppError> {
        let result = sqlx::query(ACCEPT_PENDING_CHAT_REQUEST)
            .bind(id.as_i64())
            .bind(to_millis(updated_at))
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_request(id).await
    }

    async fn delete_pending(
        &self,
        id: ChatRequestId,
        cleanups: &[NotificationCleanup],
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        let deleted = sqlx::query(DELETE_PENDING_CHAT_REQUEST)
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Ok(false);
        }

        for cleanup in cleanups {
            let removed = sqlx::query(DELETE_LATEST_MATCHING_NOTIFICATION)
                .bind(cleanup.recipient_id.as_i64())
                .bind(cleanup.related_user_id.as_i64())
                .bind(cleanup.notification_type.as_str())
                .execute(&mut *tx)
                .await?;
            debug!(
                request_id = %id,
                recipient_id = %cleanup.recipient_id,
                removed = removed.rows_affected(),
                "Removed handshake notification"
            );
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn list_pending_for_receiver(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ChatRequest>, AppError> {
        let rows = sqlx::query(SELECT_PENDING_CHAT_REQUESTS_FOR_RECEIVER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_chat_request_row).collect()
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRequest>, AppError> {
        let rows = sqlx::query(SELECT_CHAT_REQUESTS_FOR_USER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_chat_request_row).collect()
    }
}
