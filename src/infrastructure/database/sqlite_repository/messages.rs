use super::mapper::map_message_row;
use super::queries::{
    CONSUME_CHAT_SLOT, DELETE_MESSAGE, EXISTS_CURRENT_SUBSCRIPTION, EXISTS_MESSAGE_BETWEEN,
    INSERT_MESSAGE, MARK_MESSAGES_READ, SELECT_MESSAGE_BY_ID, SELECT_MESSAGES_FOR_USER,
    SELECT_PARTNER_IDS,
};
use super::{SqliteRepository, to_millis};
use crate::application::ports::repositories::{MessageRepository, QuotaInsertOutcome};
use crate::domain::entities::{Message, NewMessage};
use crate::domain::value_objects::{MessageId, SubscriptionId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

async fn insert_with(
    conn: &mut SqliteConnection,
    message: &NewMessage,
) -> Result<Message, AppError> {
    let result = sqlx::query(INSERT_MESSAGE)
        .bind(message.sender_id.as_i64())
        .bind(message.receiver_id.as_i64())
        .bind(&message.content)
        .bind(to_millis(message.created_at))
        .execute(&mut *conn)
        .await?;

    Ok(Message {
        id: MessageId::new(result.last_insert_rowid()),
        sender_id: message.sender_id,
        receiver_id: message.receiver_id,
        content: message.content.clone(),
        is_read: false,
        created_at: message.created_at,
    })
}

#[async_trait]
impl MessageRepository for SqliteRepository {
    async fn insert_message(&self, message: &NewMessage) -> Result<Message, AppError> {
        let mut conn = self.pool.get_pool().acquire().await?;
        insert_with(&mut conn, message).await
    }

    async fn insert_message_within_quota(
        &self,
        message: &NewMessage,
        subscription_id: SubscriptionId,
        now: DateTime<Utc>,
    ) -> Result<QuotaInsertOutcome, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        // 書き込みから始めて、判定から挿入までの間に他の送信が割り込めないようにする
        let consumed = sqlx::query(CONSUME_CHAT_SLOT)
            .bind(subscription_id.as_i64())
            .bind(to_millis(now))
            .bind(message.sender_id.as_i64())
            .bind(message.receiver_id.as_i64())
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !consumed {
            let still_current: bool = sqlx::query_scalar(EXISTS_CURRENT_SUBSCRIPTION)
                .bind(subscription_id.as_i64())
                .bind(to_millis(now))
                .fetch_one(&mut *tx)
                .await?;
            if !still_current {
                return Ok(QuotaInsertOutcome::SubscriptionInactive);
            }

            let existing_partner: bool = sqlx::query_scalar(EXISTS_MESSAGE_BETWEEN)
                .bind(message.sender_id.as_i64())
                .bind(message.receiver_id.as_i64())
                .fetch_one(&mut *tx)
                .await?;
            if !existing_partner {
                return Ok(QuotaInsertOutcome::LimitReached);
            }
        }

        let inserted = insert_with(&mut tx, message).await?;
        tx.commit().await?;

        Ok(QuotaInsertOutcome::Inserted {
            message: inserted,
            consumed_slot: consumed,
        })
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, AppError> {
        let row = sqlx::query(SELECT_MESSAGE_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_message_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query(SELECT_MESSAGES_FOR_USER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_message_row).collect()
    }

    async fn distinct_partner_ids(&self, user_id: UserId) -> Result<Vec<UserId>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(SELECT_PARTNER_IDS)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }

    async fn is_partner(&self, user_id: UserId, other: UserId) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(EXISTS_MESSAGE_BETWEEN)
            .bind(user_id.as_i64())
            .bind(other.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(exists)
    }

    async fn mark_read(&self, receiver_id: UserId, sender_id: UserId) -> Result<u64, AppError> {
        let result = sqlx::query(MARK_MESSAGES_READ)
            .bind(receiver_id.as_i64())
            .bind(sender_id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_message(&self, id: MessageId) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_MESSAGE)
            .bind(id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
