use super::mapper::map_block_row;
use super::queries::{
    DELETE_BLOCK, DELETE_FAVOURITE, EXISTS_BLOCK, INSERT_BLOCK, SELECT_BLOCKS_BY_BLOCKER,
    SELECT_HIDDEN_USER_IDS,
};
use super::{SqliteRepository, conflict_on_unique, to_millis};
use crate::application::ports::repositories::BlockRepository;
use crate::domain::entities::Block;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[async_trait]
impl BlockRepository for SqliteRepository {
    async fn create_block(
        &self,
        blocker_id: UserId,
        blocked_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Block, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        sqlx::query(DELETE_FAVOURITE)
            .bind(blocker_id.as_i64())
            .bind(blocked_id.as_i64())
            .execute(&mut *tx)
            .await?;

        sqlx::query(INSERT_BLOCK)
            .bind(blocker_id.as_i64())
            .bind(blocked_id.as_i64())
            .bind(to_millis(created_at))
            .execute(&mut *tx)
            .await
            .map_err(|err| conflict_on_unique(err, "User is already blocked"))?;

        tx.commit().await?;

        Ok(Block {
            blocker_id,
            blocked_id,
            created_at,
        })
    }

    async fn delete_block(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_BLOCK)
            .bind(blocker_id.as_i64())
            .bind(blocked_id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_blocked(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(EXISTS_BLOCK)
            .bind(blocker_id.as_i64())
            .bind(blocked_id.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(exists)
    }

    async fn list_blocked(&self, blocker_id: UserId) -> Result<Vec<Block>, AppError> {
        let rows = sqlx::query(SELECT_BLOCKS_BY_BLOCKER)
            .bind(blocker_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_block_row).collect()
    }

    async fn hidden_user_ids(&self, viewer: UserId) -> Result<HashSet<UserId>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar(SELECT_HIDDEN_USER_IDS)
            .bind(viewer.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }
}
