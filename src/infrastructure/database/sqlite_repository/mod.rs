use super::ConnectionPool;
use super::Repository;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

mod blocks;
mod chat_requests;
mod favourites;
mod mapper;
mod messages;
mod notifications;
mod photos;
mod plans;
mod queries;
mod subscriptions;
mod users;

pub struct SqliteRepository {
    pool: ConnectionPool,
}

impl SqliteRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn initialize(&self) -> Result<(), AppError> {
        self.pool.migrate().await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let result = sqlx::query("SELECT 1")
            .fetch_one(self.pool.get_pool())
            .await;
        Ok(result.is_ok())
    }
}

/// 一意制約違反を `Conflict` に、それ以外はそのまま DB エラーに変換する。
fn conflict_on_unique(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict(message),
        _ => AppError::from(err),
    }
}

fn to_millis(value: DateTime<Utc>) -> i64 {
    value.timestamp_millis()
}
