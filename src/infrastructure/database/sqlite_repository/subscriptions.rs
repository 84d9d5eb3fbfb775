use super::mapper::map_subscription_row;
use super::queries::{
    EXISTS_CURRENT_SUBSCRIPTION_FOR_USER, EXPIRE_ACTIVE_SUBSCRIPTIONS_FOR_USER,
    EXPIRE_SUBSCRIPTION_IF_VERSION, INSERT_SUBSCRIPTION, SELECT_ALL_SUBSCRIPTIONS, SELECT_CURRENT_ACTIVE_SUBSCRIPTION,
    SELECT_EXPIRED_ACTIVE_SUBSCRIPTIONS, SELECT_SUBSCRIPTION_BY_ID, SELECT_SUBSCRIPTIONS_BY_USER,
    TRIM_PHOTOS, UPDATE_SUBSCRIPTION_IF_VERSION,
};
use super::{SqliteRepository, to_millis};
use crate::application::ports::repositories::{ExpiryOutcome, SubscriptionRepository};
use crate::domain::entities::{
    NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate,
};
use crate::domain::value_objects::{SubscriptionId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl SubscriptionRepository for SqliteRepository {
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, AppError> {
        let result = sqlx::query(INSERT_SUBSCRIPTION)
            .bind(subscription.user_id.as_i64())
            .bind(subscription.plan_id.as_i64())
            .bind(to_millis(subscription.start_date))
            .bind(to_millis(subscription.expiry_date))
            .bind(subscription.chat_limit.map(i64::from))
            .execute(self.pool.get_pool())
            .await?;

        Ok(Subscription {
            id: SubscriptionId::new(result.last_insert_rowid()),
            user_id: subscription.user_id,
            plan_id: subscription.plan_id,
            start_date: subscription.start_date,
            expiry_date: subscription.expiry_date,
            status: SubscriptionStatus::Active,
            chat_limit: subscription.chat_limit,
            used_chat_slots: 0,
            version: 0,
        })
    }

    async fn get_subscription(
        &self,
        id: SubscriptionId,
    ) -> Result<Option<Subscription>, AppError> {
        let row = sqlx::query(SELECT_SUBSCRIPTION_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_subscription_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_current_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>, AppError> {
        let row = sqlx::query(SELECT_CURRENT_ACTIVE_SUBSCRIPTION)
            .bind(user_id.as_i64())
            .bind(to_millis(now))
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_subscription_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Subscription>, AppError> {
        let rows = sqlx::query(SELECT_SUBSCRIPTIONS_BY_USER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_subscription_row).collect()
    }

    async fn list_all(&self) -> Result<Vec<Subscription>, AppError> {
        let rows = sqlx::query(SELECT_ALL_SUBSCRIPTIONS)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_subscription_row).collect()
    }

    async fn apply_update(
        &self,
        update: &SubscriptionUpdate,
    ) -> Result<Option<Subscription>, AppError> {
        let result = sqlx::query(UPDATE_SUBSCRIPTION_IF_VERSION)
            .bind(update.id.as_i64())
            .bind(update.expected_version)
            .bind(to_millis(update.expiry_date))
            .bind(update.chat_limit.map(i64::from))
            .bind(i64::from(update.used_chat_slots))
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_subscription(update.id).await
    }

    async fn list_expired_active(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, AppError> {
        let rows = sqlx::query(SELECT_EXPIRED_ACTIVE_SUBSCRIPTIONS)
            .bind(to_millis(now))
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_subscription_row).collect()
    }

    async fn expire_subscription(
        &self,
        id: SubscriptionId,
        expected_version: i64,
        now: DateTime<Utc>,
        photo_limit: u32,
    ) -> Result<ExpiryOutcome, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        let user_id: Option<i64> = sqlx::query_scalar(EXPIRE_SUBSCRIPTION_IF_VERSION)
            .bind(id.as_i64())
            .bind(expected_version)
            .bind(to_millis(now))
            .fetch_optional(&mut *tx)
            .await?;
        let Some(user_id) = user_id else {
            return Ok(ExpiryOutcome::default());
        };

        let still_subscribed: bool = sqlx::query_scalar(EXISTS_CURRENT_SUBSCRIPTION_FOR_USER)
            .bind(user_id)
            .bind(to_millis(now))
            .fetch_one(&mut *tx)
            .await?;
        let photos_removed = if still_subscribed {
            0
        } else {
            sqlx::query(TRIM_PHOTOS)
                .bind(user_id)
                .bind(i64::from(photo_limit))
                .execute(&mut *tx)
                .await?
                .rows_affected()
        };

        tx.commit().await?;
        Ok(ExpiryOutcome {
            expired: 1,
            photos_removed,
        })
    }

    async fn revoke_active_for_user(
        &self,
        user_id: UserId,
        photo_limit: u32,
    ) -> Result<ExpiryOutcome, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        let expired = sqlx::query(EXPIRE_ACTIVE_SUBSCRIPTIONS_FOR_USER)
            .bind(user_id.as_i64())
            .execute(&mut *tx)
            .await?;
        let trimmed = sqlx::query(TRIM_PHOTOS)
            .bind(user_id.as_i64())
            .bind(i64::from(photo_limit))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ExpiryOutcome {
            expired: expired.rows_affected(),
            photos_removed: trimmed.rows_affected(),
        })
    }
}
