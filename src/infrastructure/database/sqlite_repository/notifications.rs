use super::mapper::map_notification_row;
use super::queries::{
    COUNT_UNREAD_NOTIFICATIONS, DELETE_NOTIFICATION, INSERT_NOTIFICATION,
    MARK_ALL_NOTIFICATIONS_READ, MARK_NOTIFICATION_READ, SELECT_NOTIFICATIONS_FOR_RECIPIENT,
};
use super::{SqliteRepository, to_millis};
use crate::application::ports::repositories::NotificationRepository;
use crate::domain::entities::{NewNotification, Notification};
use crate::domain::value_objects::{NotificationId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;

#[async_trait]
impl NotificationRepository for SqliteRepository {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, AppError> {
        let result = sqlx::query(INSERT_NOTIFICATION)
            .bind(notification.notification_type.as_str())
            .bind(&notification.message)
            .bind(notification.recipient_id.as_i64())
            .bind(notification.related_user_id.map(|id| id.as_i64()))
            .bind(to_millis(notification.created_at))
            .execute(self.pool.get_pool())
            .await?;

        Ok(Notification {
            id: NotificationId::new(result.last_insert_rowid()),
            notification_type: notification.notification_type,
            message: notification.message.clone(),
            recipient_id: notification.recipient_id,
            related_user_id: notification.related_user_id,
            is_read: false,
            created_at: notification.created_at,
        })
    }

    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query(SELECT_NOTIFICATIONS_FOR_RECIPIENT)
            .bind(recipient_id.as_i64())
            .bind(unread_only)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_notification_row).collect()
    }

    async fn count_unread(&self, recipient_id: UserId) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(COUNT_UNREAD_NOTIFICATIONS)
            .bind(recipient_id.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query(MARK_NOTIFICATION_READ)
            .bind(id.as_i64())
            .bind(recipient_id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, recipient_id: UserId) -> Result<u64, AppError> {
        let result = sqlx::query(MARK_ALL_NOTIFICATIONS_READ)
            .bind(recipient_id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: NotificationId) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_NOTIFICATION)
            .bind(id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{at, setup, user};
    use super::*;
    use crate::domain::entities::NotificationType;

    fn received(recipient: UserId, related: UserId, day: u32) -> NewNotification {
        NewNotification {
            notification_type: NotificationType::RequestReceived,
            message: "Someone sends a request".into(),
            recipient_id: recipient,
            related_user_id: Some(related),
            created_at: at(day),
        }
    }

    #[tokio::test]
    async fn unread_filter_and_counts() {
        let repo = setup().await;
        let me = user(&repo, "Me").await;
        let other = user(&repo, "Other").await;
        let first = repo.create_notification(&received(me.id, other.id, 2)).await.unwrap();
        repo.create_notification(&received(me.id, other.id, 3)).await.unwrap();

        assert_eq!(repo.count_unread(me.id).await.unwrap(), 2);
        assert!(repo.mark_read(first.id, me.id).await.unwrap());
        assert!(!repo.mark_read(first.id, other.id).await.unwrap());

        let unread = repo.list_for_recipient(me.id, true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].created_at, at(3));
        assert_eq!(repo.list_for_recipient(me.id, false).await.unwrap().len(), 2);

        assert_eq!(repo.mark_all_read(me.id).await.unwrap(), 1);
        assert_eq!(repo.count_unread(me.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_reports_missing_rows() {
        let repo = setup().await;
        let me = user(&repo, "Me").await;
        let other = user(&repo, "Other").await;
        let stored = repo.create_notification(&received(me.id, other.id, 2)).await.unwrap();

        assert!(repo.delete_notification(stored.id).await.unwrap());
        assert!(!repo.delete_notification(stored.id).await.unwrap());
    }
}
