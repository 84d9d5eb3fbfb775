use crate::application::ports::repositories::{NotificationRepository, UserRepository};
use crate::application::ports::{Clock, PushNotifier, RealtimeDispatcher, RealtimeTopic};
use crate::domain::entities::{NewNotification, Notification, NotificationType, User};
use crate::domain::value_objects::{NotificationId, UserId};
use crate::shared::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    users: Arc<dyn UserRepository>,
    dispatcher: Arc<dyn RealtimeDispatcher>,
    push: Arc<dyn PushNotifier>,
    clock: Arc<dyn Clock>,
    app_name: String,
}

impl NotificationService {
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        users: Arc<dyn UserRepository>,
        dispatcher: Arc<dyn RealtimeDispatcher>,
        push: Arc<dyn PushNotifier>,
        clock: Arc<dyn Clock>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            users,
            dispatcher,
            push,
            clock,
            app_name: app_name.into(),
        }
    }

    /// 通知を保存し、受信者のライブセッションとデバイスへ配信する。
    /// 配信の失敗はログに残すだけで、保存結果は返す。
    pub async fn notify(
        &self,
        notification_type: NotificationType,
        message: impl Into<String>,
        recipient: &User,
        related_user: Option<&User>,
    ) -> Result<Notification, AppError> {
        let notification = self
            .repository
            .create_notification(&NewNotification {
                notification_type,
                message: message.into(),
                recipient_id: recipient.id,
                related_user_id: related_user.map(|user| user.id),
                created_at: self.clock.now(),
            })
            .await?;

        match serde_json::to_value(&notification) {
            Ok(payload) => {
                if let Err(err) = self
                    .dispatcher
                    .send(recipient.id, RealtimeTopic::NotificationUpdate, payload)
                    .await
                {
                    warn!(
                        recipient_id = %recipient.id,
                        error = %err,
                        "Failed to dispatch notification update"
                    );
                }
            }
            Err(err) => warn!(error = %err, "Failed to serialize notification"),
        }

        self.push_to_device(&notification, recipient);
        Ok(notification)
    }

    /// デバイス送信は別タスクで行い、呼び出し元は完了を待たない。
    fn push_to_device(&self, notification: &Notification, recipient: &User) {
        let Some(token) = recipient.device_token() else {
            debug!(recipient_id = %recipient.id, "No device token; skipping push");
            return;
        };

        let title = notification
            .notification_type
            .push_title()
            .unwrap_or(self.app_name.as_str())
            .to_string();
        let mut data = HashMap::new();
        data.insert(
            "type".to_string(),
            notification.notification_type.as_str().to_string(),
        );
        if let Some(related) = notification.related_user_id {
            data.insert("relatedUserId".to_string(), related.to_string());
        }

        let push = Arc::clone(&self.push);
        let token = token.to_string();
        let body = notification.message.clone();
        let recipient_id = recipient.id;
        let notification_type = notification.notification_type.as_str();
        tokio::spawn(async move {
            if let Err(err) = push.send(&token, &title, &body, &data).await {
                warn!(
                    recipient_id = %recipient_id,
                    notification_type,
                    error = %err,
                    "Failed to send device push"
                );
            }
        });
    }

    pub async fn notifications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, AppError> {
        self.require_user(user_id).await?;
        self.repository.list_for_recipient(user_id, false).await
    }

    pub async fn unread_notifications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, AppError> {
        self.require_user(user_id).await?;
        self.repository.list_for_recipient(user_id, true).await
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, AppError> {
        self.require_user(user_id).await?;
        self.repository.count_unread(user_id).await
    }

    /// 受信者本人の通知でなければ何も変更しない。
    pub async fn mark_as_read(
        &self,
        notification_id: NotificationId,
        recipient_id: UserId,
    ) -> Result<bool, AppError> {
        self.repository.mark_read(notification_id, recipient_id).await
    }

    pub async fn mark_all_as_read(&self, recipient_id: UserId) -> Result<u64, AppError> {
        self.repository.mark_all_read(recipient_id).await
    }

    pub async fn delete_notification(
        &self,
        notification_id: NotificationId,
    ) -> Result<(), AppError> {
        if !self.repository.delete_notification(notification_id).await? {
            return Err(AppError::not_found(format!(
                "Notification {notification_id} not found"
            )));
        }
        Ok(())
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}
