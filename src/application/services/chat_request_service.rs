use crate::application::ports::repositories::{ChatRequestRepository, UserRepository};
use crate::application::ports::{Clock, RealtimeDispatcher, RealtimeTopic};
use crate::application::services::block_filter::BlockFilter;
use crate::application::services::notification_service::NotificationService;
use crate::domain::entities::{
    ChatRequest, NewChatRequest, NotificationCleanup, NotificationType, User,
};
use crate::domain::value_objects::{ChatRequestId, UserId};
use crate::shared::error::AppError;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 拒否・取り消しで行が消えたときにクライアントへ伝える状態名。
const STATUS_REJECTED: &str = "REJECTED";
const STATUS_CANCELED: &str = "CANCELED";

/// チャット開始のハンドシェイク（PENDING → ACCEPTED、または削除）。
pub struct ChatRequestService {
    requests: Arc<dyn ChatRequestRepository>,
    users: Arc<dyn UserRepository>,
    notifications: Arc<NotificationService>,
    block_filter: Arc<BlockFilter>,
    dispatcher: Arc<dyn RealtimeDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ChatRequestService {
    pub fn new(
        requests: Arc<dyn ChatRequestRepository>,
        users: Arc<dyn UserRepository>,
        notifications: Arc<NotificationService>,
        block_filter: Arc<BlockFilter>,
        dispatcher: Arc<dyn RealtimeDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            requests,
            users,
            notifications,
            block_filter,
            dispatcher,
            clock,
        }
    }

    pub async fn send_request(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<ChatRequest, AppError> {
        if sender_id == receiver_id {
            return Err(AppError::validation("Cannot send a chat request to yourself"));
        }
        let sender = self.require_user(sender_id).await?;
        let receiver = self.require_user(receiver_id).await?;

        if self
            .requests
            .find_between(sender_id, receiver_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "A chat request already exists between these users",
            ));
        }

        let request = self
            .requests
            .create_request(&NewChatRequest {
                sender_id,
                receiver_id,
                created_at: self.clock.now(),
            })
            .await?;
        info!(
            request_id = %request.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Chat request created"
        );

        self.broadcast(&request, None).await;
        self.notify_logged(
            NotificationType::RequestReceived,
            format!("{} sends a request", sender.name),
            &receiver,
            &sender,
        )
        .await;
        self.notify_logged(
            NotificationType::RequestSent,
            format!("You sent a request to {}", receiver.name),
            &sender,
            &receiver,
        )
        .await;

        Ok(request)
    }

    pub async fn accept_request(
        &self,
        request_id: ChatRequestId,
        acting_user_id: UserId,
    ) -> Result<ChatRequest, AppError> {
        let request = self.require_request(request_id).await?;
        if request.receiver_id != acting_user_id {
            return Err(AppError::forbidden(
                "You can only accept requests sent to you",
            ));
        }
        ensure_pending(&request)?;

        let accepted = self
            .requests
            .accept_pending(request_id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::invalid_state("Request is not pending"))?;
        info!(request_id = %request_id, "Chat request accepted");

        self.broadcast(&accepted, None).await;
        let sender = self.require_user(accepted.sender_id).await?;
        let receiver = self.require_user(accepted.receiver_id).await?;
        self.notify_logged(
            NotificationType::RequestAccepted,
            format!("{} accepted your request", receiver.name),
            &sender,
            &receiver,
        )
        .await;

        Ok(accepted)
    }

    pub async fn reject_request(
        &self,
        request_id: ChatRequestId,
        acting_user_id: UserId,
    ) -> Result<(), AppError> {
        let request = self.require_request(request_id).await?;
        if request.receiver_id != acting_user_id {
            return Err(AppError::forbidden(
                "You can only reject requests sent to you",
            ));
        }
        ensure_pending(&request)?;

        let cleanups = [NotificationCleanup::request_received(
            request.receiver_id,
            request.sender_id,
        )];
        if !self.requests.delete_pending(request_id, &cleanups).await? {
            return Err(AppError::invalid_state("Request is not pending"));
        }
        info!(request_id = %request_id, "Chat request rejected");

        self.broadcast(&request, Some(STATUS_REJECTED)).await;
        let sender = self.require_user(request.sender_id).await?;
        let receiver = self.require_user(request.receiver_id).await?;
        self.notify_logged(
            NotificationType::RequestRejected,
            format!("{} rejected your chat request", receiver.name),
            &sender,
            &receiver,
        )
        .await;

        Ok(())
    }

    pub async fn cancel_request(
        &self,
        request_id: ChatRequestId,
        acting_user_id: UserId,
    ) -> Result<(), AppError> {
        let request = self.require_request(request_id).await?;
        if request.sender_id != acting_user_id {
            return Err(AppError::forbidden("You can only cancel your own requests"));
        }
        ensure_pending(&request)?;

        let cleanups = [
            NotificationCleanup::request_received(request.receiver_id, request.sender_id),
            NotificationCleanup::request_sent(request.sender_id, request.receiver_id),
        ];
        if !self.requests.delete_pending(request_id, &cleanups).await? {
            return Err(AppError::invalid_state("Request is not pending"));
        }
        info!(request_id = %request_id, "Chat request canceled");

        self.broadcast(&request, Some(STATUS_CANCELED)).await;
        Ok(())
    }

    /// 向きを問わず ACCEPTED のリクエストがあれば true。
    pub async fn can_chat(&self, a: UserId, b: UserId) -> Result<bool, AppError> {
        self.requests.exists_accepted_between(a, b).await
    }

    pub async fn get_pending_requests_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ChatRequest>, AppError> {
        self.require_user(user_id).await?;
        let requests = self.requests.list_pending_for_receiver(user_id).await?;
        self.block_filter.retain_visible(user_id, requests).await
    }

    pub async fn get_all_requests_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ChatRequest>, AppError> {
        self.require_user(user_id).await?;
        let requests = self.requests.list_for_user(user_id).await?;
        self.block_filter.retain_visible(user_id, requests).await
    }

    async fn broadcast(&self, request: &ChatRequest, removed_as: Option<&str>) {
        let payload = match removed_as {
            Some(status) => json!({
                "id": request.id,
                "senderId": request.sender_id,
                "receiverId": request.receiver_id,
                "status": status,
            }),
            None => match serde_json::to_value(request) {
                Ok(value) => value,
                Err(err) => {
                    error!(
                        request_id = %request.id,
                        error = %err,
                        "Failed to serialize chat request"
                    );
                    return;
                }
            },
        };

        for target in [request.receiver_id, request.sender_id] {
            if let Err(err) = self
                .dispatcher
                .send(target, RealtimeTopic::HandshakeUpdate, payload.clone())
                .await
            {
                warn!(
                    request_id = %request.id,
                    target_user_id = %target,
                    error = %err,
                    "Failed to dispatch handshake update"
                );
            }
        }
    }

    async fn notify_logged(
        &self,
        notification_type: NotificationType,
        message: String,
        recipient: &User,
        related: &User,
    ) {
        if let Err(err) = self
            .notifications
            .notify(notification_type, message, recipient, Some(related))
            .await
        {
            warn!(
                recipient_id = %recipient.id,
                notification_type = notification_type.as_str(),
                error = %err,
                "Failed to create notification"
            );
        }
    }

    async fn require_request(&self, id: ChatRequestId) -> Result<ChatRequest, AppError> {
        self.requests
            .get_request(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Chat request {id} not found")))
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}

fn ensure_pending(request: &ChatRequest) -> Result<(), AppError> {
    if request.is_pending() {
        Ok(())
    } else {
        Err(AppError::invalid_state("Request is not pending"))
    }
}

#[cfg(test)]
mod tests;
