use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealtimeTopic {
    MessageDelivery,
    HandshakeUpdate,
    NotificationUpdate,
    ReadReceiptUpdate,
}

impl RealtimeTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealtimeTopic::MessageDelivery => "message-delivery",
            RealtimeTopic::HandshakeUpdate => "handshake-update",
            RealtimeTopic::NotificationUpdate => "notification-update",
            RealtimeTopic::ReadReceiptUpdate => "read-receipt-update",
        }
    }

    /// ユーザー単位キューの宛先。
    pub fn destination(&self) -> &'static str {
        match self {
            RealtimeTopic::MessageDelivery => "/queue/messages",
            RealtimeTopic::HandshakeUpdate => "/queue/chat-requests",
            RealtimeTopic::NotificationUpdate => "/queue/notifications",
            RealtimeTopic::ReadReceiptUpdate => "/queue/read",
        }
    }
}

/// ユーザーのライブセッションへの best-effort 配信。
#[async_trait]
pub trait RealtimeDispatcher: Send + Sync {
    async fn send(
        &self,
        target: UserId,
        topic: RealtimeTopic,
        payload: serde_json::Value,
    ) -> Result<(), AppError>;
}
