use crate::domain::value_objects::{MessageId, UserId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// 送信要求。識別子は呼び出し側の入力そのままで、欠落は検証エラーになる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageCommand {
    pub sender_id: Option<UserId>,
    pub receiver_id: Option<UserId>,
    pub content: String,
}

impl SendMessageCommand {
    pub fn new(sender_id: UserId, receiver_id: UserId, content: impl Into<String>) -> Self {
        Self {
            sender_id: Some(sender_id),
            receiver_id: Some(receiver_id),
            content: content.into(),
        }
    }

    pub fn participants(&self) -> Result<(UserId, UserId), AppError> {
        match (self.sender_id, self.receiver_id) {
            (Some(sender), Some(receiver)) => Ok((sender, receiver)),
            (None, _) => Err(AppError::validation("Sender id is required")),
            (_, None) => Err(AppError::validation("Receiver id is required")),
        }
    }
}
