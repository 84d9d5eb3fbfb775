use crate::domain::value_objects::{ChatRequestId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatRequestStatus {
    Pending,
    Accepted,
}

impl ChatRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRequestStatus::Pending => "PENDING",
            ChatRequestStatus::Accepted => "ACCEPTED",
        }
    }
}

impl FromStr for ChatRequestStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "PENDING" => Ok(ChatRequestStatus::Pending),
            "ACCEPTED" => Ok(ChatRequestStatus::Accepted),
            _ => Err(()),
        }
    }
}

/// 2 ユーザー間のチャット開始の合意（ハンドシェイク）。
/// 拒否・取り消しは行そのものを削除するため、永続化される状態は 2 つだけ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub id: ChatRequestId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: ChatRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatRequest {
    pub fn is_pending(&self) -> bool {
        self.status == ChatRequestStatus::Pending
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.sender_id == user_id || self.receiver_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewChatRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub created_at: DateTime<Utc>,
}
