use crate::domain::value_objects::{NotificationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    RequestReceived,
    RequestSent,
    RequestAccepted,
    RequestRejected,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::RequestReceived => "REQUEST_RECEIVED",
            NotificationType::RequestSent => "REQUEST_SENT",
            NotificationType::RequestAccepted => "REQUEST_ACCEPTED",
            NotificationType::RequestRejected => "REQUEST_REJECTED",
        }
    }

    /// デバイスプッシュのタイトル。種別ごとの固定文言がなければ `None`。
    pub fn push_title(&self) -> Option<&'static str> {
        match self {
            NotificationType::RequestReceived => Some("New Interest Received"),
            NotificationType::RequestAccepted => Some("It's a Match!"),
            _ => None,
        }
    }
}

impl FromStr for NotificationType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "REQUEST_RECEIVED" => Ok(NotificationType::RequestReceived),
            "REQUEST_SENT" => Ok(NotificationType::RequestSent),
            "REQUEST_ACCEPTED" => Ok(NotificationType::RequestAccepted),
            "REQUEST_REJECTED" => Ok(NotificationType::RequestRejected),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub recipient_id: UserId,
    pub related_user_id: Option<UserId>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub message: String,
    pub recipient_id: UserId,
    pub related_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// ハンドシェイクが消えたときに取り消す通知の指定。
/// recipient 宛て・related_user 関連・指定種別のうち最新の 1 件だけが対象。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationCleanup {
    pub recipient_id: UserId,
    pub related_user_id: UserId,
    pub notification_type: NotificationType,
}

impl NotificationCleanup {
    pub fn request_received(recipient_id: UserId, related_user_id: UserId) -> Self {
        Self {
            recipient_id,
            related_user_id,
            notification_type: NotificationType::RequestReceived,
        }
    }

    pub fn request_sent(recipient_id: UserId, related_user_id: UserId) -> Self {
        Self {
            recipient_id,
            related_user_id,
            notification_type: NotificationType::RequestSent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_titles_by_type() {
        assert_eq!(
            NotificationType::RequestReceived.push_title(),
            Some("New Interest Received")
        );
        assert_eq!(
            NotificationType::RequestAccepted.push_title(),
            Some("It's a Match!")
        );
        assert_eq!(NotificationType::RequestRejected.push_title(), None);
    }

    #[test]
    fn type_round_trips_through_storage_string() {
        for ty in [
            NotificationType::RequestReceived,
            NotificationType::RequestSent,
            NotificationType::RequestAccepted,
            NotificationType::RequestRejected,
        ] {
            assert_eq!(ty.as_str().parse::<NotificationType>(), Ok(ty));
        }
    }
}
