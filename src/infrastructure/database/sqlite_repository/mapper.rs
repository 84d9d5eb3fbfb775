use crate::domain::entities::{
    Block, ChatRequest, ChatRequestStatus, Favourite, Message, Notification, NotificationType,
    Photo, Plan, Role, Subscription, SubscriptionStatus, User,
};
use crate::domain::value_objects::{
    ChatRequestId, MessageId, NotificationId, PhotoId, PlanId, SubscriptionId, UserId,
};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use sqlx::{Row, sqlite::SqliteRow};
use std::str::FromStr;

pub(super) fn map_user_row(row: &SqliteRow) -> Result<User, AppError> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: parse_enum::<Role>(row, "role")?,
        gender: row.try_get("gender")?,
        age: row.try_get("age")?,
        religion: row.try_get("religion")?,
        city_town: row.try_get("city_town")?,
        fcm_token: row.try_get("fcm_token")?,
        created_at: millis(row, "created_at")?,
    })
}

pub(super) fn map_plan_row(row: &SqliteRow) -> Result<Plan, AppError> {
    Ok(Plan {
        id: PlanId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        duration_months: to_u32(row.try_get("duration_months")?, "duration_months")?,
        price: row.try_get("price")?,
        is_published: row.try_get("is_published")?,
        is_addon: row.try_get("is_addon")?,
        chat_limit: optional_u32(row, "chat_limit")?,
    })
}

pub(super) fn map_subscription_row(row: &SqliteRow) -> Result<Subscription, AppError> {
    Ok(Subscription {
        id: SubscriptionId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        plan_id: PlanId::new(row.try_get("plan_id")?),
        start_date: millis(row, "start_date")?,
        expiry_date: millis(row, "expiry_date")?,
        status: parse_enum::<SubscriptionStatus>(row, "status")?,
        chat_limit: optional_u32(row, "chat_limit")?,
        used_chat_slots: to_u32(row.try_get("used_chat_slots")?, "used_chat_slots")?,
        version: row.try_get("version")?,
    })
}

pub(super) fn map_chat_request_row(row: &SqliteRow) -> Result<ChatRequest, AppError> {
    Ok(ChatRequest {
        id: ChatRequestId::new(row.try_get("id")?),
        sender_id: UserId::new(row.try_get("sender_id")?),
        receiver_id: UserId::new(row.try_get("receiver_id")?),
        status: parse_enum::<ChatRequestStatus>(row, "status")?,
        created_at: millis(row, "created_at")?,
        updated_at: millis(row, "updated_at")?,
    })
}

pub(super) fn map_message_row(row: &SqliteRow) -> Result<Message, AppError> {
    Ok(Message {
        id: MessageId::new(row.try_get("id")?),
        sender_id: UserId::new(row.try_get("sender_id")?),
        receiver_id: UserId::new(row.try_get("receiver_id")?),
        content: row.try_get("content")?,
        is_read: row.try_get("is_read")?,
        created_at: millis(row, "created_at")?,
    })
}

pub(super) fn map_block_row(row: &SqliteRow) -> Result<Block, AppError> {
    Ok(Block {
        blocker_id: UserId::new(row.try_get("blocker_id")?),
        blocked_id: UserId::new(row.try_get("blocked_id")?),
        created_at: millis(row, "created_at")?,
    })
}

pub(super) fn map_favourite_row(row: &SqliteRow) -> Result<Favourite, AppError> {
    Ok(Favourite {
        user_id: UserId::new(row.try_get("user_id")?),
        favourited_user_id: UserId::new(row.try_get("favourited_user_id")?),
        created_at: millis(row, "created_at")?,
    })
}

pub(super) fn map_notification_row(row: &SqliteRow) -> Result<Notification, AppError> {
    let related_user_id: Option<i64> = row.try_get("related_user_id")?;
    Ok(Notification {
        id: NotificationId::new(row.try_get("id")?),
        notification_type: parse_enum::<NotificationType>(row, "notification_type")?,
        message: row.try_get("message")?,
        recipient_id: UserId::new(row.try_get("recipient_id")?),
        related_user_id: related_user_id.map(UserId::new),
        is_read: row.try_get("is_read")?,
        created_at: millis(row, "created_at")?,
    })
}

pub(super) fn map_photo_row(row: &SqliteRow) -> Result<Photo, AppError> {
    Ok(Photo {
        id: PhotoId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        url: row.try_get("url")?,
        created_at: millis(row, "created_at")?,
    })
}

fn millis(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, AppError> {
    let value: i64 = row.try_get(column)?;
    DateTime::from_timestamp_millis(value)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp in {column}: {value}")))
}

fn parse_enum<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, AppError> {
    let value: String = row.try_get(column)?;
    value
        .parse::<T>()
        .map_err(|_| AppError::Database(format!("Unknown value in {column}: {value}")))
}

fn to_u32(value: i64, column: &str) -> Result<u32, AppError> {
    u32::try_from(value)
        .map_err(|_| AppError::Database(format!("Out of range value in {column}: {value}")))
}

fn optional_u32(row: &SqliteRow, column: &str) -> Result<Option<u32>, AppError> {
    let value: Option<i64> = row.try_get(column)?;
    value.map(|value| to_u32(value, column)).transpose()
}
