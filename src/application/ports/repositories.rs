use crate::domain::entities::{
    Block, ChatRequest, Favourite, Message, NewChatRequest, NewMessage, NewNotification,
    NewSubscription, NewUser, Notification, NotificationCleanup, Photo, Plan, PlanDraft,
    Subscription, SubscriptionUpdate, User, UserSearchCriteria,
};
use crate::domain::value_objects::{
    ChatRequestId, MessageId, NotificationId, PlanId, SubscriptionId, UserId,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// メール重複は `AppError::Conflict`。
    async fn create_user(&self, user: &NewUser, created_at: DateTime<Utc>)
    -> Result<User, AppError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self, gender: Option<String>) -> Result<Vec<User>, AppError>;
    async fn search_users(&self, criteria: &UserSearchCriteria) -> Result<Vec<User>, AppError>;
    async fn update_fcm_token(&self, id: UserId, token: Option<String>) -> Result<bool, AppError>;
    /// 関連行を外部キー順に削除してからユーザーを削除する。存在しなければ `false`。
    async fn delete_user_cascade(&self, id: UserId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn create_plan(&self, draft: &PlanDraft) -> Result<Plan, AppError>;
    async fn get_plan(&self, id: PlanId) -> Result<Option<Plan>, AppError>;
    async fn list_plans(&self) -> Result<Vec<Plan>, AppError>;
    async fn list_published_plans(&self) -> Result<Vec<Plan>, AppError>;
    async fn update_plan(&self, id: PlanId, draft: &PlanDraft) -> Result<Option<Plan>, AppError>;
    /// 加入から参照されている場合は `AppError::Conflict`。
    async fn delete_plan(&self, id: PlanId) -> Result<bool, AppError>;
}

/// 加入の失効結果。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryOutcome {
    pub expired: u64,
    pub photos_removed: u64,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create_subscription(
        &self,
        subscription: &NewSubscription,
    ) -> Result<Subscription, AppError>;
    async fn get_subscription(&self, id: SubscriptionId)
    -> Result<Option<Subscription>, AppError>;
    /// 期限が `now` より後の ACTIVE 行のうち、期限が最も遅いもの。
    async fn find_current_active(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Subscription>, AppError>;
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Subscription>, AppError>;
    async fn list_all(&self) -> Result<Vec<Subscription>, AppError>;
    /// `expected_version` が一致した場合だけ適用し、更新後の行を返す。競合時は `None`。
    async fn apply_update(
        &self,
        update: &SubscriptionUpdate,
    ) -> Result<Option<Subscription>, AppError>;
    /// 期限が `now` より前の ACTIVE 行。
    async fn list_expired_active(&self, now: DateTime<Utc>)
    -> Result<Vec<Subscription>, AppError>;
    /// 1 行を EXPIRED にし、同じトランザクションで写真を `photo_limit` 枚まで削る。
    /// バージョンが変わっていた、または既に EXPIRED の場合は何もせず `expired == 0`。
    async fn expire_subscription(
        &self,
        id: SubscriptionId,
        expected_version: i64,
        now: DateTime<Utc>,
        photo_limit: u32,
    ) -> Result<ExpiryOutcome, AppError>;
    /// ユーザーの ACTIVE 行をすべて EXPIRED にし、写真を削る。
    async fn revoke_active_for_user(
        &self,
        user_id: UserId,
        photo_limit: u32,
    ) -> Result<ExpiryOutcome, AppError>;
}

#[async_trait]
pub trait ChatRequestRepository: Send + Sync {
    /// 同じ（順不同の）ペアの行が既にあれば `AppError::Conflict`。
    async fn create_request(&self, request: &NewChatRequest) -> Result<ChatRequest, AppError>;
    async fn get_request(&self, id: ChatRequestId) -> Result<Option<ChatRequest>, AppError>;
    /// 向きを問わず、状態を問わず。
    async fn find_between(&self, a: UserId, b: UserId) -> Result<Option<ChatRequest>, AppError>;
    async fn exists_accepted_between(&self, a: UserId, b: UserId) -> Result<bool, AppError>;
    /// PENDING の場合だけ ACCEPTED に遷移させる。
    async fn accept_pending(
        &self,
        id: ChatRequestId,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ChatRequest>, AppError>;
    /// PENDING の行を削除し、同じトランザクションで指定された通知を取り消す。
    async fn delete_pending(
        &self,
        id: ChatRequestId,
        cleanups: &[NotificationCleanup],
    ) -> Result<bool, AppError>;
    async fn list_pending_for_receiver(&self, user_id: UserId)
    -> Result<Vec<ChatRequest>, AppError>;
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ChatRequest>, AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuotaInsertOutcome {
    Inserted {
        message: Message,
        consumed_slot: bool,
    },
    LimitReached,
    SubscriptionInactive,
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert_message(&self, message: &NewMessage) -> Result<Message, AppError>;
    /// 既存の相手なら枠を消費せずに、新しい相手なら枠を 1 つ消費して挿入する。
    /// 枠の消費と挿入は 1 トランザクション。
    async fn insert_message_within_quota(
        &self,
        message: &NewMessage,
        subscription_id: SubscriptionId,
        now: DateTime<Utc>,
    ) -> Result<QuotaInsertOutcome, AppError>;
    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, AppError>;
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Message>, AppError>;
    async fn distinct_partner_ids(&self, user_id: UserId) -> Result<Vec<UserId>, AppError>;
    async fn is_partner(&self, user_id: UserId, other: UserId) -> Result<bool, AppError>;
    async fn mark_read(&self, receiver_id: UserId, sender_id: UserId) -> Result<u64, AppError>;
    async fn delete_message(&self, id: MessageId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// blocker から blocked へのお気に入りを削除してからブロックを作る（1 トランザクション）。
    async fn create_block(
        &self,
        blocker_id: UserId,
        blocked_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Block, AppError>;
    async fn delete_block(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError>;
    async fn is_blocked(&self, blocker_id: UserId, blocked_id: UserId) -> Result<bool, AppError>;
    async fn list_blocked(&self, blocker_id: UserId) -> Result<Vec<Block>, AppError>;
    /// viewer がブロックした、または viewer をブロックしたユーザー。
    async fn hidden_user_ids(&self, viewer: UserId) -> Result<HashSet<UserId>, AppError>;
}

#[async_trait]
pub trait FavouriteRepository: Send + Sync {
    async fn add_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Favourite, AppError>;
    async fn remove_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
    ) -> Result<bool, AppError>;
    async fn is_favourite(&self, user_id: UserId, favourited_user_id: UserId)
    -> Result<bool, AppError>;
    async fn list_favourites(&self, user_id: UserId) -> Result<Vec<Favourite>, AppError>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<Notification, AppError>;
    /// 新しい順。
    async fn list_for_recipient(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, AppError>;
    async fn count_unread(&self, recipient_id: UserId) -> Result<u64, AppError>;
    async fn mark_read(&self, id: NotificationId, recipient_id: UserId) -> Result<bool, AppError>;
    async fn mark_all_read(&self, recipient_id: UserId) -> Result<u64, AppError>;
    async fn delete_notification(&self, id: NotificationId) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn add_photo(
        &self,
        user_id: UserId,
        url: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Photo, AppError>;
    async fn list_photos(&self, user_id: UserId) -> Result<Vec<Photo>, AppError>;
    /// 古い順に `keep` 枚だけ残す。削除した枚数を返す。
    async fn trim_photos(&self, user_id: UserId, keep: u32) -> Result<u64, AppError>;
}
