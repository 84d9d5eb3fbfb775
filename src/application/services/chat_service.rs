use crate::application::ports::repositories::{
    MessageRepository, QuotaInsertOutcome, UserRepository,
};
use crate::application::ports::{Clock, RealtimeDispatcher, RealtimeTopic};
use crate::application::services::block_filter::BlockFilter;
use crate::application::services::chat_request_service::ChatRequestService;
use crate::application::services::subscription_ledger::SubscriptionLedger;
use crate::domain::entities::{Message, NewMessage, SendMessageCommand, User};
use crate::domain::value_objects::{MessageId, UserId};
use crate::shared::config::ChatConfig;
use crate::shared::error::AppError;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// メッセージ送信の認可ゲート。
///
/// 検査は次の順で行い、最初の失敗で何も書き込まずに返す。
/// 1. 送信者・受信者が存在する
/// 2. 2 人の間のチャットリクエストが ACCEPTED
/// 3. 送信者に有効な加入がある
/// 4. 新しい相手であればチャット枠が残っている
///
/// 受信者が未加入の場合、本文は送信者名入りの案内文に差し替える。
pub struct ChatService {
    users: Arc<dyn UserRepository>,
    messages: Arc<dyn MessageRepository>,
    chat_requests: Arc<ChatRequestService>,
    ledger: Arc<SubscriptionLedger>,
    block_filter: Arc<BlockFilter>,
    dispatcher: Arc<dyn RealtimeDispatcher>,
    clock: Arc<dyn Clock>,
    config: ChatConfig,
}

impl ChatService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        messages: Arc<dyn MessageRepository>,
        chat_requests: Arc<ChatRequestService>,
        ledger: Arc<SubscriptionLedger>,
        block_filter: Arc<BlockFilter>,
        dispatcher: Arc<dyn RealtimeDispatcher>,
        clock: Arc<dyn Clock>,
        config: ChatConfig,
    ) -> Self {
        Self {
            users,
            messages,
            chat_requests,
            ledger,
            block_filter,
            dispatcher,
            clock,
            config,
        }
    }

    pub async fn send_message(&self, command: SendMessageCommand) -> Result<Message, AppError> {
        let (sender_id, receiver_id) = command.participants()?;
        let sender = self.require_user(sender_id).await?;
        let receiver = self.require_user(receiver_id).await?;

        if !self.chat_requests.can_chat(sender_id, receiver_id).await? {
            return Err(AppError::forbidden("Chat request not accepted"));
        }

        let subscription = self
            .ledger
            .current_subscription(sender_id)
            .await?
            .ok_or_else(|| AppError::forbidden("Active subscription required"))?;

        let existing_partner = self.messages.is_partner(sender_id, receiver_id).await?;
        if !existing_partner && !subscription.has_free_slot() {
            return Err(chat_limit_reached());
        }

        let content = if self.ledger.has_active_subscription(receiver_id).await? {
            command.content
        } else {
            debug!(
                receiver_id = %receiver_id,
                "Receiver has no active subscription; sending upsell"
            );
            self.config.render_upsell(&sender.name)
        };

        let now = self.clock.now();
        let outcome = self
            .messages
            .insert_message_within_quota(
                &NewMessage {
                    sender_id,
                    receiver_id,
                    content,
                    created_at: now,
                },
                subscription.id,
                now,
            )
            .await?;

        let message = match outcome {
            QuotaInsertOutcome::Inserted {
                message,
                consumed_slot,
            } => {
                info!(
                    message_id = %message.id,
                    sender_id = %sender_id,
                    receiver_id = %receiver.id,
                    subscription_id = %subscription.id,
                    consumed_slot,
                    "Message sent"
                );
                message
            }
            QuotaInsertOutcome::LimitReached => return Err(chat_limit_reached()),
            QuotaInsertOutcome::SubscriptionInactive => {
                return Err(AppError::forbidden("Active subscription required"));
            }
        };

        self.deliver(&message).await;
        Ok(message)
    }

    /// 管理者送信。ハンドシェイク・加入・枠・案内文の検査をすべて省く。
    pub async fn send_message_as_admin(
        &self,
        command: SendMessageCommand,
    ) -> Result<Message, AppError> {
        let (sender_id, receiver_id) = command.participants()?;
        self.require_user(sender_id).await?;
        self.require_user(receiver_id).await?;

        let message = self
            .messages
            .insert_message(&NewMessage {
                sender_id,
                receiver_id,
                content: command.content,
                created_at: self.clock.now(),
            })
            .await?;
        info!(
            message_id = %message.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Admin message sent"
        );

        self.deliver(&message).await;
        Ok(message)
    }

    /// 設定された管理者アカウントを送信者として管理者送信を行う。
    pub async fn send_admin_message(
        &self,
        receiver_id: UserId,
        content: impl Into<String>,
    ) -> Result<Message, AppError> {
        let admin_id = self
            .config
            .admin_user_id
            .map(UserId::new)
            .ok_or_else(|| AppError::validation("Admin sender is not configured"))?;
        let admin = self.require_user(admin_id).await?;
        if !admin.is_admin() {
            return Err(AppError::forbidden(format!(
                "Configured admin sender {admin_id} does not have the ADMIN role"
            )));
        }

        self.send_message_as_admin(SendMessageCommand::new(admin.id, receiver_id, content))
            .await
    }

    /// sender から receiver への未読メッセージを既読にし、件数を返す。
    pub async fn mark_messages_as_read(
        &self,
        receiver_id: UserId,
        sender_id: UserId,
    ) -> Result<u64, AppError> {
        self.require_user(receiver_id).await?;
        self.require_user(sender_id).await?;

        let updated = self.messages.mark_read(receiver_id, sender_id).await?;
        if updated == 0 {
            return Ok(0);
        }

        let payload = json!({
            "readerId": receiver_id,
            "senderId": sender_id,
            "count": updated,
            "readAt": self.clock.now(),
        });
        for target in [sender_id, receiver_id] {
            self.dispatch(target, RealtimeTopic::ReadReceiptUpdate, payload.clone())
                .await;
        }
        Ok(updated)
    }

    pub async fn get_messages_for_user(&self, user_id: UserId) -> Result<Vec<Message>, AppError> {
        self.require_user(user_id).await?;
        let messages = self.messages.list_for_user(user_id).await?;
        self.block_filter.retain_visible(user_id, messages).await
    }

    pub async fn find_message(&self, id: MessageId) -> Result<Option<Message>, AppError> {
        self.messages.get_message(id).await
    }

    pub async fn delete_message(&self, id: MessageId) -> Result<(), AppError> {
        if !self.messages.delete_message(id).await? {
            return Err(AppError::not_found(format!("Message {id} not found")));
        }
        Ok(())
    }

    async fn deliver(&self, message: &Message) {
        let payload = match serde_json::to_value(message) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(message_id = %message.id, error = %err, "Failed to serialize message");
                return;
            }
        };
        for target in [message.receiver_id, message.sender_id] {
            self.dispatch(target, RealtimeTopic::MessageDelivery, payload.clone())
                .await;
        }
    }

    async fn dispatch(&self, target: UserId, topic: RealtimeTopic, payload: serde_json::Value) {
        if let Err(err) = self.dispatcher.send(target, topic, payload).await {
            warn!(
                target_user_id = %target,
                topic = topic.as_str(),
                error = %err,
                "Realtime dispatch failed"
            );
        }
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}

fn chat_limit_reached() -> AppError {
    AppError::forbidden("Chat limit reached")
}
