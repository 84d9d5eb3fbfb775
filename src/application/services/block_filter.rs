use crate::application::ports::Clock;
use crate::application::ports::repositories::{BlockRepository, UserRepository};
use crate::domain::entities::{Block, ChatRequest, Favourite, Message, User};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// 一覧の各要素について、閲覧者から見た「相手」のユーザーを返す。
pub trait Counterparty {
    fn counterparty(&self, viewer: UserId) -> UserId;
}

impl Counterparty for Message {
    fn counterparty(&self, viewer: UserId) -> UserId {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

impl Counterparty for ChatRequest {
    fn counterparty(&self, viewer: UserId) -> UserId {
        if self.sender_id == viewer {
            self.receiver_id
        } else {
            self.sender_id
        }
    }
}

impl Counterparty for Favourite {
    fn counterparty(&self, _viewer: UserId) -> UserId {
        self.favourited_user_id
    }
}

impl Counterparty for User {
    fn counterparty(&self, _viewer: UserId) -> UserId {
        self.id
    }
}

/// ブロック関係の管理と、全ての一覧取得に共通の可視性フィルタ。
pub struct BlockFilter {
    blocks: Arc<dyn BlockRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl BlockFilter {
    pub fn new(
        blocks: Arc<dyn BlockRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            blocks,
            users,
            clock,
        }
    }

    pub async fn block_user(
        &self,
        blocker_id: UserId,
        blocked_id: UserId,
    ) -> Result<Block, AppError> {
        if blocker_id == blocked_id {
            return Err(AppError::validation("Cannot block yourself"));
        }
        self.require_user(blocker_id).await?;
        self.require_user(blocked_id).await?;

        if self.blocks.is_blocked(blocker_id, blocked_id).await? {
            return Err(AppError::conflict(format!(
                "User {blocked_id} is already blocked"
            )));
        }

        let block = self
            .blocks
            .create_block(blocker_id, blocked_id, self.clock.now())
            .await?;
        info!(blocker_id = %blocker_id, blocked_id = %blocked_id, "User blocked");
        Ok(block)
    }

    pub async fn unblock_user(
        &self,
        blocker_id: UserId,
        blocked_id: UserId,
    ) -> Result<(), AppError> {
        if !self.blocks.delete_block(blocker_id, blocked_id).await? {
            return Err(AppError::not_found(format!(
                "User {blocker_id} has not blocked user {blocked_id}"
            )));
        }
        info!(blocker_id = %blocker_id, blocked_id = %blocked_id, "User unblocked");
        Ok(())
    }

    /// 有向の判定（blocker が blocked をブロックしているか）。
    pub async fn is_blocked(
        &self,
        blocker_id: UserId,
        blocked_id: UserId,
    ) -> Result<bool, AppError> {
        self.blocks.is_blocked(blocker_id, blocked_id).await
    }

    /// どちらかの向きにブロックがあれば true。
    pub async fn is_blocked_either_way(&self, a: UserId, b: UserId) -> Result<bool, AppError> {
        Ok(self.blocks.is_blocked(a, b).await? || self.blocks.is_blocked(b, a).await?)
    }

    pub async fn list_blocked_users(&self, blocker_id: UserId) -> Result<Vec<User>, AppError> {
        let blocks = self.blocks.list_blocked(blocker_id).await?;
        let mut users = Vec::with_capacity(blocks.len());
        for block in blocks {
            if let Some(user) = self.users.get_user(block.blocked_id).await? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn hidden_user_ids(&self, viewer: UserId) -> Result<HashSet<UserId>, AppError> {
        self.blocks.hidden_user_ids(viewer).await
    }

    /// 閲覧者とブロック関係（双方向）にある相手を含む要素を取り除く。
    pub async fn retain_visible<T: Counterparty>(
        &self,
        viewer: UserId,
        items: Vec<T>,
    ) -> Result<Vec<T>, AppError> {
        let hidden = self.hidden_user_ids(viewer).await?;
        if hidden.is_empty() {
            return Ok(items);
        }

        let before = items.len();
        let visible: Vec<T> = items
            .into_iter()
            .filter(|item| !hidden.contains(&item.counterparty(viewer)))
            .collect();
        debug!(
            viewer = %viewer,
            removed = before - visible.len(),
            "Filtered blocked counterparties"
        );
        Ok(visible)
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}
