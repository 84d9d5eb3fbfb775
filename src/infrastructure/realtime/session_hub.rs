use crate::application::ports::{RealtimeDispatcher, RealtimeTopic};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

const DEFAULT_SESSION_CAPACITY: usize = 64;

/// ライブセッションに流す 1 件分のフレーム。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEnvelope {
    pub topic: RealtimeTopic,
    pub destination: &'static str,
    pub payload: serde_json::Value,
    pub sent_at: DateTime<Utc>,
}

/// ユーザーごとの broadcast チャネルで構成したインプロセスのセッション集約。
/// 同じユーザーが複数の端末で接続していれば、全受信者に同じフレームが届く。
pub struct SessionHub {
    sessions: RwLock<HashMap<UserId, broadcast::Sender<RealtimeEnvelope>>>,
    capacity: usize,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, user_id: UserId) -> broadcast::Receiver<RealtimeEnvelope> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub async fn is_connected(&self, user_id: UserId) -> bool {
        self.sessions
            .read()
            .await
            .get(&user_id)
            .is_some_and(|sender| sender.receiver_count() > 0)
    }

    /// 受信者がいなくなったチャネルを破棄する。
    pub async fn prune(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, sender| sender.receiver_count() > 0);
        before - sessions.len()
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeDispatcher for SessionHub {
    async fn send(
        &self,
        target: UserId,
        topic: RealtimeTopic,
        payload: serde_json::Value,
    ) -> Result<(), AppError> {
        let closed = {
            let sessions = self.sessions.read().await;
            let Some(sender) = sessions.get(&target) else {
                debug!(target_user_id = %target, topic = topic.as_str(), "No live session");
                return Ok(());
            };

            let envelope = RealtimeEnvelope {
                topic,
                destination: topic.destination(),
                payload,
                sent_at: Utc::now(),
            };
            // 受信者 0 はオフライン扱い
            sender.send(envelope).is_err()
        };

        if closed {
            let mut sessions = self.sessions.write().await;
            // 読み取りロックを離した間に再接続されていれば残す
            if sessions
                .get(&target)
                .is_some_and(|sender| sender.receiver_count() == 0)
            {
                sessions.remove(&target);
            }
            debug!(target_user_id = %target, topic = topic.as_str(), "Session closed");
        }
        Ok(())
    }
}
