use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;

/// 端末へのプッシュ送信。`NotificationService` は送信を別タスクに切り出すため、
/// 実装が遅くても通知の保存やリクエスト処理は待たされない。
#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), AppError>;
}
