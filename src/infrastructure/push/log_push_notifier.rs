use crate::application::ports::PushNotifier;
use crate::shared::error::AppError;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

/// 外部のプッシュ基盤を持たない環境向け。送信内容をログに残すだけ。
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushNotifier;

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn send(
        &self,
        device_token: &str,
        title: &str,
        body: &str,
        data: &HashMap<String, String>,
    ) -> Result<(), AppError> {
        if device_token.trim().is_empty() {
            return Err(AppError::Delivery("Device token is empty".to_string()));
        }
        info!(
            target: "push::log",
            token_suffix = %token_suffix(device_token),
            title,
            body,
            data = ?data,
            "push notification"
        );
        Ok(())
    }
}

fn token_suffix(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_token_is_a_delivery_error() {
        let notifier = LogPushNotifier;
        let err = notifier
            .send("  ", "title", "body", &HashMap::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DELIVERY");
    }

    #[test]
    fn token_suffix_keeps_last_six_chars() {
        assert_eq!(token_suffix("abcdefghij"), "efghij");
        assert_eq!(token_suffix("abc"), "abc");
    }
}
