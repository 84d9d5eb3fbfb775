use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_APP_NAME: &str = "Matchmaking";

pub const DEFAULT_UPSELL_TEMPLATE: &str =
    "{sender} wants to send you a message. Purchase a plan to start the conversation.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub subscription: SubscriptionConfig,
    pub chat: ChatConfig,
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub sweep_interval_secs: u64,
    /// 非加入者に許可されるギャラリー写真の上限。
    pub non_subscriber_photo_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// 管理者メッセージの送信者として使うユーザー ID。
    #[serde(default)]
    pub admin_user_id: Option<i64>,
    pub upsell_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// 種別固有のタイトルがないプッシュ通知に使うタイトル。
    pub app_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            subscription: SubscriptionConfig::default(),
            chat: ChatConfig::default(),
            notification: NotificationConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/matchmaking.db".to_string(),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 24 * 60 * 60, // daily
            non_subscriber_photo_limit: 1,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            admin_user_id: None,
            upsell_template: DEFAULT_UPSELL_TEMPLATE.to_string(),
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn render_upsell(&self, sender_name: &str) -> String {
        self.upsell_template.replace("{sender}", sender_name)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 既定値
        let mut cfg = Self::default();

        if let Some(v) = lookup("MATCHMAKING_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Some(v) = lookup("MATCHMAKING_DB_MAX_CONNECTIONS") {
            match parse_u64(&v).and_then(|value| u32::try_from(value).ok()) {
                Some(value) => cfg.database.max_connections = value.max(1),
                None => warn_invalid("MATCHMAKING_DB_MAX_CONNECTIONS", &v),
            }
        }
        if let Some(v) = lookup("MATCHMAKING_DB_CONNECTION_TIMEOUT") {
            match parse_u64(&v) {
                Some(value) => cfg.database.connection_timeout = value.max(1),
                None => warn_invalid("MATCHMAKING_DB_CONNECTION_TIMEOUT", &v),
            }
        }

        if let Some(v) = lookup("MATCHMAKING_SWEEP_INTERVAL_SECS") {
            match parse_u64(&v) {
                Some(value) => cfg.subscription.sweep_interval_secs = value.max(1),
                None => warn_invalid("MATCHMAKING_SWEEP_INTERVAL_SECS", &v),
            }
        }
        if let Some(v) = lookup("MATCHMAKING_PHOTO_LIMIT") {
            match parse_u64(&v).and_then(|value| u32::try_from(value).ok()) {
                Some(value) => cfg.subscription.non_subscriber_photo_limit = value,
                None => warn_invalid("MATCHMAKING_PHOTO_LIMIT", &v),
            }
        }

        if let Some(v) = lookup("MATCHMAKING_ADMIN_USER_ID") {
            match v.trim().parse::<i64>() {
                Ok(value) if value > 0 => cfg.chat.admin_user_id = Some(value),
                _ => warn_invalid("MATCHMAKING_ADMIN_USER_ID", &v),
            }
        }
        if let Some(v) = lookup("MATCHMAKING_UPSELL_TEMPLATE") {
            if v.trim().is_empty() {
                warn_invalid("MATCHMAKING_UPSELL_TEMPLATE", &v);
            } else {
                cfg.chat.upsell_template = v;
            }
        }

        if let Some(v) = lookup("MATCHMAKING_APP_NAME") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.notification.app_name = trimmed.to_string();
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("Database url must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::configuration(
                "Database max_connections must be greater than 0",
            ));
        }
        if self.subscription.sweep_interval_secs == 0 {
            return Err(AppError::configuration(
                "Subscription sweep_interval_secs must be greater than 0",
            ));
        }
        if !self.chat.upsell_template.contains("{sender}") {
            return Err(AppError::configuration(
                "Chat upsell_template must contain a {sender} placeholder",
            ));
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn warn_invalid(key: &str, value: &str) {
    warn!(key, value, "Ignoring invalid configuration value; keeping default");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.subscription.non_subscriber_photo_limit, 1);
        assert_eq!(cfg.subscription.sweep_interval_secs, 86_400);
        assert!(cfg.chat.admin_user_id.is_none());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MATCHMAKING_DATABASE_URL", "sqlite::memory:"),
            ("MATCHMAKING_SWEEP_INTERVAL_SECS", "60"),
            ("MATCHMAKING_PHOTO_LIMIT", "3"),
            ("MATCHMAKING_ADMIN_USER_ID", "7"),
            ("MATCHMAKING_APP_NAME", "Shaadi"),
        ]));
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.subscription.sweep_interval_secs, 60);
        assert_eq!(cfg.subscription.non_subscriber_photo_limit, 3);
        assert_eq!(cfg.chat.admin_user_id, Some(7));
        assert_eq!(cfg.notification.app_name, "Shaadi");
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("MATCHMAKING_DB_MAX_CONNECTIONS", "many"),
            ("MATCHMAKING_ADMIN_USER_ID", "-1"),
            ("MATCHMAKING_UPSELL_TEMPLATE", "   "),
        ]));
        assert_eq!(cfg.database.max_connections, 5);
        assert!(cfg.chat.admin_user_id.is_none());
        assert_eq!(cfg.chat.upsell_template, DEFAULT_UPSELL_TEMPLATE);
    }

    #[test]
    fn template_without_placeholder_is_a_configuration_error() {
        let mut cfg = AppConfig::default();
        cfg.chat.upsell_template = "Buy a plan".to_string();
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), "CONFIGURATION");
        assert_eq!(
            err.to_string(),
            "Configuration error: Chat upsell_template must contain a {sender} placeholder"
        );
    }

    #[test]
    fn upsell_names_the_sender() {
        let chat = ChatConfig::default();
        assert_eq!(
            chat.render_upsell("Asha"),
            "Asha wants to send you a message. Purchase a plan to start the conversation."
        );
    }
}
