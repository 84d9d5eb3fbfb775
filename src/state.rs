use crate::application::ports::{Clock, PushNotifier, SystemClock};
use crate::application::services::{
    BlockFilter, ChatRequestService, ChatService, FavouriteService, NotificationService,
    PlanService, SubscriptionLedger, UserService,
};
use crate::infrastructure::database::{ConnectionPool, Repository, SqliteRepository};
use crate::infrastructure::jobs::ExpirySweepJob;
use crate::infrastructure::push::LogPushNotifier;
use crate::infrastructure::realtime::SessionHub;
use crate::shared::config::AppConfig;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// アプリケーション全体の状態を管理する構造体
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub repository: Arc<SqliteRepository>,
    pub session_hub: Arc<SessionHub>,
    pub clock: Arc<dyn Clock>,
    pub user_service: Arc<UserService>,
    pub plan_service: Arc<PlanService>,
    pub subscription_ledger: Arc<SubscriptionLedger>,
    pub block_filter: Arc<BlockFilter>,
    pub favourite_service: Arc<FavouriteService>,
    pub notification_service: Arc<NotificationService>,
    pub chat_request_service: Arc<ChatRequestService>,
    pub chat_service: Arc<ChatService>,
    pub expiry_sweep_job: Arc<ExpirySweepJob>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        ensure_database_dir(&config.database.url)?;

        let pool = ConnectionPool::from_config(&config.database)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.url))?;
        let repository = Arc::new(SqliteRepository::new(pool));
        repository.initialize().await?;

        Ok(Self::with_components(
            repository,
            config,
            Arc::new(SystemClock),
            Arc::new(SessionHub::new()),
            Arc::new(LogPushNotifier),
        ))
    }

    /// 外部依存を差し替えて組み立てる。マイグレーション済みのリポジトリを渡すこと。
    pub fn with_components(
        repository: Arc<SqliteRepository>,
        config: AppConfig,
        clock: Arc<dyn Clock>,
        session_hub: Arc<SessionHub>,
        push: Arc<dyn PushNotifier>,
    ) -> Self {
        let block_filter = Arc::new(BlockFilter::new(
            repository.clone(),
            repository.clone(),
            clock.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            repository.clone(),
            repository.clone(),
            block_filter.clone(),
            clock.clone(),
        ));
        let plan_service = Arc::new(PlanService::new(repository.clone()));
        let subscription_ledger = Arc::new(SubscriptionLedger::new(
            repository.clone(),
            repository.clone(),
            repository.clone(),
            clock.clone(),
            config.subscription.non_subscriber_photo_limit,
        ));
        let favourite_service = Arc::new(FavouriteService::new(
            repository.clone(),
            repository.clone(),
            block_filter.clone(),
            clock.clone(),
        ));
        let notification_service = Arc::new(NotificationService::new(
            repository.clone(),
            repository.clone(),
            session_hub.clone(),
            push,
            clock.clone(),
            config.notification.app_name.clone(),
        ));
        let chat_request_service = Arc::new(ChatRequestService::new(
            repository.clone(),
            repository.clone(),
            notification_service.clone(),
            block_filter.clone(),
            session_hub.clone(),
            clock.clone(),
        ));
        let chat_service = Arc::new(ChatService::new(
            repository.clone(),
            repository.clone(),
            chat_request_service.clone(),
            subscription_ledger.clone(),
            block_filter.clone(),
            session_hub.clone(),
            clock.clone(),
            config.chat.clone(),
        ));
        let expiry_sweep_job = Arc::new(ExpirySweepJob::new(
            subscription_ledger.clone(),
            clock.clone(),
            Duration::from_secs(config.subscription.sweep_interval_secs),
        ));

        Self {
            config,
            repository,
            session_hub,
            clock,
            user_service,
            plan_service,
            subscription_ledger,
            block_filter,
            favourite_service,
            notification_service,
            chat_request_service,
            chat_service,
            expiry_sweep_job,
        }
    }
}

/// ファイルベースの SQLite URL なら親ディレクトリを作っておく。
fn ensure_database_dir(url: &str) -> anyhow::Result<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display())),
        _ => Ok(()),
    }
}
