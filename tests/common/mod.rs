#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use matchmaking_core::application::ports::Clock;
use matchmaking_core::domain::entities::{NewUser, Plan, PlanDraft, User};
use matchmaking_core::infrastructure::{
    ConnectionPool, LogPushNotifier, RealtimeEnvelope, SessionHub, SqliteRepository,
};
use matchmaking_core::shared::config::{AppConfig, DatabaseConfig};
use matchmaking_core::state::AppState;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::broadcast;

/// テスト用の手動で進める時計。
pub struct TestClock {
    now: Mutex<DateTime<Utc>>,
}

impl TestClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub state: AppState,
    pub clock: Arc<TestClock>,
    pub hub: Arc<SessionHub>,
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 12, 0, 0).unwrap()
}

pub async fn harness() -> Harness {
    harness_with(AppConfig::default()).await
}

pub async fn harness_with(config: AppConfig) -> Harness {
    let pool = ConnectionPool::from_memory().await.unwrap();
    assemble(pool, config).await
}

/// 複数接続のファイル DB。同時実行のテストに使う。`TempDir` はテスト終了まで保持すること。
pub async fn file_harness(max_connections: u32) -> (Harness, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("matchmaking.db");
    let pool = ConnectionPool::from_config(&DatabaseConfig {
        url: format!("sqlite://{}", db_path.display()),
        max_connections,
        connection_timeout: 30,
    })
    .await
    .unwrap();
    (assemble(pool, AppConfig::default()).await, temp_dir)
}

async fn assemble(pool: ConnectionPool, config: AppConfig) -> Harness {
    pool.migrate().await.unwrap();
    let repository = Arc::new(SqliteRepository::new(pool));
    let clock = Arc::new(TestClock::starting_at(start()));
    let hub = Arc::new(SessionHub::new());

    let state = AppState::with_components(
        repository,
        config,
        clock.clone(),
        hub.clone(),
        Arc::new(LogPushNotifier),
    );
    Harness { state, clock, hub }
}

impl Harness {
    pub async fn register(&self, name: &str) -> User {
        self.state
            .user_service
            .register(NewUser::new(
                name,
                format!("{}@example.com", name.to_lowercase()),
            ))
            .await
            .unwrap()
    }

    pub async fn plan(&self, name: &str, chat_limit: Option<u32>, is_addon: bool) -> Plan {
        self.state
            .plan_service
            .create_plan(PlanDraft {
                name: name.to_string(),
                duration_months: 1,
                price: 10.0,
                is_published: true,
                is_addon,
                chat_limit,
            })
            .await
            .unwrap()
    }

    pub async fn subscribe(&self, user: &User, plan: &Plan) {
        self.state
            .subscription_ledger
            .purchase_subscription(user.id, plan.id)
            .await
            .unwrap();
    }

    /// sender がリクエストを送り、receiver が承認する。
    pub async fn connect(&self, sender: &User, receiver: &User) {
        let request = self
            .state
            .chat_request_service
            .send_request(sender.id, receiver.id)
            .await
            .unwrap();
        self.state
            .chat_request_service
            .accept_request(request.id, receiver.id)
            .await
            .unwrap();
    }

    pub async fn session(&self, user: &User) -> broadcast::Receiver<RealtimeEnvelope> {
        self.hub.subscribe(user.id).await
    }
}

/// 受信済みのフレームをすべて取り出す。
pub fn drain(receiver: &mut broadcast::Receiver<RealtimeEnvelope>) -> Vec<RealtimeEnvelope> {
    let mut frames = Vec::new();
    while let Ok(frame) = receiver.try_recv() {
        frames.push(frame);
    }
    frames
}
