//! マッチングサービスのチャット許可・加入枠エンジン。

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use application::ports::{Clock, PushNotifier, RealtimeDispatcher, RealtimeTopic, SystemClock};
pub use infrastructure::{ConnectionPool, ExpirySweepJob, SessionHub, SqliteRepository};
pub use shared::{AppConfig, AppError};
pub use state::AppState;

/// `RUST_LOG` が未設定なら自クレートは debug、それ以外は info。
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchmaking_core=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
