pub mod database;
pub mod jobs;
pub mod push;
pub mod realtime;

pub use database::{ConnectionPool, Repository, SqliteRepository};
pub use jobs::ExpirySweepJob;
pub use push::LogPushNotifier;
pub use realtime::{RealtimeEnvelope, SessionHub};
