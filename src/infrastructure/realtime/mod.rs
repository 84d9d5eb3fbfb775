pub mod session_hub;

pub use session_hub::{RealtimeEnvelope, SessionHub};
