pub mod clock;
pub mod push_notifier;
pub mod realtime_dispatcher;
pub mod repositories;

pub use clock::{Clock, SystemClock};
pub use push_notifier::PushNotifier;
pub use realtime_dispatcher::{RealtimeDispatcher, RealtimeTopic};
