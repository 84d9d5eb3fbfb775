pub mod log_push_notifier;

pub use log_push_notifier::LogPushNotifier;
