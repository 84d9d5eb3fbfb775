pub mod ids;

pub use ids::{ChatRequestId, MessageId, NotificationId, PhotoId, PlanId, SubscriptionId, UserId};
