pub mod block;
pub mod chat_request;
pub mod favourite;
pub mod message;
pub mod notification;
pub mod photo;
pub mod plan;
pub mod subscription;
pub mod user;

pub use block::Block;
pub use chat_request::{ChatRequest, ChatRequestStatus, NewChatRequest};
pub use favourite::Favourite;
pub use message::{Message, NewMessage, SendMessageCommand};
pub use notification::{NewNotification, Notification, NotificationCleanup, NotificationType};
pub use photo::Photo;
pub use plan::{Plan, PlanDraft};
pub use subscription::{
    NewSubscription, Subscription, SubscriptionStatus, SubscriptionSummary, SubscriptionUpdate,
    add_months,
};
pub use user::{NewUser, Role, User, UserSearchCriteria};
