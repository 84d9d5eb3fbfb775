pub mod block_filter;
pub mod chat_request_service;
pub mod chat_service;
pub mod favourite_service;
pub mod notification_service;
pub mod plan_service;
pub mod subscription_ledger;
pub mod user_service;

pub use block_filter::{BlockFilter, Counterparty};
pub use chat_request_service::ChatRequestService;
pub use chat_service::ChatService;
pub use favourite_service::FavouriteService;
pub use notification_service::NotificationService;
pub use plan_service::PlanService;
pub use subscription_ledger::{RevokeReport, SubscriptionLedger, SweepReport};
pub use user_service::UserService;
