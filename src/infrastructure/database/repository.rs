use crate::application::ports::repositories::{
    BlockRepository, ChatRequestRepository, FavouriteRepository, MessageRepository,
    NotificationRepository, PhotoRepository, PlanRepository, SubscriptionRepository,
    UserRepository,
};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// 全リポジトリを 1 つのストアで提供する実装の束。
#[async_trait]
pub trait Repository:
    UserRepository
    + PlanRepository
    + SubscriptionRepository
    + ChatRequestRepository
    + MessageRepository
    + BlockRepository
    + FavouriteRepository
    + NotificationRepository
    + PhotoRepository
{
    async fn initialize(&self) -> Result<(), AppError>;
    async fn health_check(&self) -> Result<bool, AppError>;
}
