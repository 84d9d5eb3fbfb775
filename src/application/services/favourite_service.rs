use crate::application::ports::Clock;
use crate::application::ports::repositories::{FavouriteRepository, UserRepository};
use crate::application::services::block_filter::BlockFilter;
use crate::domain::entities::{Favourite, User};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

pub struct FavouriteService {
    favourites: Arc<dyn FavouriteRepository>,
    users: Arc<dyn UserRepository>,
    block_filter: Arc<BlockFilter>,
    clock: Arc<dyn Clock>,
}

impl FavouriteService {
    pub fn new(
        favourites: Arc<dyn FavouriteRepository>,
        users: Arc<dyn UserRepository>,
        block_filter: Arc<BlockFilter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            favourites,
            users,
            block_filter,
            clock,
        }
    }

    pub async fn add_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
    ) -> Result<Favourite, AppError> {
        if user_id == favourited_user_id {
            return Err(AppError::validation("Cannot favourite yourself"));
        }
        self.require_user(user_id).await?;
        self.require_user(favourited_user_id).await?;

        if self
            .favourites
            .is_favourite(user_id, favourited_user_id)
            .await?
        {
            return Err(AppError::conflict("User already favourited"));
        }

        let favourite = self
            .favourites
            .add_favourite(user_id, favourited_user_id, self.clock.now())
            .await?;
        info!(user_id = %user_id, favourited_user_id = %favourited_user_id, "Favourite added");
        Ok(favourite)
    }

    pub async fn remove_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
    ) -> Result<(), AppError> {
        if !self
            .favourites
            .remove_favourite(user_id, favourited_user_id)
            .await?
        {
            return Err(AppError::not_found("Favourite not found"));
        }
        Ok(())
    }

    /// ブロック関係（双方向）にある相手は除く。
    pub async fn get_favourites(&self, user_id: UserId) -> Result<Vec<Favourite>, AppError> {
        self.require_user(user_id).await?;
        let favourites = self.favourites.list_favourites(user_id).await?;
        self.block_filter.retain_visible(user_id, favourites).await
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }
}
