use super::mapper::map_favourite_row;
use super::queries::{
    DELETE_FAVOURITE, EXISTS_FAVOURITE, INSERT_FAVOURITE, SELECT_FAVOURITES_BY_USER,
};
use super::{SqliteRepository, conflict_on_unique, to_millis};
use crate::application::ports::repositories::FavouriteRepository;
use crate::domain::entities::Favourite;
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl FavouriteRepository for SqliteRepository {
    async fn add_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Favourite, AppError> {
        sqlx::query(INSERT_FAVOURITE)
            .bind(user_id.as_i64())
            .bind(favourited_user_id.as_i64())
            .bind(to_millis(created_at))
            .execute(self.pool.get_pool())
            .await
            .map_err(|err| conflict_on_unique(err, "User is already in favourites"))?;

        Ok(Favourite {
            user_id,
            favourited_user_id,
            created_at,
        })
    }

    async fn remove_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(DELETE_FAVOURITE)
            .bind(user_id.as_i64())
            .bind(favourited_user_id.as_i64())
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_favourite(
        &self,
        user_id: UserId,
        favourited_user_id: UserId,
    ) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(EXISTS_FAVOURITE)
            .bind(user_id.as_i64())
            .bind(favourited_user_id.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        Ok(exists)
    }

    async fn list_favourites(&self, user_id: UserId) -> Result<Vec<Favourite>, AppError> {
        let rows = sqlx::query(SELECT_FAVOURITES_BY_USER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_favourite_row).collect()
    }
}
