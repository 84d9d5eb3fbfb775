use super::mapper::map_photo_row;
use super::queries::{INSERT_PHOTO, SELECT_PHOTOS_BY_USER, TRIM_PHOTOS};
use super::{SqliteRepository, to_millis};
use crate::application::ports::repositories::PhotoRepository;
use crate::domain::entities::Photo;
use crate::domain::value_objects::{PhotoId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl PhotoRepository for SqliteRepository {
    async fn add_photo(
        &self,
        user_id: UserId,
        url: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Photo, AppError> {
        let result = sqlx::query(INSERT_PHOTO)
            .bind(user_id.as_i64())
            .bind(url)
            .bind(to_millis(created_at))
            .execute(self.pool.get_pool())
            .await?;

        Ok(Photo {
            id: PhotoId::new(result.last_insert_rowid()),
            user_id,
            url: url.to_string(),
            created_at,
        })
    }

    async fn list_photos(&self, user_id: UserId) -> Result<Vec<Photo>, AppError> {
        let rows = sqlx::query(SELECT_PHOTOS_BY_USER)
            .bind(user_id.as_i64())
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_photo_row).collect()
    }

    async fn trim_photos(&self, user_id: UserId, keep: u32) -> Result<u64, AppError> {
        let result = sqlx::query(TRIM_PHOTOS)
            .bind(user_id.as_i64())
            .bind(i64::from(keep))
            .execute(self.pool.get_pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{at, setup, user};
    use super::*;

    #[tokio::test]
    async fn trim_keeps_oldest_photos() {
        let repo = setup().await;
        let owner = user(&repo, "Owner").await;
        for index in 0..5 {
            repo.add_photo(owner.id, &format!("https://cdn.example.com/{index}.jpg"), at(2))
                .await
                .unwrap();
        }

        assert_eq!(repo.trim_photos(owner.id, 3).await.unwrap(), 2);
        let urls: Vec<_> = repo
            .list_photos(owner.id)
            .await
            .unwrap()
            .into_iter()
            .map(|photo| photo.url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/0.jpg",
                "https://cdn.example.com/1.jpg",
                "https://cdn.example.com/2.jpg",
            ]
        );
        assert_eq!(repo.trim_photos(owner.id, 3).await.unwrap(), 0);
    }
}
