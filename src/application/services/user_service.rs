use crate::application::ports::Clock;
use crate::application::ports::repositories::{PhotoRepository, UserRepository};
use crate::application::services::block_filter::BlockFilter;
use crate::domain::entities::{NewUser, Photo, User, UserSearchCriteria};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    photos: Arc<dyn PhotoRepository>,
    block_filter: Arc<BlockFilter>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        repository: Arc<dyn UserRepository>,
        photos: Arc<dyn PhotoRepository>,
        block_filter: Arc<BlockFilter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            photos,
            block_filter,
            clock,
        }
    }

    pub async fn register(&self, user: NewUser) -> Result<User, AppError> {
        let user = user.normalized();
        if user.name.is_empty() {
            return Err(AppError::validation("Name is required"));
        }
        if !user.email.contains('@') {
            return Err(AppError::validation("A valid email is required"));
        }
        if self.repository.get_user_by_email(&user.email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }

        let created = self.repository.create_user(&user, self.clock.now()).await?;
        info!(user_id = %created.id, role = created.role.as_str(), "User registered");
        Ok(created)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.repository
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.repository
            .get_user_by_email(&email.trim().to_lowercase())
            .await
    }

    /// 閲覧者が指定されていれば、ブロック関係にあるユーザーを除く。
    pub async fn list_users(
        &self,
        gender: Option<String>,
        viewer: Option<UserId>,
    ) -> Result<Vec<User>, AppError> {
        let gender = gender.filter(|value| !value.trim().is_empty());
        let users = self.repository.list_users(gender).await?;
        self.visible_to(viewer, users).await
    }

    pub async fn search(
        &self,
        criteria: &UserSearchCriteria,
        viewer: Option<UserId>,
    ) -> Result<Vec<User>, AppError> {
        let users = self.repository.search_users(criteria).await?;
        self.visible_to(viewer, users).await
    }

    pub async fn update_fcm_token(
        &self,
        id: UserId,
        token: Option<String>,
    ) -> Result<(), AppError> {
        let token = token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if !self.repository.update_fcm_token(id, token).await? {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        Ok(())
    }

    pub async fn add_photo_to_gallery(&self, id: UserId, url: &str) -> Result<Photo, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::validation("Photo url is required"));
        }
        self.get_user(id).await?;
        self.photos.add_photo(id, url, self.clock.now()).await
    }

    pub async fn list_photos(&self, id: UserId) -> Result<Vec<Photo>, AppError> {
        self.get_user(id).await?;
        self.photos.list_photos(id).await
    }

    /// 関連データを削除してからユーザーを削除する。
    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        if !self.repository.delete_user_cascade(id).await? {
            return Err(AppError::not_found(format!("User {id} not found")));
        }
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn visible_to(
        &self,
        viewer: Option<UserId>,
        users: Vec<User>,
    ) -> Result<Vec<User>, AppError> {
        match viewer {
            Some(viewer) => self.block_filter.retain_visible(viewer, users).await,
            None => Ok(users),
        }
    }
}
