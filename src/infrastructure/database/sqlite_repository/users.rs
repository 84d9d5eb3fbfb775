use super::mapper::map_user_row;
use super::queries::{
    DELETE_USER, DELETE_USER_DEPENDENTS, EXISTS_USER, INSERT_USER, SEARCH_USERS,
    SELECT_USER_BY_EMAIL, SELECT_USER_BY_ID, SELECT_USERS, UPDATE_USER_FCM_TOKEN,
};
use super::{SqliteRepository, conflict_on_unique, to_millis};
use crate::application::ports::repositories::UserRepository;
use crate::domain::entities::{NewUser, User, UserSearchCriteria};
use crate::domain::value_objects::UserId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, AppError> {
        let role = user.role.unwrap_or_default();
        let result = sqlx::query(INSERT_USER)
            .bind(&user.name)
            .bind(&user.email)
            .bind(role.as_str())
            .bind(&user.gender)
            .bind(user.age)
            .bind(&user.religion)
            .bind(&user.city_town)
            .bind(to_millis(created_at))
            .execute(self.pool.get_pool())
            .await
            .map_err(|err| conflict_on_unique(err, "Email already registered"))?;

        Ok(User {
            id: UserId::new(result.last_insert_rowid()),
            name: user.name.clone(),
            email: user.email.clone(),
            role,
            gender: user.gender.clone(),
            age: user.age,
            religion: user.religion.clone(),
            city_town: user.city_town.clone(),
            fcm_token: None,
            created_at,
        })
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, AppError> {
        let row = sqlx::query(SELECT_USER_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_user_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query(SELECT_USER_BY_EMAIL)
            .bind(email)
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_user_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self, gender: Option<String>) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(SELECT_USERS)
            .bind(gender)
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.iter().map(map_user_row).collect()
    }

    async fn search_users(&self, criteria: &UserSearchCriteria) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(SEARCH_USERS)
            .bind(criteria.min_age)
            .bind(criteria.max_age)
            .bind(non_blank(&criteria.name))
            .bind(non_blank(&criteria.location))
            .bind(non_blank(&criteria.religion))
            .bind(non_blank(&criteria.gender))
            .fetch_all(self.pool.get_pool())
            .await?;

        rows.iter().map(map_user_row).collect()
    }

    async fn update_fcm_token(&self, id: UserId, token: Option<String>) -> Result<bool, AppError> {
        let result = sqlx::query(UPDATE_USER_FCM_TOKEN)
            .bind(id.as_i64())
            .bind(token)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_user_cascade(&self, id: UserId) -> Result<bool, AppError> {
        let mut tx = self.pool.get_pool().begin().await?;

        let exists: bool = sqlx::query_scalar(EXISTS_USER)
            .bind(id.as_i64())
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(false);
        }

        for statement in DELETE_USER_DEPENDENTS {
            sqlx::query(statement)
                .bind(id.as_i64())
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(DELETE_USER)
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
