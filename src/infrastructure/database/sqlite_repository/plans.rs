use super::SqliteRepository;
use super::mapper::map_plan_row;
use super::queries::{
    DELETE_PLAN, EXISTS_SUBSCRIPTION_FOR_PLAN, INSERT_PLAN, SELECT_PLAN_BY_ID, SELECT_PLANS,
    SELECT_PUBLISHED_PLANS, UPDATE_PLAN,
};
use crate::application::ports::repositories::PlanRepository;
use crate::domain::entities::{Plan, PlanDraft};
use crate::domain::value_objects::PlanId;
use crate::shared::error::AppError;
use async_trait::async_trait;

const PLAN_IN_USE: &str = "Plan is referenced by existing subscriptions";

#[async_trait]
impl PlanRepository for SqliteRepository {
    async fn create_plan(&self, draft: &PlanDraft) -> Result<Plan, AppError> {
        let result = sqlx::query(INSERT_PLAN)
            .bind(draft.name.trim())
            .bind(i64::from(draft.duration_months))
            .bind(draft.price)
            .bind(draft.is_published)
            .bind(draft.is_addon)
            .bind(draft.chat_limit.map(i64::from))
            .execute(self.pool.get_pool())
            .await?;

        Ok(Plan {
            id: PlanId::new(result.last_insert_rowid()),
            name: draft.name.trim().to_string(),
            duration_months: draft.duration_months,
            price: draft.price,
            is_published: draft.is_published,
            is_addon: draft.is_addon,
            chat_limit: draft.chat_limit,
        })
    }

    async fn get_plan(&self, id: PlanId) -> Result<Option<Plan>, AppError> {
        let row = sqlx::query(SELECT_PLAN_BY_ID)
            .bind(id.as_i64())
            .fetch_optional(self.pool.get_pool())
            .await?;

        match row {
            Some(row) => Ok(Some(map_plan_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, AppError> {
        let rows = sqlx::query(SELECT_PLANS)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_plan_row).collect()
    }

    async fn list_published_plans(&self) -> Result<Vec<Plan>, AppError> {
        let rows = sqlx::query(SELECT_PUBLISHED_PLANS)
            .fetch_all(self.pool.get_pool())
            .await?;
        rows.iter().map(map_plan_row).collect()
    }

    async fn update_plan(&self, id: PlanId, draft: &PlanDraft) -> Result<Option<Plan>, AppError> {
        let result = sqlx::query(UPDATE_PLAN)
            .bind(id.as_i64())
            .bind(draft.name.trim())
            .bind(i64::from(draft.duration_months))
            .bind(draft.price)
            .bind(draft.is_published)
            .bind(draft.is_addon)
            .bind(draft.chat_limit.map(i64::from))
            .execute(self.pool.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_plan(id).await
    }

    async fn delete_plan(&self, id: PlanId) -> Result<bool, AppError> {
        let in_use: bool = sqlx::query_scalar(EXISTS_SUBSCRIPTION_FOR_PLAN)
            .bind(id.as_i64())
            .fetch_one(self.pool.get_pool())
            .await?;
        if in_use {
            return Err(AppError::conflict(PLAN_IN_USE));
        }

        let result = sqlx::query(DELETE_PLAN)
            .bind(id.as_i64())
            .execute(self.pool.get_pool())
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::conflict(PLAN_IN_USE)
                }
                _ => AppError::from(err),
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{at, plan, setup, user};
    use super::*;
    use crate::application::ports::repositories::SubscriptionRepository;
    use crate::domain::entities::NewSubscription;

    #[tokio::test]
    async fn published_listing_hides_drafts() {
        let repo = setup().await;
        plan(&repo, Some(3)).await;
        repo.create_plan(&PlanDraft {
            name: "Hidden".into(),
            duration_months: 2,
            price: 5.0,
            is_published: false,
            is_addon: false,
            chat_limit: None,
        })
        .await
        .unwrap();

        assert_eq!(repo.list_plans().await.unwrap().len(), 2);
        let published = repo.list_published_plans().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].chat_limit, Some(3));
    }

    #[tokio::test]
    async fn referenced_plan_cannot_be_deleted() {
        let repo = setup().await;
        let owner = user(&repo, "Owner").await;
        let gold = plan(&repo, Some(3)).await;
        repo.create_subscription(&NewSubscription::for_plan(owner.id, &gold, at(1), 1).unwrap())
            .await
            .unwrap();

        let err = repo.delete_plan(gold.id).await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");

        let unused = plan(&repo, None).await;
        assert!(repo.delete_plan(unused.id).await.unwrap());
        assert!(!repo.delete_plan(unused.id).await.unwrap());
    }
}
