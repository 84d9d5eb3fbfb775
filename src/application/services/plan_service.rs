use crate::application::ports::repositories::PlanRepository;
use crate::domain::entities::{Plan, PlanDraft};
use crate::domain::value_objects::PlanId;
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::info;

pub struct PlanService {
    repository: Arc<dyn PlanRepository>,
}

impl PlanService {
    pub fn new(repository: Arc<dyn PlanRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_published_plans(&self) -> Result<Vec<Plan>, AppError> {
        self.repository.list_published_plans().await
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>, AppError> {
        self.repository.list_plans().await
    }

    pub async fn get_plan(&self, id: PlanId) -> Result<Plan, AppError> {
        self.repository
            .get_plan(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }

    pub async fn create_plan(&self, draft: PlanDraft) -> Result<Plan, AppError> {
        draft.validate()?;
        let plan = self.repository.create_plan(&draft).await?;
        info!(plan_id = %plan.id, addon = plan.is_addon, "Plan created");
        Ok(plan)
    }

    pub async fn update_plan(&self, id: PlanId, draft: PlanDraft) -> Result<Plan, AppError> {
        draft.validate()?;
        self.repository
            .update_plan(id, &draft)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }

    pub async fn delete_plan(&self, id: PlanId) -> Result<(), AppError> {
        if !self.repository.delete_plan(id).await? {
            return Err(AppError::not_found(format!("Plan {id} not found")));
        }
        info!(plan_id = %id, "Plan deleted");
        Ok(())
    }
}
