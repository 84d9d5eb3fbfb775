use crate::domain::value_objects::PlanId;
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};

/// 価格・期間・チャット相手数の上限を持つ販売プラン。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub duration_months: u32,
    pub price: f64,
    pub is_published: bool,
    /// 既存の加入にチャット枠だけを追加するプランかどうか。
    pub is_addon: bool,
    pub chat_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDraft {
    pub name: String,
    pub duration_months: u32,
    pub price: f64,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_addon: bool,
    #[serde(default)]
    pub chat_limit: Option<u32>,
}

impl PlanDraft {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Plan name must not be empty"));
        }
        if self.duration_months == 0 {
            return Err(AppError::validation(
                "Plan duration must be at least one month",
            ));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::validation("Plan price must be non-negative"));
        }
        if self.is_addon && self.chat_limit.is_none() {
            return Err(AppError::validation("Addon plans must define a chat limit"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> PlanDraft {
        PlanDraft {
            name: "Gold 3 Months".into(),
            duration_months: 3,
            price: 29.0,
            is_published: true,
            is_addon: false,
            chat_limit: Some(10),
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn rejects_zero_duration_and_negative_price() {
        let mut d = draft();
        d.duration_months = 0;
        assert!(matches!(d.validate(), Err(AppError::ValidationError(_))));

        let mut d = draft();
        d.price = -1.0;
        assert!(matches!(d.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn addon_requires_chat_limit() {
        let mut d = draft();
        d.is_addon = true;
        d.chat_limit = None;
        assert!(matches!(d.validate(), Err(AppError::ValidationError(_))));
    }
}
