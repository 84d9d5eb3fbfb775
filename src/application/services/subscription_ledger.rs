use crate::application::ports::Clock;
use crate::application::ports::repositories::{
    PlanRepository, SubscriptionRepository, UserRepository,
};
use crate::domain::entities::{
    NewSubscription, Plan, Subscription, SubscriptionSummary, SubscriptionUpdate, User,
};
use crate::domain::value_objects::{PlanId, UserId};
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 楽観的更新が競合したときの再試行回数。
const MAX_CAS_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub examined: u64,
    pub expired: u64,
    /// 走査中に他の更新が入り、失効させなかった行。
    pub skipped: u64,
    pub failed: u64,
    pub photos_removed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RevokeReport {
    pub expired: u64,
    pub photos_removed: u64,
}

/// 加入のライフサイクル（購入・付与・更新・アドオン・失効）。
pub struct SubscriptionLedger {
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    photo_limit: u32,
}

impl SubscriptionLedger {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        photo_limit: u32,
    ) -> Self {
        Self {
            subscriptions,
            plans,
            users,
            clock,
            photo_limit,
        }
    }

    /// 管理者による付与。現在の加入があれば期限だけを延ばし、なければ新規作成する。
    pub async fn give_subscription(
        &self,
        user_id: UserId,
        plan_id: PlanId,
        duration_months_override: Option<u32>,
    ) -> Result<Subscription, AppError> {
        if duration_months_override == Some(0) {
            return Err(AppError::validation(
                "Duration override must be at least one month",
            ));
        }
        self.require_user(user_id).await?;
        let plan = self.require_plan(plan_id).await?;
        let months = duration_months_override.unwrap_or(plan.duration_months);

        let granted = self
            .apply_or_create(user_id, &plan, months, |current| current.extended_by(months))
            .await?;
        info!(
            user_id = %user_id,
            plan_id = %plan_id,
            subscription_id = %granted.id,
            months,
            "Subscription granted"
        );
        Ok(granted)
    }

    /// 決済済みの購入を反映する。
    pub async fn purchase_subscription(
        &self,
        user_id: UserId,
        plan_id: PlanId,
    ) -> Result<Subscription, AppError> {
        self.require_user(user_id).await?;
        let plan = self.require_plan(plan_id).await?;

        let subscription = if plan.is_addon {
            self.top_up(user_id, &plan).await?
        } else {
            self.apply_or_create(user_id, &plan, plan.duration_months, |current| {
                current.renewed_with(&plan)
            })
            .await?
        };

        info!(
            user_id = %user_id,
            plan_id = %plan_id,
            subscription_id = %subscription.id,
            addon = plan.is_addon,
            chat_limit = ?subscription.chat_limit,
            expiry_date = %subscription.expiry_date,
            "Subscription purchased"
        );
        Ok(subscription)
    }

    pub async fn revoke_subscription(&self, user_id: UserId) -> Result<RevokeReport, AppError> {
        self.require_user(user_id).await?;
        let outcome = self
            .subscriptions
            .revoke_active_for_user(user_id, self.photo_limit)
            .await?;
        info!(
            user_id = %user_id,
            expired = outcome.expired,
            photos_removed = outcome.photos_removed,
            "Subscriptions revoked"
        );
        Ok(RevokeReport {
            expired: outcome.expired,
            photos_removed: outcome.photos_removed,
        })
    }

    /// 期限切れの ACTIVE 行を 1 行ずつ失効させる。1 行の失敗で全体は止めない。
    pub async fn scheduled_expiry_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, AppError> {
        let candidates = self.subscriptions.list_expired_active(now).await?;
        let mut report = SweepReport {
            examined: candidates.len() as u64,
            ..SweepReport::default()
        };

        for subscription in candidates {
            match self
                .subscriptions
                .expire_subscription(
                    subscription.id,
                    subscription.version,
                    now,
                    self.photo_limit,
                )
                .await
            {
                Ok(outcome) if outcome.expired > 0 => {
                    report.expired += 1;
                    report.photos_removed += outcome.photos_removed;
                    debug!(
                        subscription_id = %subscription.id,
                        user_id = %subscription.user_id,
                        photos_removed = outcome.photos_removed,
                        "Subscription expired"
                    );
                }
                Ok(_) => {
                    report.skipped += 1;
                    debug!(
                        subscription_id = %subscription.id,
                        "Subscription changed during sweep; skipped"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    error!(
                        subscription_id = %subscription.id,
                        user_id = %subscription.user_id,
                        error = %err,
                        "Failed to expire subscription"
                    );
                }
            }
        }

        Ok(report)
    }

    pub async fn current_subscription(
        &self,
        user_id: UserId,
    ) -> Result<Option<Subscription>, AppError> {
        self.subscriptions
            .find_current_active(user_id, self.clock.now())
            .await
    }

    pub async fn has_active_subscription(&self, user_id: UserId) -> Result<bool, AppError> {
        Ok(self.current_subscription(user_id).await?.is_some())
    }

    pub async fn active_subscription_summary(
        &self,
        user_id: UserId,
    ) -> Result<Option<SubscriptionSummary>, AppError> {
        let Some(subscription) = self.current_subscription(user_id).await? else {
            return Ok(None);
        };
        let plan = self.require_plan(subscription.plan_id).await?;
        Ok(Some(SubscriptionSummary::from_parts(&subscription, &plan)))
    }

    /// 期限の新しい順。
    pub async fn subscription_history(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SubscriptionSummary>, AppError> {
        self.require_user(user_id).await?;
        let subscriptions = self.subscriptions.list_for_user(user_id).await?;
        let mut summaries = Vec::with_capacity(subscriptions.len());
        for subscription in &subscriptions {
            match self.plans.get_plan(subscription.plan_id).await? {
                Some(plan) => summaries.push(SubscriptionSummary::from_parts(subscription, &plan)),
                None => warn!(
                    subscription_id = %subscription.id,
                    plan_id = %subscription.plan_id,
                    "Subscription references a missing plan"
                ),
            }
        }
        Ok(summaries)
    }

    pub async fn list_all_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        self.subscriptions.list_all().await
    }

    async fn top_up(&self, user_id: UserId, addon: &Plan) -> Result<Subscription, AppError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some(current) = self.current_subscription(user_id).await? else {
                return Err(AppError::validation("Addon requires an active subscription"));
            };
            let update = current.topped_up_with(addon)?;
            if let Some(updated) = self.subscriptions.apply_update(&update).await? {
                return Ok(updated);
            }
            warn!(user_id = %user_id, attempt, "Concurrent subscription update; retrying");
        }
        Err(concurrent_modification())
    }

    /// 現在の加入があれば `change` で更新し、なければ `months` ヶ月の加入を新規作成する。
    async fn apply_or_create<F>(
        &self,
        user_id: UserId,
        plan: &Plan,
        months: u32,
        change: F,
    ) -> Result<Subscription, AppError>
    where
        F: Fn(&Subscription) -> Result<SubscriptionUpdate, AppError> + Send + Sync,
    {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let now = self.clock.now();
            match self.subscriptions.find_current_active(user_id, now).await? {
                Some(current) => {
                    let update = change(&current)?;
                    if let Some(updated) = self.subscriptions.apply_update(&update).await? {
                        return Ok(updated);
                    }
                    warn!(user_id = %user_id, attempt, "Concurrent subscription update; retrying");
                }
                None => {
                    let new_subscription = NewSubscription::for_plan(user_id, plan, now, months)?;
                    return self
                        .subscriptions
                        .create_subscription(&new_subscription)
                        .await;
                }
            }
        }
        Err(concurrent_modification())
    }

    async fn require_user(&self, id: UserId) -> Result<User, AppError> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn require_plan(&self, id: PlanId) -> Result<Plan, AppError> {
        self.plans
            .get_plan(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Plan {id} not found")))
    }
}

fn concurrent_modification() -> AppError {
    AppError::conflict("Subscription was modified concurrently; please retry")
}
