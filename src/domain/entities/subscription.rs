use crate::domain::entities::Plan;
use crate::domain::value_objects::{PlanId, SubscriptionId, UserId};
use crate::shared::error::AppError;
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Expired => "EXPIRED",
        }
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "EXPIRED" => Ok(SubscriptionStatus::Expired),
            _ => Err(()),
        }
    }
}

/// ユーザーがプランを有効化した結果。期限と、チャット枠（割当数・消費数）を持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    /// 割り当て済みのチャット枠。`None` は無制限。
    pub chat_limit: Option<u32>,
    /// この加入期間中に新規に開いたチャット相手の数。
    pub used_chat_slots: u32,
    /// 楽観的排他制御のためのバージョン。
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub chat_limit: Option<u32>,
}

/// 既存の加入に対する条件付き更新。`expected_version` が一致しなければ適用されない。
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpdate {
    pub id: SubscriptionId,
    pub expected_version: i64,
    pub expiry_date: DateTime<Utc>,
    pub chat_limit: Option<u32>,
    pub used_chat_slots: u32,
}

impl NewSubscription {
    pub fn for_plan(
        user_id: UserId,
        plan: &Plan,
        now: DateTime<Utc>,
        duration_months: u32,
    ) -> Result<Self, AppError> {
        Ok(Self {
            user_id,
            plan_id: plan.id,
            start_date: now,
            expiry_date: add_months(now, duration_months)?,
            chat_limit: plan.chat_limit,
        })
    }
}

impl Subscription {
    /// ACTIVE かつ期限が未来であれば「現在の加入」とみなす。
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.expiry_date > now
    }

    pub fn remaining_slots(&self) -> Option<u32> {
        self.chat_limit
            .map(|limit| limit.saturating_sub(self.used_chat_slots))
    }

    pub fn has_free_slot(&self) -> bool {
        self.remaining_slots().is_none_or(|remaining| remaining > 0)
    }

    fn unchanged(&self) -> SubscriptionUpdate {
        SubscriptionUpdate {
            id: self.id,
            expected_version: self.version,
            expiry_date: self.expiry_date,
            chat_limit: self.chat_limit,
            used_chat_slots: self.used_chat_slots,
        }
    }

    /// 期限だけを延長する（管理者付与）。
    pub fn extended_by(&self, months: u32) -> Result<SubscriptionUpdate, AppError> {
        Ok(SubscriptionUpdate {
            expiry_date: add_months(self.expiry_date, months)?,
            ..self.unchanged()
        })
    }

    /// 通常プランでの更新。未使用の枠を繰り越し、消費数をリセットする。
    pub fn renewed_with(&self, plan: &Plan) -> Result<SubscriptionUpdate, AppError> {
        let remaining = self.remaining_slots().unwrap_or(0);
        let chat_limit = plan
            .chat_limit
            .map(|granted| remaining.saturating_add(granted));

        Ok(SubscriptionUpdate {
            expiry_date: add_months(self.expiry_date, plan.duration_months)?,
            chat_limit,
            used_chat_slots: 0,
            ..self.unchanged()
        })
    }

    /// アドオンでの枠追加。期限は変更しない。
    pub fn topped_up_with(&self, addon: &Plan) -> Result<SubscriptionUpdate, AppError> {
        let extra = addon.chat_limit.ok_or_else(|| {
            AppError::validation(format!("Addon plan {} has no chat limit", addon.id))
        })?;

        Ok(SubscriptionUpdate {
            chat_limit: self.chat_limit.map(|limit| limit.saturating_add(extra)),
            ..self.unchanged()
        })
    }
}

/// 加入とプラン情報をまとめた参照用ビュー。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub subscription_id: SubscriptionId,
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub plan_duration_months: u32,
    pub plan_chat_limit: Option<u32>,
    pub start_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub chat_limit: Option<u32>,
    pub used_chat_slots: u32,
}

impl SubscriptionSummary {
    pub fn from_parts(subscription: &Subscription, plan: &Plan) -> Self {
        Self {
            subscription_id: subscription.id,
            user_id: subscription.user_id,
            plan_id: plan.id,
            plan_name: plan.name.clone(),
            plan_duration_months: plan.duration_months,
            plan_chat_limit: plan.chat_limit,
            start_date: subscription.start_date,
            expiry_date: subscription.expiry_date,
            status: subscription.status,
            chat_limit: subscription.chat_limit,
            used_chat_slots: subscription.used_chat_slots,
        }
    }
}

/// 暦月の加算。月末は対象月の末日に丸める（1/31 + 1 ヶ月 = 2/28 or 2/29）。
pub fn add_months(from: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, AppError> {
    from.checked_add_months(Months::new(months))
        .ok_or_else(|| AppError::validation(format!("Cannot add {months} months to {from}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn plan(chat_limit: Option<u32>, duration_months: u32, is_addon: bool) -> Plan {
        Plan {
            id: PlanId::new(9),
            name: "plan".into(),
            duration_months,
            price: 10.0,
            is_published: true,
            is_addon,
            chat_limit,
        }
    }

    fn subscription(chat_limit: Option<u32>, used: u32) -> Subscription {
        Subscription {
            id: SubscriptionId::new(1),
            user_id: UserId::new(1),
            plan_id: PlanId::new(1),
            start_date: at(2026, 1, 1),
            expiry_date: at(2026, 3, 1),
            status: SubscriptionStatus::Active,
            chat_limit,
            used_chat_slots: used,
            version: 4,
        }
    }

    #[test]
    fn add_months_clamps_to_month_end() {
        assert_eq!(add_months(at(2026, 1, 31), 1).unwrap(), at(2026, 2, 28));
        assert_eq!(add_months(at(2028, 1, 31), 1).unwrap(), at(2028, 2, 29));
        assert_eq!(add_months(at(2026, 11, 15), 3).unwrap(), at(2027, 2, 15));
    }

    #[test]
    fn renewal_rolls_over_unused_slots() {
        let sub = subscription(Some(5), 3);
        let update = sub.renewed_with(&plan(Some(4), 2, false)).unwrap();
        assert_eq!(update.chat_limit, Some(6));
        assert_eq!(update.used_chat_slots, 0);
        assert_eq!(update.expiry_date, at(2026, 5, 1));
        assert_eq!(update.expected_version, 4);
    }

    #[test]
    fn renewal_never_rolls_over_negative_remainder() {
        let sub = subscription(Some(2), 5);
        let update = sub.renewed_with(&plan(Some(4), 1, false)).unwrap();
        assert_eq!(update.chat_limit, Some(4));
    }

    #[test]
    fn renewal_with_unlimited_plan_stays_unlimited() {
        let sub = subscription(Some(5), 1);
        let update = sub.renewed_with(&plan(None, 1, false)).unwrap();
        assert_eq!(update.chat_limit, None);
    }

    #[test]
    fn addon_adds_slots_without_touching_expiry() {
        let sub = subscription(Some(3), 1);
        let update = sub.topped_up_with(&plan(Some(2), 1, true)).unwrap();
        assert_eq!(update.chat_limit, Some(5));
        assert_eq!(update.used_chat_slots, 1);
        assert_eq!(update.expiry_date, sub.expiry_date);
    }

    #[test]
    fn addon_without_limit_is_rejected() {
        let sub = subscription(Some(3), 1);
        let err = sub.topped_up_with(&plan(None, 1, true)).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn current_requires_active_and_future_expiry() {
        let mut sub = subscription(Some(1), 0);
        assert!(sub.is_current(at(2026, 2, 1)));
        assert!(!sub.is_current(at(2026, 3, 1)));
        sub.status = SubscriptionStatus::Expired;
        assert!(!sub.is_current(at(2026, 2, 1)));
    }

    #[test]
    fn free_slot_accounting() {
        assert!(subscription(None, 100).has_free_slot());
        assert!(subscription(Some(2), 1).has_free_slot());
        assert!(!subscription(Some(2), 2).has_free_slot());
    }
}
