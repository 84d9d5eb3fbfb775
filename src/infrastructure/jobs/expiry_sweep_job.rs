use crate::application::ports::Clock;
use crate::application::services::{SubscriptionLedger, SweepReport};
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// 期限切れ加入の定期失効。1 回分の処理は `SubscriptionLedger` に任せる。
pub struct ExpirySweepJob {
    ledger: Arc<SubscriptionLedger>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl ExpirySweepJob {
    pub fn new(ledger: Arc<SubscriptionLedger>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            ledger,
            clock,
            interval,
        }
    }

    pub async fn run_once(&self) -> Result<SweepReport, AppError> {
        let started = Instant::now();
        let now = self.clock.now();
        let result = self.ledger.scheduled_expiry_sweep(now).await;
        let duration_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;

        match &result {
            Ok(report) => tracing::info!(
                target: "jobs::expiry_sweep",
                examined = report.examined,
                expired = report.expired,
                skipped = report.skipped,
                failed = report.failed,
                photos_removed = report.photos_removed,
                cutoff_millis = now.timestamp_millis(),
                duration_ms,
                "subscription expiry sweep completed"
            ),
            Err(err) => tracing::error!(
                target: "jobs::expiry_sweep",
                error = %err,
                duration_ms,
                "subscription expiry sweep failed"
            ),
        }

        result
    }

    /// 起動直後に 1 回、その後は `interval` ごとに実行する。
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                // 失敗は run_once がログ済み。次の周期で再試行する
                let _ = self.run_once().await;
            }
        })
    }
}
