use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, info_span, Instrument};

use crate::error::AppError;
use crate::state::AppState;

/// Periodically expires published results older than the retention window.
/// The first sweep runs immediately; the loop exits once `shutdown` flips to
/// `true` or its sender is dropped.
pub async fn start_retention_sweeper(state: Arc<AppState>, mut shutdown: watch::Receiver<bool>) {
    info!(
        interval_secs = state.config.sweep_interval.as_secs(),
        retention_days = state.config.retention_days,
        "Starting retention sweeper..."
    );

    let mut ticker = interval(state.config.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let span = info_span!("retention_sweep");
                async {
                    if let Err(e) = run_retention_sweep(&state).await {
                        error!("Retention sweep failed: {}", e);
                    }
                }
                    .instrument(span)
                    .await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Retention sweeper stopped");
                    break;
                }
            }
        }
    }
}

/// One sweep pass. Returns how many orders were expired.
pub async fn run_retention_sweep(state: &AppState) -> Result<u64, AppError> {
    let cutoff = retention_cutoff(Utc::now(), state.config.retention_days)?;
    state.order_service.expire_published_older_than(cutoff).await
}

/// `now` minus `retention_days`, or a config error when that is out of range.
pub fn retention_cutoff(now: DateTime<Utc>, retention_days: i64) -> Result<DateTime<Utc>, AppError> {
    Duration::try_days(retention_days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or_else(|| AppError::Config(format!("Retention window of {} days is out of range", retention_days)))
}
