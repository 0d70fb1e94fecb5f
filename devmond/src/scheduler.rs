use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::monitor::{Broadcast, Monitor};

/// Pushes a fresh metrics snapshot every `period` until `shutdown` flips to
/// true or its sender is dropped.
///
/// Ticks run one after another on this task, so they never overlap. Ticks
/// skipped during a debug session, or missed because one ran long, are
/// not made up later.
pub async fn run_periodic(
    monitor: Arc<Monitor>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = period.max(Duration::from_millis(10));
    info!("[scheduler] pushing metrics every {period:?}");
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        match monitor.publish_metrics() {
            Broadcast::Sent(n) => debug!("[scheduler] metrics pushed to {n} subscribers"),
            Broadcast::SuppressedByDebugger => {}
        }
    }
    info!("[scheduler] stopped");
}
