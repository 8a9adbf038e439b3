//! Periodic throughput sampling.

use std::sync::atomic::Ordering;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use super::DownloadTask;

/// Spawns the sampler for `task`, ticking every `period` until completion.
///
/// The first sample is measured from zero bytes at launch time, so a resumed
/// prefix counts toward it.
pub(crate) fn spawn(task: Arc<DownloadTask>, period: Duration) -> JoinHandle<()> {
    let mut done = task.completion();
    let mut prev_bytes = 0;
    let mut prev_at = Instant::now();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(prev_at + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = done.wait_for(|finished| *finished) => break,
                now = ticker.tick() => {
                    let bytes = task.transferred.load(Ordering::Acquire);
                    let secs = now.saturating_duration_since(prev_at).as_secs_f64();
                    if secs > 0.0 {
                        #[allow(clippy::cast_precision_loss)]
                        let rate = bytes.saturating_sub(prev_bytes) as f64 / secs;
                        *task
                            .current_rate
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner) = rate;
                        trace!(rate, bytes, "sampled throughput");
                    }
                    prev_bytes = bytes;
                    prev_at = now;
                }
            }
        }
        trace!("sampler stopped");
    })
}
