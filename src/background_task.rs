use tokio::time::{interval, Duration};

use crate::limiter::rate_limiter::FixedWindowLimiter;

const PURGE_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically drops idle rate-limit windows so spoofed or one-off client
/// keys do not accumulate.
pub async fn start_purge_task(limiter: FixedWindowLimiter) {
    let mut interval = interval(PURGE_INTERVAL);

    loop {
        interval.tick().await;

        let purged = limiter.purge_idle();
        if purged > 0 {
            tracing::debug!(
                purged,
                tracked = limiter.tracked_keys(),
                "Purged idle rate-limit windows"
            );
        }
    }
}
