use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::AccountDirectory;

/// Background task that sweeps interest across the whole directory on a
/// fixed interval. Best-effort: a failed sweep is reported and the next
/// tick runs anyway. The shared mutex serializes sweeps against foreground
/// mutations on the same directory.
pub struct InterestScheduler {
    handle: JoinHandle<()>,
}

impl InterestScheduler {
    /// Spawn the sweep loop. The first sweep runs after one full period.
    pub fn spawn(directory: Arc<Mutex<AccountDirectory>>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // An interval's first tick completes immediately; swallow it so
            // the loop waits a full period before the first sweep.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut directory = directory.lock().await;
                if let Err(err) = directory.apply_interest_to_all().await {
                    eprintln!("interest sweep failed: {}", err);
                }
            }
        });
        Self { handle }
    }

    /// Stop the loop. No further sweeps run after this returns.
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for InterestScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
