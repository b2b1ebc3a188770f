//! Periodic refresh timer

use async_std::task;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

/// Default refresh period
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Cancels a [`RefreshTimer`], from any thread
#[derive(Clone, Debug, Default)]
pub struct TimerHandle(Arc<AtomicBool>);

impl TimerHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct RefreshTimer {
    interval: Duration,
    handle: TimerHandle,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            handle: TimerHandle::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    /// Wait for the next tick, `false` once cancelled
    pub async fn tick(&self) -> bool {
        if self.handle.is_cancelled() {
            return false;
        }
        task::sleep(self.interval).await;
        !self.handle.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_until_cancelled() {
        let timer = RefreshTimer::new(Duration::from_millis(1));
        let handle = timer.handle();
        task::block_on(async {
            assert!(timer.tick().await);
            handle.cancel();
            assert!(!timer.tick().await);
        });
        assert!(timer.handle().is_cancelled());
    }
}
