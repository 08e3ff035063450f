//! Background scheduler — drives periodic reconciliation ticks.
//!
//! Each task runs `tick` immediately and then every `period` until its
//! [`Liveness`] flag is cleared. Stopping only flips the flag: a task notices
//! on its next wake-up, and in-flight IO is not aborted.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Shared "keep running" flag for a platform's background tasks.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Default for Liveness {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Spawn `tick` every `period` while `liveness` holds.
///
/// A zero period disables the task and returns `None`.
pub fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, liveness: Liveness, mut tick: F) -> Option<JoinHandle<()>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    if period.is_zero() {
        tracing::info!(task = name, "periodic task disabled");
        return None;
    }
    tracing::info!(task = name, period_secs = period.as_secs(), "periodic task started");
    Some(tokio::spawn(async move {
        while liveness.is_alive() {
            tick().await;
            tokio::time::sleep(period).await;
        }
        tracing::debug!(task = name, "periodic task stopped");
    }))
}
