//! Alarm controller — runs the security state machine of one accessory.
//!
//! Legality of every move is decided by [`hearth_domain::alarm`]; this module
//! owns the side effects: the `security_state` property, the annunciator and
//! the single pending timer.
//!
//! At most one timer is live, and only while the state is `Triggered`. The
//! timer slot is only touched with the state lock held, so a disarm racing
//! a sensor report either sees the new timer or prevents it. Cancelling a
//! timer aborts its task, which also drops a ring still in flight.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hearth_domain::alarm::{Annunciation, ArmDecision, SecurityState, evaluate_request, evaluate_sensor};
use hearth_domain::property::Property;
use hearth_domain::zone::ZoneKind;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::ports::Annunciator;

/// Name of the property carrying the security state code.
pub const SECURITY_STATE: &str = "security_state";

/// Countdown and ring durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTimings {
    /// Entry window of intermittent chirps before full annunciation.
    pub countdown: Duration,
    /// Continuous annunciation is silenced after this long.
    pub max_ring: Duration,
}

impl Default for AlarmTimings {
    fn default() -> Self {
        Self {
            countdown: Duration::from_secs(60),
            max_ring: Duration::from_secs(300),
        }
    }
}

/// Called after every state change.
pub type TransitionListener = Arc<dyn Fn(SecurityState) + Send + Sync>;

struct PendingTimer {
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Security state machine bound to an annunciator.
pub struct AlarmController<A> {
    name: String,
    annunciator: Arc<A>,
    timings: AlarmTimings,
    state: Mutex<SecurityState>,
    property: Arc<Property>,
    timer: Mutex<Option<PendingTimer>>,
    listener: Mutex<Option<TransitionListener>>,
}

impl<A: Annunciator + 'static> AlarmController<A> {
    /// Start disarmed. The `security_state` property is created here.
    pub fn new(name: impl Into<String>, annunciator: Arc<A>, timings: AlarmTimings) -> Self {
        Self {
            name: name.into(),
            annunciator,
            timings,
            state: Mutex::new(SecurityState::Disarmed),
            property: Arc::new(Property::new(SECURITY_STATE, SecurityState::Disarmed.code())),
            timer: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn property(&self) -> &Arc<Property> {
        &self.property
    }

    #[must_use]
    pub fn state(&self) -> SecurityState {
        *lock(&self.state)
    }

    /// Run `listener` after every state change.
    pub fn on_transition(&self, listener: TransitionListener) {
        *lock(&self.listener) = Some(listener);
    }

    /// Handle an arm/disarm request and return the resulting current state.
    ///
    /// Requests are never errors: an illegal one is logged and the current
    /// state echoed back.
    pub async fn request_state(&self, requested: SecurityState) -> SecurityState {
        self.apply_request(requested, true).await
    }

    /// Adopt the arm state the board itself reports, without chirping.
    pub async fn observe_board_state(&self, reported: SecurityState) -> SecurityState {
        self.apply_request(reported, false).await
    }

    pub async fn disarm(&self) -> SecurityState {
        self.request_state(SecurityState::Disarmed).await
    }

    /// Feed a sensor report. Returns the annunciation pattern when it trips
    /// the alarm.
    pub fn sensor_event(&self, zone: ZoneKind, active: bool) -> Option<Annunciation> {
        let annunciation = {
            let mut state = lock(&self.state);
            let annunciation = evaluate_sensor(*state, zone, active)?;
            *state = SecurityState::Triggered;
            self.start_timer(annunciation);
            annunciation
        };
        tracing::warn!(accessory = %self.name, zone = ?zone, pattern = ?annunciation, "alarm triggered");
        self.publish(SecurityState::Triggered);
        Some(annunciation)
    }

    async fn apply_request(&self, requested: SecurityState, confirm: bool) -> SecurityState {
        let decision = {
            let mut state = lock(&self.state);
            let decision = evaluate_request(*state, requested);
            if let ArmDecision::Changed { to, .. } = decision {
                *state = to;
                if to == SecurityState::Disarmed {
                    self.cancel_timer();
                }
            }
            decision
        };

        match decision {
            ArmDecision::Rejected { current } => {
                tracing::info!(accessory = %self.name, current = %current, requested = %requested, "arm request ignored");
                current
            }
            ArmDecision::Confirmed(current) => {
                if confirm && current.is_armed() {
                    self.chirp().await;
                }
                current
            }
            ArmDecision::Changed { from, to } => {
                tracing::info!(accessory = %self.name, from = %from, to = %to, "security state changed");
                self.publish(to);
                if to == SecurityState::Disarmed {
                    if from == SecurityState::Triggered
                        && let Err(err) = self.annunciator.silence().await
                    {
                        tracing::warn!(accessory = %self.name, error = %err, "unable to silence annunciator");
                    }
                } else if confirm {
                    self.chirp().await;
                }
                to
            }
        }
    }

    fn publish(&self, state: SecurityState) {
        self.property.set(state.code());
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener(state);
        }
    }

    async fn chirp(&self) {
        if let Err(err) = self.annunciator.chirp().await {
            tracing::warn!(accessory = %self.name, error = %err, "confirmation chirp failed");
        }
    }

    /// Caller holds the state lock.
    fn cancel_timer(&self) {
        if let Some(pending) = lock(&self.timer).take() {
            tracing::debug!(accessory = %self.name, "cancelling pending alarm timer");
            // The task may already have finished; a closed receiver is fine.
            let _ = pending.cancel.send(());
            pending.task.abort();
        }
    }

    /// Caller holds the state lock.
    fn start_timer(&self, annunciation: Annunciation) {
        let (cancel, rx) = oneshot::channel();
        let task = tokio::spawn(run_timer(
            self.name.clone(),
            Arc::clone(&self.annunciator),
            self.timings,
            annunciation,
            rx,
        ));
        let previous = lock(&self.timer).replace(PendingTimer { cancel, task });
        if let Some(previous) = previous {
            tracing::debug!(accessory = %self.name, "replacing pending alarm timer");
            drop(previous.cancel);
            previous.task.abort();
        }
    }
}

async fn run_timer<A: Annunciator>(
    name: String,
    annunciator: Arc<A>,
    timings: AlarmTimings,
    annunciation: Annunciation,
    mut cancelled: oneshot::Receiver<()>,
) {
    if annunciation == Annunciation::Countdown {
        if let Err(err) = annunciator.intermittent(timings.countdown).await {
            tracing::warn!(accessory = %name, error = %err, "countdown chirps failed");
        }
        tokio::select! {
            () = tokio::time::sleep(timings.countdown) => {}
            _ = &mut cancelled => return,
        }
    }

    tracing::warn!(accessory = %name, "alarm ringing");
    if let Err(err) = annunciator.ring().await {
        tracing::warn!(accessory = %name, error = %err, "unable to ring annunciator");
    }

    tokio::select! {
        () = tokio::time::sleep(timings.max_ring) => {
            tracing::info!(accessory = %name, "max ring duration reached, silencing");
            if let Err(err) = annunciator.silence().await {
                tracing::warn!(accessory = %name, error = %err, "unable to silence annunciator");
            }
        }
        _ = &mut cancelled => {}
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
