//! Countdown timer task.
//!
//! A [`TimerHandle`] owns the spawned interval task. It is returned by
//! [`start_timer`] and consumed by [`stop_timer`]; dropping it aborts the task
//! too, so a handle can never outlive the runner that holds it.

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{interval_at, Duration, Instant},
};
use tracing::debug;
use ulid::Ulid;

#[derive(Debug)]
pub struct TimerHandle {
    session: Ulid,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Session the ticks are tagged with.
    #[must_use]
    pub fn session(&self) -> Ulid {
        self.session
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Spawn a task that sends `session` on `ticks` once per `period`.
///
/// The first tick fires one full period after the call. The task ends by
/// itself when the receiver is gone.
pub fn start_timer(
    session: Ulid,
    period: Duration,
    ticks: mpsc::UnboundedSender<Ulid>,
) -> TimerHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        loop {
            ticker.tick().await;

            if ticks.send(session).is_err() {
                debug!(session = %session, "tick receiver closed");
                break;
            }
        }
    });

    debug!(session = %session, ?period, "timer started");

    TimerHandle { session, task }
}

/// Cancel the timer. No tick is sent after this returns.
pub fn stop_timer(handle: TimerHandle) {
    debug!(session = %handle.session, "timer stopped");
    handle.task.abort();
}
