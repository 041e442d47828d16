//! Event loop that owns an [`OtpFlow`].
//!
//! User events and timer ticks arrive on separate channels and are handled one
//! at a time, so the flow is only ever touched from this task. After each
//! event the timer is reconciled against [`OtpFlow::active_session`]: it is
//! started for a new session and stopped on every path that leaves the
//! code-accepting stages, including the runner's own exit.

use crate::otp::{
    display::DisplaySink,
    flow::OtpFlow,
    session::Stage,
    status::Status,
    timer::{start_timer, stop_timer, TimerHandle},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use ulid::Ulid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowEvent {
    /// Email form submitted.
    Email(String),
    /// Change event on one slot; empty `value` clears it.
    Digit { index: usize, value: String },
    Backspace { index: usize },
    /// Characters typed or pasted at the focused slot.
    Type(String),
    Submit,
    /// Start over, discarding the session.
    Reset,
    Shutdown,
}

pub struct Runner<S> {
    flow: OtpFlow,
    sink: S,
    events: mpsc::UnboundedReceiver<FlowEvent>,
    ticks_tx: mpsc::UnboundedSender<Ulid>,
    ticks: mpsc::UnboundedReceiver<Ulid>,
    timer: Option<TimerHandle>,
}

impl<S: DisplaySink> Runner<S> {
    /// Build a runner and the sender used to feed it events.
    pub fn new(flow: OtpFlow, sink: S) -> (Self, mpsc::UnboundedSender<FlowEvent>) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (ticks_tx, ticks) = mpsc::unbounded_channel();

        let runner = Self {
            flow,
            sink,
            events,
            ticks_tx,
            ticks,
            timer: None,
        };

        (runner, events_tx)
    }

    /// Process events until `Shutdown` or until every event sender is dropped.
    ///
    /// Returns the flow so callers can inspect the final state.
    pub async fn run(mut self) -> OtpFlow {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(FlowEvent::Shutdown) | None => break,
                    Some(event) => self.handle(event),
                },
                Some(session) = self.ticks.recv() => self.on_tick(session),
            }

            self.reconcile_timer();
        }

        if let Some(timer) = self.timer.take() {
            stop_timer(timer);
        }

        info!(stage = %self.flow.stage(), "runner stopped");

        self.flow
    }

    fn handle(&mut self, event: FlowEvent) {
        let result = match event {
            FlowEvent::Email(email) => self.flow.submit_email(&email).map(Some),
            FlowEvent::Digit { index, value } => self.flow.edit_digit(index, &value).map(|_| None),
            FlowEvent::Backspace { index } => self.flow.backspace(index).map(|_| None),
            // digits typed before any code was requested are an email attempt
            FlowEvent::Type(text) if self.flow.session().is_none() => {
                self.flow.submit_email(&text).map(Some)
            }
            FlowEvent::Type(text) => self.flow.type_digits(&text).map(|_| None),
            FlowEvent::Submit => self.flow.submit_code().map(Some),
            FlowEvent::Reset => Ok(Some(self.flow.reset())),
            FlowEvent::Shutdown => Ok(None),
        };

        match result {
            Ok(Some(status)) => self.publish_status(&status),
            Ok(None) => self.publish_digits(),
            Err(err) => match Status::from_error(&err) {
                Some(status) => self.publish_status(&status),
                None => debug!("input rejected: {err}"),
            },
        }
    }

    fn on_tick(&mut self, session: Ulid) {
        let Some(countdown) = self.flow.tick(session) else {
            return;
        };

        if let Err(err) = self.sink.show_countdown(countdown) {
            error!("display sink failed: {err}");
        }

        if self.flow.stage() == Stage::Expired {
            self.publish_status(&Status::Expired);
        }
    }

    fn reconcile_timer(&mut self) {
        let wanted = self.flow.active_session();
        let current = self.timer.as_ref().map(TimerHandle::session);
        if wanted == current {
            return;
        }

        if let Some(timer) = self.timer.take() {
            stop_timer(timer);
        }

        if let Some(session) = wanted {
            let tick = self.flow.config().tick();
            self.timer = Some(start_timer(session, tick, self.ticks_tx.clone()));
        }
    }

    fn publish_status(&mut self, status: &Status) {
        if let Err(err) = self.sink.show_status(self.flow.stage(), status) {
            error!("display sink failed: {err}");
        }
    }

    fn publish_digits(&mut self) {
        let Some(digits) = self.flow.digits() else {
            return;
        };
        if let Err(err) = self.sink.show_digits(digits) {
            error!("display sink failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::{
        code::FixedCode, delivery::LogCodeSender, display::testing::RecordingSink, FlowConfig,
    };
    use std::sync::Arc;
    use tokio::time::{sleep, Duration};

    const SENT: &str = "OTP sent, expires in 03:00";

    fn runner(sink: RecordingSink) -> (Runner<RecordingSink>, mpsc::UnboundedSender<FlowEvent>) {
        let flow = OtpFlow::new(
            FlowConfig::default(),
            Box::new(FixedCode::new("482913")),
            Arc::new(LogCodeSender),
        );
        Runner::new(flow, sink)
    }

    fn email() -> FlowEvent {
        FlowEvent::Email("a@b.com".to_string())
    }

    fn typed(code: &str) -> FlowEvent {
        FlowEvent::Type(code.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn correct_code_within_time_verifies() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(typed("482913")).unwrap();
        tx.send(FlowEvent::Submit).unwrap();
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::Verified);
        assert_eq!(sink.messages(), vec![SENT, "OTP Verified Successfully!"]);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_code_reports_mismatch() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(typed("000000")).unwrap();
        tx.send(FlowEvent::Submit).unwrap();
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::Failed);
        assert_eq!(sink.messages(), vec![SENT, "Invalid OTP. Try again."]);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_countdown_reports_expired() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(typed("482913")).unwrap();
        sleep(Duration::from_secs(181)).await;
        tx.send(FlowEvent::Submit).unwrap();
        tx.send(FlowEvent::Submit).unwrap();
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::Expired);

        let expired = "OTP expired. Please refresh and try again.";
        assert_eq!(sink.messages(), vec![SENT, expired, expired, expired]);

        let countdowns = sink.countdowns();
        assert_eq!(countdowns.len(), 180);
        assert_eq!(countdowns.first(), Some(&179));
        assert_eq!(countdowns.last(), Some(&0));
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_stops_after_verification() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(typed("482913")).unwrap();
        tx.send(FlowEvent::Submit).unwrap();
        sleep(Duration::from_secs(10)).await;
        tx.send(FlowEvent::Shutdown).unwrap();

        task.await.unwrap();
        assert!(sink.countdowns().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_keeps_running_after_mismatch() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(typed("000000")).unwrap();
        tx.send(FlowEvent::Submit).unwrap();
        sleep(Duration::from_millis(3_500)).await;
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(sink.countdowns(), vec![179, 178, 177]);
        assert_eq!(flow.countdown().map(|c| c.remaining()), Some(177));
    }

    #[tokio::test(start_paused = true)]
    async fn new_email_restarts_countdown() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        sleep(Duration::from_millis(2_500)).await;
        tx.send(email()).unwrap();
        sleep(Duration::from_millis(1_500)).await;
        tx.send(FlowEvent::Shutdown).unwrap();

        task.await.unwrap();
        assert_eq!(sink.countdowns(), vec![179, 178, 179]);
        assert_eq!(sink.messages(), vec![SENT, SENT]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_timer() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(FlowEvent::Reset).unwrap();
        sleep(Duration::from_secs(5)).await;
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::AwaitingEmail);
        assert!(sink.countdowns().is_empty());
        assert_eq!(sink.messages(), vec![SENT, "Enter your email"]);
    }

    #[tokio::test(start_paused = true)]
    async fn digit_edits_are_pushed() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        tx.send(FlowEvent::Digit {
            index: 0,
            value: "4".to_string(),
        })
        .unwrap();
        tx.send(FlowEvent::Digit {
            index: 1,
            value: "x".to_string(),
        })
        .unwrap();
        tx.send(FlowEvent::Backspace { index: 1 }).unwrap();
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.digits().map(|d| d.focus()), Some(0));

        let digits: Vec<_> = sink
            .shown()
            .into_iter()
            .filter(|shown| matches!(shown, crate::otp::display::testing::Shown::Digits(_)))
            .collect();
        assert_eq!(digits.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_channel_stops_the_runner() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(email()).unwrap();
        drop(tx);

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::AwaitingCode);
    }

    #[tokio::test(start_paused = true)]
    async fn digits_without_session_are_reported_as_invalid_email() {
        let sink = RecordingSink::default();
        let (runner, tx) = runner(sink.clone());
        let task = tokio::spawn(runner.run());

        tx.send(typed("123456")).unwrap();
        tx.send(FlowEvent::Shutdown).unwrap();

        let flow = task.await.unwrap();
        assert_eq!(flow.stage(), Stage::AwaitingEmail);
        assert_eq!(sink.messages(), vec!["Invalid email address"]);
    }
}
