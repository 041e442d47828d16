//! One-time passcode verification flow.
//!
//! An email address is submitted, a 6-digit code is generated and handed to a
//! [`CodeSender`], a countdown starts, and the user fills six digit slots
//! before submitting them for comparison.
//!
//! [`OtpFlow`] holds all state transitions and never touches a clock or a
//! task. [`Runner`] owns a flow, merges user events with timer ticks on a
//! single consumer and pushes every change to a [`DisplaySink`].

pub mod code;
pub mod countdown;
pub mod delivery;
pub mod digits;
pub mod display;
pub mod email;
pub mod error;
pub mod flow;
pub mod runner;
pub mod session;
pub mod status;
pub mod timer;

pub use self::code::{CodeSource, FixedCode, OneTimeCode, RandomCode};
pub use self::countdown::Countdown;
pub use self::delivery::{CodeSender, LogCodeSender};
pub use self::digits::DigitBuffer;
pub use self::display::{DisplaySink, JsonSink, TextSink};
pub use self::error::{FlowError, ValidationError};
pub use self::flow::OtpFlow;
pub use self::runner::{FlowEvent, Runner};
pub use self::session::{Session, Stage};
pub use self::status::Status;
pub use self::timer::{start_timer, stop_timer, TimerHandle};

use std::time::Duration;

/// Number of digit slots in a code.
pub const CODE_LENGTH: usize = 6;

/// Seconds a code stays valid unless configured otherwise.
pub const DEFAULT_TTL_SECONDS: u32 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowConfig {
    ttl_seconds: u32,
    tick: Duration,
}

impl FlowConfig {
    /// Default config: 180 second codes, one tick per second.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl_seconds: DEFAULT_TTL_SECONDS,
            tick: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: u32) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> u32 {
        self.ttl_seconds
    }

    #[must_use]
    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Total lifetime of a code, `ttl_seconds` ticks.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.tick.saturating_mul(self.ttl_seconds)
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::new()
    }
}
