use crate::otp::{code::OneTimeCode, countdown::Countdown, digits::DigitBuffer};
use serde::Serialize;
use std::fmt;
use tokio::time::{Duration, Instant};
use ulid::Ulid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitingEmail,
    AwaitingCode,
    Verified,
    Expired,
    Failed,
}

impl Stage {
    /// Stages in which digits may be edited and submitted.
    #[must_use]
    pub fn accepts_code(self) -> bool {
        matches!(self, Self::AwaitingCode | Self::Failed)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AwaitingEmail => "awaiting email",
            Self::AwaitingCode => "awaiting code",
            Self::Verified => "verified",
            Self::Expired => "expired",
            Self::Failed => "failed",
        };
        formatter.write_str(name)
    }
}

/// One verification attempt, from email submission until it is replaced.
#[derive(Debug)]
pub struct Session {
    id: Ulid,
    email: String,
    code: OneTimeCode,
    expires_at: Instant,
    pub(crate) stage: Stage,
    pub(crate) digits: DigitBuffer,
    pub(crate) countdown: Countdown,
}

impl Session {
    pub(crate) fn new(email: String, code: OneTimeCode, ttl_seconds: u32, ttl: Duration) -> Self {
        Self {
            id: Ulid::new(),
            email,
            code,
            expires_at: Instant::now() + ttl,
            stage: Stage::AwaitingCode,
            digits: DigitBuffer::new(),
            countdown: Countdown::new(ttl_seconds),
        }
    }

    #[must_use]
    pub fn id(&self) -> Ulid {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub fn digits(&self) -> &DigitBuffer {
        &self.digits
    }

    #[must_use]
    pub fn countdown(&self) -> Countdown {
        self.countdown
    }

    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Expired once the countdown is spent or the deadline has passed,
    /// whichever comes first. The deadline covers ticks that arrive late.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.countdown.is_expired() || now >= self.expires_at
    }

    pub(crate) fn code(&self) -> &OneTimeCode {
        &self.code
    }
}
