use serde::Serialize;
use std::fmt;

/// Seconds left before a code expires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Countdown(u32);

impl Countdown {
    #[must_use]
    pub fn new(seconds: u32) -> Self {
        Self(seconds)
    }

    #[must_use]
    pub fn remaining(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_expired(self) -> bool {
        self.0 == 0
    }

    /// Decrement by one second, saturating at zero.
    ///
    /// Returns `true` only on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.0 == 0 {
            return false;
        }
        self.0 -= 1;
        self.0 == 0
    }
}

// MM:SS, minutes are not capped at 59
impl fmt::Display for Countdown {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}
