//! User-facing status messages.

use crate::otp::{
    countdown::Countdown,
    error::{FlowError, ValidationError},
};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Idle,
    CodeSent { remaining: Countdown },
    Verified,
    Mismatch,
    Expired,
    InvalidEmail,
    EmailRequired,
    Incomplete { missing: Vec<usize> },
}

impl Status {
    /// Status to show for an error, `None` when the input is rejected silently.
    #[must_use]
    pub fn from_error(err: &FlowError) -> Option<Self> {
        match err {
            FlowError::Expired => Some(Self::Expired),
            FlowError::Mismatch => Some(Self::Mismatch),
            FlowError::Validation(ValidationError::InvalidEmail) => Some(Self::InvalidEmail),
            FlowError::Validation(ValidationError::EmailRequired) => Some(Self::EmailRequired),
            FlowError::Validation(ValidationError::Incomplete { missing }) => {
                Some(Self::Incomplete {
                    missing: missing.clone(),
                })
            }
            FlowError::Validation(
                ValidationError::NotADigit { .. }
                | ValidationError::SlotFilled { .. }
                | ValidationError::SlotOutOfRange { .. },
            )
            | FlowError::NoSession
            | FlowError::Closed(_)
            | FlowError::Delivery(_) => None,
        }
    }

    /// Whether the message reports a problem.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Idle | Self::CodeSent { .. } | Self::Verified)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => formatter.write_str("Enter your email"),
            Self::CodeSent { remaining } => write!(formatter, "OTP sent, expires in {remaining}"),
            Self::Verified => formatter.write_str("OTP Verified Successfully!"),
            Self::Mismatch => formatter.write_str("Invalid OTP. Try again."),
            Self::Expired => formatter.write_str("OTP expired. Please refresh and try again."),
            Self::InvalidEmail => formatter.write_str("Invalid email address"),
            Self::EmailRequired => formatter.write_str("Email is required"),
            Self::Incomplete { .. } => formatter.write_str("All 6 digits are required"),
        }
    }
}
