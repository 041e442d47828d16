use crate::otp::session::Stage;
use thiserror::Error;

/// Input rejected before it reaches the session.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Must be a number")]
    NotADigit { index: usize },
    #[error("slot {index} is already filled")]
    SlotFilled { index: usize },
    #[error("slot {index} is out of range")]
    SlotOutOfRange { index: usize },
    #[error("All 6 digits are required")]
    Incomplete { missing: Vec<usize> },
}

#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("OTP expired. Please refresh and try again.")]
    Expired,
    #[error("Invalid OTP. Try again.")]
    Mismatch,
    #[error("no code has been requested yet")]
    NoSession,
    #[error("digits cannot be edited once the session is {0}")]
    Closed(Stage),
    #[error("code delivery failed: {0}")]
    Delivery(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_text() {
        assert_eq!(
            FlowError::Expired.to_string(),
            "OTP expired. Please refresh and try again."
        );
        assert_eq!(FlowError::Mismatch.to_string(), "Invalid OTP. Try again.");
        assert_eq!(
            FlowError::from(ValidationError::InvalidEmail).to_string(),
            "Invalid email address"
        );
    }

    #[test]
    fn closed_names_the_stage() {
        let err = FlowError::Closed(Stage::Verified);
        assert_eq!(
            err.to_string(),
            "digits cannot be edited once the session is verified"
        );
    }
}
