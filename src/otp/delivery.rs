//! Simulated code delivery.
//!
//! Nothing here sends mail. A real deployment would implement [`CodeSender`]
//! against SMTP or a mail API; the default [`LogCodeSender`] only records that
//! a code went out.

use crate::otp::code::OneTimeCode;
use anyhow::Result;
use tracing::info;

/// Delivery abstraction used when a session starts.
pub trait CodeSender: Send + Sync {
    /// Deliver a code or return an error so the session is not started.
    fn send(&self, email: &str, code: &OneTimeCode) -> Result<()>;
}

/// Logs the recipient and never the code.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCodeSender;

impl CodeSender for LogCodeSender {
    fn send(&self, email: &str, _code: &OneTimeCode) -> Result<()> {
        info!(to_email = %email, "code delivery stub");
        Ok(())
    }
}
