//! The verification state machine.
//!
//! `AwaitingEmail -> AwaitingCode -> {Verified | Expired | Failed}`. A failed
//! attempt keeps the session and its countdown running; expiry and
//! verification close it. A valid email in any stage replaces the session, and
//! [`OtpFlow::reset`] drops it entirely.

use crate::otp::{
    code::{CodeSource, RandomCode},
    countdown::Countdown,
    delivery::{CodeSender, LogCodeSender},
    digits::{self, DigitBuffer},
    email::{normalize_email, valid_email},
    error::{FlowError, ValidationError},
    session::{Session, Stage},
    status::Status,
    FlowConfig,
};
use std::{fmt, sync::Arc};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use ulid::Ulid;

pub struct OtpFlow {
    config: FlowConfig,
    codes: Box<dyn CodeSource>,
    sender: Arc<dyn CodeSender>,
    session: Option<Session>,
    message: Option<Status>,
}

impl OtpFlow {
    #[must_use]
    pub fn new(
        config: FlowConfig,
        codes: Box<dyn CodeSource>,
        sender: Arc<dyn CodeSender>,
    ) -> Self {
        Self {
            config,
            codes,
            sender,
            session: None,
            message: None,
        }
    }

    /// Random codes, delivered to the log only.
    #[must_use]
    pub fn with_defaults(config: FlowConfig) -> Self {
        Self::new(config, Box::new(RandomCode), Arc::new(LogCodeSender))
    }

    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.session
            .as_ref()
            .map_or(Stage::AwaitingEmail, Session::stage)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Last message shown to the user.
    #[must_use]
    pub fn message(&self) -> Option<&Status> {
        self.message.as_ref()
    }

    #[must_use]
    pub fn countdown(&self) -> Option<Countdown> {
        self.session.as_ref().map(Session::countdown)
    }

    #[must_use]
    pub fn digits(&self) -> Option<&DigitBuffer> {
        self.session.as_ref().map(Session::digits)
    }

    /// The session that needs a running timer, if any.
    #[must_use]
    pub fn active_session(&self) -> Option<Ulid> {
        self.session
            .as_ref()
            .filter(|session| session.stage().accepts_code() && !session.countdown().is_expired())
            .map(Session::id)
    }

    /// Start a fresh session for `email`, discarding any previous one.
    ///
    /// # Errors
    /// Returns a validation error for an empty or malformed address, in which
    /// case the current session is left as it was, or `FlowError::Delivery` if
    /// the code could not be handed to the sender.
    #[instrument(skip(self))]
    pub fn submit_email(&mut self, email: &str) -> Result<Status, FlowError> {
        let result = self.start_session(email);
        self.record(result)
    }

    fn start_session(&mut self, email: &str) -> Result<Status, FlowError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ValidationError::EmailRequired.into());
        }
        if !valid_email(&email) {
            debug!("rejected malformed email");
            return Err(ValidationError::InvalidEmail.into());
        }

        let code = self.codes.generate();
        self.sender.send(&email, &code).map_err(|err| {
            warn!("code delivery failed: {err}");
            FlowError::Delivery(err.to_string())
        })?;

        let session = Session::new(email, code, self.config.ttl_seconds(), self.config.ttl());
        let remaining = session.countdown();
        info!(session = %session.id(), email = %session.email(), "code issued");

        if let Some(previous) = self.session.replace(session) {
            debug!(session = %previous.id(), "previous session discarded");
        }

        Ok(Status::CodeSent { remaining })
    }

    /// Set slot `index` to `value` (one digit, or empty to clear). Returns the new focus.
    ///
    /// # Errors
    /// Returns an error when no session accepts digits or the value is rejected.
    #[instrument(skip(self, value))]
    pub fn edit_digit(&mut self, index: usize, value: &str) -> Result<usize, FlowError> {
        let session = self.accepting_session()?;
        session.digits = digits::edit(&session.digits, index, value)?;
        Ok(session.digits.focus())
    }

    /// Backspace on slot `index`. Returns the new focus.
    ///
    /// # Errors
    /// Returns an error when no session accepts digits or the index is out of range.
    #[instrument(skip(self))]
    pub fn backspace(&mut self, index: usize) -> Result<usize, FlowError> {
        let session = self.accepting_session()?;
        session.digits = digits::backspace(&session.digits, index)?;
        Ok(session.digits.focus())
    }

    /// Type `text` starting at the focused slot. Returns the new focus.
    ///
    /// # Errors
    /// Returns an error when no session accepts digits, `text` holds a non-digit,
    /// or `text` would run past a filled slot.
    #[instrument(skip_all)]
    pub fn type_digits(&mut self, text: &str) -> Result<usize, FlowError> {
        let session = self.accepting_session()?;
        session.digits = digits::type_at_focus(&session.digits, text)?;
        Ok(session.digits.focus())
    }

    fn accepting_session(&mut self) -> Result<&mut Session, FlowError> {
        let session = self.session.as_mut().ok_or(FlowError::NoSession)?;
        if session.stage.accepts_code() {
            Ok(session)
        } else {
            Err(FlowError::Closed(session.stage))
        }
    }

    /// Compare the entered digits with the issued code.
    ///
    /// # Errors
    /// `FlowError::Expired` once the countdown has run out (repeatedly, until a
    /// new email), `FlowError::Mismatch` for a wrong code, or a validation
    /// error while slots are still empty.
    #[instrument(skip(self))]
    pub fn submit_code(&mut self) -> Result<Status, FlowError> {
        let result = self.verify();
        self.record(result)
    }

    fn verify(&mut self) -> Result<Status, FlowError> {
        let session = self.session.as_mut().ok_or(FlowError::NoSession)?;

        match session.stage {
            Stage::Verified => return Ok(Status::Verified),
            Stage::Expired => return Err(FlowError::Expired),
            Stage::AwaitingEmail | Stage::AwaitingCode | Stage::Failed => {}
        }

        let candidate = session.digits.candidate()?;

        if session.is_expired(Instant::now()) {
            session.stage = Stage::Expired;
            info!(session = %session.id(), "submit after expiry");
            return Err(FlowError::Expired);
        }

        if session.code().matches(&candidate) {
            session.stage = Stage::Verified;
            info!(session = %session.id(), "code verified");
            Ok(Status::Verified)
        } else {
            session.stage = Stage::Failed;
            info!(session = %session.id(), "code mismatch");
            Err(FlowError::Mismatch)
        }
    }

    /// Apply one timer tick for session `id`.
    ///
    /// Returns the new countdown, or `None` for a tick that no longer belongs
    /// to a code-accepting session.
    pub fn tick(&mut self, id: Ulid) -> Option<Countdown> {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.id() == id && session.stage.accepts_code())
        else {
            debug!(session = %id, "stale tick ignored");
            return None;
        };

        if session.countdown.tick() {
            session.stage = Stage::Expired;
            info!(session = %session.id(), "code expired");
            self.message = Some(Status::Expired);
        }

        self.countdown()
    }

    /// Drop the session and start over, like reloading the page.
    pub fn reset(&mut self) -> Status {
        if let Some(session) = self.session.take() {
            debug!(session = %session.id(), "session reset");
        }
        self.message = None;
        Status::Idle
    }

    fn record(&mut self, result: Result<Status, FlowError>) -> Result<Status, FlowError> {
        match &result {
            Ok(status) => self.message = Some(status.clone()),
            Err(err) => {
                if let Some(status) = Status::from_error(err) {
                    self.message = Some(status);
                }
            }
        }
        result
    }
}

impl fmt::Debug for OtpFlow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OtpFlow")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
