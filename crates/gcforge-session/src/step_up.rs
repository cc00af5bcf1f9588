//! Step-up authentication: the extra code the platform sometimes wants.
//!
//! When a logon is answered with "needs two factor" or "logon denied,
//! check your email", the session suspends and asks a [`StepUpPrompt`]
//! for a code. Whoever ends up holding the [`StepUpHandle`] (a person at
//! a terminal, a TOTP generator, a test) supplies it later.
//!
//! # The handoff
//!
//! ```text
//! StepUpPrompt::request_code(request, handle)
//!        │
//!        ▼  (any time later, any task)
//! handle.supply_authenticator_code("12345")
//!        │  single-slot mpsc
//!        ▼
//! StepUpAuthenticator::recv()  ──► accept() ──► held for the next LogOn
//! ```
//!
//! The slot holds one code. A second code while the first is still
//! undelivered is refused with [`StepUpError::SlotFull`], so a code is
//! never silently overwritten.

use std::fmt;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::StepUpError;

/// Which kind of code the platform asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepUpKind {
    /// A code mailed to the account's address (the logon "auth code").
    EmailCode,
    /// A code from the account's authenticator app (the "two-factor code").
    AuthenticatorCode,
}

impl fmt::Display for StepUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailCode => f.write_str("email code"),
            Self::AuthenticatorCode => f.write_str("authenticator code"),
        }
    }
}

/// A code on its way to the session. Consumed once, then gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpCredential {
    pub kind: StepUpKind,
    pub value: String,
    pub supplied_at: Instant,
}

/// What the session tells the prompt when it needs a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepUpRequest {
    pub kind: StepUpKind,
    /// Where the emailed code went. Only set for [`StepUpKind::EmailCode`],
    /// and only for display.
    pub email_domain: Option<String>,
    /// The account being logged on.
    pub username: String,
}

/// Asks someone for a step-up code.
///
/// `request_code` must not block: it should hand `responder` off (to a
/// task, a UI, a queue) and return. The session keeps running its event
/// loop while it waits.
///
/// # Example
///
/// ```rust
/// use gcforge_session::{StepUpHandle, StepUpPrompt, StepUpRequest};
///
/// /// Answers every request with a fixed code. Tests only.
/// struct FixedCode(&'static str);
///
/// impl StepUpPrompt for FixedCode {
///     fn request_code(&self, request: StepUpRequest, responder: StepUpHandle) {
///         let _ = responder.supply(request.kind, self.0);
///     }
/// }
/// ```
pub trait StepUpPrompt: Send + 'static {
    /// Called each time the session suspends for a code.
    fn request_code(&self, request: StepUpRequest, responder: StepUpHandle);
}

/// A prompt that only logs the request. Codes must then arrive through
/// [`SessionHandle`](crate::SessionHandle).
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPrompt;

impl StepUpPrompt for LogPrompt {
    fn request_code(&self, request: StepUpRequest, _responder: StepUpHandle) {
        tracing::info!(
            account = %request.username,
            kind = %request.kind,
            email_domain = request.email_domain.as_deref().unwrap_or("-"),
            "step-up code required"
        );
    }
}

// ---------------------------------------------------------------------------
// StepUpHandle
// ---------------------------------------------------------------------------

/// The supplier's side of the handoff. Cheap to clone.
#[derive(Debug, Clone)]
pub struct StepUpHandle {
    tx: mpsc::Sender<StepUpCredential>,
}

impl StepUpHandle {
    /// Supplies the code that was mailed to the account.
    pub fn supply_email_code(&self, code: &str) -> Result<(), StepUpError> {
        self.supply(StepUpKind::EmailCode, code)
    }

    /// Supplies a code from the authenticator app.
    pub fn supply_authenticator_code(&self, code: &str) -> Result<(), StepUpError> {
        self.supply(StepUpKind::AuthenticatorCode, code)
    }

    /// Supplies a code of the given kind.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// - [`StepUpError::EmptyCode`] if nothing is left after trimming
    /// - [`StepUpError::SlotFull`] if an earlier code is still undelivered
    /// - [`StepUpError::SessionClosed`] if the session has ended
    pub fn supply(&self, kind: StepUpKind, code: &str) -> Result<(), StepUpError> {
        let value = code.trim();
        if value.is_empty() {
            return Err(StepUpError::EmptyCode);
        }
        let credential = StepUpCredential {
            kind,
            value: value.to_owned(),
            supplied_at: Instant::now(),
        };
        self.tx.try_send(credential).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => StepUpError::SlotFull,
            mpsc::error::TrySendError::Closed(_) => StepUpError::SessionClosed,
        })
    }
}

// ---------------------------------------------------------------------------
// StepUpAuthenticator
// ---------------------------------------------------------------------------

/// The session's side of the handoff.
///
/// Tracks which code the session is waiting for and holds accepted codes
/// until the next logon takes them.
pub(crate) struct StepUpAuthenticator {
    rx: mpsc::Receiver<StepUpCredential>,
    waiting_for: Option<StepUpKind>,
    auth_code: Option<String>,
    two_factor_code: Option<String>,
}

impl StepUpAuthenticator {
    /// Creates the authenticator and the first handle to it.
    pub(crate) fn channel() -> (Self, StepUpHandle) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                rx,
                waiting_for: None,
                auth_code: None,
                two_factor_code: None,
            },
            StepUpHandle { tx },
        )
    }

    /// Starts waiting for a code of `kind`.
    pub(crate) fn begin(&mut self, kind: StepUpKind) {
        self.waiting_for = Some(kind);
    }

    pub(crate) fn waiting_for(&self) -> Option<StepUpKind> {
        self.waiting_for
    }

    pub(crate) fn is_waiting(&self) -> bool {
        self.waiting_for.is_some()
    }

    /// Next delivered code. `None` once every handle is gone.
    ///
    /// Cancel-safe.
    pub(crate) async fn recv(&mut self) -> Option<StepUpCredential> {
        self.rx.recv().await
    }

    /// Takes `credential` if it is the kind being waited for.
    ///
    /// Returns `false` (and keeps waiting) for a code of the other kind.
    pub(crate) fn accept(&mut self, credential: StepUpCredential) -> bool {
        if self.waiting_for != Some(credential.kind) {
            tracing::warn!(
                supplied = %credential.kind,
                waiting_for = ?self.waiting_for,
                "discarding step-up code of the wrong kind"
            );
            return false;
        }
        match credential.kind {
            StepUpKind::EmailCode => self.auth_code = Some(credential.value),
            StepUpKind::AuthenticatorCode => self.two_factor_code = Some(credential.value),
        }
        self.waiting_for = None;
        true
    }

    /// Hands the held codes to a logon: `(auth_code, two_factor_code)`.
    ///
    /// Each code is attached to exactly one logon attempt.
    pub(crate) fn take_codes(&mut self) -> (Option<String>, Option<String>) {
        (self.auth_code.take(), self.two_factor_code.take())
    }
}
