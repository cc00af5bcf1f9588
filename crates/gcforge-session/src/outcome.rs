//! The session's terminal result and the write-once slot that holds it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionError;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Nothing decided yet.
    Pending,
    /// The workflow completed.
    Success,
    /// The account has a ban on record.
    AccountBanned,
    /// Another client is logged on to the account.
    AlreadyLoggedInElsewhere,
    /// The platform is down.
    ServiceUnavailable,
    /// Anything else that ended the session.
    Failure,
}

impl Outcome {
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Success => "Success",
            Self::AccountBanned => "AccountBanned",
            Self::AlreadyLoggedInElsewhere => "AlreadyLoggedInElsewhere",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::Failure => "Failure",
        };
        f.write_str(name)
    }
}

/// Holds an [`Outcome`] that can be decided exactly once.
///
/// Starts as `Pending`. The first non-pending write sticks, with one
/// exception: `AccountBanned` is an annotation made at logon, and a later
/// session-ending failure (`AlreadyLoggedInElsewhere`, `ServiceUnavailable`
/// or `Failure`) replaces it. A later `Success` never does, so a banned
/// account that finishes its workflow still reports the ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeSlot {
    value: Outcome,
}

impl OutcomeSlot {
    pub fn new() -> Self {
        Self {
            value: Outcome::Pending,
        }
    }

    /// The current value.
    pub fn get(&self) -> Outcome {
        self.value
    }

    /// `true` once a non-pending outcome has been recorded.
    pub fn is_decided(&self) -> bool {
        !self.value.is_pending()
    }

    /// Records `outcome` if nothing has been decided yet, or if it
    /// supersedes a ban annotation.
    ///
    /// Recording `Pending` changes nothing and always succeeds.
    ///
    /// # Errors
    /// [`SessionError::OutcomeAlreadySet`] if a different outcome was
    /// already recorded. Re-recording the same outcome is refused too.
    pub fn record(&mut self, outcome: Outcome) -> Result<(), SessionError> {
        if outcome.is_pending() {
            return Ok(());
        }
        if self.is_decided() && !self.supersedes_ban(outcome) {
            return Err(SessionError::OutcomeAlreadySet {
                current: self.value,
                rejected: outcome,
            });
        }
        self.value = outcome;
        Ok(())
    }

    fn supersedes_ban(&self, outcome: Outcome) -> bool {
        self.value == Outcome::AccountBanned
            && matches!(
                outcome,
                Outcome::AlreadyLoggedInElsewhere | Outcome::ServiceUnavailable | Outcome::Failure
            )
    }
}

impl Default for OutcomeSlot {
    fn default() -> Self {
        Self::new()
    }
}
