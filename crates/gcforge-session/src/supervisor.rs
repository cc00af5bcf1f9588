//! The connection supervisor: attempt counting and the reconnect policy.
//!
//! The supervisor owns no I/O. The session tells it what happened to the
//! link and it answers with a [`ReconnectDecision`]; the session turns
//! that into a scheduled timer or a terminal outcome.
//!
//! The attempt counter only ever goes up. A successful connect does not
//! reset it, so the budget covers the whole life of the session.

use std::time::Duration;

use crate::{Outcome, SessionConfig};

/// What to do after the link failed or went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Connect again once the delay has passed.
    RetryAfter(Duration),
    /// Stop trying; the session is over.
    GiveUp,
}

/// The reconnect rule for a dropped link.
///
/// Reconnect iff
/// `(attempts <= max_attempts && outcome ∉ {Success, AlreadyLoggedInElsewhere}) || still_running`.
///
/// `still_running` wins on its own: a session that has not finished
/// keeps reconnecting after its budget is spent. Only a finished
/// session (or one with an external stop) is bound by the budget.
pub fn should_reconnect(
    attempts: u32,
    max_attempts: u32,
    outcome: Outcome,
    still_running: bool,
) -> bool {
    let within_budget = attempts <= max_attempts
        && !matches!(outcome, Outcome::Success | Outcome::AlreadyLoggedInElsewhere);
    within_budget || still_running
}

/// Tracks connection attempts for one session.
#[derive(Debug, Clone)]
pub struct ConnectionSupervisor {
    attempts: u32,
    max_attempts: u32,
    backoff: Duration,
    link_up: bool,
}

impl ConnectionSupervisor {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            backoff,
            link_up: false,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.max_reconnects, config.reconnect_backoff())
    }

    /// Failed or dropped connections so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_link_up(&self) -> bool {
        self.link_up
    }

    /// The link came up. The counter is left alone.
    pub fn on_connected(&mut self) {
        self.link_up = true;
    }

    /// A connection attempt was refused.
    ///
    /// Retries until `max_attempts` failures have been counted, so with
    /// the default budget of 5 there are 5 connects in total, never a 6th.
    pub fn on_connect_failed(&mut self) -> ReconnectDecision {
        self.link_up = false;
        self.attempts += 1;
        if self.attempts < self.max_attempts {
            ReconnectDecision::RetryAfter(self.backoff)
        } else {
            ReconnectDecision::GiveUp
        }
    }

    /// The link went down. See [`should_reconnect`].
    pub fn on_disconnected(&mut self, outcome: Outcome, still_running: bool) -> ReconnectDecision {
        self.link_up = false;
        self.attempts += 1;
        if should_reconnect(self.attempts, self.max_attempts, outcome, still_running) {
            ReconnectDecision::RetryAfter(self.backoff)
        } else {
            ReconnectDecision::GiveUp
        }
    }
}
