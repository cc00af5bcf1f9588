//! Single-account platform session for gcforge.
//!
//! A [`Session`] drives one account from "not connected" to a terminal
//! [`Outcome`]:
//!
//! 1. **Connect**: through the [`ConnectionSupervisor`], with a bounded
//!    reconnect policy.
//! 2. **Log on**: presenting the device-authorization hash kept by the
//!    [`SentryStore`], and suspending for step-up codes when the platform
//!    asks for them ([`StepUpHandle`]).
//! 3. **Join the game coordinator**: announce presence, say hello, wait
//!    for the welcome.
//! 4. **Run one workflow**: the [`WorkflowDispatcher`] sends a report or
//!    a commendation and correlates the response.
//!
//! # How it fits in the stack
//!
//! ```text
//! gcforge (above)            ← config file, builder, tracing setup
//!     ↕
//! Session layer (this crate) ← state machine, policies, credentials
//!     ↕
//! Transport layer (below)    ← ClientEvent in, ClientCommand out
//! ```

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod machine;
mod outcome;
mod reputation;
mod sentry;
mod state;
mod step_up;
mod supervisor;
mod workflow;

pub use config::{AccountCredentials, SessionConfig, SessionOptions};
pub use error::{SentryError, SessionError, StepUpError};
pub use machine::{Session, SessionHandle};
pub use outcome::{Outcome, OutcomeSlot};
pub use reputation::{BanInfo, NoReputation, ReputationLookup};
pub use sentry::{SentryStore, SentryWrite};
pub use state::SessionState;
pub use step_up::{
    LogPrompt, StepUpCredential, StepUpHandle, StepUpKind, StepUpPrompt,
    StepUpRequest,
};
pub use supervisor::{ConnectionSupervisor, ReconnectDecision, should_reconnect};
pub use workflow::{GcRoute, WorkflowCompletion, WorkflowDispatcher, WorkflowRequest};
