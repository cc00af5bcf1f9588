//! # gcforge
//!
//! Automated platform sessions: connect, log on (including step-up codes
//! and device authorization), join the game coordinator, run exactly one
//! report or commend workflow, and report how it went.
//!
//! The work happens in the sub-crates; this crate ties them together:
//!
//! - [`GcforgeConfig`]: one JSON file describing the account, the
//!   workflow, the bridge and the timing knobs
//! - [`SessionBuilder`]: assembles a session from those pieces
//! - [`GcforgeError`]: one error type over every layer
//! - [`init_tracing`]: `RUST_LOG`-driven log output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gcforge::prelude::*;
//!
//! # async fn demo() -> Result<(), GcforgeError> {
//! gcforge::init_tracing();
//!
//! let config = GcforgeConfig::from_file("gcforge.json")?;
//! let (session, handle) = SessionBuilder::from_config(config).connect().await?;
//!
//! // Codes typed elsewhere go in through the handle.
//! let _ = handle.supply_authenticator_code("12345");
//!
//! let outcome = session.run().await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod error;
mod telemetry;

pub use builder::SessionBuilder;
pub use config::GcforgeConfig;
pub use error::GcforgeError;
pub use telemetry::init_tracing;

/// Everything needed to configure and run a session.
pub mod prelude {
    pub use crate::{GcforgeConfig, GcforgeError, SessionBuilder, init_tracing};

    pub use gcforge_protocol::{EResult, SteamId};
    pub use gcforge_session::{
        AccountCredentials, BanInfo, LogPrompt, NoReputation, Outcome, ReputationLookup, Session,
        SessionConfig, SessionHandle, SessionState, StepUpError, StepUpHandle, StepUpKind,
        StepUpPrompt, StepUpRequest, WorkflowRequest,
    };
    pub use gcforge_transport::{BridgeTransport, ChannelPeer, ChannelTransport, Transport};
}
