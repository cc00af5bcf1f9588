//! `SessionBuilder`: assembles a [`Session`] from its pieces.

use std::path::PathBuf;

use gcforge_session::{
    AccountCredentials, LogPrompt, NoReputation, ReputationLookup, SentryStore, Session,
    SessionConfig, SessionHandle, SessionOptions, StepUpPrompt, WorkflowRequest,
};
use gcforge_transport::{BridgeTransport, Transport};

use crate::{GcforgeConfig, GcforgeError};

/// Builder for configuring a session.
///
/// Credentials and a workflow are required; everything else has a
/// default. The prompt and reputation collaborators change the builder's
/// type, so they can be set in any order.
///
/// # Example
///
/// ```rust,no_run
/// use gcforge::prelude::*;
///
/// # async fn demo() -> Result<(), GcforgeError> {
/// let (session, handle) = SessionBuilder::new()
///     .credentials(AccountCredentials::new("alice", "hunter2"))
///     .workflow(WorkflowRequest::Commend { target: SteamId(76561197960287930) })
///     .bridge("ws://127.0.0.1:27080")
///     .sentry_dir("sentries")
///     .connect()
///     .await?;
/// let outcome = session.run().await;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder<P = LogPrompt, R = NoReputation> {
    credentials: Option<AccountCredentials>,
    workflow: Option<WorkflowRequest>,
    bridge_url: String,
    sentry_dir: PathBuf,
    session_config: SessionConfig,
    prompt: P,
    reputation: R,
}

impl SessionBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            credentials: None,
            workflow: None,
            bridge_url: "ws://127.0.0.1:27080".to_string(),
            sentry_dir: PathBuf::from("sentries"),
            session_config: SessionConfig::default(),
            prompt: LogPrompt,
            reputation: NoReputation,
        }
    }

    /// A builder pre-filled from a configuration file.
    pub fn from_config(config: GcforgeConfig) -> Self {
        Self {
            credentials: Some(config.account),
            workflow: Some(config.workflow),
            bridge_url: config.bridge_url,
            sentry_dir: config.sentry_dir,
            session_config: config.session,
            prompt: LogPrompt,
            reputation: NoReputation,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: StepUpPrompt, R: ReputationLookup> SessionBuilder<P, R> {
    /// Sets the account to log on with.
    pub fn credentials(mut self, credentials: AccountCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Sets the workflow to run.
    pub fn workflow(mut self, workflow: WorkflowRequest) -> Self {
        self.workflow = Some(workflow);
        self
    }

    /// Sets the protocol bridge URL used by [`connect`](Self::connect).
    pub fn bridge(mut self, url: &str) -> Self {
        self.bridge_url = url.to_string();
        self
    }

    /// Sets the directory that holds sentry files.
    pub fn sentry_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sentry_dir = dir.into();
        self
    }

    /// Sets the session timing configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets who gets asked for step-up codes.
    pub fn prompt<P2: StepUpPrompt>(self, prompt: P2) -> SessionBuilder<P2, R> {
        SessionBuilder {
            credentials: self.credentials,
            workflow: self.workflow,
            bridge_url: self.bridge_url,
            sentry_dir: self.sentry_dir,
            session_config: self.session_config,
            prompt,
            reputation: self.reputation,
        }
    }

    /// Sets the ban-status lookup.
    pub fn reputation<R2: ReputationLookup>(self, reputation: R2) -> SessionBuilder<P, R2> {
        SessionBuilder {
            credentials: self.credentials,
            workflow: self.workflow,
            bridge_url: self.bridge_url,
            sentry_dir: self.sentry_dir,
            session_config: self.session_config,
            prompt: self.prompt,
            reputation,
        }
    }

    /// Builds the session over an already-open transport.
    ///
    /// # Errors
    /// [`GcforgeError::Incomplete`] without credentials or a workflow.
    pub fn build<T: Transport>(
        self,
        transport: T,
    ) -> Result<(Session<T, P, R>, SessionHandle), GcforgeError> {
        let credentials = self
            .credentials
            .ok_or(GcforgeError::Incomplete("account credentials"))?;
        let workflow = self
            .workflow
            .ok_or(GcforgeError::Incomplete("a workflow"))?;
        let sentry_path = SentryStore::for_account(&self.sentry_dir, &credentials.username)
            .path()
            .to_path_buf();

        let options = SessionOptions {
            credentials,
            workflow,
            sentry_path,
            config: self.session_config,
        };
        Ok(Session::new(options, transport, self.prompt, self.reputation))
    }

    /// Connects to the protocol bridge and builds the session over it.
    ///
    /// Uses `JsonCodec` frames and `BridgeTransport`.
    pub async fn connect(
        self,
    ) -> Result<(Session<BridgeTransport, P, R>, SessionHandle), GcforgeError> {
        if self.credentials.is_none() {
            return Err(GcforgeError::Incomplete("account credentials"));
        }
        if self.workflow.is_none() {
            return Err(GcforgeError::Incomplete("a workflow"));
        }
        let transport = BridgeTransport::connect(&self.bridge_url).await?;
        self.build(transport)
    }
}

#[cfg(test)]
mod tests {
    use gcforge_protocol::SteamId;
    use gcforge_session::SessionState;
    use gcforge_transport::ChannelTransport;

    use super::*;

    #[test]
    fn test_build_without_credentials_is_incomplete() {
        let (transport, _peer) = ChannelTransport::pair();
        let result = SessionBuilder::new()
            .workflow(WorkflowRequest::Commend { target: SteamId(1) })
            .build(transport);
        assert!(matches!(
            result,
            Err(GcforgeError::Incomplete("account credentials"))
        ));
    }

    #[test]
    fn test_build_without_workflow_is_incomplete() {
        let (transport, _peer) = ChannelTransport::pair();
        let result = SessionBuilder::new()
            .credentials(AccountCredentials::new("alice", "pw"))
            .build(transport);
        assert!(matches!(result, Err(GcforgeError::Incomplete("a workflow"))));
    }

    #[tokio::test]
    async fn test_connect_checks_pieces_before_dialing() {
        let result = SessionBuilder::new()
            .bridge("ws://127.0.0.1:1")
            .connect()
            .await;
        assert!(matches!(
            result,
            Err(GcforgeError::Incomplete("account credentials"))
        ));
    }

    #[test]
    fn test_build_complete_returns_idle_session() {
        let (transport, _peer) = ChannelTransport::pair();
        let (_session, handle) = SessionBuilder::new()
            .credentials(AccountCredentials::new("alice", "pw"))
            .workflow(WorkflowRequest::Commend { target: SteamId(1) })
            .build(transport)
            .unwrap();
        assert_eq!(handle.state(), SessionState::Disconnected);
    }
}
