//! The session state machine.
//!
//! A [`Session`] is a single-task event loop. Each cycle waits for exactly
//! one input and handles it to completion before looking at the next:
//!
//! - an event from the [`Transport`]
//! - a step-up code (only while one is being waited for)
//! - the one scheduled timer (reconnect backoff, step-up settle, hello
//!   delay, step-up timeout)
//! - an idle tick, so a stop request is noticed within one poll interval
//!
//! Nothing else touches the session's state, so transitions are
//! serialized without locks. The outside world observes and steers it
//! through a [`SessionHandle`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use gcforge_protocol::{
    ClientCommand, ClientEvent, EResult, GcMessage, JsonCodec, LogOnDetails,
    MachineAuthResponse, MachineAuthUpdate, PersonaState, SteamId,
};
use gcforge_transport::Transport;
use tokio::sync::watch;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use crate::step_up::StepUpAuthenticator;
use crate::{
    AccountCredentials, ConnectionSupervisor, GcRoute, Outcome, OutcomeSlot, ReconnectDecision,
    ReputationLookup, SentryStore, SessionConfig, SessionError, SessionOptions, SessionState,
    StepUpCredential, StepUpError, StepUpHandle, StepUpKind, StepUpPrompt, StepUpRequest,
    WorkflowDispatcher,
};

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Observes and steers a running [`Session`] from other tasks.
///
/// Cheap to clone. Dropping every handle does not stop the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    running: Arc<AtomicBool>,
    state: watch::Receiver<SessionState>,
    step_up: StepUpHandle,
}

impl SessionHandle {
    /// Asks the session to stop.
    ///
    /// The session notices within one poll interval, signs off gracefully
    /// and returns whatever outcome it had (possibly `Pending`).
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// `false` once a stop was requested or the session reached a
    /// terminal decision.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The session's current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Waits until the session is in `target`.
    ///
    /// Returns `false` if the session terminated (or was dropped) without
    /// reaching `target`.
    pub async fn wait_for(&self, target: SessionState) -> bool {
        let mut state = self.state.clone();
        match state
            .wait_for(|current| *current == target || current.is_terminal())
            .await
        {
            Ok(current) => *current == target,
            Err(_) => false,
        }
    }

    /// See [`StepUpHandle::supply_email_code`].
    pub fn supply_email_code(&self, code: &str) -> Result<(), StepUpError> {
        self.step_up.supply_email_code(code)
    }

    /// See [`StepUpHandle::supply_authenticator_code`].
    pub fn supply_authenticator_code(&self, code: &str) -> Result<(), StepUpError> {
        self.step_up.supply_authenticator_code(code)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    Reconnect,
    Settle,
    Hello,
    StepUpTimeout,
}

/// One input to the event loop.
enum Input<E> {
    Event(ClientEvent),
    FeedClosed,
    TransportFailed(E),
    StepUp(Option<StepUpCredential>),
    TimerFired,
    Tick,
}

/// Drives one account from "not connected" to a terminal [`Outcome`].
///
/// Generic over its three collaborators:
/// - `T`: the [`Transport`] to the platform client
/// - `P`: who gets asked for step-up codes
/// - `R`: the ban-status lookup
pub struct Session<T, P, R>
where
    T: Transport,
    P: StepUpPrompt,
    R: ReputationLookup,
{
    transport: T,
    prompt: P,
    reputation: R,
    credentials: AccountCredentials,
    config: SessionConfig,
    sentry: SentryStore,
    supervisor: ConnectionSupervisor,
    step_up: StepUpAuthenticator,
    step_up_handle: StepUpHandle,
    dispatcher: WorkflowDispatcher<JsonCodec>,
    outcome: OutcomeSlot,
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    running: Arc<AtomicBool>,

    /// The single scheduled deadline.
    timer: Option<(Instant, Timer)>,
    logged_on: bool,
    persona_online: bool,
    /// A link loss seen while suspended for a step-up code, replayed once
    /// the settle delay ends.
    deferred_disconnect: bool,
}

impl<T, P, R> Session<T, P, R>
where
    T: Transport,
    P: StepUpPrompt,
    R: ReputationLookup,
{
    /// Creates a session and the handle that steers it. Nothing happens
    /// until [`run`](Self::run) is awaited.
    pub fn new(
        options: SessionOptions,
        transport: T,
        prompt: P,
        reputation: R,
    ) -> (Self, SessionHandle) {
        let SessionOptions {
            credentials,
            workflow,
            sentry_path,
            config,
        } = options;

        let (step_up, step_up_handle) = StepUpAuthenticator::channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let running = Arc::new(AtomicBool::new(true));

        let handle = SessionHandle {
            running: Arc::clone(&running),
            state: state_rx,
            step_up: step_up_handle.clone(),
        };

        let session = Self {
            transport,
            prompt,
            reputation,
            credentials,
            supervisor: ConnectionSupervisor::from_config(&config),
            config,
            sentry: SentryStore::new(sentry_path),
            step_up,
            step_up_handle,
            dispatcher: WorkflowDispatcher::new(workflow, JsonCodec),
            outcome: OutcomeSlot::new(),
            state: SessionState::Disconnected,
            state_tx,
            running,
            timer: None,
            logged_on: false,
            persona_online: false,
            deferred_disconnect: false,
        };
        (session, handle)
    }

    /// Runs the session to completion and returns its outcome.
    ///
    /// Never fails: every error is logged and folded into the outcome.
    pub async fn run(self) -> Outcome {
        let span = tracing::info_span!("session", account = %self.credentials.username);
        self.drive().instrument(span).await
    }

    async fn drive(mut self) -> Outcome {
        tracing::info!(workflow = ?self.dispatcher.workflow(), "session starting");

        if self.is_running() {
            if let Err(err) = self.connect().await {
                self.fail(err).await;
            }
        }

        while !self.state.is_terminal() {
            if !self.is_running() {
                tracing::info!(state = ?self.state, "stop requested");
                self.finish().await;
                break;
            }

            let input = self.next_input().await;
            if let Err(err) = self.handle(input).await {
                self.fail(err).await;
            }
        }

        if let Err(err) = self.transport.close().await {
            tracing::debug!(error = %err, "transport close failed");
        }

        let outcome = self.outcome.get();
        tracing::info!(%outcome, attempts = self.supervisor.attempts(), "session finished");
        outcome
    }

    async fn next_input(&mut self) -> Input<T::Error> {
        let poll = self.config.poll_interval();
        let waiting_for_code = self.step_up.is_waiting();
        let (deadline, has_timer) = match self.timer {
            Some((deadline, _)) => (deadline, true),
            None => (Instant::now() + poll, false),
        };

        tokio::select! {
            event = self.transport.recv() => match event {
                Ok(Some(event)) => Input::Event(event),
                Ok(None) => Input::FeedClosed,
                Err(err) => Input::TransportFailed(err),
            },
            credential = self.step_up.recv(), if waiting_for_code => Input::StepUp(credential),
            () = tokio::time::sleep_until(deadline), if has_timer => Input::TimerFired,
            () = tokio::time::sleep(poll) => Input::Tick,
        }
    }

    async fn handle(&mut self, input: Input<T::Error>) -> Result<(), SessionError> {
        match input {
            Input::Event(event) => self.on_event(event).await,
            Input::FeedClosed => Err(SessionError::FeedClosed),
            Input::TransportFailed(err) => Err(SessionError::Transport(Box::new(err))),
            Input::StepUp(Some(credential)) => {
                self.on_step_up_code(credential);
                Ok(())
            }
            // The session holds a handle itself, so this never closes.
            Input::StepUp(None) => Ok(()),
            Input::TimerFired => match self.timer.take() {
                Some((_, timer)) => self.on_timer(timer).await,
                None => Ok(()),
            },
            Input::Tick => Ok(()),
        }
    }

    async fn on_event(&mut self, event: ClientEvent) -> Result<(), SessionError> {
        tracing::debug!(event = event.kind(), state = ?self.state, "event");
        match event {
            ClientEvent::Connected { result } => self.on_connected(result).await,
            ClientEvent::Disconnected { user_initiated } => {
                self.on_disconnected(user_initiated);
                Ok(())
            }
            ClientEvent::LoggedOn {
                result,
                extended_result,
                email_domain,
                steam_id,
            } => {
                self.on_logged_on(result, extended_result, email_domain, steam_id)
                    .await
            }
            ClientEvent::LoggedOff { result } => self.on_logged_off(result),
            ClientEvent::MachineAuthUpdate(update) => self.on_machine_auth(update).await,
            ClientEvent::GcMessage { app_id, message } => self.on_gc_message(app_id, message).await,
        }
    }

    // -- connection -------------------------------------------------------

    async fn connect(&mut self) -> Result<(), SessionError> {
        self.set_state(SessionState::Connecting);
        tracing::info!(attempt = self.supervisor.attempts() + 1, "connecting");
        self.send(ClientCommand::Connect).await
    }

    async fn on_connected(&mut self, result: EResult) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            tracing::debug!(%result, state = ?self.state, "ignoring unexpected connect result");
            return Ok(());
        }

        if result.is_ok() {
            self.supervisor.on_connected();
            self.set_state(SessionState::LoggingOn);
            return self.log_on().await;
        }

        match self.supervisor.on_connect_failed() {
            ReconnectDecision::RetryAfter(delay) => {
                tracing::warn!(
                    %result,
                    attempt = self.supervisor.attempts(),
                    retry_in = ?delay,
                    "connect failed, retrying"
                );
                self.set_state(SessionState::Disconnected);
                self.schedule(Timer::Reconnect, delay);
                Ok(())
            }
            ReconnectDecision::GiveUp => Err(SessionError::ConnectFailed(result)),
        }
    }

    fn on_disconnected(&mut self, user_initiated: bool) {
        self.logged_on = false;
        self.persona_online = false;

        if self.state == SessionState::AwaitingStepUp {
            tracing::debug!("link lost while waiting for a step-up code, deferring");
            self.deferred_disconnect = true;
            return;
        }
        self.apply_reconnect_policy(user_initiated);
    }

    fn apply_reconnect_policy(&mut self, user_initiated: bool) {
        let still_running = self.is_running() && !self.state.is_terminal();
        match self
            .supervisor
            .on_disconnected(self.outcome.get(), still_running)
        {
            ReconnectDecision::RetryAfter(delay) => {
                tracing::info!(
                    user_initiated,
                    attempt = self.supervisor.attempts(),
                    retry_in = ?delay,
                    "disconnected, reconnecting"
                );
                self.set_state(SessionState::Disconnected);
                self.schedule(Timer::Reconnect, delay);
            }
            ReconnectDecision::GiveUp => {
                tracing::info!(attempt = self.supervisor.attempts(), "disconnected for good");
                self.timer = None;
                self.set_state(SessionState::Terminated);
            }
        }
    }

    // -- logon ------------------------------------------------------------

    async fn log_on(&mut self) -> Result<(), SessionError> {
        let sentry_hash = match self.sentry.current_hash() {
            Ok(hash) => hash,
            Err(err) => {
                tracing::warn!(error = %err, "cannot read sentry file, logging on without it");
                None
            }
        };
        let (auth_code, two_factor_code) = self.step_up.take_codes();

        tracing::info!(
            sentry = sentry_hash.is_some(),
            auth_code = auth_code.is_some(),
            two_factor_code = two_factor_code.is_some(),
            "logging on"
        );

        let details = LogOnDetails {
            username: self.credentials.username.clone(),
            password: self.credentials.password.clone(),
            auth_code,
            two_factor_code,
            sentry_hash,
        };
        self.send(ClientCommand::LogOn(details)).await
    }

    async fn on_logged_on(
        &mut self,
        result: EResult,
        extended: EResult,
        email_domain: Option<String>,
        steam_id: Option<SteamId>,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::LoggingOn {
            tracing::debug!(%result, state = ?self.state, "ignoring unexpected logon result");
            return Ok(());
        }

        match result {
            EResult::Ok => {
                self.logged_on = true;
                tracing::info!(steam_id = ?steam_id, "logged on");
                if let Some(steam_id) = steam_id {
                    self.check_reputation(steam_id).await;
                }
                self.set_state(SessionState::Online);
                self.announce_presence().await
            }
            EResult::AccountLoginDeniedNeedTwoFactor => {
                self.suspend_for_code(StepUpKind::AuthenticatorCode, None);
                Ok(())
            }
            EResult::AccountLogonDenied => {
                self.suspend_for_code(StepUpKind::EmailCode, email_domain);
                Ok(())
            }
            EResult::ServiceUnavailable => Err(SessionError::ServiceUnavailable),
            _ => Err(SessionError::LogonFailed { result, extended }),
        }
    }

    async fn check_reputation(&mut self, steam_id: SteamId) {
        let lookup = self.reputation.ban_info(steam_id);
        let verdict = tokio::time::timeout(self.config.reputation_timeout(), lookup).await;
        match verdict {
            Ok(Some(info)) if info.is_banned() => {
                let annotation = SessionError::AccountBanned(info);
                tracing::warn!(%annotation, "proceeding anyway");
                if let Some(outcome) = annotation.outcome() {
                    self.record(outcome);
                }
            }
            Ok(_) => {}
            Err(_) => tracing::debug!("reputation lookup timed out"),
        }
    }

    async fn announce_presence(&mut self) -> Result<(), SessionError> {
        self.send(ClientCommand::SetPersona {
            state: PersonaState::Online,
        })
        .await?;
        self.persona_online = true;
        self.send(ClientCommand::GamesPlayed {
            app_ids: vec![self.config.app_id],
        })
        .await?;
        self.schedule(Timer::Hello, self.config.hello_delay());
        Ok(())
    }

    fn on_logged_off(&mut self, result: EResult) -> Result<(), SessionError> {
        self.logged_on = false;
        self.persona_online = false;

        if result.is_concurrent_session() {
            return Err(SessionError::DuplicateSession(result));
        }
        tracing::debug!(%result, "logged off");
        Ok(())
    }

    // -- step-up ----------------------------------------------------------

    fn suspend_for_code(&mut self, kind: StepUpKind, email_domain: Option<String>) {
        tracing::info!(reason = %SessionError::StepUpRequired(kind), "suspending logon");
        self.set_state(SessionState::AwaitingStepUp);
        self.step_up.begin(kind);
        self.timer = self
            .config
            .step_up_timeout()
            .map(|timeout| (Instant::now() + timeout, Timer::StepUpTimeout));

        let request = StepUpRequest {
            kind,
            email_domain: match kind {
                StepUpKind::EmailCode => email_domain,
                StepUpKind::AuthenticatorCode => None,
            },
            username: self.credentials.username.clone(),
        };
        self.prompt
            .request_code(request, self.step_up_handle.clone());
    }

    fn on_step_up_code(&mut self, credential: StepUpCredential) {
        let kind = credential.kind;
        if self.step_up.accept(credential) {
            let settle = self.config.step_up_settle();
            tracing::info!(%kind, settle = ?settle, "step-up code received");
            self.schedule(Timer::Settle, settle);
        }
    }

    /// The settle delay after a step-up code is over: get back to a fresh
    /// connection so the next logon carries the code.
    async fn resume_after_step_up(&mut self) -> Result<(), SessionError> {
        self.set_state(SessionState::Connecting);

        if std::mem::take(&mut self.deferred_disconnect) {
            self.apply_reconnect_policy(false);
            return Ok(());
        }
        if self.supervisor.is_link_up() {
            // The resulting Disconnected goes through the reconnect policy.
            return self.send(ClientCommand::Disconnect).await;
        }
        self.connect().await
    }

    // -- device authorization ---------------------------------------------

    async fn on_machine_auth(&mut self, update: MachineAuthUpdate) -> Result<(), SessionError> {
        let response = match self
            .sentry
            .apply_update(update.offset, &update.data, update.bytes_to_write)
        {
            Ok(write) => MachineAuthResponse {
                job_id: update.job_id,
                file_name: update.file_name,
                bytes_written: update.bytes_to_write,
                file_size: write.file_size,
                offset: update.offset,
                result: EResult::Ok,
                last_error: 0,
                one_time_password: update.one_time_password,
                sentry_hash: Some(write.hash),
            },
            Err(err) => {
                tracing::warn!(error = %err, job = %update.job_id, "sentry update failed");
                MachineAuthResponse {
                    job_id: update.job_id,
                    file_name: update.file_name,
                    bytes_written: 0,
                    file_size: 0,
                    offset: update.offset,
                    result: EResult::Fail,
                    last_error: err.os_error(),
                    one_time_password: update.one_time_password,
                    sentry_hash: None,
                }
            }
        };
        self.send(ClientCommand::RespondMachineAuth(response)).await
    }

    // -- coordinator ------------------------------------------------------

    async fn on_gc_message(&mut self, app_id: u32, message: GcMessage) -> Result<(), SessionError> {
        if app_id != self.config.app_id {
            tracing::debug!(app_id, "ignoring message for another app");
            return Ok(());
        }
        let Some(route) = GcRoute::from_msg_type(message.msg_type) else {
            tracing::debug!(msg_type = message.msg_type, "ignoring unknown coordinator message");
            return Ok(());
        };

        match route {
            GcRoute::Welcome => self.on_welcome().await,
            GcRoute::ReportResponse | GcRoute::CommendResponse => {
                // A reconnect can land the answer to an already-sent request
                // before the coordinator says hello again.
                if !self.dispatcher.is_sent() {
                    tracing::debug!(?route, state = ?self.state, "ignoring early response");
                    return Ok(());
                }
                if let Some(completion) = self.dispatcher.on_response(route, &message)? {
                    tracing::info!(
                        target_id = %self.dispatcher.workflow().target(),
                        confirmation_id = ?completion.confirmation_id,
                        "workflow complete"
                    );
                    self.record(Outcome::Success);
                    self.finish().await;
                }
                Ok(())
            }
        }
    }

    async fn on_welcome(&mut self) -> Result<(), SessionError> {
        if !matches!(
            self.state,
            SessionState::Online | SessionState::AwaitingHandshake
        ) {
            tracing::debug!(state = ?self.state, "ignoring welcome");
            return Ok(());
        }
        if matches!(self.timer, Some((_, Timer::Hello))) {
            self.timer = None;
        }

        match self.dispatcher.take_request()? {
            Some(request) => {
                tracing::info!(workflow = ?self.dispatcher.workflow(), "coordinator ready, sending request");
                self.send(ClientCommand::SendGc {
                    app_id: self.config.app_id,
                    message: request,
                })
                .await?;
            }
            None => tracing::debug!("request already sent, waiting for its response"),
        }
        self.set_state(SessionState::AwaitingWorkflowResponse);
        Ok(())
    }

    async fn send_hello(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Online {
            return Ok(());
        }
        let hello = self.dispatcher.hello()?;
        tracing::debug!("sending coordinator hello");
        self.send(ClientCommand::SendGc {
            app_id: self.config.app_id,
            message: hello,
        })
        .await?;
        self.set_state(SessionState::AwaitingHandshake);
        Ok(())
    }

    // -- timers -----------------------------------------------------------

    fn schedule(&mut self, timer: Timer, delay: Duration) {
        self.timer = Some((Instant::now() + delay, timer));
    }

    async fn on_timer(&mut self, timer: Timer) -> Result<(), SessionError> {
        match timer {
            Timer::Reconnect => self.connect().await,
            Timer::Settle => self.resume_after_step_up().await,
            Timer::Hello => self.send_hello().await,
            Timer::StepUpTimeout => match self.step_up.waiting_for() {
                Some(kind) => Err(SessionError::StepUpTimedOut(kind)),
                None => Ok(()),
            },
        }
    }

    // -- plumbing ---------------------------------------------------------

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "state");
            self.state = next;
            self.state_tx.send_replace(next);
        }
    }

    fn record(&mut self, outcome: Outcome) {
        if let Err(err) = self.outcome.record(outcome) {
            tracing::warn!(%err, "outcome write rejected");
        }
    }

    async fn send(&mut self, command: ClientCommand) -> Result<(), SessionError> {
        tracing::debug!(command = command.kind(), "send");
        self.transport
            .send(command)
            .await
            .map_err(|err| SessionError::Transport(Box::new(err)))
    }

    /// Ends the session on an error that implies an outcome. Errors that
    /// imply none are logged and the session carries on.
    async fn fail(&mut self, err: SessionError) {
        match err.outcome() {
            Some(outcome) => {
                tracing::error!(error = %err, "session failed");
                self.record(outcome);
                self.finish().await;
            }
            None => tracing::warn!(error = %err, "session error"),
        }
    }

    /// Signs off: presence offline, log off, disconnect (each only if it
    /// applies), then Terminated. Send failures no longer matter here.
    async fn finish(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.timer = None;

        if self.persona_online {
            self.send_quietly(ClientCommand::SetPersona {
                state: PersonaState::Offline,
            })
            .await;
            self.persona_online = false;
        }
        if self.logged_on {
            self.send_quietly(ClientCommand::LogOff).await;
            self.logged_on = false;
        }
        if self.supervisor.is_link_up() {
            self.send_quietly(ClientCommand::Disconnect).await;
        }
        self.set_state(SessionState::Terminated);
    }

    async fn send_quietly(&mut self, command: ClientCommand) {
        if let Err(err) = self.send(command).await {
            tracing::debug!(error = %err, "sign-off command not delivered");
        }
    }
}
