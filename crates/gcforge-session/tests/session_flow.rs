//! End-to-end session flows over an in-process transport.
//!
//! The test plays the platform client: it reads the commands the session
//! sends and answers with events. Time is paused, so the 5-second timers
//! elapse instantly whenever the runtime is idle.

use std::sync::{Arc, Mutex};

use gcforge_protocol::gc::{
    ClientWelcome, CommendResponse, ReportPlayer, ReportResponse, msg_type,
};
use gcforge_protocol::{
    ClientCommand, ClientEvent, EResult, GcMessage, JobId, JsonCodec, LogOnDetails,
    MachineAuthResponse, MachineAuthUpdate, PersonaState, SentryHash, SteamId,
};
use gcforge_session::{
    AccountCredentials, BanInfo, LogPrompt, NoReputation, Outcome, ReputationLookup, Session,
    SessionConfig, SessionHandle, SessionOptions, SessionState, StepUpHandle, StepUpKind,
    StepUpPrompt, StepUpRequest, WorkflowRequest,
};
use gcforge_transport::{ChannelPeer, ChannelTransport};
use sha1::{Digest, Sha1};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, timeout};

const APP_ID: u32 = 730;
const ME: SteamId = SteamId(76561198000000001);
const TARGET: SteamId = SteamId(76561197960287930);
const MATCH_ID: u64 = 3_100_000_000_000_000_001;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    peer: ChannelPeer,
    handle: SessionHandle,
    task: JoinHandle<Outcome>,
    sentry_dir: tempfile::TempDir,
}

impl Harness {
    fn start(workflow: WorkflowRequest) -> Self {
        Self::start_with(workflow, SessionConfig::default(), LogPrompt, NoReputation)
    }

    fn start_with<P: StepUpPrompt, R: ReputationLookup>(
        workflow: WorkflowRequest,
        config: SessionConfig,
        prompt: P,
        reputation: R,
    ) -> Self {
        let sentry_dir = tempfile::tempdir().unwrap();
        Self::start_in(sentry_dir, workflow, config, prompt, reputation)
    }

    fn start_in<P: StepUpPrompt, R: ReputationLookup>(
        sentry_dir: tempfile::TempDir,
        workflow: WorkflowRequest,
        config: SessionConfig,
        prompt: P,
        reputation: R,
    ) -> Self {
        let (transport, peer) = ChannelTransport::pair();
        let options = SessionOptions {
            credentials: AccountCredentials::new("alice", "hunter2"),
            workflow,
            sentry_path: sentry_dir.path().join("alice.sentry"),
            config,
        };
        let (session, handle) = Session::new(options, transport, prompt, reputation);
        let task = tokio::spawn(session.run());
        Self {
            peer,
            handle,
            task,
            sentry_dir,
        }
    }

    fn emit(&self, event: ClientEvent) {
        assert!(self.peer.emit(event), "session dropped its transport");
    }

    /// The next command; fails the test if none arrives within a minute
    /// of virtual time.
    async fn expect(&mut self) -> ClientCommand {
        timeout(Duration::from_secs(60), self.peer.next_command())
            .await
            .expect("no command within 60s")
            .expect("session dropped its transport")
    }

    /// Asserts that nothing is sent for `window` of virtual time.
    async fn expect_silence(&mut self, window: Duration) {
        match timeout(window, self.peer.next_command()).await {
            Err(_) | Ok(None) => {}
            Ok(Some(command)) => panic!("unexpected command: {command:?}"),
        }
    }

    async fn expect_log_on(&mut self) -> LogOnDetails {
        match self.expect().await {
            ClientCommand::LogOn(details) => details,
            other => panic!("expected LogOn, got {other:?}"),
        }
    }

    async fn expect_gc(&mut self, expected_type: u32) -> GcMessage {
        match self.expect().await {
            ClientCommand::SendGc { app_id, message } => {
                assert_eq!(app_id, APP_ID);
                assert_eq!(message.msg_type, expected_type);
                message
            }
            other => panic!("expected SendGc({expected_type}), got {other:?}"),
        }
    }

    /// Connect → logon OK → presence → hello. Leaves the session in
    /// AwaitingHandshake.
    async fn reach_handshake(&mut self) {
        assert_eq!(self.expect().await, ClientCommand::Connect);
        self.emit(connected(EResult::Ok));
        self.expect_log_on().await;
        self.log_on_and_say_hello().await;
    }

    async fn log_on_and_say_hello(&mut self) {
        self.emit(logged_on(EResult::Ok));
        assert_eq!(
            self.expect().await,
            ClientCommand::SetPersona {
                state: PersonaState::Online,
            }
        );
        assert_eq!(
            self.expect().await,
            ClientCommand::GamesPlayed {
                app_ids: vec![APP_ID],
            }
        );
        self.expect_gc(msg_type::CLIENT_HELLO).await;
    }

    async fn expect_sign_off(&mut self) {
        assert_eq!(
            self.expect().await,
            ClientCommand::SetPersona {
                state: PersonaState::Offline,
            }
        );
        assert_eq!(self.expect().await, ClientCommand::LogOff);
        assert_eq!(self.expect().await, ClientCommand::Disconnect);
    }

    async fn outcome(self) -> Outcome {
        timeout(Duration::from_secs(60), self.task)
            .await
            .expect("session did not finish")
            .unwrap()
    }
}

fn report() -> WorkflowRequest {
    WorkflowRequest::Report {
        target: TARGET,
        match_id: MATCH_ID,
    }
}

fn commend() -> WorkflowRequest {
    WorkflowRequest::Commend { target: TARGET }
}

fn connected(result: EResult) -> ClientEvent {
    ClientEvent::Connected { result }
}

fn disconnected() -> ClientEvent {
    ClientEvent::Disconnected {
        user_initiated: false,
    }
}

fn logged_on(result: EResult) -> ClientEvent {
    ClientEvent::LoggedOn {
        result,
        extended_result: EResult::Ok,
        email_domain: None,
        steam_id: result.is_ok().then_some(ME),
    }
}

fn gc(message: GcMessage) -> ClientEvent {
    ClientEvent::GcMessage {
        app_id: APP_ID,
        message,
    }
}

fn welcome() -> ClientEvent {
    gc(GcMessage::encode(&JsonCodec, msg_type::CLIENT_WELCOME, &ClientWelcome { version: 1 }).unwrap())
}

fn report_response(confirmation_id: u64) -> ClientEvent {
    gc(GcMessage::encode(
        &JsonCodec,
        msg_type::CLIENT_REPORT_RESPONSE,
        &ReportResponse {
            confirmation_id,
            account_id: TARGET.account_id(),
            ..ReportResponse::default()
        },
    )
    .unwrap())
}

fn commend_response() -> ClientEvent {
    gc(GcMessage::encode(
        &JsonCodec,
        msg_type::CLIENT_COMMEND_PLAYER_QUERY_RESPONSE,
        &CommendResponse::default(),
    )
    .unwrap())
}

fn sha1_of(bytes: &[u8]) -> SentryHash {
    SentryHash(Sha1::digest(bytes).into())
}

/// Records every step-up request and keeps the handle it came with.
#[derive(Clone, Default)]
struct RecordingPrompt {
    requests: Arc<Mutex<Vec<(StepUpRequest, StepUpHandle)>>>,
}

impl RecordingPrompt {
    fn last(&self) -> (StepUpRequest, StepUpHandle) {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no step-up request")
    }

    fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl StepUpPrompt for RecordingPrompt {
    fn request_code(&self, request: StepUpRequest, responder: StepUpHandle) {
        self.requests.lock().unwrap().push((request, responder));
    }
}

struct Banned;

impl ReputationLookup for Banned {
    async fn ban_info(&self, _steam_id: SteamId) -> Option<BanInfo> {
        Some(BanInfo {
            vac_banned: true,
            game_ban_count: 0,
        })
    }
}

/// Never answers; the session must give up on it.
struct Hangs;

impl ReputationLookup for Hangs {
    async fn ban_info(&self, _steam_id: SteamId) -> Option<BanInfo> {
        std::future::pending().await
    }
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_report_full_flow_succeeds_with_one_request() {
    let mut h = Harness::start(report());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));

    let details = h.expect_log_on().await;
    assert_eq!(details.username, "alice");
    assert_eq!(details.password, "hunter2");
    assert_eq!(details.sentry_hash, None);
    assert_eq!(details.auth_code, None);
    assert_eq!(details.two_factor_code, None);

    h.emit(logged_on(EResult::Ok));
    assert_eq!(
        h.expect().await,
        ClientCommand::SetPersona {
            state: PersonaState::Online,
        }
    );
    assert_eq!(
        h.expect().await,
        ClientCommand::GamesPlayed {
            app_ids: vec![APP_ID],
        }
    );

    let announced = Instant::now();
    h.expect_gc(msg_type::CLIENT_HELLO).await;
    assert!(announced.elapsed() >= Duration::from_secs(5));
    assert_eq!(h.handle.state(), SessionState::AwaitingHandshake);

    h.emit(welcome());
    let request = h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    let body: ReportPlayer = request
        .decode(&JsonCodec, msg_type::CLIENT_REPORT_PLAYER)
        .unwrap();
    assert_eq!(body, ReportPlayer::all_categories(TARGET, MATCH_ID));

    h.emit(report_response(42));
    h.expect_sign_off().await;
    h.expect_silence(Duration::from_secs(30)).await;

    assert_eq!(h.handle.state(), SessionState::Terminated);
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_commend_full_flow_succeeds() {
    let mut h = Harness::start(commend());
    h.reach_handshake().await;

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_COMMEND_PLAYER).await;

    h.emit(commend_response());
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_coordinator_messages_are_ignored() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    // Another app's welcome, an unknown type, and the other workflow's response.
    h.emit(ClientEvent::GcMessage {
        app_id: 440,
        message: GcMessage {
            msg_type: msg_type::CLIENT_WELCOME,
            body: b"{}".to_vec(),
        },
    });
    h.emit(gc(GcMessage {
        msg_type: 1,
        body: Vec::new(),
    }));
    h.emit(commend_response());
    h.expect_silence(Duration::from_secs(10)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingHandshake);

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    h.emit(commend_response());
    h.expect_silence(Duration::from_secs(10)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingWorkflowResponse);

    h.emit(report_response(7));
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_banned_account_stays_banned_after_success() {
    let mut h = Harness::start_with(report(), SessionConfig::default(), LogPrompt, Banned);
    h.reach_handshake().await;

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    h.emit(report_response(42));
    h.expect_sign_off().await;

    assert_eq!(h.outcome().await, Outcome::AccountBanned);
}

#[tokio::test(start_paused = true)]
async fn test_banned_account_logged_in_elsewhere_reports_concurrent_session() {
    let mut h = Harness::start_with(report(), SessionConfig::default(), LogPrompt, Banned);
    h.reach_handshake().await;

    h.emit(ClientEvent::LoggedOff {
        result: EResult::LoggedInElsewhere,
    });
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.expect_silence(Duration::from_secs(120)).await;

    assert_eq!(h.outcome().await, Outcome::AlreadyLoggedInElsewhere);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_reputation_lookup_times_out() {
    let mut h = Harness::start_with(report(), SessionConfig::default(), LogPrompt, Hangs);
    h.reach_handshake().await;

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    h.emit(report_response(1));
    h.expect_sign_off().await;

    assert_eq!(h.outcome().await, Outcome::Success);
}

// ---------------------------------------------------------------------------
// Step-up authentication
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_two_factor_suspends_then_logs_on_with_code() {
    let prompt = RecordingPrompt::default();
    let mut h = Harness::start_with(
        report(),
        SessionConfig::default(),
        prompt.clone(),
        NoReputation,
    );

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(logged_on(EResult::AccountLoginDeniedNeedTwoFactor));

    assert!(h.handle.wait_for(SessionState::AwaitingStepUp).await);
    let (request, _) = prompt.last();
    assert_eq!(request.kind, StepUpKind::AuthenticatorCode);
    assert_eq!(request.email_domain, None);
    assert_eq!(request.username, "alice");

    // Suspended: nothing happens however long we wait.
    h.expect_silence(Duration::from_secs(600)).await;

    let supplied = Instant::now();
    h.handle.supply_authenticator_code("999999").unwrap();

    // Link is still up, so the session drops it and reconnects.
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    assert!(supplied.elapsed() >= Duration::from_secs(5));
    h.emit(disconnected());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    let details = h.expect_log_on().await;
    assert_eq!(details.two_factor_code.as_deref(), Some("999999"));
    assert_eq!(details.auth_code, None);

    h.log_on_and_say_hello().await;
    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    h.emit(report_response(42));
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
    assert_eq!(prompt.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_authenticator_code_used_for_exactly_one_logon() {
    let mut h = Harness::start(report());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(logged_on(EResult::AccountLoginDeniedNeedTwoFactor));
    assert!(h.handle.wait_for(SessionState::AwaitingStepUp).await);

    h.handle.supply_authenticator_code("12345").unwrap();
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    assert_eq!(
        h.expect_log_on().await.two_factor_code.as_deref(),
        Some("12345")
    );
    // Exactly one logon follows the code.
    h.expect_silence(Duration::from_secs(60)).await;

    // A later reconnect logs on without it.
    h.emit(logged_on(EResult::Ok));
    h.expect().await; // SetPersona
    h.expect().await; // GamesPlayed
    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    assert_eq!(h.expect_log_on().await.two_factor_code, None);

    // Not logged on yet, so stopping only drops the link.
    h.handle.stop();
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    assert_eq!(h.outcome().await, Outcome::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_email_code_passes_domain_hint_and_auth_code() {
    let prompt = RecordingPrompt::default();
    let mut h = Harness::start_with(
        commend(),
        SessionConfig::default(),
        prompt.clone(),
        NoReputation,
    );

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(ClientEvent::LoggedOn {
        result: EResult::AccountLogonDenied,
        extended_result: EResult::Ok,
        email_domain: Some("example.com".into()),
        steam_id: None,
    });
    assert!(h.handle.wait_for(SessionState::AwaitingStepUp).await);

    let (request, responder) = prompt.last();
    assert_eq!(request.kind, StepUpKind::EmailCode);
    assert_eq!(request.email_domain.as_deref(), Some("example.com"));

    responder.supply_email_code("F7K2Q").unwrap();
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));

    let details = h.expect_log_on().await;
    assert_eq!(details.auth_code.as_deref(), Some("F7K2Q"));
    assert_eq!(details.two_factor_code, None);
}

#[tokio::test(start_paused = true)]
async fn test_wrong_kind_code_keeps_session_suspended() {
    let mut h = Harness::start(report());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(logged_on(EResult::AccountLoginDeniedNeedTwoFactor));
    assert!(h.handle.wait_for(SessionState::AwaitingStepUp).await);

    h.handle.supply_email_code("WRONG").unwrap();
    h.expect_silence(Duration::from_secs(60)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingStepUp);

    h.handle.supply_authenticator_code("424242").unwrap();
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_step_up_is_deferred_until_settled() {
    let mut h = Harness::start(report());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(logged_on(EResult::AccountLoginDeniedNeedTwoFactor));
    assert!(h.handle.wait_for(SessionState::AwaitingStepUp).await);

    // The platform drops the link right after refusing the logon.
    h.emit(disconnected());
    h.expect_silence(Duration::from_secs(120)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingStepUp);

    let supplied = Instant::now();
    h.handle.supply_authenticator_code("555555").unwrap();

    // Settle, then backoff; no Disconnect because the link is already down.
    assert_eq!(h.expect().await, ClientCommand::Connect);
    assert!(supplied.elapsed() >= Duration::from_secs(10));
    h.emit(connected(EResult::Ok));
    assert_eq!(
        h.expect_log_on().await.two_factor_code.as_deref(),
        Some("555555")
    );
}

#[tokio::test(start_paused = true)]
async fn test_step_up_timeout_ends_with_failure() {
    let config = SessionConfig {
        step_up_timeout_secs: Some(300),
        ..SessionConfig::default()
    };
    let mut h = Harness::start_with(report(), config, LogPrompt, NoReputation);

    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.emit(logged_on(EResult::AccountLogonDenied));

    let suspended = Instant::now();
    assert_eq!(
        timeout(Duration::from_secs(600), h.peer.next_command())
            .await
            .unwrap(),
        Some(ClientCommand::Disconnect)
    );
    assert!(suspended.elapsed() >= Duration::from_secs(300));
    assert_eq!(h.outcome().await, Outcome::Failure);
}

// ---------------------------------------------------------------------------
// Connection policy
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_connect_failures_give_up_without_sixth_attempt() {
    let mut h = Harness::start(report());

    for attempt in 1..=5 {
        assert_eq!(h.expect().await, ClientCommand::Connect, "attempt {attempt}");
        h.emit(connected(EResult::Fail));
    }

    h.expect_silence(Duration::from_secs(120)).await;
    assert_eq!(h.handle.state(), SessionState::Terminated);
    assert_eq!(h.outcome().await, Outcome::Failure);
}

#[tokio::test(start_paused = true)]
async fn test_connect_failure_retries_after_backoff() {
    let mut h = Harness::start(report());

    assert_eq!(h.expect().await, ClientCommand::Connect);
    let failed = Instant::now();
    h.emit(connected(EResult::NoConnection));

    assert_eq!(h.expect().await, ClientCommand::Connect);
    assert!(failed.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_while_online_reconnects_without_resending_request() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;
    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;

    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.log_on_and_say_hello().await;

    // The request already went out once.
    h.emit(welcome());
    h.expect_silence(Duration::from_secs(10)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingWorkflowResponse);

    h.emit(report_response(9));
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_response_after_reconnect_before_welcome_completes() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;
    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;

    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;
    h.log_on_and_say_hello().await;
    assert_eq!(h.handle.state(), SessionState::AwaitingHandshake);

    h.emit(report_response(9));
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_response_before_request_is_ignored() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    h.emit(report_response(3));
    h.expect_silence(Duration::from_secs(10)).await;
    assert_eq!(h.handle.state(), SessionState::AwaitingHandshake);

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
    h.emit(report_response(4));
    h.expect_sign_off().await;
    assert_eq!(h.outcome().await, Outcome::Success);
}

#[tokio::test(start_paused = true)]
async fn test_logged_in_elsewhere_while_online_stops_for_good() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    h.emit(ClientEvent::LoggedOff {
        result: EResult::LoggedInElsewhere,
    });
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.expect_silence(Duration::from_secs(120)).await;

    assert_eq!(h.outcome().await, Outcome::AlreadyLoggedInElsewhere);
}

#[tokio::test(start_paused = true)]
async fn test_already_logged_in_elsewhere_while_logging_on_stops() {
    let mut h = Harness::start(report());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;

    h.emit(ClientEvent::LoggedOff {
        result: EResult::AlreadyLoggedInElsewhere,
    });
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.expect_silence(Duration::from_secs(120)).await;

    assert_eq!(h.outcome().await, Outcome::AlreadyLoggedInElsewhere);
}

#[tokio::test(start_paused = true)]
async fn test_service_unavailable_ends_session() {
    let mut h = Harness::start(report());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;

    h.emit(logged_on(EResult::ServiceUnavailable));
    assert_eq!(h.expect().await, ClientCommand::Disconnect);
    h.expect_silence(Duration::from_secs(60)).await;

    assert_eq!(h.outcome().await, Outcome::ServiceUnavailable);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_password_ends_with_failure() {
    let mut h = Harness::start(report());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    h.expect_log_on().await;

    h.emit(logged_on(EResult::InvalidPassword));
    assert_eq!(h.expect().await, ClientCommand::Disconnect);

    assert_eq!(h.outcome().await, Outcome::Failure);
}

#[tokio::test(start_paused = true)]
async fn test_stop_while_online_signs_off_and_returns_pending() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    h.handle.stop();
    let stopped = Instant::now();
    h.expect_sign_off().await;
    assert!(stopped.elapsed() <= Duration::from_secs(1));

    assert_eq!(h.outcome().await, Outcome::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_event_feed_closed_ends_with_failure() {
    let h = Harness::start(report());
    let Harness {
        peer,
        handle: _handle,
        task,
        sentry_dir: _sentry_dir,
    } = h;
    drop(peer);

    let outcome = timeout(Duration::from_secs(60), task).await.unwrap().unwrap();
    assert_eq!(outcome, Outcome::Failure);
}

// ---------------------------------------------------------------------------
// Device authorization
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_machine_auth_update_writes_sentry_and_next_logon_presents_it() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    let blob = b"sentry-bytes-from-the-platform".to_vec();
    h.emit(ClientEvent::MachineAuthUpdate(MachineAuthUpdate {
        job_id: JobId(77),
        file_name: "ssfn123".into(),
        offset: 0,
        bytes_to_write: blob.len(),
        data: blob.clone(),
        one_time_password: Some("otp".into()),
    }));

    let expected = MachineAuthResponse {
        job_id: JobId(77),
        file_name: "ssfn123".into(),
        bytes_written: blob.len(),
        file_size: blob.len() as u64,
        offset: 0,
        result: EResult::Ok,
        last_error: 0,
        one_time_password: Some("otp".into()),
        sentry_hash: Some(sha1_of(&blob)),
    };
    assert_eq!(h.expect().await, ClientCommand::RespondMachineAuth(expected));
    assert_eq!(
        std::fs::read(h.sentry_dir.path().join("alice.sentry")).unwrap(),
        blob
    );

    h.emit(disconnected());
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));
    assert_eq!(h.expect_log_on().await.sentry_hash, Some(sha1_of(&blob)));
}

#[tokio::test(start_paused = true)]
async fn test_machine_auth_short_data_answers_fail_and_continues() {
    let mut h = Harness::start(report());
    h.reach_handshake().await;

    h.emit(ClientEvent::MachineAuthUpdate(MachineAuthUpdate {
        job_id: JobId(5),
        file_name: "ssfn".into(),
        offset: 0,
        bytes_to_write: 64,
        data: vec![1, 2, 3],
        one_time_password: None,
    }));

    match h.expect().await {
        ClientCommand::RespondMachineAuth(response) => {
            assert_eq!(response.job_id, JobId(5));
            assert_eq!(response.result, EResult::Fail);
            assert_ne!(response.last_error, 0);
            assert_eq!(response.sentry_hash, None);
        }
        other => panic!("expected RespondMachineAuth, got {other:?}"),
    }

    h.emit(welcome());
    h.expect_gc(msg_type::CLIENT_REPORT_PLAYER).await;
}

#[tokio::test(start_paused = true)]
async fn test_existing_sentry_file_hash_sent_on_first_logon() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("alice.sentry"), b"approved-before").unwrap();

    let mut h = Harness::start_in(
        dir,
        report(),
        SessionConfig::default(),
        LogPrompt,
        NoReputation,
    );
    assert_eq!(h.expect().await, ClientCommand::Connect);
    h.emit(connected(EResult::Ok));

    assert_eq!(
        h.expect_log_on().await.sentry_hash,
        Some(sha1_of(b"approved-before"))
    );
}
