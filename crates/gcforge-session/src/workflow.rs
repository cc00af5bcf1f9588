//! The workflow dispatcher: one report or one commendation per session.
//!
//! The dispatcher builds the coordinator messages (hello and the workflow
//! request) and recognizes the response that completes the workflow. It
//! does not send anything itself; the session does.

use gcforge_protocol::gc::{
    ClientHello, CommendPlayer, CommendResponse, ReportPlayer, ReportResponse, msg_type,
};
use gcforge_protocol::{Codec, GcMessage, ProtocolError, SteamId};
use serde::{Deserialize, Serialize};

/// The single action a session performs once it reaches the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WorkflowRequest {
    /// Report `target` for misconduct in `match_id`.
    Report { target: SteamId, match_id: u64 },
    /// Commend `target`.
    Commend { target: SteamId },
}

impl WorkflowRequest {
    pub fn target(&self) -> SteamId {
        match self {
            Self::Report { target, .. } | Self::Commend { target } => *target,
        }
    }

    /// The coordinator message type that answers this workflow.
    fn response_route(&self) -> GcRoute {
        match self {
            Self::Report { .. } => GcRoute::ReportResponse,
            Self::Commend { .. } => GcRoute::CommendResponse,
        }
    }
}

/// Where an inbound coordinator message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcRoute {
    Welcome,
    ReportResponse,
    CommendResponse,
}

impl GcRoute {
    /// The dispatch table. Unknown message types have no route.
    pub fn from_msg_type(msg_type: u32) -> Option<Self> {
        match msg_type {
            msg_type::CLIENT_WELCOME => Some(Self::Welcome),
            msg_type::CLIENT_REPORT_RESPONSE => Some(Self::ReportResponse),
            msg_type::CLIENT_COMMEND_PLAYER_QUERY_RESPONSE => Some(Self::CommendResponse),
            _ => None,
        }
    }
}

/// The workflow finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowCompletion {
    /// The coordinator's confirmation id. Reports only.
    pub confirmation_id: Option<u64>,
}

/// Builds and correlates the coordinator side of one workflow.
pub struct WorkflowDispatcher<C: Codec> {
    workflow: WorkflowRequest,
    codec: C,
    sent: bool,
    completed: bool,
}

impl<C: Codec> WorkflowDispatcher<C> {
    pub fn new(workflow: WorkflowRequest, codec: C) -> Self {
        Self {
            workflow,
            codec,
            sent: false,
            completed: false,
        }
    }

    pub fn workflow(&self) -> &WorkflowRequest {
        &self.workflow
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// The coordinator hello.
    pub fn hello(&self) -> Result<GcMessage, ProtocolError> {
        GcMessage::encode(&self.codec, msg_type::CLIENT_HELLO, &ClientHello::default())
    }

    /// Encodes the workflow request. Does not mark it sent.
    pub fn build_request(&self) -> Result<GcMessage, ProtocolError> {
        match self.workflow {
            WorkflowRequest::Report { target, match_id } => GcMessage::encode(
                &self.codec,
                msg_type::CLIENT_REPORT_PLAYER,
                &ReportPlayer::all_categories(target, match_id),
            ),
            WorkflowRequest::Commend { target } => GcMessage::encode(
                &self.codec,
                msg_type::CLIENT_COMMEND_PLAYER,
                &CommendPlayer::all_categories(target),
            ),
        }
    }

    /// The request, the first time it is asked for. `Ok(None)` afterwards:
    /// the workflow gets exactly one attempt.
    pub fn take_request(&mut self) -> Result<Option<GcMessage>, ProtocolError> {
        if self.sent {
            return Ok(None);
        }
        let message = self.build_request()?;
        self.sent = true;
        Ok(Some(message))
    }

    /// Checks whether `message` completes the workflow.
    ///
    /// `Ok(None)` for a response of the other workflow kind, a response
    /// before the request went out, or a repeat after completion.
    pub fn on_response(
        &mut self,
        route: GcRoute,
        message: &GcMessage,
    ) -> Result<Option<WorkflowCompletion>, ProtocolError> {
        if route != self.workflow.response_route() || !self.sent || self.completed {
            return Ok(None);
        }
        let completion = match route {
            GcRoute::ReportResponse => {
                let body: ReportResponse =
                    message.decode(&self.codec, msg_type::CLIENT_REPORT_RESPONSE)?;
                WorkflowCompletion {
                    confirmation_id: Some(body.confirmation_id),
                }
            }
            GcRoute::CommendResponse => {
                let _body: CommendResponse = message
                    .decode(&self.codec, msg_type::CLIENT_COMMEND_PLAYER_QUERY_RESPONSE)?;
                WorkflowCompletion {
                    confirmation_id: None,
                }
            }
            GcRoute::Welcome => return Ok(None),
        };
        self.completed = true;
        Ok(Some(completion))
    }
}
