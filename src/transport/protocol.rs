//! Messages exchanged with the session server.
//!
//! One JSON object per message, tagged by `type`, with camelCase fields:
//!
//! ```text
//! {"type":"terminal.input","sessionId":"s-1","data":"ls\r"}
//! {"type":"terminal.output","sessionId":"s-1","data":"total 0\r\n"}
//! ```

use serde::{Deserialize, Serialize};

use crate::core::session::SessionId;
use crate::core::status::SessionStatus;
use crate::error::ProtocolError;

/// Outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "terminal.input", rename_all = "camelCase")]
    Input { session_id: SessionId, data: String },

    #[serde(rename = "terminal.resize", rename_all = "camelCase")]
    Resize {
        session_id: SessionId,
        cols: u16,
        rows: u16,
    },

    #[serde(rename = "terminal.interrupt", rename_all = "camelCase")]
    Interrupt { session_id: SessionId },

    #[serde(rename = "session.attach", rename_all = "camelCase")]
    Attach { session_id: SessionId },

    #[serde(rename = "session.detach", rename_all = "camelCase")]
    Detach { session_id: SessionId },

    #[serde(rename = "session.resume", rename_all = "camelCase")]
    Resume { session_id: SessionId },
}

impl ClientMessage {
    pub fn session_id(&self) -> &SessionId {
        match self {
            ClientMessage::Input { session_id, .. }
            | ClientMessage::Resize { session_id, .. }
            | ClientMessage::Interrupt { session_id }
            | ClientMessage::Attach { session_id }
            | ClientMessage::Detach { session_id }
            | ClientMessage::Resume { session_id } => session_id,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Inbound event kinds a handler can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionStatus,
    SessionAttached,
    TerminalOutput,
    TerminalExit,
}

impl EventKind {
    pub fn name(self) -> &'static str {
        match self {
            EventKind::SessionStatus => "session.status",
            EventKind::SessionAttached => "session.attached",
            EventKind::TerminalOutput => "terminal.output",
            EventKind::TerminalExit => "terminal.exit",
        }
    }
}

/// Inbound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.status", rename_all = "camelCase")]
    Status {
        session_id: SessionId,
        status: SessionStatus,
    },

    #[serde(rename = "session.attached", rename_all = "camelCase")]
    Attached { session_id: SessionId },

    #[serde(rename = "terminal.output", rename_all = "camelCase")]
    Output { session_id: SessionId, data: String },

    #[serde(rename = "terminal.exit", rename_all = "camelCase")]
    Exit {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
}

impl ServerEvent {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            ServerEvent::Status { .. } => EventKind::SessionStatus,
            ServerEvent::Attached { .. } => EventKind::SessionAttached,
            ServerEvent::Output { .. } => EventKind::TerminalOutput,
            ServerEvent::Exit { .. } => EventKind::TerminalExit,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        match self {
            ServerEvent::Status { session_id, .. }
            | ServerEvent::Attached { session_id }
            | ServerEvent::Output { session_id, .. }
            | ServerEvent::Exit { session_id, .. } => session_id,
        }
    }

    /// Whether this event targets `session`
    pub fn is_for(&self, session: &SessionId) -> bool {
        self.session_id() == session
    }
}
