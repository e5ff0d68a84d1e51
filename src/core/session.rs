//! Session identity and the outbound path for one session.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport::{ClientMessage, Transport};

/// Opaque session identifier assigned by the session server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outbound action for the linked session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Input(String),
    Resize { cols: u16, rows: u16 },
    Interrupt,
    Attach,
    Detach,
    Resume,
}

impl SessionCommand {
    pub fn into_message(self, session_id: SessionId) -> ClientMessage {
        match self {
            SessionCommand::Input(data) => ClientMessage::Input { session_id, data },
            SessionCommand::Resize { cols, rows } => ClientMessage::Resize {
                session_id,
                cols,
                rows,
            },
            SessionCommand::Interrupt => ClientMessage::Interrupt { session_id },
            SessionCommand::Attach => ClientMessage::Attach { session_id },
            SessionCommand::Detach => ClientMessage::Detach { session_id },
            SessionCommand::Resume => ClientMessage::Resume { session_id },
        }
    }
}

/// The latest transport handle and session id for one controller.
///
/// Long-lived emulator and key handlers hold an `Rc<RefCell<SessionLink>>`
/// and read through it on every call, so they never act on a stale session
/// id or connection state.
pub struct SessionLink {
    transport: Rc<dyn Transport>,
    session_id: SessionId,
}

impl SessionLink {
    pub fn new(transport: Rc<dyn Transport>, session_id: SessionId) -> Self {
        Self {
            transport,
            session_id,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn set_session_id(&mut self, session_id: SessionId) {
        self.session_id = session_id;
    }

    pub fn transport(&self) -> &Rc<dyn Transport> {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Send `command` for the linked session if the transport is up.
    /// Returns whether anything was sent.
    pub fn send(&self, command: SessionCommand) -> bool {
        if !self.transport.is_connected() {
            debug!("Skipping {:?} for {}: transport disconnected", command, self.session_id);
            return false;
        }
        self.transport.send(command.into_message(self.session_id.clone()));
        true
    }
}
