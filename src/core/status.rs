//! Session status model
//!
//! Tracks the lifecycle state of the process behind one terminal session.
//! Transitions are not validated: any trigger may move to any state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Process running and producing output
    #[default]
    Active,
    /// Process running, waiting on the user
    Waiting,
    /// No live process behind the session (e.g. after a container restart)
    Idle,
    /// The backing process crashed
    Error,
    /// Session ended deliberately
    Stopped,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Waiting => "waiting",
            SessionStatus::Idle => "idle",
            SessionStatus::Error => "error",
            SessionStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "waiting" => Ok(SessionStatus::Waiting),
            "idle" => Ok(SessionStatus::Idle),
            "error" => Ok(SessionStatus::Error),
            "stopped" => Ok(SessionStatus::Stopped),
            other => Err(format!("unknown session status: {}", other)),
        }
    }
}

/// What moved the status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTrigger {
    /// The owning parent supplied a new status
    Prop(SessionStatus),
    /// `session.status` event for this session
    StatusEvent(SessionStatus),
    /// `terminal.exit` event for this session
    Exit,
}

/// Shared status cell. Clones observe the same state, so long-lived
/// transport handlers can write it while the controller reads it.
#[derive(Debug, Clone, Default)]
pub struct StatusModel {
    current: Rc<Cell<SessionStatus>>,
}

impl StatusModel {
    pub fn new(initial: SessionStatus) -> Self {
        Self {
            current: Rc::new(Cell::new(initial)),
        }
    }

    pub fn get(&self) -> SessionStatus {
        self.current.get()
    }

    /// Apply a trigger and return the resulting state
    pub fn apply(&self, trigger: StatusTrigger) -> SessionStatus {
        let next = match trigger {
            StatusTrigger::Prop(status) | StatusTrigger::StatusEvent(status) => status,
            StatusTrigger::Exit => SessionStatus::Error,
        };
        let previous = self.current.replace(next);
        if previous != next {
            tracing::debug!("Session status {} -> {} ({:?})", previous, next, trigger);
        }
        next
    }
}
