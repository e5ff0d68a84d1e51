//! What a session controller shows, derived from status and connectivity.

use crate::core::status::SessionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    /// Live emulator
    Terminal,
    /// Nothing running behind the session; the buffer is kept but hidden
    Idle { resume_enabled: bool },
    /// Backing process crashed
    Crashed { restart_enabled: bool },
}

/// Static content of a status panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    pub title: &'static str,
    pub message: &'static str,
    pub action: &'static str,
    pub enabled: bool,
}

impl SessionView {
    pub fn for_status(status: SessionStatus, connected: bool) -> Self {
        match status {
            SessionStatus::Idle => SessionView::Idle {
                resume_enabled: connected,
            },
            SessionStatus::Error => SessionView::Crashed {
                restart_enabled: connected,
            },
            _ => SessionView::Terminal,
        }
    }

    pub fn shows_terminal(&self) -> bool {
        matches!(self, SessionView::Terminal)
    }

    /// Panel shown instead of the emulator, if any. Both actions send a
    /// resume request.
    pub fn panel(&self) -> Option<Panel> {
        match *self {
            SessionView::Terminal => None,
            SessionView::Idle { resume_enabled } => Some(Panel {
                title: "Session not running",
                message: "The session's process stopped, possibly after a container restart.",
                action: "Resume Session",
                enabled: resume_enabled,
            }),
            SessionView::Crashed { restart_enabled } => Some(Panel {
                title: "Process crashed",
                message: "The session's process exited unexpectedly.",
                action: "Restart Session",
                enabled: restart_enabled,
            }),
        }
    }
}
