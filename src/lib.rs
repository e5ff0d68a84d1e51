//! bmad-terminal - session terminal controller for a BMAD workflow UI
//!
//! Binds a terminal emulator to a remote shell session over a shared
//! transport, tracks the session's lifecycle status, and types validated
//! BMAD workflow commands into the session.
//!
//! # Layout
//!
//! - **transport**: Wire messages, the `Transport` trait and an in-process transport
//! - **core**: Emulator, status model and the session controller
//! - **actions**: Story and epic workflow dispatch
//! - **ui**: Key mapping, session views and rendering
//! - **config**: `~/.bmad-terminal/config.toml` and palettes

pub mod actions;
pub mod config;
pub mod core;
pub mod error;
pub mod transport;
pub mod ui;

pub use crate::actions::{ActionDispatcher, EpicWorkflow, LogNotifier, Notifier, StoryWorkflow};
pub use crate::config::Config;
pub use crate::core::{
    ContainerSize, ControllerOptions, SessionId, SessionProps, SessionStatus,
    TerminalSessionController,
};
pub use crate::error::{ConfigError, DispatchError, ProtocolError};
pub use crate::transport::{ClientMessage, EventKind, LocalTransport, ServerEvent, Transport};
