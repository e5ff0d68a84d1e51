//! Core session components.
//!
//! - **term**: VT100/VT220 terminal state and escape sequence parser
//! - **emulator**: The emulator seam and its VT implementation
//! - **addons**: Fit-to-container and link detection
//! - **observer**: Deferred container resize tracking
//! - **status**: Session status model
//! - **session**: Session ids and the outbound command path
//! - **controller**: Binds one emulator to one session over the transport
//!
//! # Architecture
//!
//! ```text
//! TerminalSessionController
//! ├── SessionLink (shared transport + current session id)
//! ├── StatusModel
//! └── MountedSession (rebuilt per session id)
//!     ├── Emulator (VtEmulator: TerminalState + VtParser)
//!     ├── ContainerObserver
//!     └── transport Subscriptions
//! ```

pub mod addons;
pub mod controller;
pub mod emulator;
pub mod observer;
pub mod session;
pub mod status;
pub mod term;

pub use addons::{ContainerSize, FitAddon, Link, LinkifyAddon};
pub use controller::{ControllerOptions, PropsChange, SessionProps, TerminalSessionController};
pub use emulator::{
    Addon, Emulator, EmulatorEvent, EmulatorFactory, EmulatorOptions, ListenerId, ScreenSnapshot,
    VtEmulator, VtEmulatorFactory,
};
pub use session::{SessionCommand, SessionId, SessionLink};
pub use status::{SessionStatus, StatusModel, StatusTrigger};
