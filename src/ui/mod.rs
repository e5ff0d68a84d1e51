//! User interface rendering and input handling.
//!
//! - **keymapper**: Keyboard and paste input to VT byte sequence mapping
//! - **view**: Terminal or status panel, derived from session status
//! - **renderer**: Draws a view with crossterm

pub mod keymapper;
pub mod renderer;
pub mod view;

pub use keymapper::*;
pub use renderer::{Placement, Renderer};
pub use view::{Panel, SessionView};
