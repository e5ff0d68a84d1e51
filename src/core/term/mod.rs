//! VT100/VT220 screen model and escape sequence parser.

mod parser;
mod state;

pub use parser::{Response, VtParser};
pub use state::{
    AttrFlags, Cell, CellAttrs, Color, CursorState, Row, ScreenBuffer, TerminalModes,
    TerminalState,
};
