//! Session renderer using crossterm
//!
//! Draws either the emulator screen or the status panel that replaces it.
//! Output goes to any writer, so the same code serves a real terminal and
//! captured buffers.

use std::io::{self, Write};

use crossterm::{
    cursor::{MoveTo, MoveToNextLine},
    queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
};

use super::view::{Panel, SessionView};
use crate::config::Palette;
use crate::core::emulator::ScreenSnapshot;
use crate::core::term::{AttrFlags, CellAttrs, Color};

/// Where a frame is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Absolute positioning from the top-left corner (full-screen use)
    Absolute,
    /// Line after line from wherever the writer currently is
    Inline,
}

pub struct Renderer {
    palette: Palette,
    placement: Placement,
}

impl Renderer {
    pub fn new(palette: Palette, placement: Placement) -> Self {
        Self { palette, placement }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Render one frame for `view`. `snapshot` is only drawn when the view
    /// shows the live terminal.
    pub fn render<W: Write>(
        &self,
        out: &mut W,
        view: SessionView,
        snapshot: Option<&ScreenSnapshot>,
    ) -> io::Result<()> {
        match (view.panel(), snapshot) {
            (Some(panel), _) => self.render_panel(out, &panel)?,
            (None, Some(snapshot)) => self.render_screen(out, snapshot)?,
            (None, None) => {}
        }
        queue!(out, ResetColor, SetAttribute(Attribute::Reset))?;
        out.flush()
    }

    fn begin_line<W: Write>(&self, out: &mut W, row: u16) -> io::Result<()> {
        match self.placement {
            Placement::Absolute => queue!(out, MoveTo(0, row)),
            Placement::Inline if row > 0 => queue!(out, ResetColor, MoveToNextLine(1)),
            Placement::Inline => Ok(()),
        }
    }

    fn render_panel<W: Write>(&self, out: &mut W, panel: &Panel) -> io::Result<()> {
        let fg = self.palette.foreground.to_crossterm();
        let accent = if panel.enabled {
            self.palette.ansi[4].to_crossterm()
        } else {
            self.palette.ansi[8].to_crossterm()
        };

        self.begin_line(out, 0)?;
        queue!(
            out,
            SetForegroundColor(fg),
            SetAttribute(Attribute::Bold),
            Print(panel.title),
            SetAttribute(Attribute::Reset)
        )?;
        self.begin_line(out, 1)?;
        queue!(out, SetForegroundColor(fg), Print(panel.message))?;
        self.begin_line(out, 2)?;
        queue!(out, SetForegroundColor(accent), Print(format!("[ {} ]", panel.action)))?;
        if !panel.enabled {
            queue!(out, SetForegroundColor(fg), Print(" (disconnected)"))?;
        }
        Ok(())
    }

    fn render_screen<W: Write>(&self, out: &mut W, snapshot: &ScreenSnapshot) -> io::Result<()> {
        let mut line_buffer = String::with_capacity(snapshot.cols as usize);

        for (row_idx, row) in snapshot.lines.iter().enumerate() {
            self.begin_line(out, row_idx as u16)?;
            let mut current_attrs = CellAttrs::default();
            self.apply_attrs(out, &current_attrs)?;

            let mut col_idx: u16 = 0;
            for cell in &row.cells {
                if col_idx >= snapshot.cols {
                    break;
                }
                if cell.is_continuation() {
                    col_idx += 1;
                    continue;
                }
                if cell.attrs != current_attrs {
                    if !line_buffer.is_empty() {
                        queue!(out, Print(&line_buffer))?;
                        line_buffer.clear();
                    }
                    current_attrs = cell.attrs.clone();
                    self.apply_attrs(out, &current_attrs)?;
                }
                line_buffer.push_str(cell.display_char());
                col_idx += cell.width.max(1) as u16;
            }

            let trimmed = line_buffer.trim_end().len();
            if current_attrs == CellAttrs::default() {
                line_buffer.truncate(trimmed);
            }
            if !line_buffer.is_empty() {
                queue!(out, Print(&line_buffer))?;
                line_buffer.clear();
            }
        }
        Ok(())
    }

    fn apply_attrs<W: Write>(&self, out: &mut W, attrs: &CellAttrs) -> io::Result<()> {
        queue!(out, SetAttribute(Attribute::Reset))?;

        if attrs.flags.contains(AttrFlags::BOLD) {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if attrs.flags.contains(AttrFlags::DIM) {
            queue!(out, SetAttribute(Attribute::Dim))?;
        }
        if attrs.flags.contains(AttrFlags::ITALIC) {
            queue!(out, SetAttribute(Attribute::Italic))?;
        }
        if attrs.flags.contains(AttrFlags::UNDERLINE) {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        if attrs.flags.contains(AttrFlags::STRIKETHROUGH) {
            queue!(out, SetAttribute(Attribute::CrossedOut))?;
        }

        let (mut fg, mut bg) = (
            self.resolve(attrs.fg, self.palette.foreground.to_crossterm()),
            self.resolve(attrs.bg, self.palette.background.to_crossterm()),
        );
        if attrs.flags.contains(AttrFlags::INVERSE) {
            std::mem::swap(&mut fg, &mut bg);
        }
        if attrs.flags.contains(AttrFlags::HIDDEN) {
            fg = bg;
        }
        queue!(out, SetForegroundColor(fg), SetBackgroundColor(bg))
    }

    /// Map a cell color through the palette
    fn resolve(&self, color: Color, default: TermColor) -> TermColor {
        match color {
            Color::Default => default,
            Color::Indexed(idx) if idx < 16 => self.palette.ansi[idx as usize].to_crossterm(),
            Color::Indexed(idx) => TermColor::AnsiValue(idx),
            Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        }
    }
}
