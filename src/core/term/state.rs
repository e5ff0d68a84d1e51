//! Screen model
//!
//! Cell grid, scrollback, cursor and attribute state driven by the VT parser.

use std::collections::VecDeque;

use bitflags::bitflags;
use unicode_width::UnicodeWidthChar;

/// Screen state of one emulator instance
pub struct TerminalState {
    pub cols: u16,
    pub rows: u16,
    pub primary_screen: ScreenBuffer,
    pub alternate_screen: ScreenBuffer,
    pub using_alternate: bool,
    pub primary_cursor: CursorState,
    pub alternate_cursor: CursorState,
    pub current_attrs: CellAttrs,
    pub modes: TerminalModes,
    pub title: String,
    /// Scroll region (top, bottom) - 0-indexed, inclusive
    pub scroll_region: (u16, u16),
    scrollback_limit: usize,
}

impl TerminalState {
    pub fn new(cols: u16, rows: u16, scrollback_limit: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            primary_screen: ScreenBuffer::new(cols, rows, scrollback_limit),
            // The alternate screen never keeps history
            alternate_screen: ScreenBuffer::new(cols, rows, 0),
            using_alternate: false,
            primary_cursor: CursorState::default(),
            alternate_cursor: CursorState::default(),
            current_attrs: CellAttrs::default(),
            modes: TerminalModes::default(),
            title: String::new(),
            scroll_region: (0, rows - 1),
            scrollback_limit,
        }
    }

    /// Hard reset (RIS), keeping geometry and scrollback capacity
    pub fn reset(&mut self) {
        *self = Self::new(self.cols, self.rows, self.scrollback_limit);
    }

    pub fn active_screen(&self) -> &ScreenBuffer {
        if self.using_alternate {
            &self.alternate_screen
        } else {
            &self.primary_screen
        }
    }

    pub fn active_screen_mut(&mut self) -> &mut ScreenBuffer {
        if self.using_alternate {
            &mut self.alternate_screen
        } else {
            &mut self.primary_screen
        }
    }

    pub fn active_cursor(&self) -> &CursorState {
        if self.using_alternate {
            &self.alternate_cursor
        } else {
            &self.primary_cursor
        }
    }

    pub fn active_cursor_mut(&mut self) -> &mut CursorState {
        if self.using_alternate {
            &mut self.alternate_cursor
        } else {
            &mut self.primary_cursor
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        self.cols = cols;
        self.rows = rows;
        let shifted = self.primary_screen.resize(cols, rows, self.primary_cursor.row as usize);
        self.primary_cursor.row = self.primary_cursor.row.saturating_sub(shifted);
        let shifted = self.alternate_screen.resize(cols, rows, self.alternate_cursor.row as usize);
        self.alternate_cursor.row = self.alternate_cursor.row.saturating_sub(shifted);
        self.scroll_region = (0, rows - 1);

        for cursor in [&mut self.primary_cursor, &mut self.alternate_cursor] {
            cursor.col = cursor.col.min(cols - 1);
            cursor.row = cursor.row.min(rows - 1);
        }
    }

    /// Drop all history and blank the screen, keeping the cursor line as the
    /// first row so an in-progress prompt survives.
    pub fn clear(&mut self) {
        let (cols, rows) = (self.cols, self.rows as usize);
        let cursor_row = self.active_cursor().row as usize;
        let screen = self.active_screen_mut();
        let kept = if cursor_row < screen.rows.len() {
            screen.rows.remove(cursor_row)
        } else {
            Row::new(cols)
        };
        screen.scrollback.clear();
        screen.scroll_offset = 0;
        screen.rows.clear();
        screen.rows.push(kept);
        while screen.rows.len() < rows {
            screen.rows.push(Row::new(cols));
        }
        self.active_cursor_mut().row = 0;
    }

    /// Print a character at the cursor, wrapping when auto-wrap is on
    pub fn put_char(&mut self, ch: char) {
        let width = ch.width().unwrap_or(0) as u16;
        if width == 0 {
            self.append_to_previous_cell(ch);
            return;
        }

        if self.active_cursor().col + width > self.cols {
            if self.modes.auto_wrap {
                let row = self.active_cursor().row as usize;
                self.active_screen_mut().rows[row].wrapped = true;
                self.active_cursor_mut().col = 0;
                self.linefeed();
            } else {
                self.active_cursor_mut().col = self.cols.saturating_sub(width);
            }
        }

        let (row, col) = {
            let cursor = self.active_cursor();
            (cursor.row as usize, cursor.col as usize)
        };
        let cols = self.cols as usize;
        let attrs = self.current_attrs.clone();
        let insert = self.modes.insert_mode;

        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        if insert {
            for _ in 0..width {
                line.cells.pop();
                line.cells.insert(col, Cell::default());
            }
        }
        line.split_wide_at(col);
        line.cells[col] = Cell {
            grapheme: ch.to_string(),
            width: width as u8,
            attrs: attrs.clone(),
        };
        if width == 2 && col + 1 < cols {
            line.split_wide_at(col + 1);
            line.cells[col + 1] = Cell::continuation(&attrs);
        }

        self.active_cursor_mut().col += width;
    }

    fn append_to_previous_cell(&mut self, ch: char) {
        let (row, col) = {
            let cursor = self.active_cursor();
            (cursor.row as usize, cursor.col as usize)
        };
        if col == 0 {
            return;
        }
        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        let mut target = col.min(line.cells.len()) - 1;
        if line.cells[target].is_continuation() && target > 0 {
            target -= 1;
        }
        line.cells[target].grapheme.push(ch);
    }

    pub fn carriage_return(&mut self) {
        self.active_cursor_mut().col = 0;
    }

    /// Line feed, scrolling when the cursor sits on the bottom margin
    pub fn linefeed(&mut self) {
        let cursor_row = self.active_cursor().row;
        if cursor_row == self.scroll_region.1 {
            self.scroll_up(1);
        } else if cursor_row + 1 < self.rows {
            self.active_cursor_mut().row += 1;
        }
        if self.modes.linefeed_newline {
            self.carriage_return();
        }
    }

    pub fn backspace(&mut self) {
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.saturating_sub(1);
    }

    pub fn horizontal_tab(&mut self) {
        let last = self.cols - 1;
        let cursor = self.active_cursor_mut();
        cursor.col = ((cursor.col / 8 + 1) * 8).min(last);
    }

    pub fn scroll_up(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let cols = self.cols;
        let keep_history = !self.using_alternate && top == 0;
        let screen = self.active_screen_mut();
        for _ in 0..n {
            let removed = screen.rows.remove(top as usize);
            if keep_history {
                screen.push_to_scrollback(removed);
            }
            screen.rows.insert(bottom as usize, Row::new(cols));
        }
    }

    pub fn scroll_down(&mut self, n: u16) {
        let (top, bottom) = self.scroll_region;
        let cols = self.cols;
        let screen = self.active_screen_mut();
        for _ in 0..n {
            screen.rows.remove(bottom as usize);
            screen.rows.insert(top as usize, Row::new(cols));
        }
    }

    pub fn cursor_up(&mut self, n: u16) {
        let cursor = self.active_cursor_mut();
        cursor.row = cursor.row.saturating_sub(n);
    }

    pub fn cursor_down(&mut self, n: u16) {
        let last = self.rows - 1;
        let cursor = self.active_cursor_mut();
        cursor.row = cursor.row.saturating_add(n).min(last);
    }

    pub fn cursor_forward(&mut self, n: u16) {
        let last = self.cols - 1;
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.saturating_add(n).min(last);
    }

    pub fn cursor_backward(&mut self, n: u16) {
        let cursor = self.active_cursor_mut();
        cursor.col = cursor.col.saturating_sub(n);
    }

    /// CUP with 1-indexed parameters
    pub fn cursor_position(&mut self, row: u16, col: u16) {
        let (last_row, last_col) = (self.rows - 1, self.cols - 1);
        let cursor = self.active_cursor_mut();
        cursor.row = row.saturating_sub(1).min(last_row);
        cursor.col = col.saturating_sub(1).min(last_col);
    }

    pub fn set_cursor_col(&mut self, col: u16) {
        let last = self.cols - 1;
        self.active_cursor_mut().col = col.saturating_sub(1).min(last);
    }

    pub fn set_cursor_row(&mut self, row: u16) {
        let last = self.rows - 1;
        self.active_cursor_mut().row = row.saturating_sub(1).min(last);
    }

    pub fn erase_in_display(&mut self, mode: u16) {
        let cursor_row = self.active_cursor().row as usize;
        let attrs = self.current_attrs.clone();
        let range = match mode {
            0 => {
                self.erase_in_line(0);
                cursor_row + 1..self.rows as usize
            }
            1 => {
                self.erase_in_line(1);
                0..cursor_row
            }
            2 => 0..self.rows as usize,
            3 => {
                let screen = self.active_screen_mut();
                screen.scrollback.clear();
                screen.scroll_offset = 0;
                return;
            }
            _ => return,
        };
        let screen = self.active_screen_mut();
        for r in range {
            screen.rows[r].clear(&attrs);
        }
    }

    pub fn erase_in_line(&mut self, mode: u16) {
        let (row, col) = {
            let cursor = self.active_cursor();
            (cursor.row as usize, cursor.col as usize)
        };
        let attrs = self.current_attrs.clone();
        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        let len = line.cells.len();
        let range = match mode {
            0 => col.min(len)..len,
            1 => 0..(col + 1).min(len),
            2 => 0..len,
            _ => return,
        };
        for cell in &mut line.cells[range] {
            cell.clear(&attrs);
        }
    }

    /// Cursor position for in-line edits. A cursor parked past the last
    /// column after a full line acts on the last column.
    fn edit_position(&self) -> (usize, usize) {
        let cursor = self.active_cursor();
        let last = self.cols.saturating_sub(1);
        (cursor.row as usize, cursor.col.min(last) as usize)
    }

    /// ECH
    pub fn erase_chars(&mut self, n: u16) {
        let (row, col) = self.edit_position();
        let attrs = self.current_attrs.clone();
        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        let end = (col + n as usize).min(line.cells.len());
        for cell in &mut line.cells[col.min(end)..end] {
            cell.clear(&attrs);
        }
    }

    /// ICH
    pub fn insert_chars(&mut self, n: u16) {
        let (row, col) = self.edit_position();
        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        if col >= line.cells.len() {
            return;
        }
        for _ in 0..n.min(line.cells.len() as u16) {
            line.cells.pop();
            line.cells.insert(col, Cell::default());
        }
    }

    /// DCH
    pub fn delete_chars(&mut self, n: u16) {
        let (row, col) = self.edit_position();
        let screen = self.active_screen_mut();
        let line = &mut screen.rows[row];
        for _ in 0..n.min(line.cells.len() as u16) {
            if col < line.cells.len() {
                line.cells.remove(col);
                line.cells.push(Cell::default());
            }
        }
    }

    pub fn insert_lines(&mut self, n: u16) {
        let cursor_row = self.active_cursor().row;
        let (top, bottom) = self.scroll_region;
        if cursor_row < top || cursor_row > bottom {
            return;
        }
        let cols = self.cols;
        let screen = self.active_screen_mut();
        for _ in 0..n {
            screen.rows.remove(bottom as usize);
            screen.rows.insert(cursor_row as usize, Row::new(cols));
        }
    }

    pub fn delete_lines(&mut self, n: u16) {
        let cursor_row = self.active_cursor().row;
        let (top, bottom) = self.scroll_region;
        if cursor_row < top || cursor_row > bottom {
            return;
        }
        let cols = self.cols;
        let screen = self.active_screen_mut();
        for _ in 0..n {
            screen.rows.remove(cursor_row as usize);
            screen.rows.insert(bottom as usize, Row::new(cols));
        }
    }

    /// DECSTBM with 1-indexed parameters
    pub fn set_scroll_region(&mut self, top: u16, bottom: u16) {
        let last = self.rows - 1;
        let top = top.saturating_sub(1).min(last);
        let bottom = bottom.saturating_sub(1).min(last);
        if top < bottom {
            self.scroll_region = (top, bottom);
        }
    }

    pub fn save_cursor(&mut self) {
        let saved = SavedCursor {
            col: self.active_cursor().col,
            row: self.active_cursor().row,
            attrs: self.current_attrs.clone(),
        };
        self.active_cursor_mut().saved = Some(saved);
    }

    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.active_cursor().saved.clone() {
            // The grid may have shrunk since the save
            let (last_col, last_row) = (self.cols - 1, self.rows - 1);
            let cursor = self.active_cursor_mut();
            cursor.col = saved.col.min(last_col);
            cursor.row = saved.row.min(last_row);
            self.current_attrs = saved.attrs;
        }
    }

    pub fn set_private_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.application_cursor = enable,
            7 => self.modes.auto_wrap = enable,
            25 => self.active_cursor_mut().visible = enable,
            47 | 1047 => self.switch_screen(enable),
            1048 => {
                if enable {
                    self.save_cursor();
                } else {
                    self.restore_cursor();
                }
            }
            1049 => {
                if enable {
                    self.save_cursor();
                    self.switch_screen(true);
                    self.alternate_cursor = CursorState::default();
                } else {
                    self.switch_screen(false);
                    self.restore_cursor();
                }
            }
            2004 => self.modes.bracketed_paste = enable,
            _ => {}
        }
    }

    fn switch_screen(&mut self, alternate: bool) {
        if alternate && !self.using_alternate {
            self.alternate_screen = ScreenBuffer::new(self.cols, self.rows, 0);
        }
        self.using_alternate = alternate;
    }

    /// RI
    pub fn reverse_index(&mut self) {
        if self.active_cursor().row == self.scroll_region.0 {
            self.scroll_down(1);
        } else {
            self.cursor_up(1);
        }
    }

    /// Plain text of a visible row with trailing blanks removed
    pub fn row_text(&self, row: usize) -> String {
        self.active_screen()
            .get_row_at(row)
            .map(Row::text)
            .unwrap_or_default()
    }

    /// Plain text of the whole visible screen, one entry per row
    pub fn visible_text(&self) -> Vec<String> {
        (0..self.rows as usize).map(|r| self.row_text(r)).collect()
    }
}

/// Screen rows plus bounded scrollback
pub struct ScreenBuffer {
    pub rows: Vec<Row>,
    pub scrollback: VecDeque<Row>,
    pub scrollback_limit: usize,
    /// 0 = live view, >0 = scrolled back by that many lines
    pub scroll_offset: usize,
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16, scrollback_limit: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Row::new(cols)).collect(),
            scrollback: VecDeque::new(),
            scrollback_limit,
            scroll_offset: 0,
        }
    }

    /// Returns how many rows moved into history, so the caller can shift its cursor.
    pub fn resize(&mut self, cols: u16, rows: u16, cursor_row: usize) -> u16 {
        let rows = rows as usize;
        let mut shifted = 0;
        // Rows below the cursor go first, then the top rows move into history
        while self.rows.len() > rows {
            if self.rows.len() - 1 > cursor_row {
                self.rows.pop();
            } else {
                let removed = self.rows.remove(0);
                self.push_to_scrollback(removed);
                shifted += 1;
            }
        }
        while self.rows.len() < rows {
            self.rows.push(Row::new(cols));
        }
        for row in self.rows.iter_mut().chain(self.scrollback.iter_mut()) {
            row.resize(cols);
        }
        self.scroll_offset = self.scroll_offset.min(self.scrollback.len());
        shifted
    }

    pub fn push_to_scrollback(&mut self, row: Row) {
        if self.scrollback_limit == 0 {
            return;
        }
        self.scrollback.push_back(row);
        while self.scrollback.len() > self.scrollback_limit {
            self.scrollback.pop_front();
        }
    }

    /// Visible row, accounting for the scroll offset
    pub fn get_row_at(&self, visible_row: usize) -> Option<&Row> {
        let history = self.scrollback.len();
        let absolute = history.saturating_sub(self.scroll_offset) + visible_row;
        if absolute < history {
            self.scrollback.get(absolute)
        } else {
            self.rows.get(absolute - history)
        }
    }

    pub fn scroll_view_up(&mut self, n: usize) {
        self.scroll_offset = (self.scroll_offset + n).min(self.scrollback.len());
    }

    pub fn scroll_view_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}

#[derive(Clone)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub wrapped: bool,
}

impl Row {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            wrapped: false,
        }
    }

    pub fn resize(&mut self, cols: u16) {
        self.cells.resize(cols as usize, Cell::default());
    }

    pub fn clear(&mut self, attrs: &CellAttrs) {
        for cell in &mut self.cells {
            cell.clear(attrs);
        }
        self.wrapped = false;
    }

    /// Blank out both halves of a wide character that overlaps `col`
    fn split_wide_at(&mut self, col: usize) {
        if col > 0 && self.cells[col].is_continuation() {
            let attrs = self.cells[col - 1].attrs.clone();
            self.cells[col - 1].clear(&attrs);
        }
        if self.cells[col].width == 2 && col + 1 < self.cells.len() {
            let attrs = self.cells[col + 1].attrs.clone();
            self.cells[col + 1].clear(&attrs);
        }
    }

    pub fn text(&self) -> String {
        let mut out: String = self
            .cells
            .iter()
            .filter(|c| !c.is_continuation())
            .map(Cell::display_char)
            .collect();
        out.truncate(out.trim_end().len());
        out
    }
}

#[derive(Clone)]
pub struct Cell {
    pub grapheme: String,
    pub width: u8,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            grapheme: String::new(),
            width: 1,
            attrs: CellAttrs::default(),
        }
    }
}

impl Cell {
    pub fn clear(&mut self, attrs: &CellAttrs) {
        self.grapheme.clear();
        self.width = 1;
        self.attrs = attrs.clone();
    }

    pub fn continuation(attrs: &CellAttrs) -> Self {
        Self {
            grapheme: String::new(),
            width: 0,
            attrs: attrs.clone(),
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    pub fn display_char(&self) -> &str {
        if self.grapheme.is_empty() {
            " "
        } else {
            &self.grapheme
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Cell color as set by SGR
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
    Rgb(u8, u8, u8),
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct AttrFlags: u16 {
        const BOLD          = 0b0000_0000_0001;
        const DIM           = 0b0000_0000_0010;
        const ITALIC        = 0b0000_0000_0100;
        const UNDERLINE     = 0b0000_0000_1000;
        const BLINK         = 0b0000_0001_0000;
        const INVERSE       = 0b0000_0010_0000;
        const HIDDEN        = 0b0000_0100_0000;
        const STRIKETHROUGH = 0b0000_1000_0000;
    }
}

#[derive(Clone)]
pub struct CursorState {
    pub col: u16,
    pub row: u16,
    pub visible: bool,
    pub saved: Option<SavedCursor>,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            col: 0,
            row: 0,
            visible: true,
            saved: None,
        }
    }
}

#[derive(Clone)]
pub struct SavedCursor {
    pub col: u16,
    pub row: u16,
    pub attrs: CellAttrs,
}

/// Mode flags that change how input is encoded or output is interpreted
#[derive(Clone, Debug)]
pub struct TerminalModes {
    pub application_cursor: bool,
    pub auto_wrap: bool,
    pub insert_mode: bool,
    pub linefeed_newline: bool,
    pub bracketed_paste: bool,
}

impl Default for TerminalModes {
    fn default() -> Self {
        Self {
            application_cursor: false,
            auto_wrap: true,
            insert_mode: false,
            linefeed_newline: false,
            bracketed_paste: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn print(state: &mut TerminalState, text: &str) {
        for ch in text.chars() {
            state.put_char(ch);
        }
    }

    #[test]
    fn test_wrap_pushes_to_next_row() {
        let mut state = TerminalState::new(4, 3, 100);
        print(&mut state, "abcdef");
        assert_eq!(state.row_text(0), "abcd");
        assert_eq!(state.row_text(1), "ef");
        assert!(state.primary_screen.rows[0].wrapped);
    }

    #[test]
    fn test_scrollback_is_bounded() {
        let mut state = TerminalState::new(10, 2, 3);
        for i in 0..10 {
            print(&mut state, &i.to_string());
            state.carriage_return();
            state.linefeed();
        }
        assert_eq!(state.primary_screen.scrollback.len(), 3);
        assert_eq!(state.primary_screen.scrollback.back().map(Row::text), Some("8".into()));
    }

    #[test]
    fn test_clear_keeps_cursor_line_only() {
        let mut state = TerminalState::new(10, 3, 100);
        for line in ["one", "two", "three", "four"] {
            print(&mut state, line);
            state.carriage_return();
            state.linefeed();
        }
        print(&mut state, "$ ");
        state.clear();
        assert!(state.primary_screen.scrollback.is_empty());
        assert_eq!(state.visible_text(), vec!["$", "", ""]);
        assert_eq!(state.active_cursor().row, 0);
        assert_eq!(state.active_cursor().col, 2);
    }

    #[test]
    fn test_wide_char_occupies_two_cells() {
        let mut state = TerminalState::new(6, 1, 0);
        print(&mut state, "日本");
        assert_eq!(state.active_cursor().col, 4);
        assert!(state.primary_screen.rows[0].cells[1].is_continuation());
        assert_eq!(state.row_text(0), "日本");
    }

    #[test]
    fn test_char_edits_at_the_wrap_column() {
        let mut state = TerminalState::new(5, 2, 0);
        print(&mut state, "abcde");
        assert_eq!(state.active_cursor().col, 5);

        state.insert_chars(1);
        assert_eq!(state.row_text(0), "abcd");
        assert_eq!(state.primary_screen.rows[0].cells.len(), 5);

        print(&mut state, "xyz");
        state.carriage_return();
        state.linefeed();
        print(&mut state, "vwxyz");
        state.delete_chars(3);
        assert_eq!(state.row_text(1), "vwxy");
        print(&mut state, "12345");
        state.erase_chars(9);
        assert_eq!(state.row_text(1), "1234");
        assert_eq!(state.primary_screen.rows[1].cells.len(), 5);
    }

    #[test]
    fn test_restore_cursor_after_shrink() {
        let mut state = TerminalState::new(80, 24, 100);
        state.active_cursor_mut().row = 19;
        state.active_cursor_mut().col = 70;
        state.save_cursor();
        state.resize(40, 10);
        state.restore_cursor();
        assert_eq!(state.active_cursor().row, 9);
        assert_eq!(state.active_cursor().col, 39);
        print(&mut state, "x");
        assert_eq!(state.row_text(9).trim_start(), "x");
    }

    #[test]
    fn test_resize_shrink_moves_rows_into_history() {
        let mut state = TerminalState::new(5, 4, 10);
        for line in ["a", "b", "c", "d"] {
            print(&mut state, line);
            if line != "d" {
                state.carriage_return();
                state.linefeed();
            }
        }
        state.resize(5, 2);
        assert_eq!(state.visible_text(), vec!["c", "d"]);
        assert_eq!(state.primary_screen.scrollback.len(), 2);
    }
}
