//! Emulator add-ons: fit-to-container and link detection.

use std::sync::LazyLock;

use regex::Regex;

use super::term::TerminalState;

/// Container size in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

impl ContainerSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Hidden or collapsed containers report a zero or negative size
    pub fn is_measurable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

const MIN_COLS: u16 = 2;
const MIN_ROWS: u16 = 1;

/// Derives a grid size from the container and the cell metrics of the font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitAddon {
    cell_width: f32,
    cell_height: f32,
    /// Horizontal space reserved for the scrollbar
    scrollbar_width: f32,
}

impl FitAddon {
    /// Monospace glyphs are ~0.6em wide
    pub fn new(font_size: f32, line_height: f32) -> Self {
        Self {
            cell_width: (font_size * 0.6).max(1.0),
            cell_height: (font_size * line_height).max(1.0),
            scrollbar_width: 14.0,
        }
    }

    pub fn with_cell_size(cell_width: f32, cell_height: f32) -> Self {
        Self {
            cell_width: cell_width.max(1.0),
            cell_height: cell_height.max(1.0),
            scrollbar_width: 0.0,
        }
    }

    /// Grid dimensions for `container`, or `None` when it cannot be measured
    pub fn propose_dimensions(&self, container: ContainerSize) -> Option<(u16, u16)> {
        if !container.is_measurable() {
            return None;
        }
        let usable = (container.width - self.scrollbar_width).max(0.0);
        let cols = (usable / self.cell_width).floor().min(u16::MAX as f32) as u16;
        let rows = (container.height / self.cell_height).floor().min(u16::MAX as f32) as u16;
        Some((cols.max(MIN_COLS), rows.max(MIN_ROWS)))
    }

    /// Smallest-ish container that fits exactly `cols` x `rows`
    pub fn container_for(&self, cols: u16, rows: u16) -> ContainerSize {
        // Half a cell of slack keeps float rounding from losing a column
        ContainerSize::new(
            (cols as f32 + 0.5) * self.cell_width + self.scrollbar_width,
            (rows as f32 + 0.5) * self.cell_height,
        )
    }
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^\s<>"'`]+"#).expect("URL_RE should compile")
});

/// A detected hyperlink on the visible screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub row: u16,
    /// First column, inclusive
    pub start_col: u16,
    /// Last column, exclusive
    pub end_col: u16,
    pub url: String,
}

/// Finds `http(s)://` URLs in rendered output
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkifyAddon;

impl LinkifyAddon {
    pub fn new() -> Self {
        Self
    }

    pub fn scan(&self, state: &TerminalState) -> Vec<Link> {
        let mut links = Vec::new();
        for row in 0..state.rows {
            let text = state.row_text(row as usize);
            for found in URL_RE.find_iter(&text) {
                let url = found.as_str().trim_end_matches(['.', ',', ';', ':', ')', ']', '!', '?']);
                // Columns count characters; a wide glyph before the link shifts it by one per glyph
                let start_col = text[..found.start()].chars().count() as u16;
                let end_col = start_col + url.chars().count() as u16;
                links.push(Link {
                    row,
                    start_col,
                    end_col,
                    url: url.to_string(),
                });
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_dimensions() {
        let fit = FitAddon::with_cell_size(10.0, 20.0);
        assert_eq!(fit.propose_dimensions(ContainerSize::new(805.0, 481.0)), Some((80, 24)));
        assert_eq!(fit.propose_dimensions(ContainerSize::new(5.0, 5.0)), Some((2, 1)));
        assert_eq!(fit.propose_dimensions(ContainerSize::new(0.0, 300.0)), None);
    }

    #[test]
    fn test_fit_reserves_scrollbar() {
        let fit = FitAddon::new(10.0, 2.0);
        // cell 6x20, 614px - 14px scrollbar = 600px
        assert_eq!(fit.propose_dimensions(ContainerSize::new(614.0, 200.0)), Some((100, 10)));
    }

    #[test]
    fn test_container_for_grid() {
        let fit = FitAddon::new(14.0, 1.2);
        for (cols, rows) in [(80, 24), (132, 43), (2, 1)] {
            assert_eq!(fit.propose_dimensions(fit.container_for(cols, rows)), Some((cols, rows)));
        }
    }

    #[test]
    fn test_linkify_trims_punctuation() {
        let mut state = TerminalState::new(80, 3, 0);
        for ch in "see https://example.com/docs. and http://x.io".chars() {
            state.put_char(ch);
        }
        let links = LinkifyAddon::new().scan(&state);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://example.com/docs");
        assert_eq!((links[0].row, links[0].start_col, links[0].end_col), (0, 4, 28));
        assert_eq!(links[1].url, "http://x.io");
    }
}
