//! Configuration and terminal palettes.
//!
//! Settings are read from `~/.bmad-terminal/config.toml`:
//!
//! ```toml
//! [terminal]
//! font_family = "JetBrains Mono, Menlo, monospace"
//! font_size = 14
//! line_height = 1.2
//! scrollback = 10000
//! cursor_blink = true
//! # default, tokyo-night, dracula, solarized-dark
//! theme = "tokyo-night"
//!
//! [session]
//! reattach_on_reconnect = false
//! default_status = "active"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every section and key is optional; missing values take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::status::SessionStatus;
use crate::error::ConfigError;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub terminal: TerminalConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Presentation constants handed to every emulator instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub font_family: String,
    /// Font size in CSS pixels
    pub font_size: f32,
    pub line_height: f32,
    /// Lines of history kept per emulator
    pub scrollback: usize,
    pub cursor_blink: bool,
    pub theme: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            font_family: "JetBrains Mono, Menlo, Monaco, Consolas, monospace".to_string(),
            font_size: 14.0,
            line_height: 1.2,
            scrollback: 10_000,
            cursor_blink: true,
            theme: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Send attach again whenever the transport comes back up
    pub reattach_on_reconnect: bool,
    /// Status a controller starts in when its parent does not supply one
    pub default_status: SessionStatus,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reattach_on_reconnect: false,
            default_status: SessionStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Log file; defaults to `~/.bmad-terminal/bmad-terminal.log`
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl Config {
    /// Load `~/.bmad-terminal/config.toml`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                tracing::warn!("Ignoring config file: {}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn config_path() -> Option<PathBuf> {
        data_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging
            .file
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("bmad-terminal.log")))
    }

    pub fn palette(&self) -> Palette {
        Palette::by_name(&self.terminal.theme)
    }
}

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_crossterm(self) -> crossterm::style::Color {
        crossterm::style::Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Emulator color palette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    pub background: Rgb,
    pub foreground: Rgb,
    pub cursor: Rgb,
    pub selection: Rgb,
    /// ANSI colors 0-15
    pub ansi: [Rgb; 16],
}

impl Default for Palette {
    fn default() -> Self {
        Self::default_palette()
    }
}

impl Palette {
    pub fn default_palette() -> Self {
        Self {
            name: "default".to_string(),
            background: Rgb::new(30, 30, 30),
            foreground: Rgb::new(212, 212, 212),
            cursor: Rgb::new(174, 175, 173),
            selection: Rgb::new(38, 79, 120),
            ansi: [
                Rgb::new(0, 0, 0),
                Rgb::new(205, 49, 49),
                Rgb::new(13, 188, 121),
                Rgb::new(229, 229, 16),
                Rgb::new(36, 114, 200),
                Rgb::new(188, 63, 188),
                Rgb::new(17, 168, 205),
                Rgb::new(229, 229, 229),
                Rgb::new(102, 102, 102),
                Rgb::new(241, 76, 76),
                Rgb::new(35, 209, 139),
                Rgb::new(245, 245, 67),
                Rgb::new(59, 142, 234),
                Rgb::new(214, 112, 214),
                Rgb::new(41, 184, 219),
                Rgb::new(255, 255, 255),
            ],
        }
    }

    pub fn tokyo_night() -> Self {
        Self {
            name: "tokyo-night".to_string(),
            background: Rgb::new(26, 27, 38),
            foreground: Rgb::new(169, 177, 214),
            cursor: Rgb::new(192, 202, 245),
            selection: Rgb::new(51, 59, 91),
            ansi: [
                Rgb::new(21, 22, 30),
                Rgb::new(247, 118, 142),
                Rgb::new(158, 206, 106),
                Rgb::new(224, 175, 104),
                Rgb::new(122, 162, 247),
                Rgb::new(187, 154, 247),
                Rgb::new(125, 207, 255),
                Rgb::new(169, 177, 214),
                Rgb::new(65, 72, 104),
                Rgb::new(247, 118, 142),
                Rgb::new(158, 206, 106),
                Rgb::new(224, 175, 104),
                Rgb::new(122, 162, 247),
                Rgb::new(187, 154, 247),
                Rgb::new(125, 207, 255),
                Rgb::new(192, 202, 245),
            ],
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Rgb::new(40, 42, 54),
            foreground: Rgb::new(248, 248, 242),
            cursor: Rgb::new(248, 248, 242),
            selection: Rgb::new(68, 71, 90),
            ansi: [
                Rgb::new(33, 34, 44),
                Rgb::new(255, 85, 85),
                Rgb::new(80, 250, 123),
                Rgb::new(241, 250, 140),
                Rgb::new(189, 147, 249),
                Rgb::new(255, 121, 198),
                Rgb::new(139, 233, 253),
                Rgb::new(248, 248, 242),
                Rgb::new(98, 114, 164),
                Rgb::new(255, 110, 110),
                Rgb::new(105, 255, 148),
                Rgb::new(255, 255, 165),
                Rgb::new(214, 172, 255),
                Rgb::new(255, 146, 223),
                Rgb::new(164, 255, 255),
                Rgb::new(255, 255, 255),
            ],
        }
    }

    pub fn solarized_dark() -> Self {
        Self {
            name: "solarized-dark".to_string(),
            background: Rgb::new(0, 43, 54),
            foreground: Rgb::new(131, 148, 150),
            cursor: Rgb::new(147, 161, 161),
            selection: Rgb::new(7, 54, 66),
            ansi: [
                Rgb::new(7, 54, 66),
                Rgb::new(220, 50, 47),
                Rgb::new(133, 153, 0),
                Rgb::new(181, 137, 0),
                Rgb::new(38, 139, 210),
                Rgb::new(211, 54, 130),
                Rgb::new(42, 161, 152),
                Rgb::new(238, 232, 213),
                Rgb::new(0, 43, 54),
                Rgb::new(203, 75, 22),
                Rgb::new(88, 110, 117),
                Rgb::new(101, 123, 131),
                Rgb::new(131, 148, 150),
                Rgb::new(108, 113, 196),
                Rgb::new(147, 161, 161),
                Rgb::new(253, 246, 227),
            ],
        }
    }

    /// Unknown names fall back to the default palette
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "tokyo-night" | "tokyo_night" | "tokyonight" => Self::tokyo_night(),
            "dracula" => Self::dracula(),
            "solarized-dark" | "solarized_dark" => Self::solarized_dark(),
            _ => Self::default_palette(),
        }
    }

    pub fn list() -> Vec<&'static str> {
        vec!["default", "tokyo-night", "dracula", "solarized-dark"]
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn data_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".bmad-terminal"))
}
