use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};

use crate::dispatcher::{DispatcherOptions, SyncMode};
use crate::fill::{FillLimits, FillScheme};
use crate::viewport::ViewportOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub key_bindings: KeyBindings,
    /// Edge length of one grid cell in world pixels.
    pub cell_size: u32,
    pub sync_mode: SyncMode,
    pub scheme: FillScheme,
    pub fill_limits: FillLimits,
    pub viewport: ViewportOptions,
    /// Screen pixels per terminal column / row.
    pub column_px: u32,
    pub row_px: u32,
    /// Keyboard pan distance in terminal cells.
    pub pan_step: u16,
    /// Base URL of the detail/observe API; derived from the socket URL when unset.
    pub http_base: Option<String>,
    pub log_file: Option<PathBuf>,
    /// Delay between snapshots in replay mode.
    pub replay_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub quit: String,
    pub pan_left: String,
    pub pan_right: String,
    pub pan_up: String,
    pub pan_down: String,
    pub zoom_in: String,
    pub zoom_out: String,
    pub next_scheme: String,
    pub prev_island: String,
    pub next_island: String,
    pub stop: String,
    pub start: String,
    pub clear_detail: String,
    pub fullscreen: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        KeyBindings {
            quit: "q".into(),
            pan_left: "Left".into(),
            pan_right: "Right".into(),
            pan_up: "Up".into(),
            pan_down: "Down".into(),
            zoom_in: "+".into(),
            zoom_out: "-".into(),
            next_scheme: "s".into(),
            prev_island: "[".into(),
            next_island: "]".into(),
            stop: "x".into(),
            start: "g".into(),
            clear_detail: "Esc".into(),
            fullscreen: "F11".into(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            key_bindings: KeyBindings::default(),
            cell_size: 20,
            sync_mode: SyncMode::Incremental,
            scheme: FillScheme::Default,
            fill_limits: FillLimits::default(),
            viewport: ViewportOptions::default(),
            column_px: 10,
            row_px: 20,
            pan_step: 4,
            http_base: None,
            log_file: None,
            replay_interval_ms: 250,
        }
    }
}

impl ViewerConfig {
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match std::fs::read_to_string(&config_path) {
            Ok(json) => match Self::parse(&json) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: invalid viewer config ({e}), using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn parse(json: &str) -> Result<Self, String> {
        let config: ViewerConfig = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cell_size == 0 {
            return Err("cell_size must be at least 1".into());
        }
        if self.column_px == 0 || self.row_px == 0 {
            return Err("column_px and row_px must be at least 1".into());
        }
        self.fill_limits.validate()?;
        self.viewport.validate()
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            cell_size: self.cell_size,
            sync_mode: self.sync_mode,
            scheme: self.scheme,
            limits: self.fill_limits,
            viewport: self.viewport,
        }
    }

    fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os("WORLD_VIEWER_CONFIG") {
            return PathBuf::from(path);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        let mut path = PathBuf::from(home);
        path.push(".config");
        path.push("world-viewer");
        path.push("viewer.json");
        path
    }
}

/// Check whether a crossterm `KeyEvent` matches a binding string from config.
pub fn matches_binding(binding: &str, event: &KeyEvent) -> bool {
    if let Some(rest) = binding.strip_prefix("Alt-") {
        if !event.modifiers.contains(KeyModifiers::ALT) {
            return false;
        }
        return matches_key(rest, event.code);
    }

    if let Some(rest) = binding.strip_prefix("Ctrl-") {
        if !event.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        return matches_key(rest, event.code);
    }

    // Plain bindings never fire with Ctrl or Alt held.
    if event.modifiers.contains(KeyModifiers::CONTROL)
        || event.modifiers.contains(KeyModifiers::ALT)
    {
        return false;
    }

    matches_key(binding, event.code)
}

fn matches_key(binding: &str, code: KeyCode) -> bool {
    match binding {
        "Right" => code == KeyCode::Right,
        "Left" => code == KeyCode::Left,
        "Up" => code == KeyCode::Up,
        "Down" => code == KeyCode::Down,
        "Enter" => code == KeyCode::Enter,
        "Esc" => code == KeyCode::Esc,
        "Space" => code == KeyCode::Char(' '),
        "Tab" => code == KeyCode::Tab,
        "Backspace" => code == KeyCode::Backspace,
        "Home" => code == KeyCode::Home,
        "End" => code == KeyCode::End,
        "PageUp" => code == KeyCode::PageUp,
        "PageDown" => code == KeyCode::PageDown,
        s => {
            if let Some(rest) = s.strip_prefix('F') {
                if let Ok(n) = rest.parse::<u8>() {
                    return code == KeyCode::F(n);
                }
            }
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => code == KeyCode::Char(c),
                _ => false,
            }
        }
    }
}
