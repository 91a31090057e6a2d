// src/config.rs

//! Compile-time settings of the viewer.
//!
//! There is no configuration file: `CONFIG` always holds the defaults below.
//! The structs still derive `Serialize`/`Deserialize` so the effective values
//! can be dumped to the log and so a future front end could override them
//! without touching the modules that read them.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::keys::KeySymbol;

/// Global, read-only configuration instance.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::default);

// --- Top-Level Configuration Structure ---

/// Represents the complete configuration for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Colors and window title.
    pub appearance: AppearanceConfig,
    /// Size hints handed to the window manager.
    pub window: WindowConfig,
    /// Keybinding configuration.
    pub keybindings: KeybindingsConfig,
}

// --- Appearance Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Base fill of the window, visible around the image.
    pub background: Color,
    /// Color every non-opaque image pixel is replaced with before compositing.
    pub neutral_fill: Color,
    /// Prefix of the window title; the file name is appended after a space.
    pub title_prefix: String,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        AppearanceConfig {
            background: Color::BACKGROUND,
            neutral_fill: Color::NEUTRAL_GRAY,
            title_prefix: "sip".to_string(),
        }
    }
}

// --- Window Configuration ---

/// WM_NORMAL_HINTS values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub min_width: u32,
    pub min_height: u32,
    pub base_width: u32,
    pub base_height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            min_width: 300,
            min_height: 200,
            base_width: 400,
            base_height: 250,
        }
    }
}

// --- Keybinding Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Key that ends the viewer.
    pub quit: KeySymbol,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        KeybindingsConfig {
            quit: KeySymbol::Char('q'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_colors_hints_and_quit_key() {
        let config = Config::default();
        assert_eq!(config.appearance.background, Color::rgb(0x44, 0x44, 0x44));
        assert_eq!(config.appearance.neutral_fill, Color::rgb(0x80, 0x80, 0x80));
        assert_eq!(config.window.min_width, 300);
        assert_eq!(config.window.min_height, 200);
        assert_eq!(config.window.base_width, 400);
        assert_eq!(config.window.base_height, 250);
        assert_eq!(config.keybindings.quit, KeySymbol::Char('q'));
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "window": { "min_width": 10 } }"#).unwrap();
        assert_eq!(config.window.min_width, 10);
        assert_eq!(config.window.base_width, 400);
        assert_eq!(config.keybindings.quit, KeySymbol::Char('q'));
    }
}
