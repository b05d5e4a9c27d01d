//! Configuration for the compositor core
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files: decoration theme metrics, the keyboard focus
//! policy, and the root menu definition. All of it is read-only at
//! runtime; the event path only ever borrows it.

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[cfg(test)]
mod tests;

/// Main configuration struct containing all core settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Decoration theme metrics
    #[serde(default)]
    pub theme: Theme,

    /// Keyboard focus policy
    #[serde(default)]
    pub focus: FocusConfig,

    /// Root menu definition
    #[serde(default)]
    pub menu: MenuConfig,
}

/// Server-side decoration metrics.
///
/// These are the only inputs (besides view geometry) to the SSD
/// engine, so two views with the same geometry always decorate
/// identically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Theme {
    /// Border width on the left/right/bottom edges (pixels)
    pub border_width: u32,

    /// Title bar height, including the top border (pixels)
    pub title_height: u32,

    /// Width and height of the titlebar buttons (pixels)
    pub button_size: u32,

    /// Gap between adjacent titlebar buttons (pixels)
    pub button_spacing: u32,

    /// Side length of the atomic corner-resize handles (pixels)
    pub corner_size: u32,

    /// Minimum view width enforced during interactive resize (pixels)
    pub min_view_width: u32,

    /// Minimum view height enforced during interactive resize (pixels)
    pub min_view_height: u32,

    /// Cursor image shown during passthrough
    pub cursor_default: String,

    /// Cursor image shown while an interactive move is in progress
    pub cursor_move: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_width: 2,
            title_height: 26,
            button_size: 20,
            button_spacing: 4,
            corner_size: 12,
            min_view_width: 100,
            min_view_height: 60,
            cursor_default: "left_ptr".to_string(),
            cursor_move: "grabbing".to_string(),
        }
    }
}

/// Keyboard focus policy.
///
/// Pointer routing is always under-cursor; this only selects how
/// keyboard focus follows the pointer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FocusPolicy {
    /// Keyboard focus changes on click (and on map/cycle)
    #[default]
    ClickToFocus,
    /// Keyboard focus follows the pointer into whatever view it enters
    FollowsPointer,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FocusConfig {
    #[serde(default)]
    pub policy: FocusPolicy,
}

/// Root menu definition. Item geometry comes from the theme; only the
/// labels and the actions they dispatch live here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MenuConfig {
    /// Menu width (pixels)
    pub width: u32,

    /// Per-item height (pixels)
    pub item_height: u32,

    /// Items in display order
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            width: 180,
            item_height: 24,
            items: vec![
                MenuItem {
                    label: "Terminal".to_string(),
                    action: "Execute".to_string(),
                    command: Some("foot".to_string()),
                },
                MenuItem {
                    label: "Exit".to_string(),
                    action: "Exit".to_string(),
                    command: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub label: String,

    /// Named action dispatched when the item is activated
    pub action: String,

    /// Argument for actions that take one (e.g. Execute)
    #[serde(default)]
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        info!("📋 Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let theme = &self.theme;

        if theme.title_height == 0 {
            anyhow::bail!("theme.title_height must be greater than zero");
        }
        if theme.button_size > theme.title_height {
            anyhow::bail!(
                "theme.button_size ({}) cannot exceed theme.title_height ({})",
                theme.button_size,
                theme.title_height
            );
        }
        if theme.min_view_width == 0 || theme.min_view_height == 0 {
            anyhow::bail!("theme.min_view_width and theme.min_view_height must be non-zero");
        }
        if self.menu.item_height == 0 && !self.menu.items.is_empty() {
            anyhow::bail!("menu.item_height must be non-zero when menu items are defined");
        }

        Ok(())
    }
}
