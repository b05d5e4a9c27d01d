//! Unit tests for configuration module
//!
//! Tests theme parsing, validation, and edge cases in configuration
//! handling.

use super::*;
use anyhow::Result;

#[test]
fn test_default_configuration_is_valid() {
    let config = Config::default();

    assert!(config.validate().is_ok());
    assert!(config.theme.title_height > 0);
    assert!(config.theme.button_size <= config.theme.title_height);
    assert!(config.theme.min_view_width > 0);
    assert_eq!(config.focus.policy, FocusPolicy::ClickToFocus);
    assert!(!config.menu.items.is_empty());
}

#[test]
fn test_configuration_roundtrip() -> Result<()> {
    let original = Config::default();

    let toml_string = toml::to_string(&original)?;
    let deserialized: Config = toml::from_str(&toml_string)?;

    assert_eq!(original.theme, deserialized.theme);
    assert_eq!(original.focus, deserialized.focus);
    assert_eq!(original.menu, deserialized.menu);

    Ok(())
}

#[test]
fn test_partial_configuration_uses_defaults() -> Result<()> {
    let config: Config = toml::from_str(
        r#"
[theme]
border_width = 4
title_height = 30
button_size = 22
button_spacing = 2
corner_size = 16
min_view_width = 80
min_view_height = 40
cursor_default = "default"
cursor_move = "move"
"#,
    )?;

    assert_eq!(config.theme.border_width, 4);
    assert_eq!(config.theme.title_height, 30);
    // Unspecified sections fall back to defaults
    assert_eq!(config.focus.policy, FocusPolicy::ClickToFocus);
    assert_eq!(config.menu.width, MenuConfig::default().width);

    Ok(())
}

#[test]
fn test_focus_policy_parsing() -> Result<()> {
    let config: Config = toml::from_str(
        r#"
[focus]
policy = "follows-pointer"
"#,
    )?;

    assert_eq!(config.focus.policy, FocusPolicy::FollowsPointer);
    Ok(())
}

#[test]
fn test_menu_items_parse() -> Result<()> {
    let config: Config = toml::from_str(
        r#"
[[menu.items]]
label = "Web Browser"
action = "Execute"
command = "firefox"

[[menu.items]]
label = "Exit"
action = "Exit"
"#,
    )?;

    assert_eq!(config.menu.items.len(), 2);
    assert_eq!(config.menu.items[0].command.as_deref(), Some("firefox"));
    assert!(config.menu.items[1].command.is_none());
    Ok(())
}

#[test]
fn test_validation_rejects_zero_title_height() {
    let mut config = Config::default();
    config.theme.title_height = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_oversized_buttons() {
    let mut config = Config::default();
    config.theme.button_size = config.theme.title_height + 1;

    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_zero_min_size() {
    let mut config = Config::default();
    config.theme.min_view_width = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_load_missing_file_fails_with_context() {
    let result = Config::load("/nonexistent/lintel.toml");

    assert!(result.is_err());
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to read config file"));
}
