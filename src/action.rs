//! Named actions
//!
//! The invocation surface for external keybind handling and the root
//! menu: actions are referenced by name in configuration and resolved
//! here into the server operations they trigger. Unknown names are a
//! typed parse error so config problems surface at load time rather
//! than as dead keybinds.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Ask the focused view's client to close.
    Close,
    /// Maximize the focused view, or restore its saved geometry.
    ToggleMaximize,
    /// Minimize the focused view; focus falls to the next topmost.
    Iconify,
    /// Step the alt-tab cycle to the next view in stacking order.
    NextWindow,
    /// Open the root menu at the pointer.
    ShowMenu,
    /// Spawn an external command (emitted to the embedding backend;
    /// the core never forks).
    Execute { command: String },
    /// Shut the compositor down.
    Exit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("unknown action '{0}'")]
    Unknown(String),

    #[error("action '{0}' requires a command argument")]
    MissingCommand(&'static str),
}

impl Action {
    /// Resolves a configured action name plus optional argument.
    pub fn parse(name: &str, command: Option<&str>) -> Result<Action, ActionError> {
        match name {
            "Close" => Ok(Action::Close),
            "ToggleMaximize" => Ok(Action::ToggleMaximize),
            "Iconify" => Ok(Action::Iconify),
            "NextWindow" => Ok(Action::NextWindow),
            "ShowMenu" => Ok(Action::ShowMenu),
            "Execute" => match command {
                Some(cmd) if !cmd.is_empty() => Ok(Action::Execute {
                    command: cmd.to_string(),
                }),
                _ => Err(ActionError::MissingCommand("Execute")),
            },
            "Exit" => Ok(Action::Exit),
            other => Err(ActionError::Unknown(other.to_string())),
        }
    }
}
