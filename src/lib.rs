//! # Lintel
//!
//! The window-management core of a stacking Wayland compositor:
//! views, the seat input state machine, server-side decorations,
//! focus orchestration, and damage-tracked multi-output repaint
//! scheduling.
//!
//! ## Architecture
//!
//! Lintel is a library, not a running compositor. An embedding
//! backend owns the display protocol and the hardware; it translates
//! surface/input/output events into calls on [`Server`] and executes
//! the [`DisplayRequest`]s the core emits in response. Everything in
//! between — stacking, focus, interactive move/resize, decoration
//! hit-testing, damage accumulation — lives here, synchronously, on
//! one event path.
//!
//! Modules:
//! - `geometry`: rectangles, borders, and the damage accumulator
//! - `config`: TOML theme metrics, focus policy, menu definition
//! - `view`: top-level surface lifecycle and the shell variant set
//! - `ssd`: pure decoration geometry and hit-testing
//! - `seat`: cursor, merged keyboard group, device hotplug
//! - `output`: per-output damage and layer surfaces
//! - `menu`: the root menu model
//! - `action`: named actions for keybinds and menu items
//! - `server`: the root aggregate tying it all together
//!
//! ## Usage
//!
//! ```rust
//! use lintel::{Config, Server, Shell, SurfaceId};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut server = Server::new(Config::default())?;
//! server.handle_new_output("DP-1", 1920, 1080, 1.0);
//!
//! let view = server.handle_new_toplevel(SurfaceId::new(1), Shell::xdg(), (640, 480), true);
//! server.handle_view_map(view);
//!
//! for request in server.drain_requests() {
//!     // hand each request to the display layer
//!     let _ = request;
//! }
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod config;
pub mod geometry;
pub mod input;
pub mod menu;
pub mod output;
pub mod seat;
pub mod server;
pub mod ssd;
pub mod view;

// Re-export main types for easy access
pub use action::{Action, ActionError};
pub use config::{Config, FocusPolicy, Theme};
pub use geometry::{Border, Rect};
pub use input::{ButtonState, InputMode, KeyState, Modifiers, MouseButton, ResizeEdges};
pub use output::{Layer, Output, OutputId};
pub use seat::{DeviceId, DeviceKind, InputDevice, Seat};
pub use server::{DisplayRequest, KeyRoute, Server, UnderCursor, ViewArea, ViewHit};
pub use ssd::SsdPart;
pub use view::{Shell, SurfaceId, View, ViewId};

// Re-export common error types
pub use anyhow::{Context, Error, Result};

/// Version information for Lintel
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
