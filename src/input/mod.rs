//! Input data types shared between the seat and the server
//!
//! The interactive state machine itself lives on the server (the grab
//! references views and outputs); this module holds the plain types it
//! speaks: input modes, resize-edge masks, button and modifier state.

use bitflags::bitflags;

/// The seat-wide input mode. Exactly one is active at a time.
///
/// `Move`/`Resize` imply a grabbed view; `Menu` routes all input to
/// the root menu; `Passthrough` routes to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Passthrough,
    Move,
    Resize,
    Menu,
}

bitflags! {
    /// Which edges of a view a resize drags. Corners set two bits and
    /// are treated as a single atomic handle by hit-testing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResizeEdges: u32 {
        const TOP    = 1 << 0;
        const BOTTOM = 1 << 1;
        const LEFT   = 1 << 2;
        const RIGHT  = 1 << 3;

        const TOP_LEFT     = Self::TOP.bits() | Self::LEFT.bits();
        const TOP_RIGHT    = Self::TOP.bits() | Self::RIGHT.bits();
        const BOTTOM_LEFT  = Self::BOTTOM.bits() | Self::LEFT.bits();
        const BOTTOM_RIGHT = Self::BOTTOM.bits() | Self::RIGHT.bits();
    }
}

bitflags! {
    /// Committed keyboard modifier state, shared across the merged
    /// keyboard group.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const CAPS  = 1 << 1;
        const CTRL  = 1 << 2;
        const ALT   = 1 << 3;
        const NUM   = 1 << 4;
        const LOGO  = 1 << 6;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}
