//! Seat: cursor, keyboard group, and input devices
//!
//! There is exactly one seat per server. All physical keyboards merge
//! into one logical keyboard group so committed modifier state is
//! shared: holding Shift on one keyboard while typing on another works,
//! and unplugging a keyboard mid-chord releases only the keys that
//! device was holding — never leaving a stuck modifier behind.
//!
//! Routing policy lives on the server; the seat only owns device and
//! focus state.

use log::{debug, info};
use std::collections::{HashMap, HashSet};

use bitflags::bitflags;

use crate::input::{KeyState, Modifiers, MouseButton};
use crate::view::SurfaceId;

/// Handle to an input device, issued by the backend on hotplug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(u64);

impl DeviceId {
    pub fn new(raw: u64) -> Self {
        DeviceId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Pointer,
}

#[derive(Debug, Clone)]
pub struct InputDevice {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

bitflags! {
    /// Advertised seat capabilities, derived from the device list.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SeatCapabilities: u32 {
        const POINTER  = 1;
        const KEYBOARD = 2;
    }
}

// Evdev keycodes for the depressed modifiers the group tracks.
const KEY_LEFTCTRL: u32 = 29;
const KEY_LEFTSHIFT: u32 = 42;
const KEY_RIGHTSHIFT: u32 = 54;
const KEY_LEFTALT: u32 = 56;
const KEY_RIGHTCTRL: u32 = 97;
const KEY_RIGHTALT: u32 = 100;
const KEY_LEFTMETA: u32 = 125;
const KEY_RIGHTMETA: u32 = 126;

fn modifier_for_keycode(keycode: u32) -> Modifiers {
    match keycode {
        KEY_LEFTSHIFT | KEY_RIGHTSHIFT => Modifiers::SHIFT,
        KEY_LEFTCTRL | KEY_RIGHTCTRL => Modifiers::CTRL,
        KEY_LEFTALT | KEY_RIGHTALT => Modifiers::ALT,
        KEY_LEFTMETA | KEY_RIGHTMETA => Modifiers::LOGO,
        _ => Modifiers::empty(),
    }
}

/// All physical keyboards merged into one logical keyboard.
///
/// Tracks which keys each device holds so that committed modifier
/// state can be recomputed when a device disappears.
#[derive(Debug, Default)]
pub struct KeyboardGroup {
    /// Committed modifier state, shared across the group.
    modifiers: Modifiers,

    /// Keys currently held, per device.
    held: HashMap<DeviceId, HashSet<u32>>,
}

impl KeyboardGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Feeds one key event from one device into the group. Returns
    /// true when the committed modifier state changed.
    pub fn handle_key(&mut self, device: DeviceId, keycode: u32, state: KeyState) -> bool {
        match state {
            KeyState::Pressed => {
                self.held.entry(device).or_default().insert(keycode);
            }
            KeyState::Released => {
                if let Some(keys) = self.held.get_mut(&device) {
                    keys.remove(&keycode);
                }
            }
        }

        self.recompute_modifiers()
    }

    /// Is `keycode` held on any device in the group?
    pub fn is_held(&self, keycode: u32) -> bool {
        self.held.values().any(|keys| keys.contains(&keycode))
    }

    /// Drops a device from the group, releasing every key only it was
    /// holding. Returns true when that changed the committed
    /// modifiers.
    pub fn remove_device(&mut self, device: DeviceId) -> bool {
        if self.held.remove(&device).is_none() {
            return false;
        }
        self.recompute_modifiers()
    }

    fn recompute_modifiers(&mut self) -> bool {
        let mut modifiers = Modifiers::empty();
        for keys in self.held.values() {
            for &keycode in keys {
                modifiers |= modifier_for_keycode(keycode);
            }
        }

        if modifiers != self.modifiers {
            self.modifiers = modifiers;
            true
        } else {
            false
        }
    }
}

/// Cursor state for the single seat pointer.
#[derive(Debug)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
    pub pressed: HashSet<MouseButton>,
    /// Cursor image name last handed to the display layer.
    pub image: String,
}

impl Cursor {
    fn new(image: &str) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            pressed: HashSet::new(),
            image: image.to_string(),
        }
    }
}

/// The single per-server seat.
#[derive(Debug)]
pub struct Seat {
    pub cursor: Cursor,
    pub keyboard_group: KeyboardGroup,
    devices: HashMap<DeviceId, InputDevice>,

    /// Layer surface holding exclusive keyboard focus (lock screens,
    /// launchers). While set, views cannot receive keyboard input.
    pub focused_layer: Option<SurfaceId>,

    /// Surface with keyboard focus (click-to-focus).
    pub keyboard_focus: Option<SurfaceId>,

    /// Surface under the pointer (focus-follows-pointer routing).
    pub pointer_focus: Option<SurfaceId>,
}

impl Seat {
    pub fn new(default_cursor: &str) -> Self {
        info!("🪑 Seat initialized");
        Self {
            cursor: Cursor::new(default_cursor),
            keyboard_group: KeyboardGroup::new(),
            devices: HashMap::new(),
            focused_layer: None,
            keyboard_focus: None,
            pointer_focus: None,
        }
    }

    pub fn capabilities(&self) -> SeatCapabilities {
        let mut caps = SeatCapabilities::empty();
        for device in self.devices.values() {
            caps |= match device.kind {
                DeviceKind::Keyboard => SeatCapabilities::KEYBOARD,
                DeviceKind::Pointer => SeatCapabilities::POINTER,
            };
        }
        caps
    }

    pub fn add_device(&mut self, device: InputDevice) {
        debug!(
            "Input device added: {} ({:?})",
            device.name, device.kind
        );
        self.devices.insert(device.id, device);
    }

    /// Removes a device. Keyboard removal releases its held keys
    /// through the group; returns true when committed modifiers
    /// changed as a result.
    pub fn remove_device(&mut self, id: DeviceId) -> bool {
        let Some(device) = self.devices.remove(&id) else {
            return false;
        };
        debug!("Input device removed: {}", device.name);

        match device.kind {
            DeviceKind::Keyboard => self.keyboard_group.remove_device(id),
            DeviceKind::Pointer => false,
        }
    }

    pub fn devices(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.values()
    }

    pub fn set_cursor_position(&mut self, x: f64, y: f64) {
        self.cursor.x = x;
        self.cursor.y = y;
    }

    /// Updates pressed-button bookkeeping. Returns true when this is
    /// the transition that changed the set.
    pub fn set_button(&mut self, button: MouseButton, pressed: bool) -> bool {
        if pressed {
            self.cursor.pressed.insert(button)
        } else {
            self.cursor.pressed.remove(&button)
        }
    }

    pub fn any_button_pressed(&self) -> bool {
        !self.cursor.pressed.is_empty()
    }
}
