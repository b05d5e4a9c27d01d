//! Pointer and keyboard dispatch, and the interactive state machine
//!
//! All raw input funnels through here. In `Passthrough` events route
//! to clients: keyboard to the exclusive layer surface if one holds
//! focus, otherwise to the last-focused view; pointer always to the
//! surface under the cursor. `Move`/`Resize` turn motion into
//! geometry deltas against the grab origin, and `Menu` feeds the root
//! menu. Every exit path — button release, Escape, grabbed-view
//! destruction, losing the pointer — lands back in `Passthrough` with
//! the grab reference cleared synchronously.

use log::{debug, warn};

use crate::action::Action;
use crate::geometry::Rect;
use crate::input::{ButtonState, InputMode, KeyState, MouseButton, ResizeEdges};
use crate::seat::{DeviceId, InputDevice, SeatCapabilities};
use crate::ssd::{self, SsdPart};
use crate::view::{SurfaceId, ViewId};

use super::{DisplayRequest, Grab, Server, UnderCursor, ViewArea};

/// Evdev keycode for Escape.
const KEY_ESC: u32 = 1;

/// Where a keyboard event should go, decided by the core and executed
/// by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    /// The core consumed the event (cancel, menu input).
    Consumed,
    /// Forward to the layer surface holding exclusive focus.
    Layer(SurfaceId),
    /// Forward to the keyboard-focused surface.
    Surface(SurfaceId),
    /// Nothing focused; drop the event.
    Unrouted,
}

impl Server {
    // === Devices ===

    pub fn handle_device_added(&mut self, device: InputDevice) {
        self.seat.add_device(device);
    }

    /// Device unplug. Keys held only by the removed device are
    /// released through the keyboard group, and an interactive mode
    /// that just lost its pointer is cancelled.
    pub fn handle_device_removed(&mut self, id: DeviceId) {
        self.seat.remove_device(id);

        let interactive = matches!(self.input_mode, InputMode::Move | InputMode::Resize);
        if interactive && !self.seat.capabilities().contains(SeatCapabilities::POINTER) {
            warn!("Pointer capability lost during {:?}, cancelling", self.input_mode);
            self.end_interactive();
        }
    }

    // === Keyboard ===

    /// Feeds one key event through the merged keyboard group and
    /// decides where it goes.
    pub fn handle_keyboard_key(
        &mut self,
        device: DeviceId,
        keycode: u32,
        state: KeyState,
    ) -> KeyRoute {
        self.seat.keyboard_group.handle_key(device, keycode, state);

        if state == KeyState::Pressed && keycode == KEY_ESC {
            match self.input_mode {
                InputMode::Move | InputMode::Resize => {
                    debug!("Interactive {:?} cancelled", self.input_mode);
                    self.end_interactive();
                    return KeyRoute::Consumed;
                }
                InputMode::Menu => {
                    self.dismiss_menu();
                    return KeyRoute::Consumed;
                }
                InputMode::Passthrough => {}
            }
        }

        if self.input_mode == InputMode::Menu {
            return KeyRoute::Consumed;
        }

        // A layer surface with exclusive focus gets everything,
        // unconditionally.
        if let Some(layer) = self.seat.focused_layer {
            return KeyRoute::Layer(layer);
        }
        match self.seat.keyboard_focus {
            Some(surface) => KeyRoute::Surface(surface),
            None => KeyRoute::Unrouted,
        }
    }

    // === Pointer ===

    pub fn handle_pointer_motion(&mut self, x: f64, y: f64) {
        self.seat.set_cursor_position(x, y);

        match self.input_mode {
            InputMode::Move => {
                let Some(grab) = self.grab else {
                    return;
                };
                let nx = grab.start_geometry.x + (x - grab.start_x).round() as i32;
                let ny = grab.start_geometry.y + (y - grab.start_y).round() as i32;
                self.move_view_to(grab.view, nx, ny);
            }
            InputMode::Resize => {
                let Some(grab) = self.grab else {
                    return;
                };
                let target = self.resize_target(&grab, x, y);
                self.request_move_resize(grab.view, target);
            }
            InputMode::Menu => {
                if self.menu.select_at(x.floor() as i32, y.floor() as i32) {
                    if let Some(rect) = self.menu.geometry() {
                        self.damage_layout_rect(rect);
                    }
                }
            }
            InputMode::Passthrough => {
                let under = self.surface_under(x, y);
                let follows_pointer = self.config.focus.policy
                    == crate::config::FocusPolicy::FollowsPointer;

                match under {
                    Some(UnderCursor::Layer(surface)) => {
                        self.seat.pointer_focus = Some(surface);
                    }
                    Some(UnderCursor::View(hit)) => {
                        self.seat.pointer_focus = Some(hit.surface);
                        // Keyboard follows only under the
                        // follows-pointer policy, and without raising.
                        if follows_pointer && hit.area == ViewArea::Surface {
                            self.focus_view_inner(hit.view, false);
                        }
                    }
                    None => {
                        self.seat.pointer_focus = None;
                    }
                }
            }
        }
    }

    pub fn handle_pointer_button(&mut self, button: MouseButton, state: ButtonState) {
        match state {
            ButtonState::Pressed => {
                self.seat.set_button(button, true);
                match self.input_mode {
                    // Extra buttons during a grab are ignored.
                    InputMode::Move | InputMode::Resize => {}
                    InputMode::Menu => self.menu_click(),
                    InputMode::Passthrough => self.passthrough_press(button),
                }
            }
            ButtonState::Released => {
                self.seat.set_button(button, false);
                let interactive =
                    matches!(self.input_mode, InputMode::Move | InputMode::Resize);
                if interactive && !self.seat.any_button_pressed() {
                    self.end_interactive();
                }
            }
        }
    }

    /// Axis (scroll) events only ever go to the surface under the
    /// cursor, and only while passing through; interactive modes and
    /// the menu swallow them.
    pub fn handle_pointer_axis(&mut self, _dx: f64, _dy: f64) -> Option<SurfaceId> {
        if self.input_mode != InputMode::Passthrough {
            return None;
        }
        self.seat.pointer_focus
    }

    fn menu_click(&mut self) {
        let (x, y) = (
            self.seat.cursor.x.floor() as i32,
            self.seat.cursor.y.floor() as i32,
        );
        let activated = self
            .menu
            .activate_at(x, y)
            .map(|item| (item.action.clone(), item.command.clone()));

        // Click anywhere dismisses; an item click also dispatches.
        self.dismiss_menu();

        if let Some((name, command)) = activated {
            match Action::parse(&name, command.as_deref()) {
                Ok(action) => self.dispatch_action(&action),
                Err(err) => warn!("Menu item with bad action: {}", err),
            }
        }
    }

    fn passthrough_press(&mut self, button: MouseButton) {
        let (x, y) = (self.seat.cursor.x, self.seat.cursor.y);
        match self.surface_under(x, y) {
            Some(UnderCursor::Layer(surface)) => {
                self.seat.pointer_focus = Some(surface);
            }
            Some(UnderCursor::View(hit)) => {
                self.seat.pointer_focus = Some(hit.surface);
                // Click-to-focus applies to any button press.
                self.focus_view(hit.view);

                if button != MouseButton::Left {
                    return;
                }
                if let ViewArea::Ssd(part) = hit.area {
                    self.ssd_press(hit.view, part);
                }
            }
            None => {
                self.seat.pointer_focus = None;
            }
        }
    }

    /// A left press on a decoration part: buttons act, the title bar
    /// starts a move, edges and corners start a resize.
    fn ssd_press(&mut self, view: ViewId, part: SsdPart) {
        match part {
            SsdPart::ButtonClose => {
                if let Some(surface) = self.views.get(&view).map(|v| v.surface) {
                    self.requests.push_back(DisplayRequest::Close { surface });
                }
            }
            SsdPart::ButtonMaximize => self.toggle_maximize(view),
            SsdPart::ButtonIconify => self.set_view_minimized(view, true),
            SsdPart::TitleBar => {
                self.begin_interactive(view, InputMode::Move, ResizeEdges::empty())
            }
            _ => {
                let edges = ssd::resize_edges(part);
                if !edges.is_empty() {
                    self.begin_interactive(view, InputMode::Resize, edges);
                }
            }
        }
    }

    // === Interactive move / resize ===

    /// Starts an interactive move or resize on a mapped view,
    /// capturing the pointer origin, the view's box, and the edge
    /// mask. Only valid from `Passthrough`.
    pub fn begin_interactive(&mut self, view: ViewId, mode: InputMode, edges: ResizeEdges) {
        if self.input_mode != InputMode::Passthrough {
            return;
        }
        if !matches!(mode, InputMode::Move | InputMode::Resize) {
            return;
        }
        let Some(v) = self.views.get(&view) else {
            return;
        };
        if !v.mapped {
            return;
        }

        debug!("Begin interactive {:?} on view {}", mode, view.raw());
        self.grab = Some(Grab {
            view,
            start_x: self.seat.cursor.x,
            start_y: self.seat.cursor.y,
            start_geometry: v.geometry,
            edges,
        });
        self.input_mode = mode;

        if mode == InputMode::Move {
            let name = self.config.theme.cursor_move.clone();
            self.set_cursor_image(name);
        }
    }

    /// Leaves `Move`/`Resize`: clears the grab, restores the default
    /// cursor, and returns to `Passthrough`. Safe to call from any
    /// state.
    pub fn end_interactive(&mut self) {
        if !matches!(self.input_mode, InputMode::Move | InputMode::Resize) {
            return;
        }
        self.input_mode = InputMode::Passthrough;
        self.grab = None;
        let name = self.config.theme.cursor_default.clone();
        self.set_cursor_image(name);
    }

    /// Box for the current resize: anchored at the non-dragged edges,
    /// clamped to the theme's minimum view size.
    fn resize_target(&self, grab: &Grab, x: f64, y: f64) -> Rect {
        let dx = (x - grab.start_x).round() as i32;
        let dy = (y - grab.start_y).round() as i32;
        let start = grab.start_geometry;
        let min_w = self.config.theme.min_view_width as i32;
        let min_h = self.config.theme.min_view_height as i32;

        let mut new_x = start.x;
        let mut new_y = start.y;
        let mut new_w = start.width as i32;
        let mut new_h = start.height as i32;

        if grab.edges.contains(ResizeEdges::LEFT) {
            new_x = start.x + dx;
            new_w -= dx;
        } else if grab.edges.contains(ResizeEdges::RIGHT) {
            new_w += dx;
        }
        if grab.edges.contains(ResizeEdges::TOP) {
            new_y = start.y + dy;
            new_h -= dy;
        } else if grab.edges.contains(ResizeEdges::BOTTOM) {
            new_h += dy;
        }

        // Clamp against the minimum while keeping the anchored edge
        // fixed.
        if new_w < min_w {
            if grab.edges.contains(ResizeEdges::LEFT) {
                new_x = start.right() - min_w;
            }
            new_w = min_w;
        }
        if new_h < min_h {
            if grab.edges.contains(ResizeEdges::TOP) {
                new_y = start.bottom() - min_h;
            }
            new_h = min_h;
        }

        Rect::new(new_x, new_y, new_w as u32, new_h as u32)
    }

    // === Cursor image ===

    /// A client asked for a cursor image. Honored only while routing
    /// passes events through and only for the client the pointer is
    /// over.
    pub fn handle_cursor_image_request(&mut self, surface: SurfaceId, name: &str) {
        if self.input_mode != InputMode::Passthrough {
            return;
        }
        if self.seat.pointer_focus != Some(surface) {
            return;
        }
        self.set_cursor_image(name.to_string());
    }

    fn set_cursor_image(&mut self, name: String) {
        if self.seat.cursor.image == name {
            return;
        }
        self.seat.cursor.image = name.clone();
        self.requests.push_back(DisplayRequest::SetCursor { name });
    }
}
