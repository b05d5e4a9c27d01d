//! The server aggregate
//!
//! One explicitly constructed context owns every collection in the
//! core: views and their stacking order, outputs and the shared
//! layout, child surfaces, layer surfaces, the seat, and the
//! interactive-grab state. The embedding backend translates protocol
//! and hardware events into method calls here, then drains the
//! `DisplayRequest` queue and executes whatever the core asked for.
//! All mutation happens on that single event path; nothing in this
//! module blocks or spans callbacks.
//!
//! Submodules split the aggregate by concern: `desktop` for focus,
//! stacking and hit-testing; `input` for the pointer/keyboard state
//! machine.

use anyhow::Result;
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::action::Action;
use crate::config::Config;
use crate::geometry::{Border, Rect};
use crate::input::{InputMode, ResizeEdges};
use crate::menu::Menu;
use crate::output::{Layer, LayerSurface, Output, OutputId};
use crate::seat::Seat;
use crate::view::{
    ChildKind, ConfigureDisposition, Shell, SurfaceId, View, ViewChild, ViewId,
};

mod desktop;
mod input;

pub use desktop::{UnderCursor, ViewArea, ViewHit};
pub use input::KeyRoute;

/// Everything the core asks of the display layer. Queued during event
/// handling, drained and executed by the embedding backend.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayRequest {
    /// Send a configure for `surface`. `serial` is set for
    /// shell-protocol views awaiting an acknowledgement and `None`
    /// for legacy-X views, whose geometry has already been applied.
    Configure {
        surface: SurfaceId,
        geometry: Rect,
        serial: Option<u32>,
    },
    /// Ask the client to close its surface.
    Close { surface: SurfaceId },
    /// Activate or deactivate a surface (focus ring, decorations).
    Activate { surface: SurfaceId, active: bool },
    /// Tell the client its maximized state changed.
    SetMaximized { surface: SurfaceId, maximized: bool },
    /// Change the hardware cursor image.
    SetCursor { name: String },
    /// An output accumulated damage; schedule its next frame.
    ScheduleRepaint { output: OutputId },
    /// Spawn an external command (the core never forks).
    Spawn { command: String },
    /// Shut down the compositor.
    Quit,
}

/// Captured state of an interactive move or resize.
#[derive(Debug, Clone, Copy)]
struct Grab {
    view: ViewId,
    /// Pointer position when the grab started.
    start_x: f64,
    start_y: f64,
    /// The view's box when the grab started.
    start_geometry: Rect,
    edges: ResizeEdges,
}

pub struct Server {
    config: Config,

    views: HashMap<ViewId, View>,
    /// Stacking order, most recently focused first.
    stacking: Vec<ViewId>,
    /// Root surface -> owning view.
    surface_to_view: HashMap<SurfaceId, ViewId>,
    /// Child surfaces (subsurfaces, popups), keyed by their surface.
    children: HashMap<SurfaceId, ViewChild>,

    outputs: HashMap<OutputId, Output>,
    /// Hotplug order; the shared layout packs outputs left-to-right
    /// in this order.
    output_order: Vec<OutputId>,
    layer_surfaces: HashMap<SurfaceId, LayerSurface>,

    pub seat: Seat,

    input_mode: InputMode,
    grab: Option<Grab>,
    /// Alt-tab cursor. Stacking is frozen while this is set.
    cycle_target: Option<ViewId>,
    focused_view: Option<ViewId>,

    menu: Menu,

    requests: VecDeque<DisplayRequest>,
    /// Outputs with a repaint request already queued, to avoid
    /// flooding the backend between frames.
    scheduled_repaints: HashSet<OutputId>,

    next_view_id: u64,
    next_output_id: u64,
}

impl Server {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        info!("🏗️ Initializing compositor core...");
        let seat = Seat::new(&config.theme.cursor_default);
        let menu = Menu::new(config.menu.clone());

        Ok(Self {
            config,
            views: HashMap::new(),
            stacking: Vec::new(),
            surface_to_view: HashMap::new(),
            children: HashMap::new(),
            outputs: HashMap::new(),
            output_order: Vec::new(),
            layer_surfaces: HashMap::new(),
            seat,
            input_mode: InputMode::Passthrough,
            grab: None,
            cycle_target: None,
            focused_view: None,
            menu,
            requests: VecDeque::new(),
            scheduled_repaints: HashSet::new(),
            next_view_id: 1,
            next_output_id: 1,
        })
    }

    // === Accessors ===

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn view(&self, id: ViewId) -> Option<&View> {
        self.views.get(&id)
    }

    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.output_order.iter().filter_map(|id| self.outputs.get(id))
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn grabbed_view(&self) -> Option<ViewId> {
        self.grab.as_ref().map(|g| g.view)
    }

    pub fn focused_view(&self) -> Option<ViewId> {
        self.focused_view
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Views in stacking order, most recently focused first.
    pub fn stacking_order(&self) -> &[ViewId] {
        &self.stacking
    }

    /// Drains the pending display requests for the backend to
    /// execute.
    pub fn drain_requests(&mut self) -> Vec<DisplayRequest> {
        self.requests.drain(..).collect()
    }

    // === View lifecycle ===

    /// A new top-level shell surface appeared. The view starts
    /// unmapped; nothing focuses or damages until it maps.
    pub fn handle_new_toplevel(
        &mut self,
        surface: SurfaceId,
        shell: Shell,
        size: (u32, u32),
        ssd: bool,
    ) -> ViewId {
        let id = ViewId::new(self.next_view_id);
        self.next_view_id += 1;

        // Cascade new views across the first output.
        let base = self
            .outputs
            .get(self.output_order.first().unwrap_or(&OutputId::new(0)))
            .map(|o| o.layout_box())
            .unwrap_or_default();
        let offset = 40 * (self.views.len() as i32 % 8);
        let geometry = Rect::new(
            base.x + self.deco_border(ssd).left + offset,
            base.y + self.deco_border(ssd).top + offset,
            size.0,
            size.1,
        );

        let mut view = View::new(id, surface, shell, geometry, ssd);
        view.margin = self.deco_border(ssd);

        debug!(
            "New toplevel: view {} surface {} ({}x{}, ssd={})",
            id.raw(),
            surface.raw(),
            size.0,
            size.1,
            ssd
        );

        self.surface_to_view.insert(surface, id);
        self.views.insert(id, view);
        // Unmapped views sit at the bottom; mapping raises them.
        self.stacking.push(id);
        id
    }

    /// Decoration border for a view with the given SSD flag.
    fn deco_border(&self, ssd: bool) -> Border {
        if !ssd {
            return Border::default();
        }
        let theme = &self.config.theme;
        Border {
            top: theme.title_height as i32,
            right: theme.border_width as i32,
            bottom: theme.border_width as i32,
            left: theme.border_width as i32,
        }
    }

    pub fn handle_view_map(&mut self, id: ViewId) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if !view.map() {
            return;
        }
        let rect = view.outer_geometry();
        self.damage_layout_rect(rect);
        // Initial focus decision: newly mapped views take focus.
        self.focus_view(id);
    }

    pub fn handle_view_unmap(&mut self, id: ViewId) {
        if self.grabbed_view() == Some(id) {
            warn!("Grabbed view {} unmapped, cancelling interactive mode", id.raw());
            self.end_interactive();
        }

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let rect = view.outer_geometry();
        if !view.unmap() {
            return;
        }
        self.damage_layout_rect(rect);

        if self.focused_view == Some(id) {
            self.focused_view = None;
            self.seat.keyboard_focus = None;
            self.focus_topmost_mapped();
        }
    }

    /// The shell surface is gone. Valid in any map state. Children
    /// are deregistered and released before the view itself so no
    /// lookup ever lands on a partially torn-down object.
    pub fn handle_view_destroyed(&mut self, id: ViewId) {
        if self.grabbed_view() == Some(id) {
            warn!(
                "Grabbed view {} destroyed during {:?}, falling back to passthrough",
                id.raw(),
                self.input_mode
            );
            self.end_interactive();
        }
        if self.cycle_target == Some(id) {
            self.cycle_target = None;
        }

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let rect = view.outer_geometry();
        let surface = view.surface;
        let was_mapped = view.mapped;

        // Children first, newest to oldest.
        let child_surfaces: Vec<SurfaceId> = std::mem::take(&mut view.children);
        for child in child_surfaces.into_iter().rev() {
            self.children.remove(&child);
            if self.seat.pointer_focus == Some(child) {
                self.seat.pointer_focus = None;
            }
        }

        if was_mapped {
            self.damage_layout_rect(rect);
        }

        if self.seat.pointer_focus == Some(surface) {
            self.seat.pointer_focus = None;
        }
        if self.seat.keyboard_focus == Some(surface) {
            self.seat.keyboard_focus = None;
        }

        self.stacking.retain(|&v| v != id);
        self.surface_to_view.remove(&surface);
        self.views.remove(&id);
        debug!("View {} destroyed", id.raw());

        if self.focused_view == Some(id) {
            self.focused_view = None;
            self.focus_topmost_mapped();
        }
    }

    pub fn set_view_title(&mut self, id: ViewId, title: &str) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.title == title {
            return;
        }
        view.title = title.to_string();
        let rect = view.outer_geometry();
        let mapped = view.mapped;
        if mapped {
            self.damage_layout_rect(rect);
        }
    }

    pub fn set_view_app_id(&mut self, id: ViewId, app_id: &str) {
        if let Some(view) = self.views.get_mut(&id) {
            view.app_id = app_id.to_string();
        }
    }

    /// Switch a view between server-side and client-side decorations.
    pub fn set_view_decorated(&mut self, id: ViewId, ssd: bool) {
        let margin = self.deco_border(ssd);
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if view.ssd == ssd {
            return;
        }
        let old = view.outer_geometry();
        view.ssd = ssd;
        view.margin = margin;
        let new = view.outer_geometry();
        let mapped = view.mapped;
        if mapped {
            self.damage_layout_rect(old);
            self.damage_layout_rect(new);
        }
    }

    // === Child surfaces ===

    pub fn handle_new_subsurface(
        &mut self,
        parent_surface: SurfaceId,
        surface: SurfaceId,
        offset: (i32, i32),
    ) {
        self.add_child(parent_surface, surface, ChildKind::Subsurface, offset);
    }

    pub fn handle_new_popup(
        &mut self,
        parent_surface: SurfaceId,
        surface: SurfaceId,
        offset: (i32, i32),
    ) {
        self.add_child(parent_surface, surface, ChildKind::Popup, offset);
    }

    fn add_child(
        &mut self,
        parent_surface: SurfaceId,
        surface: SurfaceId,
        kind: ChildKind,
        offset: (i32, i32),
    ) {
        // Resolve the owning view: the parent is either a view's root
        // surface or another child (nested popups).
        let parent_view = self
            .surface_to_view
            .get(&parent_surface)
            .copied()
            .or_else(|| self.children.get(&parent_surface).map(|c| c.parent_view));

        let Some(parent_view) = parent_view else {
            debug!(
                "Child surface {} for unknown parent {}, ignoring",
                surface.raw(),
                parent_surface.raw()
            );
            return;
        };

        let child = ViewChild::new(surface, parent_view, parent_surface, kind, offset);
        self.children.insert(surface, child);
        if let Some(view) = self.views.get_mut(&parent_view) {
            view.children.push(surface);
        }
        debug!(
            "New {:?} {} on view {}",
            kind,
            surface.raw(),
            parent_view.raw()
        );
    }

    /// A child or layer surface disappeared. Root view surfaces go
    /// through `handle_view_destroyed` instead (and are routed there
    /// if a backend sends them here).
    pub fn handle_surface_destroyed(&mut self, surface: SurfaceId) {
        if let Some(&view) = self.surface_to_view.get(&surface) {
            self.handle_view_destroyed(view);
            return;
        }

        if let Some(child) = self.children.remove(&surface) {
            if let Some(view) = self.views.get_mut(&child.parent_view) {
                view.children.retain(|&s| s != surface);
            }
            if self.seat.pointer_focus == Some(surface) {
                self.seat.pointer_focus = None;
            }
            if let Some((x, y)) = self.child_layout_position_of(&child) {
                self.damage_layout_rect(Rect::new(x, y, child.size.0, child.size.1));
            }
            return;
        }

        if self.layer_surfaces.contains_key(&surface) {
            self.handle_layer_surface_destroyed(surface);
            return;
        }

        debug!("Destroy for unknown surface {}, ignoring", surface.raw());
    }

    /// Layout position of a child: its offset chain down to the
    /// owning view's surface.
    fn child_layout_position(&self, surface: SurfaceId) -> Option<(i32, i32)> {
        self.children
            .get(&surface)
            .and_then(|c| self.child_layout_position_of(c))
    }

    fn child_layout_position_of(&self, child: &ViewChild) -> Option<(i32, i32)> {
        let (mut x, mut y) = child.offset;
        let mut parent = child.parent_surface;
        let mut depth = 0;
        while let Some(next) = self.children.get(&parent) {
            x += next.offset.0;
            y += next.offset.1;
            parent = next.parent_surface;
            depth += 1;
            if depth > 64 {
                return None;
            }
        }
        let view = self.views.get(self.surface_to_view.get(&parent)?)?;
        Some((view.geometry.x + x, view.geometry.y + y))
    }

    /// Visits the view's surface and every child surface, in
    /// bottom-to-top render order (root first, children in creation
    /// order). Render lists and input feedback walk this.
    pub fn for_each_view_surface<F: FnMut(SurfaceId, (i32, i32))>(&self, id: ViewId, mut f: F) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        f(view.surface, (view.geometry.x, view.geometry.y));
        for &child_surface in &view.children {
            if let Some(pos) = self.child_layout_position(child_surface) {
                f(child_surface, pos);
            }
        }
    }

    /// Visits only the view's popups, in creation order.
    pub fn for_each_view_popup_surface<F: FnMut(SurfaceId, (i32, i32))>(
        &self,
        id: ViewId,
        mut f: F,
    ) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        for &child_surface in &view.children {
            let Some(child) = self.children.get(&child_surface) else {
                continue;
            };
            if !child.is_popup() {
                continue;
            }
            if let Some(pos) = self.child_layout_position_of(child) {
                f(child_surface, pos);
            }
        }
    }

    // === Commits ===

    /// A surface committed. `acked_serial` is the latest configure
    /// serial the client has acknowledged (0 if it never acked one),
    /// `size` the committed buffer size, `damage` the client's
    /// incremental damage in surface-local coordinates.
    pub fn handle_commit(
        &mut self,
        surface: SurfaceId,
        acked_serial: u32,
        size: (u32, u32),
        damage: &[Rect],
    ) {
        if let Some(&id) = self.surface_to_view.get(&surface) {
            let Some(view) = self.views.get_mut(&id) else {
                return;
            };
            let old = view.outer_geometry();
            let geometry_changed = view.handle_commit(acked_serial, size);
            let new = view.outer_geometry();
            let (gx, gy) = (view.geometry.x, view.geometry.y);
            if !view.mapped {
                return;
            }
            if geometry_changed {
                self.damage_layout_rect(old);
                self.damage_layout_rect(new);
            } else {
                self.damage_surface_region(gx, gy, damage);
            }
            return;
        }

        if let Some(child) = self.children.get_mut(&surface) {
            child.size = size;
            if let Some((x, y)) = self.child_layout_position(surface) {
                self.damage_surface_region(x, y, damage);
            }
            return;
        }

        if let Some(layer) = self.layer_surfaces.get_mut(&surface) {
            layer.geometry.width = size.0;
            layer.geometry.height = size.1;
            let (x, y) = (layer.geometry.x, layer.geometry.y);
            self.damage_surface_region(x, y, damage);
            return;
        }

        // Protocol inconsistency: never fatal.
        debug!("Commit for unknown surface {}, ignoring", surface.raw());
    }

    // === Outputs ===

    pub fn handle_new_output(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        scale: f32,
    ) -> OutputId {
        let id = OutputId::new(self.next_output_id);
        self.next_output_id += 1;

        self.outputs
            .insert(id, Output::new(id, name, width, height, scale));
        self.output_order.push(id);
        self.arrange_outputs();
        self.damage_all_outputs();
        id
    }

    /// Output hotplug removal. Views stranded outside the remaining
    /// layout migrate onto the first output; layer surfaces on the
    /// dead output are dropped.
    pub fn handle_output_removed(&mut self, id: OutputId) {
        let Some(output) = self.outputs.remove(&id) else {
            return;
        };
        warn!("Output {} removed", output.name);
        self.output_order.retain(|&o| o != id);
        self.scheduled_repaints.remove(&id);

        let doomed: Vec<SurfaceId> = self
            .layer_surfaces
            .values()
            .filter(|l| l.output == id)
            .map(|l| l.surface)
            .collect();
        for surface in doomed {
            self.layer_surfaces.remove(&surface);
            if self.seat.focused_layer == Some(surface) {
                self.seat.focused_layer = None;
            }
        }

        self.arrange_outputs();

        // Migrate views that no longer touch any live output.
        let remaining: Vec<Rect> = self.outputs().map(|o| o.layout_box()).collect();
        if let Some(home) = remaining.first().copied() {
            let stranded: Vec<ViewId> = self
                .views
                .values()
                .filter(|v| !remaining.iter().any(|b| b.intersects(&v.outer_geometry())))
                .map(|v| v.id)
                .collect();
            for view in stranded {
                let Some(v) = self.views.get(&view) else {
                    continue;
                };
                let geo = v.geometry;
                let margin = v.margin;
                let x = geo
                    .x
                    .clamp(home.x + margin.left, (home.right() - geo.width as i32).max(home.x + margin.left));
                let y = geo
                    .y
                    .clamp(home.y + margin.top, (home.bottom() - geo.height as i32).max(home.y + margin.top));
                debug!("Migrating view {} to surviving output", view.raw());
                self.move_view_to(view, x, y);
            }
        }

        self.damage_all_outputs();
    }

    pub fn handle_output_mode(&mut self, id: OutputId, width: u32, height: u32, scale: f32) {
        let Some(output) = self.outputs.get_mut(&id) else {
            return;
        };
        output.set_mode(width, height, scale);
        self.arrange_outputs();
        self.damage_all_outputs();
    }

    /// Packs outputs left-to-right in hotplug order. This is the
    /// shared logical layout every damage conversion reads.
    fn arrange_outputs(&mut self) {
        let mut x = 0;
        for id in self.output_order.clone() {
            if let Some(output) = self.outputs.get_mut(&id) {
                output.layout_x = x;
                output.layout_y = 0;
                x += output.layout_box().width as i32;
            }
        }
    }

    // === Layer surfaces ===

    pub fn handle_new_layer_surface(
        &mut self,
        surface: SurfaceId,
        output: OutputId,
        layer: Layer,
        size: (u32, u32),
        exclusive_focus: bool,
    ) {
        let Some(out) = self.outputs.get_mut(&output) else {
            debug!(
                "Layer surface {} for unknown output, ignoring",
                surface.raw()
            );
            return;
        };
        let geometry = Rect::new(out.layout_x, out.layout_y, size.0, size.1);
        out.add_layer_surface(layer, surface);

        self.layer_surfaces.insert(
            surface,
            LayerSurface {
                surface,
                output,
                layer,
                geometry,
                exclusive_focus,
            },
        );

        if exclusive_focus {
            debug!("Layer surface {} takes exclusive focus", surface.raw());
            self.seat.focused_layer = Some(surface);
        }

        self.damage_layout_rect(geometry);
    }

    pub fn handle_layer_surface_destroyed(&mut self, surface: SurfaceId) {
        let Some(layer) = self.layer_surfaces.remove(&surface) else {
            return;
        };
        if let Some(output) = self.outputs.get_mut(&layer.output) {
            output.remove_layer_surface(surface);
        }
        if self.seat.focused_layer == Some(surface) {
            self.seat.focused_layer = None;
            // Keyboard input goes back to the view path.
            self.focus_topmost_mapped();
        }
        if self.seat.pointer_focus == Some(surface) {
            self.seat.pointer_focus = None;
        }
        self.damage_layout_rect(layer.geometry);
    }

    pub fn layer_surface(&self, surface: SurfaceId) -> Option<&LayerSurface> {
        self.layer_surfaces.get(&surface)
    }

    // === Damage ===

    /// Full-output damage everywhere: layout changes, hotplug.
    pub fn damage_all_outputs(&mut self) {
        for id in self.output_order.clone() {
            if let Some(output) = self.outputs.get_mut(&id) {
                output.damage_whole();
            }
            self.schedule_repaint(id);
        }
    }

    /// Damages a layout-coordinate rect on every output it touches.
    /// Each intersecting output clips independently; there is no
    /// cross-output shared region.
    fn damage_layout_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        for id in self.output_order.clone() {
            let Some(output) = self.outputs.get_mut(&id) else {
                continue;
            };
            if !output.layout_box().intersects(&rect) {
                continue;
            }
            output.damage_surface(rect.x, rect.y, (rect.width, rect.height), true, &[]);
            self.schedule_repaint(id);
        }
    }

    /// Incremental client damage at layout position (`lx`, `ly`).
    fn damage_surface_region(&mut self, lx: i32, ly: i32, damage: &[Rect]) {
        if damage.is_empty() {
            return;
        }
        for id in self.output_order.clone() {
            let Some(output) = self.outputs.get_mut(&id) else {
                continue;
            };
            output.damage_surface(lx, ly, (0, 0), false, damage);
            let damaged = output.has_damage();
            if damaged {
                self.schedule_repaint(id);
            }
        }
    }

    fn schedule_repaint(&mut self, id: OutputId) {
        if self.scheduled_repaints.insert(id) {
            self.requests
                .push_back(DisplayRequest::ScheduleRepaint { output: id });
        }
    }

    /// Frame callback: hands the pending region to the renderer and
    /// clears it. A second call before new damage returns nothing.
    pub fn take_output_damage(&mut self, id: OutputId) -> Vec<Rect> {
        self.scheduled_repaints.remove(&id);
        self.outputs
            .get_mut(&id)
            .map(|o| o.take_damage())
            .unwrap_or_default()
    }

    // === Geometry operations ===

    /// Repositions a view, damaging both the old and new extents on
    /// every output they touch.
    pub(crate) fn move_view_to(&mut self, id: ViewId, x: i32, y: i32) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let old = view.outer_geometry();
        if !view.move_to(x, y) {
            return;
        }
        let new = view.outer_geometry();
        let surface = view.surface;
        let geometry = view.geometry;
        let mapped = view.mapped;
        // Legacy-X clients track their own window position.
        if !view.shell.is_xdg() {
            self.requests.push_back(DisplayRequest::Configure {
                surface,
                geometry,
                serial: None,
            });
        }
        if mapped {
            self.damage_layout_rect(old);
            self.damage_layout_rect(new);
        }
    }

    /// Issues an asynchronous move-resize toward `target`.
    pub(crate) fn request_move_resize(&mut self, id: ViewId, target: Rect) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let old = view.outer_geometry();
        let surface = view.surface;
        let mapped = view.mapped;
        match view.move_resize(target) {
            ConfigureDisposition::Applied => {
                let new = view.outer_geometry();
                self.requests.push_back(DisplayRequest::Configure {
                    surface,
                    geometry: target,
                    serial: None,
                });
                if mapped {
                    self.damage_layout_rect(old);
                    self.damage_layout_rect(new);
                }
            }
            ConfigureDisposition::AwaitingAck { serial } => {
                // Damage happens when the acked commit applies it.
                self.requests.push_back(DisplayRequest::Configure {
                    surface,
                    geometry: target,
                    serial: Some(serial),
                });
            }
        }
    }

    /// Maximizes against the usable area of the view's output, or
    /// restores the saved geometry. No-op for unmapped views.
    pub fn toggle_maximize(&mut self, id: ViewId) {
        let Some(view) = self.views.get(&id) else {
            return;
        };
        if !view.mapped {
            return;
        }
        let maximize = !view.maximized;
        let margin = view.margin;
        let surface = view.surface;

        let target = if maximize {
            let Some(output_box) = self.output_box_for_view(id) else {
                // No outputs: nowhere to maximize to.
                return;
            };
            Rect::new(
                output_box.x + margin.left,
                output_box.y + margin.top,
                (output_box.width as i32 - margin.left - margin.right).max(1) as u32,
                (output_box.height as i32 - margin.top - margin.bottom).max(1) as u32,
            )
        } else {
            Rect::default() // ignored on restore
        };

        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        let old = view.outer_geometry();
        let mapped = view.mapped;
        let Some((geometry, disposition)) = view.set_maximized(maximize, target) else {
            return;
        };

        self.requests.push_back(DisplayRequest::SetMaximized {
            surface,
            maximized: maximize,
        });
        match disposition {
            ConfigureDisposition::Applied => {
                let new = self
                    .views
                    .get(&id)
                    .map(|v| v.outer_geometry())
                    .unwrap_or(geometry);
                self.requests.push_back(DisplayRequest::Configure {
                    surface,
                    geometry,
                    serial: None,
                });
                if mapped {
                    self.damage_layout_rect(old);
                    self.damage_layout_rect(new);
                }
            }
            ConfigureDisposition::AwaitingAck { serial } => {
                self.requests.push_back(DisplayRequest::Configure {
                    surface,
                    geometry,
                    serial: Some(serial),
                });
            }
        }
    }

    /// Minimized views leave the focus path until restored.
    pub fn set_view_minimized(&mut self, id: ViewId, minimized: bool) {
        let Some(view) = self.views.get_mut(&id) else {
            return;
        };
        if !view.mapped || view.minimized == minimized {
            return;
        }
        view.minimized = minimized;
        let rect = view.outer_geometry();
        self.damage_layout_rect(rect);

        if minimized {
            if self.focused_view == Some(id) {
                self.focused_view = None;
                self.seat.keyboard_focus = None;
                self.focus_topmost_mapped();
            }
        } else {
            self.focus_view(id);
        }
    }

    /// Output whose layout box contains the view's center, falling
    /// back to the first output.
    fn output_box_for_view(&self, id: ViewId) -> Option<Rect> {
        let view = self.views.get(&id)?;
        let cx = view.geometry.x + view.geometry.width as i32 / 2;
        let cy = view.geometry.y + view.geometry.height as i32 / 2;
        self.outputs()
            .map(|o| o.layout_box())
            .find(|b| b.contains_point(cx, cy))
            .or_else(|| self.outputs().next().map(|o| o.layout_box()))
    }

    // === Actions ===

    /// Entry point for external keybind handling and the root menu.
    pub fn dispatch_action(&mut self, action: &Action) {
        debug!("Dispatching action {:?}", action);
        match action {
            Action::Close => {
                if let Some(surface) = self
                    .focused_view
                    .and_then(|id| self.views.get(&id))
                    .map(|v| v.surface)
                {
                    self.requests.push_back(DisplayRequest::Close { surface });
                }
            }
            Action::ToggleMaximize => {
                if let Some(id) = self.focused_view {
                    self.toggle_maximize(id);
                }
            }
            Action::Iconify => {
                if let Some(id) = self.focused_view {
                    self.set_view_minimized(id, true);
                }
            }
            Action::NextWindow => self.cycle_next(),
            Action::ShowMenu => {
                let (x, y) = (self.seat.cursor.x as i32, self.seat.cursor.y as i32);
                self.show_menu(x, y);
            }
            Action::Execute { command } => {
                self.requests.push_back(DisplayRequest::Spawn {
                    command: command.clone(),
                });
            }
            Action::Exit => self.requests.push_back(DisplayRequest::Quit),
        }
    }

    // === Menu ===

    /// Opens the root menu at a layout position and routes input to
    /// it.
    pub fn show_menu(&mut self, x: i32, y: i32) {
        if self.input_mode != InputMode::Passthrough {
            return;
        }
        self.menu.open(x, y);
        self.input_mode = InputMode::Menu;
        if let Some(rect) = self.menu.geometry() {
            self.damage_layout_rect(rect);
        }
    }

    pub fn dismiss_menu(&mut self) {
        if self.input_mode != InputMode::Menu {
            return;
        }
        if let Some(rect) = self.menu.geometry() {
            self.damage_layout_rect(rect);
        }
        self.menu.close();
        self.input_mode = InputMode::Passthrough;
    }
}
