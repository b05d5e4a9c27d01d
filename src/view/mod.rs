//! View entity and lifecycle
//!
//! A view is one managed top-level client surface. Views are owned by
//! the server's view map and referenced everywhere else by `ViewId`;
//! the id of a destroyed view simply stops resolving, so no stale
//! reference can be touched.
//!
//! Geometry changes on shell-protocol views are double-buffered behind
//! the configure/ack serial handshake: `move_resize` issues a configure
//! carrying a freshly issued serial, and a later commit applies the
//! stored position only if its serial is current. Legacy-X views have
//! no handshake and apply geometry immediately.

use log::debug;

use crate::geometry::{Border, Rect};

mod child;

pub use child::{ChildKind, ViewChild};

/// Stable handle to a view. Normally allocated by the server, never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    pub fn new(raw: u64) -> Self {
        ViewId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a client surface, issued by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn new(raw: u64) -> Self {
        SurfaceId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A move-resize that has been configured but not yet acknowledged by
/// the client. `update_x`/`update_y` record which position components
/// to apply once the matching commit arrives (only edges that move the
/// origin need them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMoveResize {
    pub update_x: bool,
    pub update_y: bool,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub serial: u32,
}

/// Closed set of shell variants backing a view.
///
/// The variant supplies the configure semantics; all other view
/// operations are shared. This is deliberately an enum rather than a
/// trait object: the set is closed and matching on it keeps the
/// handshake rules in one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shell {
    /// Shell-protocol (xdg) toplevel. Geometry changes wait for the
    /// client to acknowledge the configure serial.
    Xdg {
        /// Latest issued configure serial; monotonically increasing,
        /// starts at 0 meaning "never configured".
        configure_serial: u32,
        /// Unacknowledged move-resize, if any.
        pending: Option<PendingMoveResize>,
    },
    /// Legacy-X toplevel. Geometry applies immediately; there is no
    /// ack handshake to wait for.
    Xwayland,
}

impl Shell {
    pub fn xdg() -> Self {
        Shell::Xdg {
            configure_serial: 0,
            pending: None,
        }
    }

    pub fn xwayland() -> Self {
        Shell::Xwayland
    }

    pub fn is_xdg(&self) -> bool {
        matches!(self, Shell::Xdg { .. })
    }
}

/// How a `move_resize` took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigureDisposition {
    /// Geometry was applied synchronously (legacy-X views).
    Applied,
    /// A configure carrying `serial` was issued; geometry applies when
    /// the client commits with an acknowledgement for it.
    AwaitingAck { serial: u32 },
}

/// One managed top-level surface.
#[derive(Debug, Clone)]
pub struct View {
    pub id: ViewId,
    pub surface: SurfaceId,
    pub shell: Shell,

    pub title: String,
    pub app_id: String,

    /// Geometry of the client surface within the layout.
    pub geometry: Rect,

    /// Space between the surface extremities and the max extents of
    /// the server-side decorations. Zero for client-decorated views.
    pub margin: Border,

    /// Space between the surface extremities and the parts considered
    /// the window (client-side drop shadows). Zero for SSD views.
    pub padding: Border,

    /// Whether the compositor draws decorations for this view.
    pub ssd: bool,

    pub mapped: bool,
    pub been_mapped: bool,
    pub minimized: bool,
    pub maximized: bool,

    /// Geometry snapshot taken when maximizing, restored on
    /// unmaximize.
    pub saved_geometry: Option<Rect>,

    /// Direct and nested child surfaces (subsurfaces, popups) in
    /// creation order. The entries resolve through the server's child
    /// map; they are removed there before the view itself is released.
    pub children: Vec<SurfaceId>,
}

impl View {
    pub fn new(id: ViewId, surface: SurfaceId, shell: Shell, geometry: Rect, ssd: bool) -> Self {
        Self {
            id,
            surface,
            shell,
            title: String::new(),
            app_id: String::new(),
            geometry,
            margin: Border::default(),
            padding: Border::default(),
            ssd,
            mapped: false,
            been_mapped: false,
            minimized: false,
            maximized: false,
            saved_geometry: None,
            children: Vec::new(),
        }
    }

    /// Views that can receive focus: mapped and not minimized.
    pub fn is_focusable(&self) -> bool {
        self.mapped && !self.minimized
    }

    /// Transition unmapped -> mapped. Returns false if already mapped.
    pub fn map(&mut self) -> bool {
        if self.mapped {
            return false;
        }
        self.mapped = true;
        self.been_mapped = true;
        debug!("View {} mapped", self.id.raw());
        true
    }

    /// Transition mapped -> unmapped. Returns false if already
    /// unmapped.
    pub fn unmap(&mut self) -> bool {
        if !self.mapped {
            return false;
        }
        self.mapped = false;
        debug!("View {} unmapped", self.id.raw());
        true
    }

    /// Repositions the view without a size change. No configure is
    /// needed: position is compositor-owned for both shell variants.
    pub fn move_to(&mut self, x: i32, y: i32) -> bool {
        if self.geometry.x == x && self.geometry.y == y {
            return false;
        }
        self.geometry.x = x;
        self.geometry.y = y;
        true
    }

    /// Issues an asynchronous move-resize.
    ///
    /// For xdg views a new serial is drawn from the per-view counter
    /// and the target geometry parks in `pending` until the client
    /// acknowledges it; last-configure-wins, so a second call before
    /// the ack simply replaces the pending entry with a higher serial.
    /// Legacy-X views apply the geometry on the spot.
    pub fn move_resize(&mut self, geo: Rect) -> ConfigureDisposition {
        match &mut self.shell {
            Shell::Xdg {
                configure_serial,
                pending,
            } => {
                *configure_serial += 1;
                let serial = *configure_serial;
                *pending = Some(PendingMoveResize {
                    update_x: geo.x != self.geometry.x,
                    update_y: geo.y != self.geometry.y,
                    x: geo.x,
                    y: geo.y,
                    width: geo.width,
                    height: geo.height,
                    serial,
                });
                debug!(
                    "View {} configure {}x{}{:+}{:+} serial {}",
                    self.id.raw(),
                    geo.width,
                    geo.height,
                    geo.x,
                    geo.y,
                    serial
                );
                ConfigureDisposition::AwaitingAck { serial }
            }
            Shell::Xwayland => {
                self.geometry = geo;
                ConfigureDisposition::Applied
            }
        }
    }

    /// Reconciles a client commit against the pending move-resize.
    ///
    /// `acked_serial` is the highest configure serial the client has
    /// acknowledged; `surface_size` is the committed buffer size.
    /// Returns true when the view geometry changed (callers damage the
    /// old and new extents).
    ///
    /// A stale acknowledgement (older than the latest issued serial)
    /// is discarded without touching geometry: the client is still
    /// responding to a superseded configure and a newer one is already
    /// on the wire.
    pub fn handle_commit(&mut self, acked_serial: u32, surface_size: (u32, u32)) -> bool {
        let old = self.geometry;

        if let Shell::Xdg { pending, .. } = &mut self.shell {
            if let Some(p) = *pending {
                if acked_serial >= p.serial {
                    if p.update_x {
                        self.geometry.x = p.x;
                    }
                    if p.update_y {
                        self.geometry.y = p.y;
                    }
                    *pending = None;
                } else {
                    debug!(
                        "View {} stale ack {} (latest {}), discarding",
                        self.id.raw(),
                        acked_serial,
                        p.serial
                    );
                    return false;
                }
            }
        }

        self.geometry.width = surface_size.0;
        self.geometry.height = surface_size.1;

        self.geometry != old
    }

    /// Saves or restores the pre-maximize snapshot and issues the
    /// geometry change. `target` is the usable area of the view's
    /// output; it is ignored when unmaximizing. Returns the submitted
    /// geometry and how it took effect.
    pub fn set_maximized(
        &mut self,
        maximize: bool,
        target: Rect,
    ) -> Option<(Rect, ConfigureDisposition)> {
        if maximize == self.maximized {
            return None;
        }

        if maximize {
            self.saved_geometry = Some(self.geometry);
            self.maximized = true;
            Some((target, self.move_resize(target)))
        } else {
            self.maximized = false;
            let restore = self.saved_geometry.take().unwrap_or(self.geometry);
            Some((restore, self.move_resize(restore)))
        }
    }

    /// Extents of the surface plus decoration margin, in layout
    /// coordinates.
    pub fn outer_geometry(&self) -> Rect {
        self.geometry.expanded(self.margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_view(shell: Shell) -> View {
        View::new(
            ViewId::new(1),
            SurfaceId::new(10),
            shell,
            Rect::new(100, 100, 640, 480),
            true,
        )
    }

    #[test]
    fn test_mapped_only_between_map_and_unmap() {
        let mut view = test_view(Shell::xdg());

        assert!(!view.mapped);
        assert!(view.map());
        assert!(view.mapped);
        assert!(view.been_mapped);
        assert!(!view.map()); // second map is a no-op

        assert!(view.unmap());
        assert!(!view.mapped);
        assert!(view.been_mapped);
        assert!(!view.unmap());
    }

    #[test]
    fn test_move_resize_issues_monotonic_serials() {
        let mut view = test_view(Shell::xdg());

        let first = view.move_resize(Rect::new(0, 0, 800, 600));
        let second = view.move_resize(Rect::new(0, 0, 900, 700));

        let (s1, s2) = match (first, second) {
            (
                ConfigureDisposition::AwaitingAck { serial: a },
                ConfigureDisposition::AwaitingAck { serial: b },
            ) => (a, b),
            other => panic!("expected two configures, got {:?}", other),
        };
        assert!(s2 > s1);
        // Geometry untouched until the ack arrives
        assert_eq!(view.geometry, Rect::new(100, 100, 640, 480));
    }

    #[test]
    fn test_stale_ack_discarded_current_applied_once() {
        let mut view = test_view(Shell::xdg());

        let serial = match view.move_resize(Rect::new(50, 60, 800, 600)) {
            ConfigureDisposition::AwaitingAck { serial } => serial,
            other => panic!("expected configure, got {:?}", other),
        };

        // Commit acking serial-1: geometry unchanged
        assert!(!view.handle_commit(serial - 1, (640, 480)));
        assert_eq!(view.geometry, Rect::new(100, 100, 640, 480));

        // Commit acking the current serial: applied exactly once
        assert!(view.handle_commit(serial, (800, 600)));
        assert_eq!(view.geometry, Rect::new(50, 60, 800, 600));

        // Later commit with the same serial has nothing pending left
        assert!(!view.handle_commit(serial, (800, 600)));
    }

    #[test]
    fn test_xwayland_applies_immediately() {
        let mut view = test_view(Shell::xwayland());

        let disposition = view.move_resize(Rect::new(5, 5, 300, 200));

        assert_eq!(disposition, ConfigureDisposition::Applied);
        assert_eq!(view.geometry, Rect::new(5, 5, 300, 200));
    }

    #[test]
    fn test_maximize_saves_and_restores_geometry() {
        let mut view = test_view(Shell::xwayland());
        let original = view.geometry;
        let workspace = Rect::new(0, 0, 1920, 1080);

        view.set_maximized(true, workspace);
        assert!(view.maximized);
        assert_eq!(view.geometry, workspace);
        assert_eq!(view.saved_geometry, Some(original));

        view.set_maximized(false, workspace);
        assert!(!view.maximized);
        assert_eq!(view.geometry, original);
        assert!(view.saved_geometry.is_none());
    }

    #[test]
    fn test_maximize_twice_is_noop() {
        let mut view = test_view(Shell::xwayland());
        let workspace = Rect::new(0, 0, 1920, 1080);

        assert!(view.set_maximized(true, workspace).is_some());
        assert!(view.set_maximized(true, workspace).is_none());
    }

    #[test]
    fn test_minimized_view_not_focusable() {
        let mut view = test_view(Shell::xdg());
        view.map();
        assert!(view.is_focusable());

        view.minimized = true;
        assert!(!view.is_focusable());
    }

    #[test]
    fn test_outer_geometry_includes_margin() {
        let mut view = test_view(Shell::xdg());
        view.margin = Border {
            top: 26,
            right: 2,
            bottom: 2,
            left: 2,
        };

        assert_eq!(view.outer_geometry(), Rect::new(98, 74, 644, 508));
    }
}
