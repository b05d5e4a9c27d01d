//! Desktop orchestration: focus, stacking order, cycling, hit-testing
//!
//! Stacking order is most-recently-focused first. Focusing a view
//! raises it, except while an alt-tab cycle is in flight: the stack is
//! frozen then so repeated `NextWindow` invocations walk a stable
//! order, and only the terminal release commits the final focus (and
//! the reorder that comes with it).

use log::debug;

use crate::ssd::{self, SsdPart};
use crate::view::{SurfaceId, View, ViewId};

use super::{DisplayRequest, Server};

/// Which part of a view a point landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArea {
    /// The client surface itself (or one of its child surfaces).
    Surface,
    /// A server-side decoration part.
    Ssd(SsdPart),
}

/// Result of a desktop hit-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewHit {
    pub view: ViewId,
    /// The concrete surface under the point: the view's own surface,
    /// or a child (popup/subsurface). Decoration hits report the
    /// view's surface.
    pub surface: SurfaceId,
    pub area: ViewArea,
    /// Surface-local coordinates of the point.
    pub sx: f64,
    pub sy: f64,
}

/// What the pointer is over, layer surfaces included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnderCursor {
    Layer(SurfaceId),
    View(ViewHit),
}

impl Server {
    // === Focus ===

    /// Focuses a view: keyboard focus, shell activation, raise (when
    /// not cycling), and decoration damage on both ends of the
    /// transfer. No-op while a layer surface holds exclusive focus,
    /// and for unmapped or minimized views.
    pub fn focus_view(&mut self, id: ViewId) {
        self.focus_view_inner(id, self.cycle_target.is_none());
    }

    pub(super) fn focus_view_inner(&mut self, id: ViewId, raise: bool) {
        if self.seat.focused_layer.is_some() {
            return;
        }
        let Some(view) = self.views.get(&id) else {
            return;
        };
        if !view.is_focusable() {
            return;
        }
        let surface = view.surface;
        let rect = view.outer_geometry();

        if self.focused_view == Some(id) {
            if raise {
                self.raise_view(id);
            }
            return;
        }

        if let Some(previous) = self.focused_view.take() {
            if let Some(prev) = self.views.get(&previous) {
                let prev_surface = prev.surface;
                let prev_rect = prev.outer_geometry();
                self.requests.push_back(DisplayRequest::Activate {
                    surface: prev_surface,
                    active: false,
                });
                self.damage_layout_rect(prev_rect);
            }
        }

        debug!("Focusing view {}", id.raw());
        self.focused_view = Some(id);
        self.seat.keyboard_focus = Some(surface);
        if raise {
            self.raise_view(id);
        }
        self.requests.push_back(DisplayRequest::Activate {
            surface,
            active: true,
        });
        self.damage_layout_rect(rect);
    }

    fn raise_view(&mut self, id: ViewId) {
        self.stacking.retain(|&v| v != id);
        self.stacking.insert(0, id);
    }

    /// Fallback target whenever the focused view unmaps, is
    /// destroyed, or is minimized.
    pub fn focus_topmost_mapped(&mut self) {
        let next = self
            .stacking
            .iter()
            .copied()
            .find(|id| self.views.get(id).is_some_and(View::is_focusable));

        match next {
            Some(id) => self.focus_view_inner(id, true),
            None => {
                self.focused_view = None;
                self.seat.keyboard_focus = None;
            }
        }
    }

    // === Cycling (alt-tab) ===

    /// The view to cycle to from `current`: the next focusable view
    /// strictly after it in stacking order, wrapping to the first.
    /// With no reference point, the second-most-recently-focused view
    /// is returned (skipping the already-focused top), so the first
    /// invocation lands on the natural alt-tab target.
    pub fn cycle_view(&self, current: Option<ViewId>) -> Option<ViewId> {
        let focusable: Vec<ViewId> = self
            .stacking
            .iter()
            .copied()
            .filter(|id| self.views.get(id).is_some_and(View::is_focusable))
            .collect();

        match current {
            None => focusable.get(1).copied(),
            Some(current) => match focusable.iter().position(|&id| id == current) {
                Some(index) => focusable.get((index + 1) % focusable.len()).copied(),
                // The reference point vanished mid-cycle; start over.
                None => focusable.first().copied(),
            },
        }
    }

    /// One `NextWindow` step. The first step enters cycle mode (which
    /// freezes stacking); each further step walks the frozen order.
    pub fn cycle_next(&mut self) {
        let Some(target) = self.cycle_view(self.cycle_target) else {
            return;
        };
        self.cycle_target = Some(target);
        self.focus_view_inner(target, false);
    }

    /// Terminal release: commits the cycle target as the real focus
    /// and unfreezes stacking.
    pub fn end_cycle(&mut self) {
        if let Some(target) = self.cycle_target.take() {
            self.focus_view_inner(target, true);
        }
    }

    /// Whether an alt-tab cycle is in flight.
    pub fn cycling(&self) -> bool {
        self.cycle_target.is_some()
    }

    // === Hit-testing ===

    /// The topmost view under a layout point, with the sub-area hit.
    /// Child surfaces (popups first) are checked before the main
    /// surface, decorations last.
    pub fn view_at(&self, lx: f64, ly: f64) -> Option<ViewHit> {
        let (x, y) = (lx.floor() as i32, ly.floor() as i32);

        for &id in &self.stacking {
            let Some(view) = self.views.get(&id) else {
                continue;
            };
            if !view.is_focusable() {
                continue;
            }

            // Children, newest first: popups stack above older
            // siblings and above the parent surface.
            for &child_surface in view.children.iter().rev() {
                let Some(child) = self.children.get(&child_surface) else {
                    continue;
                };
                let Some((cx, cy)) = self.child_layout_position_of(child) else {
                    continue;
                };
                let rect = crate::geometry::Rect::new(cx, cy, child.size.0, child.size.1);
                if rect.contains_point(x, y) {
                    return Some(ViewHit {
                        view: id,
                        surface: child_surface,
                        area: ViewArea::Surface,
                        sx: lx - cx as f64,
                        sy: ly - cy as f64,
                    });
                }
            }

            if view.geometry.contains_point(x, y) {
                return Some(ViewHit {
                    view: id,
                    surface: view.surface,
                    area: ViewArea::Surface,
                    sx: lx - view.geometry.x as f64,
                    sy: ly - view.geometry.y as f64,
                });
            }

            let part = ssd::hit_test(view, &self.config.theme, x, y);
            if part != SsdPart::None {
                return Some(ViewHit {
                    view: id,
                    surface: view.surface,
                    area: ViewArea::Ssd(part),
                    sx: lx - view.geometry.x as f64,
                    sy: ly - view.geometry.y as f64,
                });
            }
        }

        None
    }

    /// What the pointer is over: overlay/top layer surfaces beat
    /// views, views beat bottom/background layer surfaces. Layer
    /// lists iterate layer-order-then-creation-order, topmost first.
    pub fn surface_under(&self, lx: f64, ly: f64) -> Option<UnderCursor> {
        let (x, y) = (lx.floor() as i32, ly.floor() as i32);

        let layer_hit = |above_views: bool| -> Option<SurfaceId> {
            for output in self.outputs() {
                for surface in output.layer_surfaces_top_down() {
                    let Some(layer) = self.layer_surfaces.get(&surface) else {
                        continue;
                    };
                    if (layer.layer >= crate::output::Layer::Top) != above_views {
                        continue;
                    }
                    if layer.geometry.contains_point(x, y) {
                        return Some(surface);
                    }
                }
            }
            None
        };

        if let Some(surface) = layer_hit(true) {
            return Some(UnderCursor::Layer(surface));
        }
        if let Some(hit) = self.view_at(lx, ly) {
            return Some(UnderCursor::View(hit));
        }
        layer_hit(false).map(UnderCursor::Layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::output::Layer;
    use crate::view::Shell;

    fn server() -> Server {
        let mut server = Server::new(Config::default()).expect("default config is valid");
        server.handle_new_output("DP-1", 1920, 1080, 1.0);
        server
    }

    fn mapped_view(server: &mut Server, surface: u64) -> ViewId {
        let id = server.handle_new_toplevel(SurfaceId::new(surface), Shell::xdg(), (400, 300), true);
        server.handle_view_map(id);
        id
    }

    /// Stack [a(top), b, c]: focus order c, b, a.
    fn stacked_three(server: &mut Server) -> (ViewId, ViewId, ViewId) {
        let c = mapped_view(server, 3);
        let b = mapped_view(server, 2);
        let a = mapped_view(server, 1);
        (a, b, c)
    }

    #[test]
    fn test_cycle_from_none_skips_focused_top() {
        let mut server = server();
        let (_a, b, _c) = stacked_three(&mut server);

        assert_eq!(server.cycle_view(None), Some(b));
    }

    #[test]
    fn test_cycle_walks_and_wraps() {
        let mut server = server();
        let (a, b, c) = stacked_three(&mut server);

        assert_eq!(server.cycle_view(Some(b)), Some(c));
        assert_eq!(server.cycle_view(Some(c)), Some(a));
        assert_eq!(server.cycle_view(Some(a)), Some(b));
    }

    #[test]
    fn test_cycle_skips_unmapped_and_minimized() {
        let mut server = server();
        let (a, b, c) = stacked_three(&mut server);
        server.set_view_minimized(b, true);

        // b is gone from the cycle: a -> c -> a
        assert_eq!(server.cycle_view(Some(a)), Some(c));
        assert_eq!(server.cycle_view(Some(c)), Some(a));
    }

    #[test]
    fn test_stacking_frozen_during_cycle() {
        let mut server = server();
        let (a, b, _c) = stacked_three(&mut server);
        let before = server.stacking_order().to_vec();

        server.cycle_next();
        assert_eq!(server.focused_view(), Some(b));
        // Stepping focus does not reorder the stack.
        assert_eq!(server.stacking_order(), before.as_slice());

        server.end_cycle();
        // The terminal release commits the reorder.
        assert_eq!(server.stacking_order()[0], b);
        assert_eq!(server.focused_view(), Some(b));
        assert!(!server.cycling());
        let _ = a;
    }

    #[test]
    fn test_repeated_cycle_walks_stack() {
        let mut server = server();
        let (a, b, c) = stacked_three(&mut server);

        server.cycle_next();
        assert_eq!(server.focused_view(), Some(b));
        server.cycle_next();
        assert_eq!(server.focused_view(), Some(c));
        server.cycle_next();
        assert_eq!(server.focused_view(), Some(a));
    }

    #[test]
    fn test_destroying_cycle_target_clears_cycle() {
        let mut server = server();
        let (_a, b, _c) = stacked_three(&mut server);

        server.cycle_next();
        assert_eq!(server.focused_view(), Some(b));

        server.handle_view_destroyed(b);
        assert!(!server.cycling());
    }

    #[test]
    fn test_view_at_returns_topmost() {
        let mut server = server();
        // Two views at the same spot; the later-focused one wins.
        let a = mapped_view(&mut server, 1);
        let b = mapped_view(&mut server, 2);
        server.move_view_to(a, 100, 100);
        server.move_view_to(b, 100, 100);

        let hit = server.view_at(150.0, 150.0).expect("hit");
        assert_eq!(hit.view, b);
        assert_eq!(hit.area, ViewArea::Surface);
        assert_eq!(hit.surface, SurfaceId::new(2));
        assert_eq!((hit.sx, hit.sy), (50.0, 50.0));
    }

    #[test]
    fn test_view_at_reports_decoration_part() {
        let mut server = server();
        let a = mapped_view(&mut server, 1);
        server.move_view_to(a, 100, 100);

        // Just above the surface: the title bar.
        let hit = server.view_at(200.0, 95.0).expect("hit");
        assert_eq!(hit.view, a);
        assert_eq!(hit.area, ViewArea::Ssd(SsdPart::TitleBar));
    }

    #[test]
    fn test_view_at_prefers_popup_over_parent() {
        let mut server = server();
        let a = mapped_view(&mut server, 1);
        server.move_view_to(a, 100, 100);
        server.handle_new_popup(SurfaceId::new(1), SurfaceId::new(5), (50, 50));
        server.handle_commit(SurfaceId::new(5), 0, (100, 100), &[]);

        let hit = server.view_at(160.0, 160.0).expect("hit");
        assert_eq!(hit.view, a);
        assert_eq!(hit.surface, SurfaceId::new(5));
        assert_eq!((hit.sx, hit.sy), (10.0, 10.0));
    }

    #[test]
    fn test_view_at_ignores_minimized() {
        let mut server = server();
        let a = mapped_view(&mut server, 1);
        server.move_view_to(a, 100, 100);
        server.set_view_minimized(a, true);

        assert!(server.view_at(150.0, 150.0).is_none());
    }

    #[test]
    fn test_overlay_layer_beats_view() {
        let mut server = server();
        let output = server.outputs().next().expect("output").id;
        let a = mapped_view(&mut server, 1);
        server.move_view_to(a, 0, 0);
        server.handle_new_layer_surface(SurfaceId::new(9), output, Layer::Overlay, (1920, 1080), false);

        match server.surface_under(100.0, 100.0) {
            Some(UnderCursor::Layer(surface)) => assert_eq!(surface, SurfaceId::new(9)),
            other => panic!("expected overlay hit, got {:?}", other),
        }
    }

    #[test]
    fn test_background_layer_loses_to_view() {
        let mut server = server();
        let output = server.outputs().next().expect("output").id;
        let a = mapped_view(&mut server, 1);
        server.move_view_to(a, 100, 100);
        server.handle_new_layer_surface(
            SurfaceId::new(9),
            output,
            Layer::Background,
            (1920, 1080),
            false,
        );

        match server.surface_under(150.0, 150.0) {
            Some(UnderCursor::View(hit)) => assert_eq!(hit.view, a),
            other => panic!("expected view hit, got {:?}", other),
        }
        // Off the view, the background shows through.
        match server.surface_under(1800.0, 900.0) {
            Some(UnderCursor::Layer(surface)) => assert_eq!(surface, SurfaceId::new(9)),
            other => panic!("expected background hit, got {:?}", other),
        }
    }

    #[test]
    fn test_focus_refused_while_layer_exclusive() {
        let mut server = server();
        let output = server.outputs().next().expect("output").id;
        let a = mapped_view(&mut server, 1);
        server.handle_new_layer_surface(SurfaceId::new(9), output, Layer::Overlay, (100, 100), true);
        let b = mapped_view(&mut server, 2);

        // Mapping b attempted to focus it, but the lock screen holds
        // exclusive focus.
        assert_eq!(server.focused_view(), Some(a));
        let _ = b;
    }

    #[test]
    fn test_focus_topmost_with_nothing_mapped() {
        let mut server = server();
        let a = mapped_view(&mut server, 1);
        server.handle_view_unmap(a);

        assert!(server.focused_view().is_none());
        assert!(server.seat.keyboard_focus.is_none());
    }
}
