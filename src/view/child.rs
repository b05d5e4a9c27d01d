//! Child surfaces hanging off a view
//!
//! Subsurfaces and popups share one representation: a non-owning
//! back-reference to the parent view plus the surface they own. Both
//! nest (a popup can spawn its own popups), so the parent surface is
//! tracked separately from the parent view.
//!
//! Children are created on the parent's new-subsurface / new-popup
//! event and destroyed with their surface, always before or together
//! with the parent view.

use super::{SurfaceId, ViewId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Subsurface,
    Popup,
}

/// A subsurface or popup belonging to a view.
#[derive(Debug, Clone)]
pub struct ViewChild {
    /// The surface this child owns.
    pub surface: SurfaceId,

    /// The top-level view this child ultimately belongs to. Resolved
    /// through the server's view map; the parent always outlives the
    /// child.
    pub parent_view: ViewId,

    /// Direct parent surface: the view's own surface, or another
    /// child when nested.
    pub parent_surface: SurfaceId,

    pub kind: ChildKind,

    /// Position relative to the parent surface origin.
    pub offset: (i32, i32),

    /// Last committed surface size.
    pub size: (u32, u32),
}

impl ViewChild {
    pub fn new(
        surface: SurfaceId,
        parent_view: ViewId,
        parent_surface: SurfaceId,
        kind: ChildKind,
        offset: (i32, i32),
    ) -> Self {
        Self {
            surface,
            parent_view,
            parent_surface,
            kind,
            offset,
            size: (0, 0),
        }
    }

    pub fn is_popup(&self) -> bool {
        self.kind == ChildKind::Popup
    }
}
