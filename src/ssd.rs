//! Server-side decoration geometry
//!
//! Pure functions from (view geometry, theme metrics) to decoration
//! part boxes and hit-test results. Nothing here is stored: the same
//! inputs always decorate identically, which is what lets focus
//! changes repaint decorations by just damaging the extents.
//!
//! Layout, from the outside in: a `border_width` frame around the
//! whole view, the title bar filling the rest of `title_height` above
//! the surface, and the button row right-aligned inside the title bar
//! (iconify, maximize, close outermost). Corner handles are atomic
//! squares overlaid on the frame; they win over single edges but lose
//! to the title bar and buttons.

use crate::config::Theme;
use crate::geometry::{Border, Rect};
use crate::input::ResizeEdges;
use crate::view::View;

/// A named part of the server-side decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SsdPart {
    None,
    ButtonClose,
    ButtonMaximize,
    ButtonIconify,
    TitleBar,
    Top,
    Right,
    Bottom,
    Left,
    CornerTopLeft,
    CornerTopRight,
    CornerBottomLeft,
    CornerBottomRight,
}

/// Decoration thickness on each side. All zero for client-decorated
/// views.
pub fn thickness(view: &View, theme: &Theme) -> Border {
    if !view.ssd {
        return Border::default();
    }

    Border {
        top: theme.title_height as i32,
        right: theme.border_width as i32,
        bottom: theme.border_width as i32,
        left: theme.border_width as i32,
    }
}

/// Bounding box of the surface plus its decoration, in layout
/// coordinates.
pub fn max_extents(view: &View, theme: &Theme) -> Rect {
    view.geometry.expanded(thickness(view, theme))
}

/// Geometry of a named decoration part in layout coordinates.
///
/// Returns an empty rect for `SsdPart::None` and for client-decorated
/// views.
pub fn part_box(view: &View, theme: &Theme, part: SsdPart) -> Rect {
    if !view.ssd {
        return Rect::default();
    }

    let geo = view.geometry;
    let outer = max_extents(view, theme);
    let bw = theme.border_width;
    let corner = theme.corner_size;
    let button = theme.button_size;
    let spacing = theme.button_spacing;

    let button_y = outer.y + ((theme.title_height - button) / 2) as i32;
    let close_x = outer.right() - (bw + spacing + button) as i32;
    let maximize_x = close_x - (button + spacing) as i32;
    let iconify_x = maximize_x - (button + spacing) as i32;

    match part {
        SsdPart::None => Rect::default(),
        SsdPart::ButtonClose => Rect::new(close_x, button_y, button, button),
        SsdPart::ButtonMaximize => Rect::new(maximize_x, button_y, button, button),
        SsdPart::ButtonIconify => Rect::new(iconify_x, button_y, button, button),
        SsdPart::TitleBar => Rect::new(
            outer.x,
            outer.y + bw as i32,
            outer.width,
            theme.title_height.saturating_sub(bw),
        ),
        SsdPart::Top => Rect::new(outer.x, outer.y, outer.width, bw),
        SsdPart::Bottom => Rect::new(outer.x, geo.bottom(), outer.width, bw),
        SsdPart::Left => Rect::new(outer.x, outer.y, bw, outer.height),
        SsdPart::Right => Rect::new(geo.right(), outer.y, bw, outer.height),
        SsdPart::CornerTopLeft => Rect::new(outer.x, outer.y, corner, corner),
        SsdPart::CornerTopRight => {
            Rect::new(outer.right() - corner as i32, outer.y, corner, corner)
        }
        SsdPart::CornerBottomLeft => {
            Rect::new(outer.x, outer.bottom() - corner as i32, corner, corner)
        }
        SsdPart::CornerBottomRight => Rect::new(
            outer.right() - corner as i32,
            outer.bottom() - corner as i32,
            corner,
            corner,
        ),
    }
}

/// The decoration part under a layout-coordinate point.
///
/// Precedence: buttons > title bar > corners > edges. Points inside
/// the client surface (or outside the max extents) hit nothing; so
/// does every point on a client-decorated view.
pub fn hit_test(view: &View, theme: &Theme, lx: i32, ly: i32) -> SsdPart {
    if !view.ssd {
        return SsdPart::None;
    }
    if view.geometry.contains_point(lx, ly) {
        return SsdPart::None;
    }
    if !max_extents(view, theme).contains_point(lx, ly) {
        return SsdPart::None;
    }

    const ORDER: [SsdPart; 12] = [
        SsdPart::ButtonClose,
        SsdPart::ButtonMaximize,
        SsdPart::ButtonIconify,
        SsdPart::TitleBar,
        SsdPart::CornerTopLeft,
        SsdPart::CornerTopRight,
        SsdPart::CornerBottomLeft,
        SsdPart::CornerBottomRight,
        SsdPart::Top,
        SsdPart::Right,
        SsdPart::Bottom,
        SsdPart::Left,
    ];

    for part in ORDER {
        if part_box(view, theme, part).contains_point(lx, ly) {
            return part;
        }
    }

    SsdPart::None
}

/// The resize-edge mask a part drags. Corners are atomic: a corner
/// part yields both adjoining edges as one mask, it is never derived
/// from two separate edge hits.
pub fn resize_edges(part: SsdPart) -> ResizeEdges {
    match part {
        SsdPart::Top => ResizeEdges::TOP,
        SsdPart::Bottom => ResizeEdges::BOTTOM,
        SsdPart::Left => ResizeEdges::LEFT,
        SsdPart::Right => ResizeEdges::RIGHT,
        SsdPart::CornerTopLeft => ResizeEdges::TOP_LEFT,
        SsdPart::CornerTopRight => ResizeEdges::TOP_RIGHT,
        SsdPart::CornerBottomLeft => ResizeEdges::BOTTOM_LEFT,
        SsdPart::CornerBottomRight => ResizeEdges::BOTTOM_RIGHT,
        _ => ResizeEdges::empty(),
    }
}
