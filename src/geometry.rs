//! Geometry primitives shared across the compositor core
//!
//! Everything here is plain data: rectangles in layout coordinates,
//! decoration border widths, and the per-output pending-damage
//! accumulator used by the repaint scheduler.

/// Maximum number of damage rects tracked per output before coalescing
/// into a single bounding box.
const MAX_DAMAGE_REGIONS: usize = 16;

/// An axis-aligned rectangle in layout (or output-local) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_loc_and_size((x, y): (i32, i32), (width, height): (u32, u32)) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }

    /// Intersection of two rects, or `None` when they don't overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        Some(Rect {
            x: x1,
            y: y1,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }

    /// Smallest bounding box containing both rects.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }

        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());

        Rect {
            x: x1,
            y: y1,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        }
    }

    pub fn translated(&self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Scales a layout-coordinate rect to output pixels.
    pub fn scaled(&self, scale: f32) -> Rect {
        Rect {
            x: (self.x as f32 * scale).floor() as i32,
            y: (self.y as f32 * scale).floor() as i32,
            width: (self.width as f32 * scale).ceil() as u32,
            height: (self.height as f32 * scale).ceil() as u32,
        }
    }

    /// Grows the rect outward by a border on each side.
    pub fn expanded(&self, border: Border) -> Rect {
        Rect {
            x: self.x - border.left,
            y: self.y - border.top,
            width: (self.width as i32 + border.left + border.right).max(0) as u32,
            height: (self.height as i32 + border.top + border.bottom).max(0) as u32,
        }
    }
}

/// Per-side decoration widths. All zero for client-decorated views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Border {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Border {
    pub fn uniform(width: i32) -> Self {
        Self {
            top: width,
            right: width,
            bottom: width,
            left: width,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Border::default()
    }
}

/// Accumulates damage rects for one output between repaints.
///
/// Rects are kept in output-local coordinates and clipped against the
/// output bounds on insert. Once the list grows past
/// `MAX_DAMAGE_REGIONS` the rects are collapsed into their bounding box
/// to bound per-frame bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct PendingDamage {
    regions: Vec<Rect>,
}

impl PendingDamage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rect, clipped to `bounds`. Out-of-bounds damage is
    /// silently dropped.
    pub fn add(&mut self, rect: Rect, bounds: Rect) {
        let clipped = match rect.intersection(&bounds) {
            Some(r) if !r.is_empty() => r,
            _ => return,
        };

        // Skip rects already covered by accumulated damage.
        if self
            .regions
            .iter()
            .any(|r| r.intersection(&clipped) == Some(clipped))
        {
            return;
        }

        self.regions.push(clipped);

        if self.regions.len() > MAX_DAMAGE_REGIONS {
            let bounding = self
                .regions
                .iter()
                .fold(Rect::default(), |acc, r| acc.union(r));
            self.regions.clear();
            self.regions.push(bounding);
        }
    }

    /// Replaces all accumulated damage with the full bounds.
    pub fn add_whole(&mut self, bounds: Rect) {
        self.regions.clear();
        self.regions.push(bounds);
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[Rect] {
        &self.regions
    }

    /// Drains the accumulated damage. Called exactly once per
    /// successful repaint.
    pub fn take(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_point() {
        let r = Rect::new(10, 10, 50, 50);

        assert!(r.contains_point(10, 10));
        assert!(r.contains_point(59, 59));
        assert!(!r.contains_point(60, 60));
        assert!(!r.contains_point(0, 0));
    }

    #[test]
    fn test_rect_intersection() {
        let r1 = Rect::new(0, 0, 100, 100);
        let r2 = Rect::new(50, 50, 100, 100);

        assert_eq!(r1.intersection(&r2), Some(Rect::new(50, 50, 50, 50)));

        let r3 = Rect::new(200, 200, 50, 50);
        assert!(r1.intersection(&r3).is_none());
    }

    #[test]
    fn test_rect_union() {
        let r1 = Rect::new(0, 0, 100, 100);
        let r2 = Rect::new(50, 50, 100, 100);

        assert_eq!(r1.union(&r2), Rect::new(0, 0, 150, 150));
    }

    #[test]
    fn test_rect_union_with_empty() {
        let r = Rect::new(5, 5, 10, 10);
        assert_eq!(Rect::default().union(&r), r);
        assert_eq!(r.union(&Rect::default()), r);
    }

    #[test]
    fn test_rect_expanded() {
        let r = Rect::new(100, 100, 200, 150);
        let grown = r.expanded(Border {
            top: 25,
            right: 4,
            bottom: 4,
            left: 4,
        });

        assert_eq!(grown, Rect::new(96, 75, 208, 179));
    }

    #[test]
    fn test_rect_scaled() {
        let r = Rect::new(10, 10, 100, 100);
        let scaled = r.scaled(2.0);

        assert_eq!(scaled, Rect::new(20, 20, 200, 200));
    }

    #[test]
    fn test_damage_union_of_disjoint_rects() {
        let bounds = Rect::new(0, 0, 1920, 1080);
        let mut damage = PendingDamage::new();

        damage.add(Rect::new(0, 0, 10, 10), bounds);
        damage.add(Rect::new(100, 100, 10, 10), bounds);

        assert_eq!(damage.regions().len(), 2);
        assert_eq!(damage.regions()[0], Rect::new(0, 0, 10, 10));
        assert_eq!(damage.regions()[1], Rect::new(100, 100, 10, 10));
    }

    #[test]
    fn test_damage_whole_replaces_accumulated() {
        let bounds = Rect::new(0, 0, 1920, 1080);
        let mut damage = PendingDamage::new();

        damage.add(Rect::new(0, 0, 10, 10), bounds);
        damage.add(Rect::new(100, 100, 10, 10), bounds);
        damage.add_whole(bounds);

        assert_eq!(damage.regions(), &[bounds]);
    }

    #[test]
    fn test_damage_clipped_to_bounds() {
        let bounds = Rect::new(0, 0, 800, 600);
        let mut damage = PendingDamage::new();

        damage.add(Rect::new(750, 550, 100, 100), bounds);

        assert_eq!(damage.regions(), &[Rect::new(750, 550, 50, 50)]);
    }

    #[test]
    fn test_damage_outside_bounds_dropped() {
        let bounds = Rect::new(0, 0, 800, 600);
        let mut damage = PendingDamage::new();

        damage.add(Rect::new(900, 900, 10, 10), bounds);

        assert!(damage.is_empty());
    }

    #[test]
    fn test_damage_coalesces_past_cap() {
        let bounds = Rect::new(0, 0, 4000, 100);
        let mut damage = PendingDamage::new();

        // One past the cap: the 17th insert collapses the list into
        // its bounding box.
        for i in 0..17 {
            damage.add(Rect::new(i * 100, 0, 10, 10), bounds);
        }

        assert_eq!(damage.regions().len(), 1);
        assert!(damage.regions()[0].contains_point(0, 0));
        assert!(damage.regions()[0].contains_point(1605, 5));
    }

    #[test]
    fn test_damage_take_clears() {
        let bounds = Rect::new(0, 0, 800, 600);
        let mut damage = PendingDamage::new();
        damage.add(Rect::new(0, 0, 10, 10), bounds);

        let taken = damage.take();
        assert_eq!(taken.len(), 1);
        assert!(damage.is_empty());
    }
}
