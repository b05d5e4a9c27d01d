//! Outputs, layer surfaces, and damage-tracked repaint scheduling
//!
//! Each physical display accumulates a pending damage region between
//! repaints. Damage arrives in layout coordinates and is converted to
//! output-local pixels here (subtract the output's layout origin,
//! apply its scale) so the renderer can consume it directly. The
//! region is clipped to the output's resolution and drained exactly
//! once per successful repaint.
//!
//! Layer surfaces (panels, wallpapers, lock screens) live outside
//! normal view stacking in four fixed layers per output and are
//! iterated layer-order-then-creation-order everywhere.

use log::{debug, info};

use crate::geometry::{PendingDamage, Rect};
use crate::view::SurfaceId;

/// Stable handle to an output. Allocated by the server on hotplug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(u64);

impl OutputId {
    pub(crate) fn new(raw: u64) -> Self {
        OutputId(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The four fixed compositing layers, bottom to top. Views render
/// between `Bottom` and `Top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background = 0,
    Bottom = 1,
    Top = 2,
    Overlay = 3,
}

impl Layer {
    pub const ALL: [Layer; 4] = [Layer::Background, Layer::Bottom, Layer::Top, Layer::Overlay];
}

/// A surface pinned to one of the fixed layers of one output.
#[derive(Debug, Clone)]
pub struct LayerSurface {
    pub surface: SurfaceId,
    pub output: OutputId,
    pub layer: Layer,
    /// Geometry in layout coordinates.
    pub geometry: Rect,
    /// Whether this surface demands exclusive keyboard focus while
    /// mapped (lock screens). The seat routes all keys to it.
    pub exclusive_focus: bool,
}

/// One physical display.
#[derive(Debug)]
pub struct Output {
    pub id: OutputId,
    pub name: String,

    /// Position in the shared logical layout.
    pub layout_x: i32,
    pub layout_y: i32,

    /// Current mode, in physical pixels.
    pub width: u32,
    pub height: u32,

    pub scale: f32,

    damage: PendingDamage,

    /// Layer-surface stacking, one list per fixed layer, each in
    /// creation order.
    layers: [Vec<SurfaceId>; 4],
}

impl Output {
    pub fn new(id: OutputId, name: &str, width: u32, height: u32, scale: f32) -> Self {
        info!("🖥️ Output {} connected: {}x{}@{}", name, width, height, scale);
        Self {
            id,
            name: name.to_string(),
            layout_x: 0,
            layout_y: 0,
            width,
            height,
            scale,
            damage: PendingDamage::new(),
            layers: Default::default(),
        }
    }

    /// The output's box in layout coordinates.
    pub fn layout_box(&self) -> Rect {
        Rect::new(
            self.layout_x,
            self.layout_y,
            (self.width as f32 / self.scale) as u32,
            (self.height as f32 / self.scale) as u32,
        )
    }

    /// The output's box in its own pixel coordinates.
    fn pixel_bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    fn to_output_local(&self, rect: Rect) -> Rect {
        rect.translated(-self.layout_x, -self.layout_y).scaled(self.scale)
    }

    /// Adds damage for a surface at layout position (`lx`, `ly`).
    ///
    /// With `whole` set the surface's full box is damaged (map,
    /// resize, focus change); otherwise only the client's incremental
    /// rects, which are surface-local and get offset to (`lx`, `ly`)
    /// first. Anything outside this output is dropped by clipping.
    pub fn damage_surface(
        &mut self,
        lx: i32,
        ly: i32,
        surface_size: (u32, u32),
        whole: bool,
        client_damage: &[Rect],
    ) {
        let bounds = self.pixel_bounds();

        if whole {
            let surface_box = Rect::new(lx, ly, surface_size.0, surface_size.1);
            self.damage.add(self.to_output_local(surface_box), bounds);
        } else {
            for rect in client_damage {
                let layout_rect = rect.translated(lx, ly);
                self.damage.add(self.to_output_local(layout_rect), bounds);
            }
        }
    }

    /// Damages the whole output.
    pub fn damage_whole(&mut self) {
        self.damage.add_whole(self.pixel_bounds());
    }

    pub fn has_damage(&self) -> bool {
        !self.damage.is_empty()
    }

    pub fn pending_damage(&self) -> &[Rect] {
        self.damage.regions()
    }

    /// Drains the pending region for a repaint. Cleared exactly once;
    /// a second call returns nothing until new damage arrives.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        self.damage.take()
    }

    /// Applies a mode or scale change and invalidates the whole
    /// output.
    pub fn set_mode(&mut self, width: u32, height: u32, scale: f32) {
        debug!(
            "Output {} mode change: {}x{}@{}",
            self.name, width, height, scale
        );
        self.width = width;
        self.height = height;
        self.scale = scale;
        // Old damage may lie outside the new resolution.
        self.damage.take();
        self.damage_whole();
    }

    pub fn add_layer_surface(&mut self, layer: Layer, surface: SurfaceId) {
        self.layers[layer as usize].push(surface);
    }

    pub fn remove_layer_surface(&mut self, surface: SurfaceId) -> bool {
        let mut removed = false;
        for list in &mut self.layers {
            let before = list.len();
            list.retain(|&s| s != surface);
            removed |= list.len() != before;
        }
        removed
    }

    /// Layer surfaces bottom-to-top: layer order, then creation order
    /// within a layer. Render lists use this directly.
    pub fn layer_surfaces_bottom_up(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.layers.iter().flat_map(|list| list.iter().copied())
    }

    /// Layer surfaces top-to-bottom, for input hit-testing.
    pub fn layer_surfaces_top_down(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.layers
            .iter()
            .rev()
            .flat_map(|list| list.iter().rev().copied())
    }
}
