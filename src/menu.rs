//! Root menu model
//!
//! The menu definition (labels and the actions they dispatch) comes
//! from configuration and is read-only; this module only tracks where
//! the menu is open and which item the pointer is over. While the menu
//! is open the server's input mode is `Menu` and all pointer/keyboard
//! input is routed here instead of to views.

use crate::config::{MenuConfig, MenuItem};
use crate::geometry::Rect;

#[derive(Debug)]
pub struct Menu {
    config: MenuConfig,

    /// Top-left corner in layout coordinates while open.
    origin: Option<(i32, i32)>,

    /// Index of the item under the pointer.
    selected: Option<usize>,
}

impl Menu {
    pub fn new(config: MenuConfig) -> Self {
        Self {
            config,
            origin: None,
            selected: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.origin.is_some()
    }

    pub fn open(&mut self, x: i32, y: i32) {
        self.origin = Some((x, y));
        self.selected = None;
    }

    pub fn close(&mut self) {
        self.origin = None;
        self.selected = None;
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.config.items
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Full menu box in layout coordinates, when open.
    pub fn geometry(&self) -> Option<Rect> {
        let (x, y) = self.origin?;
        Some(Rect::new(
            x,
            y,
            self.config.width,
            self.config.item_height * self.config.items.len() as u32,
        ))
    }

    /// Index of the item under a layout-coordinate point.
    pub fn item_at(&self, x: i32, y: i32) -> Option<usize> {
        let geometry = self.geometry()?;
        if !geometry.contains_point(x, y) {
            return None;
        }
        let index = ((y - geometry.y) as u32 / self.config.item_height) as usize;
        (index < self.config.items.len()).then_some(index)
    }

    /// Updates the selection to follow the pointer. Returns true when
    /// the highlighted item changed (callers damage the menu box).
    pub fn select_at(&mut self, x: i32, y: i32) -> bool {
        let selected = self.item_at(x, y);
        if selected != self.selected {
            self.selected = selected;
            true
        } else {
            false
        }
    }

    /// The item under the point, for click activation.
    pub fn activate_at(&self, x: i32, y: i32) -> Option<&MenuItem> {
        self.item_at(x, y).map(|i| &self.config.items[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Menu {
        Menu::new(MenuConfig {
            width: 100,
            item_height: 20,
            items: vec![
                MenuItem {
                    label: "Terminal".to_string(),
                    action: "Execute".to_string(),
                    command: Some("foot".to_string()),
                },
                MenuItem {
                    label: "Maximize".to_string(),
                    action: "ToggleMaximize".to_string(),
                    command: None,
                },
                MenuItem {
                    label: "Exit".to_string(),
                    action: "Exit".to_string(),
                    command: None,
                },
            ],
        })
    }

    #[test]
    fn test_closed_menu_has_no_geometry() {
        let menu = menu();
        assert!(!menu.is_open());
        assert!(menu.geometry().is_none());
        assert!(menu.item_at(0, 0).is_none());
    }

    #[test]
    fn test_geometry_spans_all_items() {
        let mut menu = menu();
        menu.open(50, 50);

        assert_eq!(menu.geometry(), Some(Rect::new(50, 50, 100, 60)));
    }

    #[test]
    fn test_item_lookup() {
        let mut menu = menu();
        menu.open(0, 0);

        assert_eq!(menu.item_at(10, 5), Some(0));
        assert_eq!(menu.item_at(10, 25), Some(1));
        assert_eq!(menu.item_at(10, 59), Some(2));
        assert_eq!(menu.item_at(10, 60), None);
        assert_eq!(menu.item_at(200, 5), None);
    }

    #[test]
    fn test_selection_follows_pointer() {
        let mut menu = menu();
        menu.open(0, 0);

        assert!(menu.select_at(10, 5));
        assert_eq!(menu.selected(), Some(0));
        // Same item: no change to repaint
        assert!(!menu.select_at(15, 8));
        assert!(menu.select_at(10, 45));
        assert_eq!(menu.selected(), Some(2));
        // Leaving the menu clears the highlight
        assert!(menu.select_at(300, 300));
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn test_activate_returns_item() {
        let mut menu = menu();
        menu.open(0, 0);

        let item = menu.activate_at(10, 25).expect("item under point");
        assert_eq!(item.action, "ToggleMaximize");
    }

    #[test]
    fn test_close_resets_state() {
        let mut menu = menu();
        menu.open(0, 0);
        menu.select_at(10, 5);

        menu.close();

        assert!(!menu.is_open());
        assert!(menu.selected().is_none());
    }
}
