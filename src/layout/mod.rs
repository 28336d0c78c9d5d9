use std::collections::BTreeMap;

use ratatui::prelude::Rect;

/// Rows of the screen claimed by the shell chrome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShellAreas {
    /// Launcher row along the top edge.
    pub dock: Rect,
    /// Space windows are laid out and clamped into.
    pub managed: Rect,
    /// Minimized-window row along the bottom edge.
    pub taskbar: Rect,
}

/// Split `area` into a top dock row of `dock_height`, a one-row taskbar at
/// the bottom, and the managed area in between.
pub fn split_shell(area: Rect, dock_height: u16) -> ShellAreas {
    let top_h = dock_height.min(area.height);
    let bottom_h = 1u16.min(area.height.saturating_sub(top_h));
    let dock = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: top_h,
    };
    let taskbar = Rect {
        x: area.x,
        y: area.y.saturating_add(area.height).saturating_sub(bottom_h),
        width: area.width,
        height: bottom_h,
    };
    let managed = Rect {
        x: area.x,
        y: area.y.saturating_add(top_h),
        width: area.width,
        height: area.height.saturating_sub(top_h).saturating_sub(bottom_h),
    };
    ShellAreas {
        dock,
        managed,
        taskbar,
    }
}

/// Screen rectangles recorded during a frame, for hit testing the next
/// pointer event against what was actually drawn.
#[derive(Debug, Clone)]
pub struct RegionMap<T: Clone + Ord> {
    regions: BTreeMap<T, Rect>,
}

impl<T: Clone + Ord> Default for RegionMap<T> {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }
}

impl<T: Clone + Ord> RegionMap<T> {
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn set(&mut self, id: T, rect: Rect) {
        self.regions.insert(id, rect);
    }

    pub fn get(&self, id: &T) -> Option<Rect> {
        self.regions.get(id).copied()
    }

    /// First id in `ids` whose region contains the point. Pass ids topmost
    /// first when regions overlap.
    pub fn hit_test<'a>(&self, column: u16, row: u16, ids: &'a [T]) -> Option<&'a T> {
        ids.iter().find(|id| {
            self.regions
                .get(*id)
                .is_some_and(|rect| rect_contains(*rect, column, row))
        })
    }
}

pub fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    let max_x = rect.x.saturating_add(rect.width);
    let max_y = rect.y.saturating_add(rect.height);
    column >= rect.x && column < max_x && row >= rect.y && row < max_y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_shell_reserves_top_and_bottom_rows() {
        let areas = split_shell(Rect::new(0, 0, 80, 24), 1);
        assert_eq!(areas.dock, Rect::new(0, 0, 80, 1));
        assert_eq!(areas.taskbar, Rect::new(0, 23, 80, 1));
        assert_eq!(areas.managed, Rect::new(0, 1, 80, 22));
    }

    #[test]
    fn split_shell_degrades_on_tiny_screens() {
        let areas = split_shell(Rect::new(0, 0, 10, 1), 1);
        assert_eq!(areas.dock.height, 1);
        assert_eq!(areas.taskbar.height, 0);
        assert_eq!(areas.managed.height, 0);
    }

    #[test]
    fn region_map_hit_test_prefers_earlier_ids() {
        let mut map = RegionMap::default();
        map.set("low".to_string(), Rect::new(0, 0, 10, 10));
        map.set("high".to_string(), Rect::new(5, 5, 10, 10));
        let order = ["high".to_string(), "low".to_string()];
        assert_eq!(map.hit_test(6, 6, &order).map(String::as_str), Some("high"));
        assert_eq!(map.hit_test(1, 1, &order).map(String::as_str), Some("low"));
        assert_eq!(map.hit_test(40, 40, &order), None);
        map.clear();
        assert_eq!(map.get(&"low".to_string()), None);
    }

    #[test]
    fn rect_contains_edge_cases() {
        let r = Rect {
            x: 0,
            y: 0,
            width: 0,
            height: 5,
        };
        assert!(!rect_contains(r, 0, 0));
        let r2 = Rect {
            x: 1,
            y: 1,
            width: 3,
            height: 3,
        };
        assert!(rect_contains(r2, 1, 1));
        assert!(!rect_contains(r2, 4, 1));
    }
}
