pub mod decorator;
pub mod drag;
pub mod registry;
pub mod surface;

use std::fmt;

use ratatui::prelude::Rect;
use serde::{Deserialize, Serialize};

pub use drag::{DragController, DragState, PointerDown};
pub use registry::{RegistryEvent, RegistryPolicy, WindowRecord, WindowRegistry};
pub use surface::{SurfaceAction, WindowSurface};

/// Stable identifier of a launchable sub-application.
///
/// One id maps to at most one window: the shell runs every sub-application
/// as a single instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WindowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Sub-application variants the shell knows how to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppKind {
    Tasks,
    Bookmarks,
    Identity,
}

impl AppKind {
    pub const ALL: [AppKind; 3] = [AppKind::Tasks, AppKind::Bookmarks, AppKind::Identity];

    pub fn icon(self) -> &'static str {
        match self {
            AppKind::Tasks => "☑",
            AppKind::Bookmarks => "★",
            AppKind::Identity => "☺",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppKind::Tasks => "tasks",
            AppKind::Bookmarks => "bookmarks",
            AppKind::Identity => "identity",
        }
    }
}

impl fmt::Display for AppKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signed top-left offset of a window frame, in cells relative to the
/// managed area.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Unsigned frame or viewport size, in cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl From<Rect> for Size {
    fn from(rect: Rect) -> Self {
        Self::new(rect.width, rect.height)
    }
}

/// Resolve a record's frame into absolute screen coordinates inside `area`,
/// clipped to it. Returns `None` when nothing of the frame is visible.
pub fn frame_rect(area: Rect, position: Position, size: Size) -> Option<Rect> {
    let x0 = area.x as i32 + position.x;
    let y0 = area.y as i32 + position.y;
    let x1 = (x0 + size.width as i32).min(area.x as i32 + area.width as i32);
    let y1 = (y0 + size.height as i32).min(area.y as i32 + area.height as i32);
    let x0 = x0.max(area.x as i32);
    let y0 = y0.max(area.y as i32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Rect {
        x: x0 as u16,
        y: y0 as u16,
        width: (x1 - x0) as u16,
        height: (y1 - y0) as u16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rect_offsets_into_area() {
        let area = Rect::new(0, 1, 80, 20);
        let rect = frame_rect(area, Position::new(3, 2), Size::new(10, 5)).unwrap();
        assert_eq!(rect, Rect::new(3, 3, 10, 5));
    }

    #[test]
    fn frame_rect_clips_to_area() {
        let area = Rect::new(0, 1, 20, 10);
        let rect = frame_rect(area, Position::new(15, 8), Size::new(10, 5)).unwrap();
        assert_eq!(rect, Rect::new(15, 9, 5, 2));
        assert!(frame_rect(area, Position::new(30, 0), Size::new(4, 4)).is_none());
    }

    #[test]
    fn app_kind_round_trips_through_lowercase_names() {
        for kind in AppKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
