//! Header drag tracking for a single window.
//!
//! The controller is a small `Idle → Dragging → Idle` state machine fed with
//! plain coordinates, so it can be driven from tests without synthesizing
//! terminal mouse events.

use ratatui::prelude::Rect;

use super::{Position, Size};
use crate::constants::DEAD_ZONE_MARGIN;
use crate::layout::rect_contains;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        start_column: u16,
        start_row: u16,
        start_position: Position,
    },
}

/// Result of a pointer press on the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerDown {
    /// The press landed on the header; the window should come to front.
    pub focus: bool,
    /// A drag began; text selection must be suppressed until it ends.
    pub drag_started: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Handle a press at `(column, row)`. `header` is the frame's header row
    /// and `controls` the bounding box of its buttons, both in screen cells.
    pub fn pointer_down(
        &mut self,
        column: u16,
        row: u16,
        header: Rect,
        controls: Rect,
        position: Position,
    ) -> PointerDown {
        if !rect_contains(header, column, row) {
            return PointerDown::default();
        }
        if in_dead_zone(controls, column, row) {
            return PointerDown {
                focus: true,
                drag_started: false,
            };
        }
        self.state = DragState::Dragging {
            start_column: column,
            start_row: row,
            start_position: position,
        };
        PointerDown {
            focus: true,
            drag_started: true,
        }
    }

    /// Track pointer motion. Returns the new clamped frame position, or
    /// `None` when idle or when the move cancelled the drag because the
    /// pointer wandered back into the controls' dead zone.
    pub fn pointer_move(
        &mut self,
        column: u16,
        row: u16,
        controls: Rect,
        viewport: Size,
        window: Size,
    ) -> Option<Position> {
        let DragState::Dragging {
            start_column,
            start_row,
            start_position,
        } = self.state
        else {
            return None;
        };
        if in_dead_zone(controls, column, row) {
            self.state = DragState::Idle;
            return None;
        }
        let dx = column as i32 - start_column as i32;
        let dy = row as i32 - start_row as i32;
        Some(clamp_position(
            Position::new(start_position.x + dx, start_position.y + dy),
            viewport,
            window,
        ))
    }

    /// End the drag. Returns whether a drag was in progress.
    pub fn pointer_up(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

/// Clamp both axes into `[0, viewport - window]`. A window larger than the
/// viewport is pinned to the origin.
pub fn clamp_position(candidate: Position, viewport: Size, window: Size) -> Position {
    let max_x = (viewport.width as i32 - window.width as i32).max(0);
    let max_y = (viewport.height as i32 - window.height as i32).max(0);
    Position::new(candidate.x.clamp(0, max_x), candidate.y.clamp(0, max_y))
}

fn in_dead_zone(controls: Rect, column: u16, row: u16) -> bool {
    if controls.width == 0 || controls.height == 0 {
        return false;
    }
    let zone = Rect {
        x: controls.x.saturating_sub(DEAD_ZONE_MARGIN),
        y: controls.y.saturating_sub(DEAD_ZONE_MARGIN),
        width: controls.width.saturating_add(DEAD_ZONE_MARGIN * 2),
        height: controls.height.saturating_add(DEAD_ZONE_MARGIN * 2),
    };
    rect_contains(zone, column, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: Rect = Rect {
        x: 10,
        y: 5,
        width: 30,
        height: 1,
    };
    const CONTROLS: Rect = Rect {
        x: 32,
        y: 5,
        width: 6,
        height: 1,
    };
    const VIEWPORT: Size = Size::new(100, 40);
    const WINDOW: Size = Size::new(30, 10);

    fn dragging_from(column: u16, row: u16, position: Position) -> DragController {
        let mut drag = DragController::new();
        let down = drag.pointer_down(column, row, HEADER, CONTROLS, position);
        assert!(down.drag_started);
        drag
    }

    #[test]
    fn drag_moves_by_pointer_delta() {
        let mut drag = dragging_from(12, 5, Position::new(10, 5));
        let pos = drag.pointer_move(20, 9, CONTROLS, VIEWPORT, WINDOW);
        assert_eq!(pos, Some(Position::new(18, 9)));
    }

    #[test]
    fn drag_clamps_to_viewport() {
        let mut drag = dragging_from(12, 5, Position::new(10, 5));
        assert_eq!(
            drag.pointer_move(0, 0, CONTROLS, VIEWPORT, WINDOW),
            Some(Position::new(0, 0))
        );
        assert_eq!(
            drag.pointer_move(200, 80, CONTROLS, VIEWPORT, WINDOW),
            Some(Position::new(70, 30))
        );
    }

    #[test]
    fn clamp_matches_closed_form_for_every_delta() {
        let start = Position::new(10, 5);
        for dx in -20..=90 {
            for dy in -10..=40 {
                let pos = clamp_position(
                    Position::new(start.x + dx, start.y + dy),
                    VIEWPORT,
                    WINDOW,
                );
                assert_eq!(pos.x, (start.x + dx).clamp(0, 70));
                assert_eq!(pos.y, (start.y + dy).clamp(0, 30));
            }
        }
    }

    #[test]
    fn oversized_window_pins_to_origin() {
        let pos = clamp_position(Position::new(5, 5), Size::new(10, 4), Size::new(20, 8));
        assert_eq!(pos, Position::new(0, 0));
    }

    #[test]
    fn press_in_dead_zone_focuses_without_dragging() {
        let mut drag = DragController::new();
        // one cell left of the controls, inside the inflated margin
        let down = drag.pointer_down(31, 5, HEADER, CONTROLS, Position::new(10, 5));
        assert!(down.focus);
        assert!(!down.drag_started);
        assert!(!drag.is_dragging());
    }

    #[test]
    fn press_outside_header_is_ignored() {
        let mut drag = DragController::new();
        let down = drag.pointer_down(12, 8, HEADER, CONTROLS, Position::new(10, 5));
        assert_eq!(down, PointerDown::default());
    }

    #[test]
    fn reentering_dead_zone_cancels_drag() {
        let mut drag = dragging_from(12, 5, Position::new(10, 5));
        assert!(drag.pointer_move(20, 5, CONTROLS, VIEWPORT, WINDOW).is_some());
        assert!(drag.pointer_move(33, 5, CONTROLS, VIEWPORT, WINDOW).is_none());
        assert_eq!(drag.state(), DragState::Idle);
        // further motion is ignored until the next press
        assert!(drag.pointer_move(20, 5, CONTROLS, VIEWPORT, WINDOW).is_none());
    }

    #[test]
    fn pointer_up_resets_state() {
        let mut drag = dragging_from(12, 5, Position::new(10, 5));
        assert!(drag.pointer_up());
        assert!(!drag.pointer_up());
        assert!(drag.pointer_move(20, 9, CONTROLS, VIEWPORT, WINDOW).is_none());
    }
}
