use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use crate::layout::rect_contains;
use crate::ui::{UiFrame, safe_set_string, truncate_to_width};
use crate::window::{AppKind, WindowId};

/// One minimized window as the taskbar draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskbarEntry {
    pub id: WindowId,
    pub kind: AppKind,
    pub title: String,
}

/// Bottom row listing minimized windows. It holds no window state of its
/// own: every frame it is handed the registry's current projection.
#[derive(Debug, Default)]
pub struct Taskbar {
    hits: Vec<(Rect, WindowId)>,
}

impl Taskbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw `entries` from the left and return the columns left free on
    /// the right for the status line.
    pub fn render(&mut self, frame: &mut UiFrame<'_>, area: Rect, entries: &[TaskbarEntry]) -> Rect {
        self.hits.clear();
        let style = Style::default()
            .bg(crate::theme::taskbar_bg())
            .fg(crate::theme::taskbar_fg());
        frame.fill(area, style);
        if area.width == 0 || area.height == 0 {
            return Rect::default();
        }
        let buffer = frame.buffer_mut();
        let bounds = area.intersection(buffer.area);
        let y = area.y;
        let max_x = area.x.saturating_add(area.width);
        let mut x = area.x;
        for entry in entries {
            let mut label = format!("{} {}", entry.kind.icon(), entry.title);
            let max_label = max_x.saturating_sub(x).saturating_sub(2) as usize;
            if max_label == 0 {
                break;
            }
            if label.chars().count() > max_label {
                label = truncate_to_width(&label, max_label);
            }
            let chunk = format!("[{label}]");
            let chunk_width = chunk.chars().count() as u16;
            safe_set_string(
                buffer,
                bounds,
                x,
                y,
                &chunk,
                style.add_modifier(Modifier::BOLD),
            );
            self.hits
                .push((Rect::new(x, y, chunk_width, 1), entry.id.clone()));
            x = x.saturating_add(chunk_width).saturating_add(1);
        }
        Rect {
            x: x.min(max_x),
            y,
            width: max_x.saturating_sub(x),
            height: area.height,
        }
    }

    /// Window whose entry was drawn under the pointer, if any.
    pub fn click(&self, column: u16, row: u16) -> Option<WindowId> {
        self.hits
            .iter()
            .find(|(rect, _)| rect_contains(*rect, column, row))
            .map(|(_, id)| id.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
