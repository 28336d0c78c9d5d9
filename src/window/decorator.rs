use ratatui::buffer::Buffer;
use ratatui::prelude::Rect;
use ratatui::style::{Modifier, Style};

use crate::layout::rect_contains;
use crate::ui::{safe_set_string, truncate_to_width};

/// What a press on the window header means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    OpenExternal,
    Minimize,
    Close,
    Drag,
    None,
}

const CONTROLS: [(&str, HeaderAction); 3] = [
    ("↗", HeaderAction::OpenExternal),
    ("_", HeaderAction::Minimize),
    ("x", HeaderAction::Close),
];

// Each control is drawn as " <glyph>", followed by one trailing pad cell.
const CONTROLS_WIDTH: u16 = CONTROLS.len() as u16 * 2 + 1;

pub trait WindowDecorator: std::fmt::Debug {
    /// Row the user grabs to move the window.
    fn header_rect(&self, rect: Rect) -> Rect;
    /// Bounding box of the header buttons.
    fn controls_rect(&self, rect: Rect) -> Rect;
    /// Area left for the embedded surface.
    fn content_rect(&self, rect: Rect) -> Rect;
    fn hit_test(&self, rect: Rect, column: u16, row: u16) -> HeaderAction;
    fn render_window(&self, buffer: &mut Buffer, rect: Rect, title: &str, focused: bool);
}

#[derive(Debug, Default)]
pub struct DefaultDecorator;

impl WindowDecorator for DefaultDecorator {
    fn header_rect(&self, rect: Rect) -> Rect {
        if rect.width == 0 || rect.height == 0 {
            return Rect::default();
        }
        Rect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: 1,
        }
    }

    fn controls_rect(&self, rect: Rect) -> Rect {
        let header = self.header_rect(rect);
        // Leave at least the corner cell and one title cell.
        if header.width < CONTROLS_WIDTH + 2 {
            return Rect::default();
        }
        Rect {
            x: header.x + header.width - CONTROLS_WIDTH,
            y: header.y,
            width: CONTROLS_WIDTH - 1,
            height: 1,
        }
    }

    fn content_rect(&self, rect: Rect) -> Rect {
        if rect.width < 3 || rect.height < 3 {
            return Rect::default();
        }
        Rect {
            x: rect.x + 1,
            y: rect.y + 1,
            width: rect.width - 2,
            height: rect.height - 2,
        }
    }

    fn hit_test(&self, rect: Rect, column: u16, row: u16) -> HeaderAction {
        let header = self.header_rect(rect);
        if !rect_contains(header, column, row) {
            return HeaderAction::None;
        }
        let controls = self.controls_rect(rect);
        if rect_contains(controls, column, row) {
            // glyphs sit on odd offsets: " ↗ _ x"
            let offset = column - controls.x;
            if offset % 2 == 1 {
                let idx = (offset / 2) as usize;
                if let Some((_, action)) = CONTROLS.get(idx) {
                    return *action;
                }
            }
            return HeaderAction::None;
        }
        HeaderAction::Drag
    }

    fn render_window(&self, buffer: &mut Buffer, rect: Rect, title: &str, focused: bool) {
        let bounds = rect.intersection(buffer.area);
        if bounds.width == 0 || bounds.height == 0 {
            return;
        }
        let header_style = if focused {
            Style::default()
                .bg(crate::theme::decorator_header_bg())
                .fg(crate::theme::decorator_header_fg())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .bg(crate::theme::decorator_inactive_bg())
                .fg(crate::theme::decorator_header_fg())
        };
        let border_style = Style::default().fg(crate::theme::decorator_border());

        // Header
        let header = self.header_rect(rect);
        for x in header.x..header.x.saturating_add(header.width) {
            if let Some(cell) = buffer.cell_mut((x, header.y)) {
                cell.reset();
                cell.set_symbol(" ");
                cell.set_style(header_style);
            }
        }
        let controls = self.controls_rect(rect);
        let title_room = if controls.width > 0 {
            controls.x.saturating_sub(header.x).saturating_sub(1)
        } else {
            header.width.saturating_sub(1)
        };
        let title = truncate_to_width(title, title_room as usize);
        safe_set_string(buffer, bounds, header.x + 1, header.y, &title, header_style);
        if controls.width > 0 {
            let glyphs: String = CONTROLS.iter().map(|(g, _)| format!(" {g}")).collect();
            safe_set_string(buffer, bounds, controls.x, controls.y, &glyphs, header_style);
        }

        // Body: borders around a cleared content area.
        let right = rect.x.saturating_add(rect.width).saturating_sub(1);
        let bottom = rect.y.saturating_add(rect.height).saturating_sub(1);
        for y in rect.y.saturating_add(1)..=bottom {
            for x in rect.x..=right {
                let Some(cell) = buffer.cell_mut((x, y)) else {
                    continue;
                };
                cell.reset();
                let symbol = match (x == rect.x, x == right, y == bottom) {
                    (true, _, true) => "└",
                    (_, true, true) => "┘",
                    (_, _, true) => "─",
                    (true, _, _) | (_, true, _) => "│",
                    _ => " ",
                };
                cell.set_symbol(symbol);
                cell.set_style(border_style);
            }
        }
    }
}
