//! One mounted window: frame decoration, header drag tracking and the
//! embedded surface's protocol endpoint.

use std::sync::Arc;

use ratatui::prelude::Rect;
use ratatui::style::{Modifier, Style};

use super::decorator::{DefaultDecorator, HeaderAction, WindowDecorator};
use super::drag::DragController;
use super::{Position, Size, WindowId};
use crate::auth::{HostInbox, LogDirection, MessagePort, SurfaceEndpoint};
use crate::origin::Origin;
use crate::ui::{UiFrame, safe_set_string};

/// What a pointer event on a surface asks the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceAction {
    Focus,
    Minimize,
    Close,
    OpenExternal,
    Moved(Position),
    DragStarted,
    DragEnded,
}

#[derive(Debug)]
pub struct WindowSurface {
    id: WindowId,
    drag: DragController,
    endpoint: SurfaceEndpoint,
    decorator: Box<dyn WindowDecorator>,
}

impl WindowSurface {
    pub fn new(id: WindowId, origin: Origin) -> Self {
        Self {
            id,
            drag: DragController::new(),
            endpoint: SurfaceEndpoint::new(origin),
            decorator: Box::new(DefaultDecorator),
        }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn endpoint(&self) -> &SurfaceEndpoint {
        &self.endpoint
    }

    /// Port the relay uses to reach this surface.
    pub fn port(&self) -> Arc<dyn MessagePort> {
        Arc::new(self.endpoint.clone())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Bring the embedded surface up. The page asks for the current identity
    /// as soon as it loads.
    pub fn mount(&mut self, inbox: &HostInbox) {
        self.endpoint.set_loaded(true);
        self.endpoint.request_auth(inbox);
    }

    /// Tear the surface down. Any drag in progress is abandoned.
    pub fn unmount(&mut self) -> bool {
        self.endpoint.set_loaded(false);
        self.drag.pointer_up()
    }

    pub fn request_auth(&self, inbox: &HostInbox) -> bool {
        self.endpoint.request_auth(inbox)
    }

    /// Press at `(column, row)` on a frame currently drawn at `frame`.
    pub fn pointer_down(
        &mut self,
        column: u16,
        row: u16,
        frame: Rect,
        position: Position,
    ) -> Vec<SurfaceAction> {
        let header = self.decorator.header_rect(frame);
        let controls = self.decorator.controls_rect(frame);
        let down = self
            .drag
            .pointer_down(column, row, header, controls, position);
        let mut actions = Vec::new();
        if down.focus {
            actions.push(SurfaceAction::Focus);
        }
        if down.drag_started {
            actions.push(SurfaceAction::DragStarted);
            return actions;
        }
        match self.decorator.hit_test(frame, column, row) {
            HeaderAction::OpenExternal => actions.push(SurfaceAction::OpenExternal),
            HeaderAction::Minimize => actions.push(SurfaceAction::Minimize),
            HeaderAction::Close => actions.push(SurfaceAction::Close),
            HeaderAction::Drag | HeaderAction::None => {}
        }
        actions
    }

    /// Pointer motion anywhere on screen while this surface may be dragging.
    pub fn pointer_move(
        &mut self,
        column: u16,
        row: u16,
        frame: Rect,
        viewport: Size,
        window: Size,
    ) -> Option<SurfaceAction> {
        if !self.drag.is_dragging() {
            return None;
        }
        let controls = self.decorator.controls_rect(frame);
        match self
            .drag
            .pointer_move(column, row, controls, viewport, window)
        {
            Some(position) => Some(SurfaceAction::Moved(position)),
            None => Some(SurfaceAction::DragEnded),
        }
    }

    pub fn pointer_up(&mut self) -> Option<SurfaceAction> {
        self.drag.pointer_up().then_some(SurfaceAction::DragEnded)
    }

    pub fn render(&self, frame: &mut UiFrame<'_>, rect: Rect, title: &str, focused: bool) {
        let bounds = rect.intersection(frame.area());
        if bounds.width == 0 || bounds.height == 0 {
            return;
        }
        self.decorator
            .render_window(frame.buffer_mut(), rect, title, focused);
        let content = self.decorator.content_rect(rect).intersection(bounds);
        if content.width == 0 || content.height == 0 {
            return;
        }
        self.render_content(frame, content);
    }

    fn render_content(&self, frame: &mut UiFrame<'_>, area: Rect) {
        let buffer = frame.buffer_mut();
        let dim = Style::default().add_modifier(Modifier::DIM);
        let log = self.endpoint.log();
        let answered = log.iter().any(|e| e.direction == LogDirection::Received);
        let status = match (self.endpoint.has_token(), self.endpoint.signed_in_uid()) {
            (true, Some(uid)) => format!("signed in as {uid}"),
            _ if !answered => "waiting for host".to_string(),
            _ => "signed out".to_string(),
        };
        let mut y = area.y;
        let bottom = area.y.saturating_add(area.height);
        safe_set_string(buffer, area, area.x, y, self.endpoint.origin().as_str(), dim);
        y = y.saturating_add(1);
        if y < bottom {
            let style = if self.endpoint.has_token() {
                Style::default().fg(crate::theme::surface_outbound_fg())
            } else {
                Style::default().fg(crate::theme::surface_error_fg())
            };
            safe_set_string(buffer, area, area.x, y, &status, style);
            y = y.saturating_add(1);
        }
        let rows = bottom.saturating_sub(y) as usize;
        if rows == 0 {
            return;
        }
        let skip = log.len().saturating_sub(rows);
        for entry in log.iter().skip(skip) {
            let (prefix, style) = match entry.direction {
                LogDirection::Sent => ("→ ", Style::default().fg(crate::theme::surface_outbound_fg())),
                LogDirection::Received => {
                    ("← ", Style::default().fg(crate::theme::surface_inbound_fg()))
                }
                LogDirection::Note => ("· ", dim),
            };
            let line = format!("{prefix}{}", entry.text);
            safe_set_string(buffer, area, area.x, y, &line, style);
            y = y.saturating_add(1);
        }
    }
}
