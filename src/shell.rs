//! The desktop shell: owns the window registry, the mounted surfaces, the
//! single auth relay and the chrome around them.
//!
//! Every input event is applied to the registry first; [`Shell::sync`] then
//! reconciles mounted surfaces and relay attachments with the registry's
//! lifecycle events, so the registry stays the one source of truth.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use ratatui::style::Style;

use crate::auth::{AuthRelay, HostInbox, MessageEvent, TokenProvider};
use crate::components::{Component, ComponentContext, StatusBar};
use crate::config::ShellConfig;
use crate::constants::{CASCADE_STEP_X, CASCADE_STEP_Y};
use crate::dock::{Dock, DockAction, ExternalOpener, visible_launchers};
use crate::favorites::Favorites;
use crate::layout::{RegionMap, ShellAreas, rect_contains, split_shell};
use crate::log_buffer::LogHandle;
use crate::state::AppState;
use crate::taskbar::{Taskbar, TaskbarEntry};
use crate::ui::{UiFrame, safe_set_string};
use crate::window::drag::clamp_position;
use crate::window::{
    Position, RegistryEvent, RegistryPolicy, Size, SurfaceAction, WindowId, WindowRecord,
    WindowRegistry, WindowSurface, frame_rect,
};

const DOCK_HEIGHT: u16 = 1;
const KEY_HINTS: &str = "1-9 launch · tab cycle · m min · w close · r auth · o browser · f favs · c mouse · ^Q quit";

#[derive(Debug)]
pub struct Shell {
    config: ShellConfig,
    registry: WindowRegistry,
    surfaces: BTreeMap<WindowId, WindowSurface>,
    relay: AuthRelay,
    inbox: HostInbox,
    inbox_rx: Receiver<MessageEvent>,
    dock: Dock,
    taskbar: Taskbar,
    status: StatusBar,
    favorites: Box<dyn Favorites>,
    opener: Box<dyn ExternalOpener>,
    state: AppState,
    areas: ShellAreas,
    frames: RegionMap<WindowId>,
    log: Option<LogHandle>,
}

impl Shell {
    pub fn new(
        config: ShellConfig,
        provider: Arc<dyn TokenProvider>,
        favorites: Box<dyn Favorites>,
        opener: Box<dyn ExternalOpener>,
    ) -> Self {
        let mut registry = WindowRegistry::new(RegistryPolicy {
            exclusive_focus: config.shell.exclusive_focus,
        });
        let embedded = config.launchers.iter().filter(|l| !l.external_only);
        for (index, launcher) in embedded.enumerate() {
            let origin = match launcher.origin() {
                Ok(origin) => origin,
                Err(err) => {
                    tracing::warn!(id = %launcher.id, error = %err, "skipping launcher with bad url");
                    continue;
                }
            };
            let step = index as i32;
            let record = WindowRecord::new(
                launcher.window_id(),
                launcher.kind,
                launcher.title.clone(),
                launcher.url.clone(),
                origin,
            )
            .with_geometry(
                Position::new(step * CASCADE_STEP_X, step * CASCADE_STEP_Y),
                launcher.window_size(&config.shell),
            );
            registry.register(record);
        }
        let relay = AuthRelay::new(config.auth.allow_list(), provider);
        let (inbox, inbox_rx) = HostInbox::channel();
        let mut status = StatusBar::new();
        status.set_style(
            Style::default()
                .bg(crate::theme::taskbar_bg())
                .fg(crate::theme::status_fg()),
        );
        Self {
            config,
            registry,
            surfaces: BTreeMap::new(),
            relay,
            inbox,
            inbox_rx,
            dock: Dock::new(),
            taskbar: Taskbar::new(),
            status,
            favorites,
            opener,
            state: AppState::new(),
            areas: ShellAreas::default(),
            frames: RegionMap::default(),
            log: None,
        }
    }

    /// Show the latest line of `log` in the status bar.
    pub fn with_log(mut self, log: LogHandle) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    pub fn relay(&self) -> &AuthRelay {
        &self.relay
    }

    pub fn surface(&self, id: &WindowId) -> Option<&WindowSurface> {
        self.surfaces.get(id)
    }

    pub fn favorites(&self) -> Vec<WindowId> {
        self.favorites.list()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn areas(&self) -> ShellAreas {
        self.areas
    }

    /// Handle on the shared listener, for anything that wants to post to
    /// the host the way an embedded surface does.
    pub fn inbox(&self) -> HostInbox {
        self.inbox.clone()
    }

    /// Lay the chrome out for a screen of `area`, pulling open windows back
    /// inside the managed area if it shrank.
    pub fn set_area(&mut self, area: Rect) {
        self.areas = split_shell(area, DOCK_HEIGHT);
        let viewport = Size::from(self.areas.managed);
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }
        let moves: Vec<(WindowId, Position)> = self
            .registry
            .records()
            .filter(|r| r.is_open())
            .map(|r| (r.id.clone(), clamp_position(r.position, viewport, r.size)))
            .collect();
        for (id, position) in moves {
            self.registry.move_to(&id, position);
        }
        self.refresh_frames();
    }

    // Registry operations. Each one is followed by a sync.

    pub fn open(&mut self, id: &WindowId) {
        if let Some(launcher) = self.config.launcher(id)
            && launcher.external_only
        {
            let url = launcher.url.clone();
            self.open_external(&url);
            return;
        }
        self.registry.open(id);
        self.sync();
    }

    pub fn close(&mut self, id: &WindowId) {
        self.registry.close(id);
        self.sync();
    }

    pub fn minimize(&mut self, id: &WindowId) {
        self.registry.minimize(id);
        self.sync();
    }

    pub fn restore(&mut self, id: &WindowId) {
        self.registry.restore(id);
        self.sync();
    }

    pub fn focus(&mut self, id: &WindowId) {
        self.registry.focus(id);
        self.sync();
    }

    fn open_external(&self, url: &str) {
        match self.opener.open(url) {
            Ok(()) => tracing::info!(%url, "opened in browser"),
            Err(err) => tracing::warn!(%url, error = %err, "could not open browser"),
        }
    }

    fn toggle_favorite(&mut self, id: &WindowId) {
        match self.favorites.toggle(id) {
            Ok(favorite) => tracing::info!(id = %id, favorite, "favorites changed"),
            Err(err) => tracing::warn!(error = %err, "could not update favorites"),
        }
    }

    /// Mount surfaces for newly opened windows, unmount closed ones, and
    /// drop drags on windows that are no longer visible.
    pub fn sync(&mut self) {
        for event in self.registry.take_events() {
            match event {
                RegistryEvent::Opened(id) => self.mount(&id),
                RegistryEvent::Closed(id) => self.unmount(&id),
            }
        }
        for (id, surface) in self.surfaces.iter_mut() {
            let visible = self.registry.get(id).is_some_and(WindowRecord::is_visible);
            if !visible && surface.pointer_up().is_some() {
                tracing::debug!(window_id = %id, "drag abandoned");
            }
        }
        let dragging = self.surfaces.values().any(WindowSurface::is_dragging);
        self.state.set_selection_suppressed(dragging);
        self.refresh_frames();
    }

    /// Rebuild hit-test frames from the registry so pointer input sees
    /// windows where they are now, not where they were last drawn.
    fn refresh_frames(&mut self) {
        self.frames.clear();
        let managed = self.areas.managed;
        for record in self.registry.visible() {
            if let Some(rect) = frame_rect(managed, record.position, record.size) {
                self.frames.set(record.id.clone(), rect);
            }
        }
    }

    fn mount(&mut self, id: &WindowId) {
        let Some(record) = self.registry.get(id) else {
            return;
        };
        let origin = record.remote_origin.clone();
        let viewport = Size::from(self.areas.managed);
        if viewport.width > 0 && viewport.height > 0 {
            let position = clamp_position(record.position, viewport, record.size);
            self.registry.move_to(id, position);
        }
        let mut surface = WindowSurface::new(id.clone(), origin.clone());
        self.relay.attach(id.clone(), origin);
        surface.mount(&self.inbox);
        self.relay.surface_loaded(id, surface.port());
        self.surfaces.insert(id.clone(), surface);
    }

    fn unmount(&mut self, id: &WindowId) {
        if let Some(mut surface) = self.surfaces.remove(id) {
            surface.unmount();
        }
        self.relay.detach(id);
    }

    /// Per-frame housekeeping: route inbound messages through the relay and
    /// deliver finished token fetches. Returns how many messages went out.
    pub fn tick(&mut self) -> usize {
        self.drain_inbox();
        self.relay.pump()
    }

    /// Like [`tick`](Self::tick) but waits up to `timeout` for in-flight
    /// fetches.
    pub fn settle(&mut self, timeout: Duration) -> usize {
        self.drain_inbox();
        self.relay.pump_blocking(timeout)
    }

    fn drain_inbox(&mut self) {
        while let Ok(event) = self.inbox_rx.try_recv() {
            let origin = event.origin.clone();
            let disposition = self.relay.handle_message(event);
            tracing::trace!(%origin, ?disposition, "inbound message");
        }
    }

    /// Apply one input event. Returns whether the shell used it.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let handled = match event {
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            Event::Key(key) => self.handle_key(*key),
            Event::Resize(width, height) => {
                self.set_area(Rect::new(0, 0, *width, *height));
                true
            }
            _ => false,
        };
        self.sync();
        handled
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if rect_contains(self.areas.dock, column, row) {
                    if let Some(action) = self.dock.click(column, row) {
                        self.apply_dock_action(action);
                    }
                    return true;
                }
                if rect_contains(self.areas.taskbar, column, row) {
                    if let Some(id) = self.taskbar.click(column, row) {
                        self.registry.restore(&id);
                    }
                    return true;
                }
                self.pointer_down(column, row)
            }
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                self.pointer_move(column, row)
            }
            MouseEventKind::Up(MouseButton::Left) => self.pointer_up(),
            _ => false,
        }
    }

    fn apply_dock_action(&mut self, action: DockAction) {
        match action {
            DockAction::Open(id) => self.registry.open(&id),
            DockAction::OpenExternal(url) => self.open_external(&url),
            DockAction::ToggleFavorite(id) => self.toggle_favorite(&id),
            DockAction::MoveFavorite(id, index) => match self.favorites.move_to(&id, index) {
                Ok(moved) => tracing::info!(id = %id, index, moved, "favorite reordered"),
                Err(err) => tracing::warn!(error = %err, "could not reorder favorites"),
            },
        }
    }

    fn pointer_down(&mut self, column: u16, row: u16) -> bool {
        self.refresh_frames();
        let order: Vec<WindowId> = self
            .registry
            .visible()
            .iter()
            .rev()
            .map(|r| r.id.clone())
            .collect();
        let Some(id) = self.frames.hit_test(column, row, &order).cloned() else {
            return false;
        };
        let (Some(frame), Some(record)) = (self.frames.get(&id), self.registry.get(&id)) else {
            return false;
        };
        let position = record.position;
        let Some(surface) = self.surfaces.get_mut(&id) else {
            return false;
        };
        let actions = surface.pointer_down(column, row, frame, position);
        for action in actions {
            self.apply_surface_action(&id, action);
        }
        true
    }

    fn pointer_move(&mut self, column: u16, row: u16) -> bool {
        let Some(id) = self
            .surfaces
            .iter()
            .find(|(_, s)| s.is_dragging())
            .map(|(id, _)| id.clone())
        else {
            return false;
        };
        let Some(record) = self.registry.get(&id) else {
            return false;
        };
        let window = record.size;
        let viewport = Size::from(self.areas.managed);
        let frame = frame_rect(self.areas.managed, record.position, window).unwrap_or_default();
        let action = self
            .surfaces
            .get_mut(&id)
            .and_then(|s| s.pointer_move(column, row, frame, viewport, window));
        if let Some(action) = action {
            self.apply_surface_action(&id, action);
        }
        true
    }

    fn pointer_up(&mut self) -> bool {
        let mut ended = false;
        for surface in self.surfaces.values_mut() {
            ended |= surface.pointer_up().is_some();
        }
        ended
    }

    fn apply_surface_action(&mut self, id: &WindowId, action: SurfaceAction) {
        match action {
            SurfaceAction::Focus => self.registry.focus(id),
            SurfaceAction::Minimize => self.registry.minimize(id),
            SurfaceAction::Close => self.registry.close(id),
            SurfaceAction::OpenExternal => {
                if let Some(url) = self.registry.get(id).map(|r| r.remote_url.clone()) {
                    self.open_external(&url);
                }
            }
            SurfaceAction::Moved(position) => self.registry.move_to(id, position),
            SurfaceAction::DragStarted => tracing::trace!(window_id = %id, "drag started"),
            SurfaceAction::DragEnded => tracing::trace!(window_id = %id, "drag ended"),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if !key.modifiers.difference(KeyModifiers::SHIFT).is_empty() {
            return false;
        }
        let focused = self.registry.focused().map(|r| r.id.clone());
        match key.code {
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                let favorites = self.favorites.list();
                let target = visible_launchers(&self.config.launchers, &favorites)
                    .get(index)
                    .map(|l| l.window_id());
                match target {
                    Some(id) => self.open(&id),
                    None => return false,
                }
            }
            KeyCode::Char('f') => {
                let editing = self.dock.editing();
                self.dock.set_editing(!editing);
            }
            KeyCode::Char('c') => self.state.toggle_mouse_capture(),
            KeyCode::Char(c @ ('m' | 'w' | 'r' | 'o')) => {
                let Some(id) = focused else {
                    return false;
                };
                match c {
                    'm' => self.registry.minimize(&id),
                    'w' => self.registry.close(&id),
                    'r' => {
                        if let Some(surface) = self.surfaces.get(&id) {
                            surface.request_auth(&self.inbox);
                        }
                    }
                    _ => self.apply_surface_action(&id, SurfaceAction::OpenExternal),
                }
            }
            _ => return false,
        }
        true
    }

    /// Raise the bottom-most visible window; repeated presses walk the
    /// whole stack.
    fn cycle_focus(&mut self) {
        let bottom = self.registry.visible().first().map(|r| r.id.clone());
        if let Some(id) = bottom {
            self.registry.focus(&id);
        }
    }

    pub fn render(&mut self, frame: &mut UiFrame<'_>) {
        let area = frame.area();
        if split_shell(area, DOCK_HEIGHT) != self.areas {
            self.set_area(area);
        }
        let managed = self.areas.managed;
        let desktop = Style::default()
            .bg(crate::theme::desktop_bg())
            .fg(crate::theme::desktop_fg());
        frame.fill(managed, desktop);

        self.refresh_frames();
        let focused = self.registry.focused().map(|r| r.id.clone());
        let visible = self.registry.visible();
        if visible.is_empty() && managed.height > 0 {
            let hint = "click a launcher or press 1-9";
            let x = managed.x + managed.width.saturating_sub(hint.len() as u16) / 2;
            let y = managed.y + managed.height / 2;
            safe_set_string(frame.buffer_mut(), managed, x, y, hint, desktop);
        }
        for record in visible {
            let Some(rect) = self.frames.get(&record.id) else {
                continue;
            };
            if let Some(surface) = self.surfaces.get(&record.id) {
                let is_focused = focused.as_ref() == Some(&record.id);
                surface.render(frame, rect, &record.title, is_focused);
            }
        }

        let favorites = self.favorites.list();
        self.dock.render(
            frame,
            self.areas.dock,
            &self.config.launchers,
            &favorites,
            focused.as_ref(),
        );

        let entries: Vec<TaskbarEntry> = self
            .registry
            .minimized()
            .into_iter()
            .map(|r| TaskbarEntry {
                id: r.id.clone(),
                kind: r.kind,
                title: r.title.clone(),
            })
            .collect();
        let rest = self.taskbar.render(frame, self.areas.taskbar, &entries);

        let message = self
            .log
            .as_ref()
            .and_then(LogHandle::last_line)
            .unwrap_or_default();
        self.status.set_left(format!(" {message}"));
        let hint = if self.state.selection_suppressed() {
            "dragging"
        } else if !self.state.mouse_capture_enabled() {
            "mouse off · c to capture"
        } else {
            KEY_HINTS
        };
        self.status.set_right(format!("{hint} "));
        self.status.render(frame, rest, &ComponentContext::new(false));
    }
}
