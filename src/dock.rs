use std::fmt;

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};

use crate::config::LauncherConfig;
use crate::layout::rect_contains;
use crate::ui::{UiFrame, safe_set_string, truncate_to_width};
use crate::window::WindowId;

/// Opens a URL outside the shell.
pub trait ExternalOpener: fmt::Debug {
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Hands URLs to the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl ExternalOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        webbrowser::open(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockAction {
    Open(WindowId),
    OpenExternal(String),
    ToggleFavorite(WindowId),
    /// Move a favorite to a new position in the dock.
    MoveFavorite(WindowId, usize),
}

#[derive(Debug, Clone)]
enum DockHit {
    Menu,
    Action(DockAction),
}

/// Launchers shown in the dock: every regular launcher in configured order,
/// then favorited ones in favorites order.
pub fn visible_launchers<'a>(
    launchers: &'a [LauncherConfig],
    favorites: &[WindowId],
) -> Vec<&'a LauncherConfig> {
    let mut visible: Vec<&LauncherConfig> =
        launchers.iter().filter(|l| !l.favoritable).collect();
    for fav in favorites {
        if let Some(launcher) = launchers
            .iter()
            .find(|l| l.favoritable && l.id == fav.as_str())
        {
            visible.push(launcher);
        }
    }
    visible
}

fn launcher_action(launcher: &LauncherConfig) -> DockAction {
    if launcher.external_only {
        DockAction::OpenExternal(launcher.url.clone())
    } else {
        DockAction::Open(launcher.window_id())
    }
}

/// Editing mode lists favorites first, in dock order, each but the first
/// with a "◂" button that moves it one place earlier; the remaining
/// favoritable launchers follow.
fn editing_items(
    launchers: &[LauncherConfig],
    favorites: &[WindowId],
    style: Style,
) -> Vec<(String, Style, DockAction)> {
    let favoritable: Vec<&LauncherConfig> =
        launchers.iter().filter(|l| l.favoritable).collect();
    let mut items = Vec::new();
    let mut index = 0;
    for fav in favorites {
        let Some(launcher) = favoritable.iter().find(|l| l.id == fav.as_str()) else {
            continue;
        };
        if index > 0 {
            items.push((
                " ◂".to_string(),
                style,
                DockAction::MoveFavorite(launcher.window_id(), index - 1),
            ));
        }
        items.push((
            format!(" ★ {} ", launcher.title),
            style,
            DockAction::ToggleFavorite(launcher.window_id()),
        ));
        index += 1;
    }
    for launcher in favoritable {
        if favorites.iter().any(|f| f.as_str() == launcher.id) {
            continue;
        }
        items.push((
            format!(" ☆ {} ", launcher.title),
            style,
            DockAction::ToggleFavorite(launcher.window_id()),
        ));
    }
    items
}

#[derive(Debug, Default)]
pub struct Dock {
    hits: Vec<(Rect, DockHit)>,
    editing: bool,
    hostname: Option<String>,
}

impl Dock {
    pub fn new() -> Self {
        Self::default()
    }

    /// In editing mode the dock lists every favoritable launcher; clicks
    /// toggle or reorder favorites instead of launching.
    pub fn editing(&self) -> bool {
        self.editing
    }

    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
    }

    fn hostname(&mut self) -> String {
        if let Some(ref h) = self.hostname {
            return h.clone();
        }
        let h = hostname::get()
            .ok()
            .and_then(|s| s.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        self.hostname = Some(h.clone());
        h
    }

    pub fn render(
        &mut self,
        frame: &mut UiFrame<'_>,
        area: Rect,
        launchers: &[LauncherConfig],
        favorites: &[WindowId],
        focused: Option<&WindowId>,
    ) {
        self.hits.clear();
        let bg = Style::default()
            .bg(crate::theme::dock_bg())
            .fg(crate::theme::dock_fg());
        frame.fill(area, bg);
        if area.width == 0 || area.height == 0 {
            return;
        }
        let host = self.hostname();
        let buffer = frame.buffer_mut();
        let bounds = area.intersection(buffer.area);
        if bounds.width == 0 || bounds.height == 0 {
            return;
        }
        let y = area.y;
        let max_x = area.x.saturating_add(area.width);
        let mut x = area.x;

        const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
        let menu = format!("≡ {CRATE_NAME} ");
        let menu_width = menu.chars().count() as u16;
        if x.saturating_add(menu_width) <= max_x {
            let menu_style = if self.editing {
                bg.fg(crate::theme::dock_active_fg())
                    .add_modifier(Modifier::BOLD)
            } else {
                bg
            };
            safe_set_string(buffer, bounds, x, y, &menu, menu_style);
            self.hits.push((Rect::new(x, y, menu_width, 1), DockHit::Menu));
            x = x.saturating_add(menu_width);
        }

        let items: Vec<(String, Style, DockAction)> = if self.editing {
            editing_items(launchers, favorites, bg)
        } else {
            let mut separated = false;
            visible_launchers(launchers, favorites)
                .into_iter()
                .map(|l| {
                    let active = focused.is_some_and(|f| f.as_str() == l.id);
                    let style = if active {
                        bg.fg(crate::theme::dock_active_fg())
                            .add_modifier(Modifier::BOLD)
                    } else {
                        bg
                    };
                    let lead = if l.favoritable && !separated {
                        separated = true;
                        "│"
                    } else {
                        " "
                    };
                    let ext = if l.external_only { " ↗" } else { "" };
                    (
                        format!("{lead}{} {}{ext} ", l.kind.icon(), l.title),
                        style,
                        launcher_action(l),
                    )
                })
                .collect()
        };

        for (label, style, action) in items {
            let room = max_x.saturating_sub(x) as usize;
            if room == 0 {
                break;
            }
            let label = truncate_to_width(&label, room);
            let width = label.chars().count() as u16;
            safe_set_string(buffer, bounds, x, y, &label, style);
            self.hits
                .push((Rect::new(x, y, width, 1), DockHit::Action(action)));
            x = x.saturating_add(width);
        }

        let info = format!(" {host} ");
        let info_width = info.chars().count() as u16;
        if x.saturating_add(info_width) < max_x {
            let info_style = bg.fg(crate::theme::dock_info_fg());
            safe_set_string(buffer, bounds, max_x - info_width, y, &info, info_style);
        }
    }

    /// Resolve a click against the last rendered frame.
    pub fn click(&mut self, column: u16, row: u16) -> Option<DockAction> {
        let hit = self
            .hits
            .iter()
            .find(|(rect, _)| rect_contains(*rect, column, row))
            .map(|(_, hit)| hit.clone())?;
        match hit {
            DockHit::Menu => {
                self.editing = !self.editing;
                None
            }
            DockHit::Action(action) => Some(action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use ratatui::buffer::Buffer;

    fn row_text(buf: &Buffer, width: u16) -> String {
        (0..width).map(|x| buf[(x, 0)].symbol().to_string()).collect()
    }

    fn render(dock: &mut Dock, favorites: &[WindowId], focused: Option<&WindowId>) -> Buffer {
        let config = ShellConfig::default();
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        let mut ui = UiFrame::from_parts(area, &mut buf);
        dock.render(&mut ui, area, &config.launchers, favorites, focused);
        buf
    }

    fn column_of(buf: &Buffer, needle: &str) -> u16 {
        let text = row_text(buf, 100);
        let byte = text.find(needle).unwrap();
        text[..byte].chars().count() as u16
    }

    #[test]
    fn favoritable_launchers_need_a_favorite() {
        let config = ShellConfig::default();
        let ids: Vec<&str> = visible_launchers(&config.launchers, &[])
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["bookmarks", "tasks"]);
        let ids: Vec<&str> = visible_launchers(&config.launchers, &[WindowId::new("identity")])
            .iter()
            .map(|l| l.id.as_str())
            .collect();
        assert_eq!(ids, vec!["bookmarks", "tasks", "identity"]);
    }

    #[test]
    fn click_on_launcher_opens_it() {
        let mut dock = Dock::new();
        let buf = render(&mut dock, &[], None);
        let x = column_of(&buf, "Tâches");
        assert_eq!(dock.click(x, 0), Some(DockAction::Open(WindowId::new("tasks"))));
        assert_eq!(dock.click(99, 5), None);
    }

    #[test]
    fn external_only_launcher_opens_url() {
        let mut config = ShellConfig::default();
        config.launchers[0].external_only = true;
        let mut dock = Dock::new();
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        let mut ui = UiFrame::from_parts(area, &mut buf);
        dock.render(&mut ui, area, &config.launchers, &[], None);
        let x = column_of(&buf, "Signets");
        assert_eq!(
            dock.click(x, 0),
            Some(DockAction::OpenExternal("https://signets.netlify.app".into()))
        );
    }

    #[test]
    fn focused_launcher_is_highlighted() {
        let mut dock = Dock::new();
        let focused = WindowId::new("bookmarks");
        let buf = render(&mut dock, &[], Some(&focused));
        let x = column_of(&buf, "Signets");
        assert_eq!(buf[(x, 0)].fg, crate::theme::dock_active_fg());
        let y = column_of(&buf, "Tâches");
        assert_ne!(buf[(y, 0)].fg, crate::theme::dock_active_fg());
    }

    #[test]
    fn menu_toggles_favorite_editing() {
        let mut dock = Dock::new();
        render(&mut dock, &[], None);
        assert_eq!(dock.click(0, 0), None);
        assert!(dock.editing());
        let buf = render(&mut dock, &[], None);
        let text = row_text(&buf, 100);
        assert!(text.contains("☆ Générateur d'identité"));
        assert!(!text.contains("Tâches"));
        let x = column_of(&buf, "Générateur");
        assert_eq!(
            dock.click(x, 0),
            Some(DockAction::ToggleFavorite(WindowId::new("identity")))
        );
    }

    #[test]
    fn editing_lists_favorites_in_order_with_move_buttons() {
        let mut config = ShellConfig::default();
        config.launchers[1].favoritable = true;
        let favorites = [WindowId::new("identity"), WindowId::new("tasks")];
        let mut dock = Dock::new();
        dock.set_editing(true);
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        let mut ui = UiFrame::from_parts(area, &mut buf);
        dock.render(&mut ui, area, &config.launchers, &favorites, None);

        let text = row_text(&buf, 100);
        let identity = text.find("★ Générateur").unwrap();
        let tasks = text.find("★ Tâches").unwrap();
        assert!(identity < tasks);
        assert_eq!(text.matches('◂').count(), 1);
        let x = column_of(&buf, "◂");
        assert_eq!(
            dock.click(x, 0),
            Some(DockAction::MoveFavorite(WindowId::new("tasks"), 0))
        );
    }
}
