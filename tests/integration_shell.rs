use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use embed_wm::auth::{AuthToken, LogDirection, StaticTokenProvider};
use embed_wm::config::ShellConfig;
use embed_wm::dock::ExternalOpener;
use embed_wm::favorites::MemoryFavorites;
use embed_wm::shell::Shell;
use embed_wm::ui::UiFrame;
use embed_wm::window::{Position, WindowId};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

#[derive(Debug)]
struct NoBrowser;

impl ExternalOpener for NoBrowser {
    fn open(&self, _url: &str) -> std::io::Result<()> {
        Ok(())
    }
}

fn shell(token: Option<AuthToken>) -> Shell {
    Shell::new(
        ShellConfig::default(),
        Arc::new(StaticTokenProvider::new(token)),
        Box::new(MemoryFavorites::default()),
        Box::new(NoBrowser),
    )
}

fn draw(shell: &mut Shell, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    let mut ui = UiFrame::from_parts(area, &mut buf);
    shell.render(&mut ui);
    buf
}

fn press(kind: MouseEventKind, column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind,
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

#[test]
fn dragging_past_the_edges_keeps_the_frame_inside() {
    let mut shell = shell(None);
    let tasks = WindowId::new("tasks");
    shell.open(&tasks);
    draw(&mut shell, 100, 30);
    // managed area is rows 1..=28; tasks cascades to (4, 2)
    let (x, y) = (10, 3);
    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), x, y));
    shell.handle_event(&press(MouseEventKind::Drag(MouseButton::Left), 0, 0));
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(0, 0));

    shell.handle_event(&press(MouseEventKind::Drag(MouseButton::Left), 99, 29));
    // 100 - 56, 28 - 16
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(44, 12));
    shell.handle_event(&press(MouseEventKind::Up(MouseButton::Left), 99, 29));
    assert!(!shell.state().selection_suppressed());

    // further motion without a press does nothing
    shell.handle_event(&press(MouseEventKind::Moved, 20, 20));
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(44, 12));
}

#[test]
fn press_on_a_covered_window_goes_to_the_top_one() {
    let mut shell = shell(None);
    let bookmarks = WindowId::new("bookmarks");
    let tasks = WindowId::new("tasks");
    shell.open(&bookmarks);
    shell.open(&tasks);
    draw(&mut shell, 100, 30);
    // (6, 3) is on the tasks header, which covers bookmarks' body
    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), 6, 3));
    assert!(shell.surface(&tasks).unwrap().is_dragging());
    assert!(!shell.surface(&bookmarks).unwrap().is_dragging());
    shell.handle_event(&press(MouseEventKind::Up(MouseButton::Left), 6, 3));

    // a header press on the lower window raises it
    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), 1, 1));
    assert_eq!(shell.registry().focused().unwrap().id, bookmarks);
}

#[test]
fn opened_surface_is_signed_in_after_tick() {
    let mut shell = shell(Some(AuthToken::new("T", "U")));
    let identity = WindowId::new("identity");
    shell.open(&identity);
    let surface = shell.surface(&identity).unwrap();
    assert!(surface.endpoint().signed_in_uid().is_none());

    assert_eq!(shell.settle(Duration::from_secs(5)), 2);
    let endpoint = shell.surface(&identity).unwrap().endpoint().clone();
    assert_eq!(endpoint.signed_in_uid().as_deref(), Some("U"));
    let received = endpoint
        .log()
        .into_iter()
        .filter(|e| e.direction == LogDirection::Received)
        .count();
    assert_eq!(received, 2);

    // identity cascades to (8, 4): frame on row 5, origin on 6, status on 7
    let buf = draw(&mut shell, 100, 30);
    let body: String = (0..100).map(|x| buf[(x, 7)].symbol().to_string()).collect();
    assert!(body.contains("signed in as U"), "{body}");
}

#[test]
fn closing_mid_fetch_delivers_nothing() {
    let mut shell = shell(Some(AuthToken::new("T", "U")));
    let tasks = WindowId::new("tasks");
    shell.open(&tasks);
    shell.close(&tasks);
    assert_eq!(shell.relay().in_flight(), 0);
    assert_eq!(shell.settle(Duration::from_millis(50)), 0);
    assert!(shell.surface(&tasks).is_none());
}

#[test]
fn presses_after_a_drag_see_the_new_layout_before_any_redraw() {
    let mut shell = shell(None);
    let bookmarks = WindowId::new("bookmarks");
    let tasks = WindowId::new("tasks");
    shell.open(&bookmarks);
    shell.open(&tasks);
    draw(&mut shell, 100, 30);

    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), 10, 3));
    shell.handle_event(&press(MouseEventKind::Drag(MouseButton::Left), 50, 13));
    shell.handle_event(&press(MouseEventKind::Up(MouseButton::Left), 50, 13));
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(44, 12));

    // tasks' old header is now bookmarks' body: no drag starts
    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), 10, 3));
    assert!(!shell.state().selection_suppressed());
    shell.handle_event(&press(MouseEventKind::Drag(MouseButton::Left), 20, 6));
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(44, 12));
    shell.handle_event(&press(MouseEventKind::Up(MouseButton::Left), 20, 6));

    // tasks' new header grabs it
    shell.handle_event(&press(MouseEventKind::Down(MouseButton::Left), 50, 13));
    assert!(shell.state().selection_suppressed());
    shell.handle_event(&press(MouseEventKind::Drag(MouseButton::Left), 49, 12));
    assert_eq!(shell.registry().get(&tasks).unwrap().position, Position::new(43, 11));
}
