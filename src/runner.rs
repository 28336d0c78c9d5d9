use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyModifiers};

use crate::drivers::{InputDriver, OutputDriver};
use crate::event_loop::{ControlFlow, EventLoop};
use crate::shell::Shell;

fn is_quit(event: &Event) -> bool {
    matches!(
        event,
        Event::Key(key)
            if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL)
    )
}

fn captures_mouse(shell: &Shell) -> bool {
    let state = shell.state();
    state.mouse_capture_enabled() || state.selection_suppressed()
}

/// Push pending state changes to the terminal. While a drag is in progress
/// mouse capture is forced on so the terminal never starts a native text
/// selection under the pointer.
fn flush_driver_state<D: InputDriver>(shell: &mut Shell, driver: &mut D) -> io::Result<()> {
    let state = shell.state_mut();
    let capture = state.take_mouse_capture_change();
    let selection = state.take_selection_change();
    if capture.is_none() && selection.is_none() {
        return Ok(());
    }
    driver.set_mouse_capture(captures_mouse(shell))
}

/// Drive `shell` until the user quits: input events go to the shell, and
/// every loop iteration ticks the relay and redraws.
pub fn run_shell<D, O>(
    shell: &mut Shell,
    input: D,
    output: &mut O,
    poll_interval: Duration,
) -> io::Result<()>
where
    D: InputDriver,
    O: OutputDriver,
{
    output.enter()?;
    let mut event_loop = EventLoop::new(input, poll_interval);
    let result = event_loop
        .driver()
        .set_mouse_capture(shell.state().mouse_capture_enabled())
        .and_then(|()| {
            event_loop.run(|driver, event| {
                match event {
                    Some(evt) if is_quit(&evt) => return Ok(ControlFlow::Quit),
                    Some(Event::Mouse(_)) if !captures_mouse(shell) => {}
                    Some(evt) => {
                        shell.handle_event(&evt);
                    }
                    None => {
                        shell.tick();
                        output.draw(|mut frame| shell.render(&mut frame))?;
                    }
                }
                flush_driver_state(shell, driver)?;
                Ok(ControlFlow::Continue)
            })
        });
    let _ = event_loop.driver().set_mouse_capture(false);
    output.exit()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthToken, StaticTokenProvider};
    use crate::config::ShellConfig;
    use crate::dock::ExternalOpener;
    use crate::favorites::MemoryFavorites;
    use crate::ui::UiFrame;
    use crate::window::WindowId;
    use crossterm::event::{KeyEvent, MouseButton, MouseEvent, MouseEventKind};
    use ratatui::buffer::Buffer;
    use ratatui::layout::Rect;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Debug)]
    struct NoBrowser;

    impl ExternalOpener for NoBrowser {
        fn open(&self, _url: &str) -> io::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Scripted {
        events: VecDeque<Event>,
        capture: Vec<bool>,
    }

    impl InputDriver for Scripted {
        fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
            Ok(!self.events.is_empty())
        }

        fn read(&mut self) -> io::Result<Event> {
            self.events
                .pop_front()
                .ok_or_else(|| io::Error::other("script exhausted"))
        }

        fn set_mouse_capture(&mut self, enabled: bool) -> io::Result<()> {
            self.capture.push(enabled);
            Ok(())
        }
    }

    struct BufferOutput {
        buffer: Buffer,
        entered: bool,
        frames: usize,
    }

    impl BufferOutput {
        fn new(width: u16, height: u16) -> Self {
            Self {
                buffer: Buffer::empty(Rect::new(0, 0, width, height)),
                entered: false,
                frames: 0,
            }
        }
    }

    impl OutputDriver for BufferOutput {
        fn enter(&mut self) -> io::Result<()> {
            self.entered = true;
            Ok(())
        }

        fn exit(&mut self) -> io::Result<()> {
            self.entered = false;
            Ok(())
        }

        fn draw<F>(&mut self, f: F) -> io::Result<()>
        where
            F: FnOnce(UiFrame<'_>),
        {
            let area = self.buffer.area;
            f(UiFrame::from_parts(area, &mut self.buffer));
            self.frames += 1;
            Ok(())
        }
    }

    fn shell() -> Shell {
        let provider = Arc::new(StaticTokenProvider::new(Some(AuthToken::new("T", "U"))));
        Shell::new(
            ShellConfig::default(),
            provider,
            Box::new(MemoryFavorites::default()),
            Box::new(NoBrowser),
        )
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn ctrl_q() -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL))
    }

    #[test]
    fn quits_on_ctrl_q_and_restores_terminal() {
        let mut shell = shell();
        let mut input = Scripted {
            events: VecDeque::from(vec![ctrl_q()]),
            ..Default::default()
        };
        let mut output = BufferOutput::new(80, 24);
        run_shell(&mut shell, &mut input, &mut output, Duration::ZERO).unwrap();
        assert!(!output.entered);
        assert_eq!(output.frames, 1);
        assert_eq!(input.capture, vec![true, false]);
    }

    #[test]
    fn header_drag_keeps_capture_on_after_toggle() {
        let mut shell = shell();
        shell.open(&WindowId::new("bookmarks"));
        // bookmarks opens at the managed area's origin, header on row 1
        let mut input = Scripted {
            events: VecDeque::from(vec![
                mouse(MouseEventKind::Down(MouseButton::Left), 5, 1),
                Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)),
                mouse(MouseEventKind::Drag(MouseButton::Left), 9, 3),
                mouse(MouseEventKind::Up(MouseButton::Left), 9, 3),
                mouse(MouseEventKind::Down(MouseButton::Left), 9, 5),
                ctrl_q(),
            ]),
            ..Default::default()
        };
        let mut output = BufferOutput::new(100, 30);
        run_shell(&mut shell, &mut input, &mut output, Duration::ZERO).unwrap();
        // initial, drag start, toggle mid-drag, release, final teardown
        assert_eq!(input.capture, vec![true, true, true, false, false]);
        // the drag finished even though capture was switched off during it
        let record = shell.registry().get(&WindowId::new("bookmarks")).unwrap();
        assert_eq!(record.position, crate::window::Position::new(4, 2));
        // a body press after release starts no new drag
        assert!(!shell.state().selection_suppressed());
    }
}
