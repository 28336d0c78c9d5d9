/// Shell-wide UI flags. Changes that must reach the terminal driver are
/// recorded as dirty and collected once per frame through the `take_*`
/// methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppState {
    mouse_capture_enabled: bool,
    mouse_capture_dirty: bool,
    selection_suppressed: bool,
    selection_dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mouse_capture_enabled: true,
            mouse_capture_dirty: false,
            selection_suppressed: false,
            selection_dirty: false,
        }
    }

    pub fn mouse_capture_enabled(&self) -> bool {
        self.mouse_capture_enabled
    }

    pub fn set_mouse_capture_enabled(&mut self, enabled: bool) {
        if self.mouse_capture_enabled == enabled {
            return;
        }
        self.mouse_capture_enabled = enabled;
        self.mouse_capture_dirty = true;
    }

    pub fn toggle_mouse_capture(&mut self) {
        let enabled = !self.mouse_capture_enabled;
        self.set_mouse_capture_enabled(enabled);
    }

    pub fn take_mouse_capture_change(&mut self) -> Option<bool> {
        if self.mouse_capture_dirty {
            self.mouse_capture_dirty = false;
            Some(self.mouse_capture_enabled)
        } else {
            None
        }
    }

    /// True while a window drag is in progress: text selection is off for
    /// the whole shell so the drag does not highlight content underneath.
    pub fn selection_suppressed(&self) -> bool {
        self.selection_suppressed
    }

    pub fn set_selection_suppressed(&mut self, suppressed: bool) {
        if self.selection_suppressed == suppressed {
            return;
        }
        self.selection_suppressed = suppressed;
        self.selection_dirty = true;
    }

    pub fn take_selection_change(&mut self) -> Option<bool> {
        if self.selection_dirty {
            self.selection_dirty = false;
            Some(self.selection_suppressed)
        } else {
            None
        }
    }
}
