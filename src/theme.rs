use ratatui::style::Color;

// Centralized theme colors for the shell chrome and window frames.

pub const ACCENT_RGB: (u8, u8, u8) = (96, 165, 250);

pub fn accent() -> Color {
    Color::Rgb(ACCENT_RGB.0, ACCENT_RGB.1, ACCENT_RGB.2)
}

// Desktop behind the windows
pub fn desktop_bg() -> Color {
    Color::Black
}
pub fn desktop_fg() -> Color {
    Color::DarkGray
}

// Dock
pub fn dock_bg() -> Color {
    Color::DarkGray
}
pub fn dock_fg() -> Color {
    Color::White
}
pub fn dock_active_fg() -> Color {
    accent()
}
pub fn dock_info_fg() -> Color {
    Color::Gray
}

// Taskbar
pub fn taskbar_bg() -> Color {
    Color::DarkGray
}
pub fn taskbar_fg() -> Color {
    Color::White
}

// Status line
pub fn status_fg() -> Color {
    Color::Gray
}

// Decorator
pub fn decorator_header_bg() -> Color {
    Color::Blue
}
pub fn decorator_inactive_bg() -> Color {
    Color::DarkGray
}
pub fn decorator_header_fg() -> Color {
    Color::White
}
pub fn decorator_border() -> Color {
    Color::DarkGray
}

// Surface content
pub fn surface_inbound_fg() -> Color {
    Color::Yellow
}
pub fn surface_outbound_fg() -> Color {
    Color::Green
}
pub fn surface_error_fg() -> Color {
    Color::Red
}
