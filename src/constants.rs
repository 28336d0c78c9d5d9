//! Shared crate-wide constants.

/// Stacking layer of the static shell chrome (dock and taskbar).
///
/// The registry's z counter starts here, so the first window opened in a
/// session is assigned `Z_FLOOR + 1` and always draws above the chrome.
pub const Z_FLOOR: u32 = 50;

/// Margin (in cells) by which the header controls' bounding box is inflated
/// in every direction to form the drag dead zone.
pub const DEAD_ZONE_MARGIN: u16 = 1;

/// Default frame size for a newly launched window, in terminal cells.
pub const DEFAULT_WINDOW_WIDTH: u16 = 56;
pub const DEFAULT_WINDOW_HEIGHT: u16 = 16;

/// Offset applied per launcher index so new windows cascade instead of
/// stacking exactly on top of each other.
pub const CASCADE_STEP_X: i32 = 4;
pub const CASCADE_STEP_Y: i32 = 2;

/// Maximum number of protocol lines a surface keeps for its content view.
pub const SURFACE_LOG_LINES: usize = 200;
