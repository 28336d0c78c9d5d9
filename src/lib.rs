pub mod auth;
pub mod component_context;
pub mod components;
pub mod config;
pub mod constants;
pub mod dock;
pub mod drivers;
pub mod event_loop;
pub mod favorites;
pub mod layout;
pub mod log_buffer;
pub mod origin;
pub mod runner;
pub mod shell;
pub mod state;
pub mod taskbar;
pub mod theme;
pub mod tracing_sub;
pub mod ui;
pub mod window;
