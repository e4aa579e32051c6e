//! owbc-tui - Terminal UI for the OpenWrt build console
//!
//! Ratatui-based rendering, event polling, and the event loop driving
//! the engine in owbc-app: `runner` owns terminal lifecycle and the
//! draw/update cycle, `event` translates terminal input into messages,
//! and `render` turns state into frames.

pub mod event;
pub mod layout;
pub mod popup;
pub mod render;
pub mod runner;

pub use render::view;
pub use runner::run;
