//! Ratatui front-end: application state, key handling and drawing.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
