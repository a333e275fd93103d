//! Dashboard UI Module
//!
//! Main window: the uploaded photo on the left, the cropped plate, its number
//! and the upload/save/exit actions on the right.

pub mod app;
pub mod components;
pub mod state;
pub mod theme;
pub mod views;

pub use app::run_dashboard;
