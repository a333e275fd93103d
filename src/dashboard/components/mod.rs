//! Reusable UI components for the dashboard

pub mod placeholder;
pub mod status_card;

pub use placeholder::{render_image_or_placeholder, PlaceholderStyle};
pub use status_card::{CardStatus, StatusCard};
