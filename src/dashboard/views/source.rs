//! Source view - the uploaded photo

use crate::dashboard::components::{render_image_or_placeholder, PlaceholderStyle};
use crate::dashboard::state::{DashboardState, RequestState};
use crate::dashboard::theme;

pub const UPLOAD_PROMPT: &str = "Upload an image containing a ship plate";
pub const LOAD_FAILED: &str = "Could not load image";

/// Render the uploaded image filling the panel
pub fn render_source_view(ui: &mut egui::Ui, state: &DashboardState) {
    theme::panel_frame().show(ui, |ui| {
        let size = ui.available_size();

        let (message, style) = match (&state.request, &state.source_texture) {
            (RequestState::Failed(_), None) => (LOAD_FAILED, PlaceholderStyle::Error),
            _ => (UPLOAD_PROMPT, PlaceholderStyle::Neutral),
        };

        render_image_or_placeholder(ui, state.source_texture.as_ref(), size, message, style);
    });
}
