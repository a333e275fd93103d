//! Result view - cropped plate, recognized number and actions

use egui::{RichText, Rounding, Stroke};
use std::path::PathBuf;

use crate::dashboard::components::{
    render_image_or_placeholder, CardStatus, PlaceholderStyle, StatusCard,
};
use crate::dashboard::state::{DashboardState, RequestState};
use crate::dashboard::theme::{self, ThemeColors};

pub const WAITING: &str = "Waiting for detection...";
pub const DETECTING: &str = "Detecting...";
pub const RECOGNIZING: &str = "Recognizing...";
pub const NO_PLATE: &str = "No plate detected";
pub const NOT_RECOGNIZED: &str = "Could not recognize plate number";

const CROP_AREA_HEIGHT: f32 = 150.0;

/// What the user asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultAction {
    /// Open the file dialog
    Browse,
    Upload(PathBuf),
    Save,
    Exit,
}

/// Text of the crop area and how to draw it when there is no crop texture
pub fn crop_placeholder(request: &RequestState) -> (String, PlaceholderStyle) {
    match request {
        RequestState::Idle => (WAITING.to_string(), PlaceholderStyle::Neutral),
        RequestState::Processing { .. } => (DETECTING.to_string(), PlaceholderStyle::Neutral),
        RequestState::Displaying(_) => (NO_PLATE.to_string(), PlaceholderStyle::Error),
        RequestState::Failed(reason) => (reason.clone(), PlaceholderStyle::Error),
    }
}

/// Upload action for a typed path, if one was entered
pub fn typed_path_action(input: &str) -> Option<ResultAction> {
    let path = input.trim();
    if path.is_empty() {
        None
    } else {
        Some(ResultAction::Upload(PathBuf::from(path)))
    }
}

/// Text of the plate number box
pub fn plate_label(request: &RequestState) -> &str {
    match request {
        RequestState::Idle => "--",
        RequestState::Processing { .. } => RECOGNIZING,
        RequestState::Displaying(result) => match result.text.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => NOT_RECOGNIZED,
        },
        RequestState::Failed(_) => NOT_RECOGNIZED,
    }
}

/// Render the result panel, returning the action the user triggered, if any
pub fn render_result_view(
    ui: &mut egui::Ui,
    state: &mut DashboardState,
    store_available: bool,
) -> Option<ResultAction> {
    let mut action = None;

    theme::panel_frame().show(ui, |ui| {
        ui.vertical_centered(|ui| {
            ui.heading(
                RichText::new("Ship Plate Recognition Result")
                    .strong()
                    .color(ThemeColors::TEXT_PRIMARY),
            );
        });
        let line_y = ui.cursor().top();
        ui.painter().hline(
            ui.max_rect().x_range(),
            line_y,
            Stroke::new(2.0, ThemeColors::ACCENT_PRIMARY),
        );
        ui.add_space(12.0);

        render_result_frame(ui, state);

        ui.add_space(8.0);
        action = render_actions(ui, state, store_available);
    });

    action
}

fn render_result_frame(ui: &mut egui::Ui, state: &DashboardState) {
    egui::Frame::none()
        .fill(ThemeColors::BG_RESULT)
        .rounding(Rounding::same(10.0))
        .stroke(Stroke::new(1.0, ThemeColors::BORDER_LIGHT))
        .inner_margin(15.0)
        .show(ui, |ui| {
            ui.label(
                RichText::new("Detected plate region")
                    .size(18.0)
                    .strong()
                    .color(ThemeColors::ACCENT_PRIMARY),
            );

            let (message, style) = crop_placeholder(&state.request);
            let size = egui::vec2(ui.available_width(), CROP_AREA_HEIGHT);
            render_image_or_placeholder(ui, state.crop_texture.as_ref(), size, &message, style);

            ui.label(
                RichText::new("Recognition result")
                    .size(18.0)
                    .strong()
                    .color(ThemeColors::ACCENT_PRIMARY),
            );

            egui::Frame::none()
                .fill(ThemeColors::BG_PLATE_NUMBER)
                .rounding(Rounding::same(8.0))
                .inner_margin(15.0)
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new(plate_label(&state.request))
                                .size(28.0)
                                .strong()
                                .color(ThemeColors::TEXT_PRIMARY),
                        );
                    });
                });

            if let RequestState::Displaying(result) = &state.request {
                ui.horizontal(|ui| {
                    if let Some(confidence) = result.confidence {
                        StatusCard::new(
                            "Confidence",
                            format!("{:.1}%", confidence * 100.0),
                            CardStatus::for_confidence(confidence),
                        )
                        .show(ui);
                    }
                    StatusCard::new(
                        "Processing time",
                        format!("{} ms", result.processing_time_ms),
                        CardStatus::Neutral,
                    )
                    .show(ui);
                });
            }
        });
}

fn render_actions(
    ui: &mut egui::Ui,
    state: &mut DashboardState,
    store_available: bool,
) -> Option<ResultAction> {
    let mut action = None;
    let busy = state.request.is_processing();
    let button_size = egui::vec2(ui.available_width(), 48.0);

    let upload = ui.add_enabled(
        !busy,
        theme::action_button("Upload Image", ThemeColors::ACCENT_PRIMARY).min_size(button_size),
    );
    if upload.clicked() {
        action = Some(ResultAction::Browse);
    }

    let path_field = ui.add_enabled(
        !busy,
        egui::TextEdit::singleline(&mut state.path_input)
            .hint_text("Or type an image path and press Enter")
            .desired_width(f32::INFINITY),
    );
    if path_field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
        action = typed_path_action(&state.path_input);
    }

    let save_fill = if state.can_save() && store_available {
        ThemeColors::ACCENT_SUCCESS
    } else {
        ThemeColors::TEXT_DISABLED
    };
    let save = ui.add_enabled(
        state.can_save() && store_available,
        theme::action_button("Save to Database", save_fill).min_size(button_size),
    );
    if save.clicked() {
        action = Some(ResultAction::Save);
    }

    let exit = ui.add(
        theme::action_button("Exit", ThemeColors::ACCENT_ERROR).min_size(button_size),
    );
    if exit.clicked() {
        action = Some(ResultAction::Exit);
    }

    if !store_available {
        ui.label(
            RichText::new("Record store unavailable")
                .size(12.0)
                .color(ThemeColors::TEXT_SECONDARY),
        );
    }

    action
}
