//! Image area that falls back to a text placeholder

use egui::{RichText, Rounding, Stroke, Vec2};
use crate::dashboard::theme::ThemeColors;

/// How the placeholder text is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Grey dashed box
    Neutral,
    /// Red box, used for "nothing found"
    Error,
}

/// Scale `texture` to fill `size` keeping its aspect ratio
pub fn fit_size(texture: Vec2, size: Vec2) -> Vec2 {
    if texture.x <= 0.0 || texture.y <= 0.0 {
        return Vec2::ZERO;
    }
    let scale = (size.x / texture.x).min(size.y / texture.y);
    texture * scale
}

/// Draw the texture in an area of `size`, or the placeholder message when there is none
pub fn render_image_or_placeholder(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    size: Vec2,
    message: &str,
    style: PlaceholderStyle,
) {
    let (fill, border, text_color) = match (texture, style) {
        (Some(_), _) => (ThemeColors::BG_PANEL, ThemeColors::BORDER_LIGHT, ThemeColors::TEXT_MUTED),
        (None, PlaceholderStyle::Neutral) => (
            ThemeColors::BG_PLACEHOLDER,
            ThemeColors::BORDER_DASHED,
            ThemeColors::TEXT_MUTED,
        ),
        (None, PlaceholderStyle::Error) => (
            ThemeColors::BG_PLACEHOLDER_ERROR,
            ThemeColors::ACCENT_ERROR,
            ThemeColors::ACCENT_ERROR_DARK,
        ),
    };

    egui::Frame::none()
        .fill(fill)
        .rounding(Rounding::same(8.0))
        .stroke(Stroke::new(1.0, border))
        .show(ui, |ui| {
            ui.set_min_size(size);
            ui.set_max_size(size);

            ui.centered_and_justified(|ui| match texture {
                Some(texture) => {
                    ui.image((texture.id(), fit_size(texture.size_vec2(), size)));
                }
                None => {
                    ui.label(RichText::new(message).size(14.0).color(text_color));
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let fitted = fit_size(Vec2::new(800.0, 400.0), Vec2::new(400.0, 400.0));
        assert_eq!(fitted, Vec2::new(400.0, 200.0));

        let fitted = fit_size(Vec2::new(100.0, 300.0), Vec2::new(400.0, 150.0));
        assert_eq!(fitted, Vec2::new(50.0, 150.0));
    }

    #[test]
    fn test_fit_enlarges_small_crops() {
        let fitted = fit_size(Vec2::new(40.0, 20.0), Vec2::new(400.0, 150.0));
        assert_eq!(fitted, Vec2::new(300.0, 150.0));
    }

    #[test]
    fn test_fit_empty_texture() {
        assert_eq!(fit_size(Vec2::ZERO, Vec2::new(10.0, 10.0)), Vec2::ZERO);
    }
}
