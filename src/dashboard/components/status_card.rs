//! Status card component for the small figures under a recognition result

use egui::{Color32, RichText, Rounding, Stroke, Vec2};
use crate::dashboard::theme::ThemeColors;

/// A card with a title, a value and a colored status dot
pub struct StatusCard {
    pub title: String,
    pub value: String,
    pub status: CardStatus,
}

/// Status types for cards
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardStatus {
    Good,
    Neutral,
    Warning,
    Error,
}

impl CardStatus {
    /// Status for a recognition confidence in [0, 1]
    pub fn for_confidence(confidence: f32) -> Self {
        if confidence >= 0.9 {
            CardStatus::Good
        } else if confidence >= 0.7 {
            CardStatus::Warning
        } else {
            CardStatus::Error
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            CardStatus::Good => ThemeColors::ACCENT_SUCCESS,
            CardStatus::Neutral => ThemeColors::TEXT_MUTED,
            CardStatus::Warning => ThemeColors::ACCENT_WARNING,
            CardStatus::Error => ThemeColors::ACCENT_ERROR,
        }
    }
}

impl StatusCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>, status: CardStatus) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            status,
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(ThemeColors::BG_RESULT)
            .rounding(Rounding::same(8.0))
            .stroke(Stroke::new(1.0, ThemeColors::BORDER_LIGHT))
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_min_width(150.0);

                ui.horizontal(|ui| {
                    let dot_rect = egui::Rect::from_center_size(
                        ui.cursor().left_top() + Vec2::new(6.0, 10.0),
                        Vec2::splat(8.0),
                    );
                    ui.painter().circle_filled(dot_rect.center(), 4.0, self.status.color());
                    ui.add_space(16.0);

                    ui.vertical(|ui| {
                        ui.label(
                            RichText::new(&self.title)
                                .size(12.0)
                                .color(ThemeColors::TEXT_MUTED)
                        );

                        ui.add_space(2.0);

                        ui.label(
                            RichText::new(&self.value)
                                .size(18.0)
                                .color(ThemeColors::TEXT_PRIMARY)
                                .strong()
                        );
                    });
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        assert_eq!(CardStatus::for_confidence(0.95), CardStatus::Good);
        assert_eq!(CardStatus::for_confidence(0.9), CardStatus::Good);
        assert_eq!(CardStatus::for_confidence(0.75), CardStatus::Warning);
        assert_eq!(CardStatus::for_confidence(0.5), CardStatus::Error);
    }
}
