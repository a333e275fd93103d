//! Dashboard theme and styling
//!
//! Light blue-grey theme for the recognition window.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Light color palette
pub struct ThemeColors;

impl ThemeColors {
    // Background colors
    pub const BG_WINDOW: Color32 = Color32::from_rgb(240, 245, 250);
    pub const BG_PANEL: Color32 = Color32::WHITE;
    pub const BG_RESULT: Color32 = Color32::from_rgb(248, 249, 250);
    pub const BG_PLACEHOLDER: Color32 = Color32::from_rgb(238, 242, 247);
    pub const BG_PLACEHOLDER_ERROR: Color32 = Color32::from_rgb(253, 232, 232);
    pub const BG_PLATE_NUMBER: Color32 = Color32::from_rgb(232, 244, 252);

    // Accent colors
    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(52, 152, 219);
    pub const ACCENT_PRIMARY_HOVER: Color32 = Color32::from_rgb(41, 128, 185);
    pub const ACCENT_SUCCESS: Color32 = Color32::from_rgb(46, 204, 113);
    pub const ACCENT_WARNING: Color32 = Color32::from_rgb(243, 156, 18);
    pub const ACCENT_ERROR: Color32 = Color32::from_rgb(231, 76, 60);
    pub const ACCENT_ERROR_DARK: Color32 = Color32::from_rgb(192, 57, 43);

    // Text colors
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(44, 62, 80);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(102, 102, 102);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(127, 140, 141);
    pub const TEXT_DISABLED: Color32 = Color32::from_rgb(189, 195, 199);

    // Border colors
    pub const BORDER: Color32 = Color32::from_rgb(208, 208, 208);
    pub const BORDER_LIGHT: Color32 = Color32::from_rgb(224, 224, 224);
    pub const BORDER_DASHED: Color32 = Color32::from_rgb(160, 160, 160);
}

/// Apply the light theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    let mut visuals = Visuals::light();

    visuals.window_fill = ThemeColors::BG_PANEL;
    visuals.panel_fill = ThemeColors::BG_WINDOW;
    visuals.faint_bg_color = ThemeColors::BG_RESULT;
    visuals.extreme_bg_color = ThemeColors::BG_PANEL;

    visuals.widgets.noninteractive.bg_fill = ThemeColors::BG_PANEL;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, ThemeColors::TEXT_PRIMARY);
    visuals.widgets.noninteractive.rounding = Rounding::same(8.0);

    visuals.widgets.inactive.bg_fill = ThemeColors::ACCENT_PRIMARY;
    visuals.widgets.inactive.weak_bg_fill = ThemeColors::ACCENT_PRIMARY;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.inactive.rounding = Rounding::same(8.0);

    visuals.widgets.hovered.bg_fill = ThemeColors::ACCENT_PRIMARY_HOVER;
    visuals.widgets.hovered.weak_bg_fill = ThemeColors::ACCENT_PRIMARY_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.hovered.rounding = Rounding::same(8.0);

    visuals.widgets.active.bg_fill = ThemeColors::ACCENT_PRIMARY_HOVER;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.active.rounding = Rounding::same(8.0);

    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT_PRIMARY, 77);
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT_PRIMARY);

    visuals.window_rounding = Rounding::same(15.0);
    visuals.window_stroke = Stroke::new(2.0, ThemeColors::BORDER);

    style.visuals = visuals;

    style.spacing.item_spacing = egui::vec2(12.0, 12.0);
    style.spacing.button_padding = egui::vec2(12.0, 12.0);
    style.spacing.window_margin = egui::Margin::same(20.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(16.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(15.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(24.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}

/// Helper to create a color with modified alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// Filled action button in the given color
pub fn action_button(label: &str, fill: Color32) -> egui::Button<'static> {
    egui::Button::new(egui::RichText::new(label.to_string()).strong().color(Color32::WHITE))
        .fill(fill)
        .rounding(Rounding::same(8.0))
}

/// Panel frame: white, rounded, grey border
pub fn panel_frame() -> egui::Frame {
    egui::Frame::none()
        .fill(ThemeColors::BG_PANEL)
        .rounding(Rounding::same(15.0))
        .stroke(Stroke::new(2.0, ThemeColors::BORDER))
        .inner_margin(20.0)
}

/// Register an extra font (for CJK plate text) ahead of the built-in ones
pub fn install_font(ctx: &egui::Context, path: &std::path::Path) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    let mut fonts = egui::FontDefinitions::default();
    fonts
        .font_data
        .insert("plate_font".to_owned(), egui::FontData::from_owned(bytes));

    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "plate_font".to_owned());
    }

    ctx.set_fonts(fonts);
    Ok(())
}
