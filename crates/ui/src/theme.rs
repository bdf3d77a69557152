use egui::{Color32, CornerRadius, FontId, Stroke, TextStyle};
use flamechart_protocol::ThemeToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            ThemeMode::Dark => dark_visuals(),
            ThemeMode::Light => light_visuals(),
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
}

fn resolve_dark(token: ThemeToken) -> Color32 {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        // Frame fills are pale in both modes, so labels stay dark.
        LabelText => Color32::from_rgb(0x1e, 0x1e, 0x2e), // Base

        TextPrimary => Color32::from_rgb(0xcd, 0xd6, 0xf4), // Text
        TextMuted => Color32::from_rgb(0xa6, 0xad, 0xc8),   // Subtext0

        Background => Color32::from_rgb(0x11, 0x11, 0x1b), // Crust
        Surface => Color32::from_rgb(0x18, 0x18, 0x25),    // Mantle
        Border => Color32::from_rgb(0x31, 0x32, 0x44),     // Surface0
    }
}

fn resolve_light(token: ThemeToken) -> Color32 {
    use ThemeToken::*;
    match token {
        LabelText => Color32::from_rgb(20, 20, 30),

        TextPrimary => Color32::from_rgb(20, 20, 30),
        TextMuted => Color32::from_rgb(100, 100, 110),

        Background => Color32::from_rgb(255, 255, 255),
        Surface => Color32::from_rgb(245, 245, 248),
        Border => Color32::from_rgb(210, 210, 220),
    }
}

pub const FONT_TITLE: f32 = 18.0;
pub const FONT_BODY: f32 = 12.0;
pub const FONT_CAPTION: f32 = 11.0;

fn rounded(mut v: egui::Visuals) -> egui::Visuals {
    v.window_corner_radius = CornerRadius::same(6);
    v.menu_corner_radius = CornerRadius::same(6);
    for w in [
        &mut v.widgets.noninteractive,
        &mut v.widgets.inactive,
        &mut v.widgets.hovered,
        &mut v.widgets.active,
        &mut v.widgets.open,
    ] {
        w.corner_radius = CornerRadius::same(5);
    }
    v
}

/// Catppuccin Mocha dark visuals for egui widgets.
pub fn dark_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::dark();
    v.panel_fill = Color32::from_rgb(0x18, 0x18, 0x25);
    v.window_fill = Color32::from_rgb(0x1e, 0x1e, 0x2e);
    v.extreme_bg_color = Color32::from_rgb(0x11, 0x11, 0x1b);
    v.widgets.inactive.bg_fill = Color32::from_rgb(0x45, 0x47, 0x5a);
    v.widgets.hovered.bg_fill = Color32::from_rgb(0x58, 0x5b, 0x70);
    v.widgets.active.bg_fill = Color32::from_rgb(0x89, 0xb4, 0xfa);
    v.selection.stroke = Stroke::new(1.0, Color32::from_rgb(0x89, 0xb4, 0xfa));
    v.error_fg_color = Color32::from_rgb(0xf3, 0x8b, 0xa8);
    rounded(v)
}

pub fn light_visuals() -> egui::Visuals {
    let mut v = egui::Visuals::light();
    v.panel_fill = Color32::from_rgb(250, 250, 252);
    v.window_fill = Color32::from_rgb(255, 255, 255);
    v.widgets.inactive.bg_fill = Color32::from_rgb(230, 230, 235);
    v.widgets.hovered.bg_fill = Color32::from_rgb(220, 220, 228);
    v.widgets.active.bg_fill = Color32::from_rgb(50, 110, 220);
    v.selection.stroke = Stroke::new(1.0, Color32::from_rgb(50, 110, 220));
    v.error_fg_color = Color32::from_rgb(211, 47, 47);
    rounded(v)
}

pub fn apply_typography(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    style
        .text_styles
        .insert(TextStyle::Heading, FontId::proportional(FONT_TITLE));
    style
        .text_styles
        .insert(TextStyle::Body, FontId::proportional(FONT_BODY));
    style
        .text_styles
        .insert(TextStyle::Button, FontId::proportional(FONT_BODY));
    style
        .text_styles
        .insert(TextStyle::Small, FontId::proportional(FONT_CAPTION));
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_dark_in_both_modes() {
        for mode in [ThemeMode::Dark, ThemeMode::Light] {
            let c = resolve(ThemeToken::LabelText, mode);
            assert!(c.r() < 64 && c.g() < 64 && c.b() < 64);
        }
    }

    #[test]
    fn toggle_round_trips() {
        assert_eq!(ThemeMode::Dark.toggled().toggled(), ThemeMode::Dark);
    }
}
