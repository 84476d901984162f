/// Theme system — Light and Dark colour themes for the viewer

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum AppTheme {
    #[default]
    Light,
    Dark,
}

impl AppTheme {
    pub fn label(&self) -> &'static str {
        match self {
            AppTheme::Light => "☀ Light",
            AppTheme::Dark => "🌙 Dark",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            AppTheme::Light => AppTheme::Dark,
            AppTheme::Dark => AppTheme::Light,
        }
    }
}

/// Colours the viewer needs beyond stock egui visuals
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub panel_fill: egui::Color32,
    pub window_fill: egui::Color32,
    /// Backdrop behind the image
    pub canvas_bg: egui::Color32,

    pub widget_inactive_bg: egui::Color32,
    pub widget_hovered_stroke: egui::Color32,
    pub widget_active_bg: egui::Color32,
    pub selection_bg: egui::Color32,
    pub selection_stroke: egui::Color32,

    pub text_muted: egui::Color32,
    pub success: egui::Color32,
    pub warning: egui::Color32,
    pub error: egui::Color32,

    pub is_dark: bool,
}

impl ThemeColors {
    pub fn from_theme(theme: AppTheme) -> Self {
        match theme {
            AppTheme::Light => Self::light(),
            AppTheme::Dark => Self::dark(),
        }
    }

    fn light() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0xF7, 0xF7, 0xF8),
            window_fill: egui::Color32::from_rgb(0xFF, 0xFF, 0xFF),
            canvas_bg: egui::Color32::from_rgb(0x80, 0x80, 0x80),

            widget_inactive_bg: egui::Color32::from_rgb(0xE3, 0xE5, 0xE8),
            widget_hovered_stroke: egui::Color32::from_rgb(0x5B, 0x9B, 0xD5),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),
            selection_bg: egui::Color32::from_rgba_premultiplied(0x3B, 0x7D, 0xC0, 0x40),
            selection_stroke: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),

            text_muted: egui::Color32::from_rgb(0x88, 0x8C, 0x94),
            success: egui::Color32::from_rgb(0x27, 0x8B, 0x4A),
            warning: egui::Color32::from_rgb(0xB8, 0x8B, 0x00),
            error: egui::Color32::from_rgb(0xD0, 0x30, 0x30),

            is_dark: false,
        }
    }

    fn dark() -> Self {
        Self {
            panel_fill: egui::Color32::from_rgb(0x1E, 0x1F, 0x24),
            window_fill: egui::Color32::from_rgb(0x25, 0x26, 0x2C),
            canvas_bg: egui::Color32::from_rgb(0x10, 0x10, 0x12),

            widget_inactive_bg: egui::Color32::from_rgb(0x30, 0x32, 0x3A),
            widget_hovered_stroke: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),
            widget_active_bg: egui::Color32::from_rgb(0x3B, 0x7D, 0xC0),
            selection_bg: egui::Color32::from_rgba_premultiplied(0x3B, 0x7D, 0xC0, 0x50),
            selection_stroke: egui::Color32::from_rgb(0x6C, 0xB4, 0xF0),

            text_muted: egui::Color32::from_rgb(0x8A, 0x8D, 0x96),
            success: egui::Color32::from_rgb(0x4C, 0xC2, 0x6E),
            warning: egui::Color32::from_rgb(0xE8, 0xC0, 0x40),
            error: egui::Color32::from_rgb(0xFF, 0x55, 0x55),

            is_dark: true,
        }
    }
}

pub fn apply_theme(ctx: &egui::Context, theme: AppTheme) {
    let c = ThemeColors::from_theme(theme);

    let mut visuals = if c.is_dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };

    visuals.panel_fill = c.panel_fill;
    visuals.window_fill = c.window_fill;

    visuals.widgets.inactive.bg_fill = c.widget_inactive_bg;
    visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(4);
    visuals.widgets.hovered.bg_stroke = egui::Stroke::new(1.0, c.widget_hovered_stroke);
    visuals.widgets.active.bg_fill = c.widget_active_bg;

    visuals.selection.bg_fill = c.selection_bg;
    visuals.selection.stroke = egui::Stroke::new(1.5, c.selection_stroke);

    ctx.set_visuals(visuals);
}
