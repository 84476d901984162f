/// Main application state and eframe::App implementation
///
/// Ties together the pipeline controller, file/capture collaborators and
/// the GUI panels. All pipeline work runs synchronously inside `update`.

use std::path::{Path, PathBuf};

use eframe::egui;

use crate::data::{capture, io};
use crate::gui::control_panel::{self, ControlAction, ControlPanelState};
use crate::gui::image_view::{self, ImageViewState};
use crate::gui::theme::{self, AppTheme, ThemeColors};
use crate::gui::toolbar::{self, ToolbarAction};
use crate::pipeline::controller::{PipelineController, PipelineStatus};
use crate::pipeline::effects::Effect;
use crate::pipeline::error::PipelineError;

/// Severity of the status-bar message
#[derive(Debug, Clone, Copy, PartialEq)]
enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

/// The main application
pub struct ViewerApp {
    controller: PipelineController,

    /// GUI sub-states
    panel_state: ControlPanelState,
    view_state: ImageViewState,

    /// Status bar
    status_message: String,
    status_kind: StatusKind,
    show_about: bool,

    /// Whether the capture program answered at start-up
    capture_available: bool,

    current_theme: AppTheme,
    theme_colors: ThemeColors,

    /// Dropped files buffer
    dropped_files: Vec<PathBuf>,
}

impl ViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let default_theme = AppTheme::default();
        theme::apply_theme(&cc.egui_ctx, default_theme);

        let mut style = (*cc.egui_ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(8.0, 5.0);
        style.spacing.button_padding = egui::vec2(8.0, 4.0);
        cc.egui_ctx.set_style(style);

        let panel_state = ControlPanelState::default();
        let capture_available = capture::check_capture_available(&panel_state.capture);
        if capture_available {
            log::info!("Capture program '{}' detected", panel_state.capture.program);
        } else {
            log::info!(
                "Capture program '{}' not found — webcam capture will fail",
                panel_state.capture.program
            );
        }

        Self {
            controller: PipelineController::new(),
            panel_state,
            view_state: ImageViewState::default(),
            status_message: "Ready — open an image or capture one from the webcam".to_string(),
            status_kind: StatusKind::Info,
            show_about: false,
            capture_available,
            current_theme: default_theme,
            theme_colors: ThemeColors::from_theme(default_theme),
            dropped_files: Vec::new(),
        }
    }

    fn set_status(&mut self, kind: StatusKind, message: String) {
        match kind {
            StatusKind::Warning => log::warn!("{}", message),
            StatusKind::Error => log::error!("{}", message),
            _ => {}
        }
        self.status_kind = kind;
        self.status_message = message;
    }

    /// Decode a file and make it the current image. A failed decode keeps
    /// whatever was loaded before.
    fn load_path(&mut self, path: &Path) {
        match io::load_image(path) {
            Ok(buffer) => {
                let (w, h) = buffer.dimensions();
                self.controller.load(buffer, &path.display().to_string());
                self.set_status(
                    StatusKind::Success,
                    format!("Loaded: {} ({}×{})", path.display(), w, h),
                );
            }
            Err(e) => self.set_status(StatusKind::Warning, e.to_string()),
        }
    }

    fn capture(&mut self) {
        let settings = self.panel_state.capture.clone();
        match capture::capture_frame(&settings) {
            Ok(buffer) => {
                let (w, h) = buffer.dimensions();
                self.controller.load(buffer, &format!("camera {}", settings.device));
                self.set_status(
                    StatusKind::Success,
                    format!("Captured frame from {} ({}×{})", settings.device, w, h),
                );
            }
            Err(e) => {
                self.controller.capture_failed(&e.to_string());
                let hint = if self.capture_available {
                    ""
                } else {
                    " — is ffmpeg installed?"
                };
                self.set_status(StatusKind::Warning, format!("{}{}", e, hint));
            }
        }
    }

    fn apply_effect(&mut self, effect: Effect) {
        match self.controller.apply_effect(&effect) {
            Ok(()) => self.set_status(StatusKind::Info, format!("Applied: {}", effect)),
            Err(PipelineError::NoImageLoaded) => self.set_status(
                StatusKind::Warning,
                "Load an image before applying effects".to_string(),
            ),
            Err(e) => self.set_status(StatusKind::Error, format!("{} failed: {}", effect.name(), e)),
        }
    }

    fn save_image(&mut self) {
        if self.controller.status() == PipelineStatus::Empty {
            self.set_status(StatusKind::Warning, "No image to save".to_string());
            return;
        }
        if let Some(path) = io::save_image_dialog() {
            let result = self
                .controller
                .export_buffer()
                .and_then(|buffer| io::save_image(&buffer, &path));
            match result {
                Ok(()) => {
                    self.controller.note_export(&path.display().to_string());
                    self.set_status(StatusKind::Success, format!("Saved: {}", path.display()));
                }
                Err(e) => self.set_status(StatusKind::Error, e.to_string()),
            }
        }
    }

    fn export_log(&mut self) {
        if let Some(path) = io::save_log_dialog() {
            match self.controller.log().save(&path) {
                Ok(()) => self.set_status(StatusKind::Success, format!("Log saved: {}", path.display())),
                Err(e) => self.set_status(StatusKind::Error, format!("Error saving log: {}", e)),
            }
        }
    }

    fn open_file(&mut self) {
        if let Some(path) = io::open_image_dialog() {
            self.load_path(&path);
        }
    }

    /// Handle toolbar actions
    fn handle_toolbar_action(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenFile => self.open_file(),
            ToolbarAction::Capture => self.capture(),
            ToolbarAction::SaveImage => self.save_image(),
            ToolbarAction::ExportLog => self.export_log(),
            ToolbarAction::ThemeToggle => {
                self.current_theme = self.current_theme.next();
                self.theme_colors = ThemeColors::from_theme(self.current_theme);
            }
            ToolbarAction::ShowAbout => self.show_about = true,
            ToolbarAction::None => {}
        }
    }

    /// Handle control panel actions
    fn handle_control_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::OpenFile => self.open_file(),
            ControlAction::Capture => self.capture(),
            ControlAction::SetChannel(channel) => {
                self.controller.set_channel(channel);
                self.set_status(StatusKind::Info, format!("Display mode: {}", channel));
            }
            ControlAction::Apply(effect) => self.apply_effect(effect),
            ControlAction::Reset => match self.controller.reset() {
                Ok(()) => self.set_status(StatusKind::Info, "Reset to original".to_string()),
                Err(e) => self.set_status(StatusKind::Warning, e.to_string()),
            },
            ControlAction::SaveImage => self.save_image(),
            ControlAction::None => {}
        }
    }

    fn status_color(&self) -> egui::Color32 {
        match self.status_kind {
            StatusKind::Info => self.theme_colors.text_muted,
            StatusKind::Success => self.theme_colors.success,
            StatusKind::Warning => self.theme_colors.warning,
            StatusKind::Error => self.theme_colors.error,
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_theme(ctx, self.current_theme);

        // Handle drag-and-drop
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    self.dropped_files.push(path.clone());
                }
            }
        });
        if let Some(path) = self.dropped_files.pop() {
            self.dropped_files.clear();
            self.load_path(&path);
        }

        // Keyboard shortcuts
        let (open, save) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            (cmd && i.key_pressed(egui::Key::O), cmd && i.key_pressed(egui::Key::S))
        });
        if open {
            self.open_file();
        }
        if save {
            self.save_image();
        }

        let has_image = self.controller.status() == PipelineStatus::Loaded;

        let toolbar_action = toolbar::show_toolbar(ctx, self.current_theme.label(), has_image);
        self.handle_toolbar_action(toolbar_action);

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(self.status_color(), &self.status_message);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} · {} ops",
                            self.controller.channel(),
                            self.controller.log().len()
                        ))
                        .color(self.theme_colors.text_muted),
                    );
                });
            });
        });

        let mut control_action = ControlAction::None;
        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    control_action = control_panel::show_control_panel(
                        ui,
                        &mut self.panel_state,
                        self.controller.channel(),
                        has_image,
                        self.controller.working().map(|w| w.dimensions()),
                    );
                });
            });
        self.handle_control_action(control_action);

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                image_view::show_image_view(
                    ui,
                    &mut self.view_state,
                    &self.controller,
                    self.theme_colors.canvas_bg,
                    self.theme_colors.text_muted,
                );
            });

        if self.show_about {
            egui::Window::new("About")
                .open(&mut self.show_about)
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.heading("🖼 Image Channel Viewer");
                    ui.label(format!("Version {}", env!("CARGO_PKG_VERSION")));
                    ui.add_space(10.0);
                    ui.label("Built with Rust + egui");
                    ui.add_space(10.0);
                    ui.label("• Load PNG/JPEG images or capture from a webcam");
                    ui.label("• View the red, green or blue channel on its own");
                    ui.label("• Negative, border and line effects");
                    ui.label("• Save the result as PNG or JPEG");
                });
        }
    }
}
