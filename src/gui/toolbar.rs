/// Toolbar — top menu bar with file operations and view options

/// Actions that can be triggered from the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    None,
    OpenFile,
    Capture,
    SaveImage,
    ExportLog,
    ThemeToggle,
    ShowAbout,
}

/// Render the toolbar and return any triggered action
pub fn show_toolbar(ctx: &egui::Context, theme_label: &str, has_image: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("📁 File", |ui| {
                if ui.button("📂 Open Image…").clicked() {
                    action = ToolbarAction::OpenFile;
                    ui.close_menu();
                }
                if ui.button("📷 Capture from Webcam").clicked() {
                    action = ToolbarAction::Capture;
                    ui.close_menu();
                }
                ui.separator();
                if ui
                    .add_enabled(has_image, egui::Button::new("💾 Save Image…"))
                    .clicked()
                {
                    action = ToolbarAction::SaveImage;
                    ui.close_menu();
                }
                if ui.button("📋 Export Session Log…").clicked() {
                    action = ToolbarAction::ExportLog;
                    ui.close_menu();
                }
            });

            ui.menu_button("🔍 View", |ui| {
                if ui.button(format!("🎨 Theme: {}", theme_label)).clicked() {
                    action = ToolbarAction::ThemeToggle;
                    ui.close_menu();
                }
            });

            ui.menu_button("❓ Help", |ui| {
                if ui.button("ℹ About").clicked() {
                    action = ToolbarAction::ShowAbout;
                    ui.close_menu();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new(theme_label).size(12.0)).corner_radius(12.0))
                    .clicked()
                {
                    action = ToolbarAction::ThemeToggle;
                }
                ui.separator();
                ui.label(
                    egui::RichText::new("Image Channel Viewer")
                        .color(egui::Color32::from_rgb(0x70, 0x75, 0x80))
                        .size(12.0),
                );
            });
        });
    });

    action
}
