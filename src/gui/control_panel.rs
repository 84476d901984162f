/// Control panel — left sidebar with source, display-mode and effect controls

use crate::data::buffer::Channel;
use crate::data::capture::CaptureSettings;
use crate::pipeline::effects::Effect;

/// Parameter values edited in the panel
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ControlPanelState {
    // Border
    pub border_size: u32,

    // Line
    pub line_from: (i32, i32),
    pub line_to: (i32, i32),
    pub line_thickness: u32,

    pub capture: CaptureSettings,
}

impl Default for ControlPanelState {
    fn default() -> Self {
        Self {
            border_size: 20,
            line_from: (0, 0),
            line_to: (200, 200),
            line_thickness: 3,
            capture: CaptureSettings::default(),
        }
    }
}

impl ControlPanelState {
    pub fn border_effect(&self) -> Effect {
        Effect::border(self.border_size)
    }

    pub fn line_effect(&self) -> Effect {
        Effect::line(self.line_from, self.line_to, self.line_thickness)
    }
}

/// Actions triggered by the control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    None,
    OpenFile,
    Capture,
    SetChannel(Channel),
    Apply(Effect),
    Reset,
    SaveImage,
}

/// Render the control panel in the left sidebar
pub fn show_control_panel(
    ui: &mut egui::Ui,
    state: &mut ControlPanelState,
    channel: Channel,
    has_image: bool,
    image_size: Option<(u32, u32)>,
) -> ControlAction {
    let mut action = ControlAction::None;
    let full_width = egui::vec2(ui.available_width(), 0.0);

    ui.vertical_centered(|ui| {
        ui.heading("🖼 Image");
    });
    ui.separator();

    if ui.add(egui::Button::new("📂 Load image").min_size(full_width)).clicked() {
        action = ControlAction::OpenFile;
    }
    if ui.add(egui::Button::new("📷 Capture from webcam").min_size(full_width))
        .clicked()
    {
        action = ControlAction::Capture;
    }

    if let Some((w, h)) = image_size {
        ui.label(
            egui::RichText::new(format!("{} × {} px", w, h))
                .small()
                .color(ui.visuals().weak_text_color()),
        );
    }

    ui.add_space(8.0);
    ui.label(egui::RichText::new("Display mode").strong());
    let mut selected = channel;
    for ch in Channel::ALL {
        ui.radio_value(&mut selected, ch, ch.label());
    }
    if selected != channel {
        action = ControlAction::SetChannel(selected);
    }

    ui.add_space(8.0);
    ui.separator();
    ui.label(egui::RichText::new("Effects").strong());

    ui.add_enabled_ui(has_image, |ui| {
        if ui.add(egui::Button::new("◐ Negative").min_size(full_width)).clicked() {
            action = ControlAction::Apply(Effect::Negative);
        }

        ui.add_space(4.0);
        ui.horizontal(|ui| {
            ui.label("Border:");
            ui.add(
                egui::DragValue::new(&mut state.border_size)
                    .range(1..=2000)
                    .suffix(" px"),
            );
        });
        if ui.add(egui::Button::new("▣ Add border").min_size(full_width)).clicked() {
            action = ControlAction::Apply(state.border_effect());
        }

        ui.add_space(4.0);
        egui::Grid::new("line_params").num_columns(3).show(ui, |ui| {
            ui.label("From:");
            ui.add(egui::DragValue::new(&mut state.line_from.0).prefix("x "));
            ui.add(egui::DragValue::new(&mut state.line_from.1).prefix("y "));
            ui.end_row();
            ui.label("To:");
            ui.add(egui::DragValue::new(&mut state.line_to.0).prefix("x "));
            ui.add(egui::DragValue::new(&mut state.line_to.1).prefix("y "));
            ui.end_row();
            ui.label("Width:");
            ui.add(
                egui::DragValue::new(&mut state.line_thickness)
                    .range(1..=200)
                    .suffix(" px"),
            );
            ui.end_row();
        });
        if ui.add(egui::Button::new("╱ Draw line").min_size(full_width)).clicked() {
            action = ControlAction::Apply(state.line_effect());
        }

        ui.add_space(8.0);
        if ui.add(egui::Button::new("↺ Reset to original").min_size(full_width))
            .clicked()
        {
            action = ControlAction::Reset;
        }
    });

    ui.add_space(8.0);
    ui.separator();
    if ui
        .add_enabled(has_image, egui::Button::new("💾 Save image").min_size(full_width))
        .clicked()
    {
        action = ControlAction::SaveImage;
    }

    ui.add_space(8.0);
    egui::CollapsingHeader::new("📷 Camera")
        .default_open(false)
        .show(ui, |ui| {
            egui::Grid::new("capture_settings").num_columns(2).show(ui, |ui| {
                ui.label("Program:");
                ui.text_edit_singleline(&mut state.capture.program);
                ui.end_row();
                ui.label("Format:");
                ui.text_edit_singleline(&mut state.capture.input_format);
                ui.end_row();
                ui.label("Device:");
                ui.text_edit_singleline(&mut state.capture.device);
                ui.end_row();
                ui.label("Timeout:");
                ui.add(
                    egui::DragValue::new(&mut state.capture.timeout_secs)
                        .range(1..=120)
                        .suffix(" s"),
                );
                ui.end_row();
            });
            if ui.small_button("Restore defaults").clicked() {
                state.capture = CaptureSettings::default();
            }
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_effects_use_standard_colours() {
        let state = ControlPanelState::default();
        assert_eq!(
            state.border_effect(),
            Effect::Border { size: 20, color: [128, 0, 128] }
        );
        match state.line_effect() {
            Effect::Line { thickness, color, .. } => {
                assert_eq!(thickness, 3);
                assert_eq!(color, [0, 255, 0]);
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }
}
