/// Central image display
///
/// Asks the controller for a viewport-fitted render, uploads it as a
/// texture and draws it centred. The texture is rebuilt only when the
/// pipeline revision or the viewport size changes.

use crate::pipeline::controller::PipelineController;

/// Texture cache for the display buffer
#[derive(Default)]
pub struct ImageViewState {
    texture: Option<egui::TextureHandle>,
    /// (revision, viewport width px, viewport height px) the texture was built for
    key: Option<(u64, u32, u32)>,
}

impl ImageViewState {
    fn refresh(
        &mut self,
        ctx: &egui::Context,
        controller: &PipelineController,
        viewport: (u32, u32),
    ) {
        let key = (controller.revision(), viewport.0, viewport.1);
        if self.key == Some(key) {
            return;
        }
        self.key = Some(key);
        self.texture = controller.render(viewport.0, viewport.1).map(|display| {
            log::debug!(
                "Display buffer {}×{} for viewport {}×{}",
                display.width(),
                display.height(),
                viewport.0,
                viewport.1
            );
            ctx.load_texture("display", display.to_color_image(), egui::TextureOptions::LINEAR)
        });
    }
}

/// Draw the image (or a hint when there is nothing to show)
pub fn show_image_view(
    ui: &mut egui::Ui,
    state: &mut ImageViewState,
    controller: &PipelineController,
    canvas_bg: egui::Color32,
    hint_color: egui::Color32,
) {
    let avail = ui.available_size();
    let ppp = ui.ctx().pixels_per_point();
    let viewport = (
        (avail.x * ppp).max(0.0).floor() as u32,
        (avail.y * ppp).max(0.0).floor() as u32,
    );

    let (rect, _response) = ui.allocate_exact_size(avail, egui::Sense::hover());
    ui.painter().rect_filled(rect, 0.0, canvas_bg);

    state.refresh(ui.ctx(), controller, viewport);

    match &state.texture {
        Some(texture) => {
            let [w, h] = texture.size();
            let size = egui::vec2(w as f32 / ppp, h as f32 / ppp);
            let image_rect = egui::Rect::from_center_size(rect.center(), size);
            ui.painter().image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            let hint = if controller.working().is_some() {
                ""
            } else {
                "Load an image or capture one from the webcam"
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                hint,
                egui::FontId::proportional(16.0),
                hint_color,
            );
        }
    }
}
