pub mod channel;
pub mod controller;
pub mod effects;
pub mod error;
pub mod viewport;

#[cfg(test)]
mod tests {
    use super::controller::{PipelineController, PipelineStatus};
    use super::effects::Effect;
    use super::error::PipelineError;
    use crate::data::buffer::{Channel, ImageBuffer, BORDER_PURPLE};

    #[test]
    fn test_white_image_red_channel() {
        let mut ctl = PipelineController::new();
        ctl.load(ImageBuffer::filled(4, 4, [255, 255, 255]).unwrap(), "white");
        ctl.set_channel(Channel::Red);
        let shown = ctl.render(400, 400).expect("viewport is large enough");
        assert_eq!(shown.dimensions(), (4, 4));
        for px in shown.as_raw().chunks(3) {
            assert_eq!(px, [255, 0, 0]);
        }
    }

    #[test]
    fn test_border_then_line_then_save_buffer() {
        let mut ctl = PipelineController::new();
        ctl.load(ImageBuffer::filled(2, 2, [10, 10, 10]).unwrap(), "grey");
        ctl.apply_effect(&Effect::border(1)).unwrap();
        let framed = ctl.working().unwrap().clone();
        assert_eq!(framed.dimensions(), (4, 4));
        assert_eq!(framed.pixel(0, 0), BORDER_PURPLE);
        assert_eq!(framed.pixel(1, 1), [10, 10, 10]);

        ctl.apply_effect(&Effect::line((0, 3), (3, 3), 1)).unwrap();
        let out = ctl.export_buffer().unwrap();
        assert_eq!(out.pixel(2, 3), [0, 255, 0]);
        assert_eq!(out.pixel(2, 2), [10, 10, 10]);
    }

    #[test]
    fn test_apply_on_empty_controller() {
        let mut ctl = PipelineController::new();
        for effect in [Effect::Negative, Effect::border(3), Effect::line((0, 0), (1, 1), 2)] {
            assert!(matches!(
                ctl.apply_effect(&effect),
                Err(PipelineError::NoImageLoaded)
            ));
        }
        assert_eq!(ctl.status(), PipelineStatus::Empty);
    }

    #[test]
    fn test_render_in_tiny_viewport() {
        let mut ctl = PipelineController::new();
        ctl.load(ImageBuffer::filled(8, 8, [1, 2, 3]).unwrap(), "tiny");
        assert!(ctl.render(1, 1).is_none());
        assert!(ctl.render(2, 2).is_some());
    }

    #[test]
    fn test_double_negative_round_trip_through_controller() {
        let data: Vec<u8> = (0..5 * 5 * 3).map(|i| (i * 3) as u8).collect();
        let img = ImageBuffer::new(5, 5, data).unwrap();
        let mut ctl = PipelineController::new();
        ctl.load(img.clone(), "ramp");
        ctl.apply_effect(&Effect::Negative).unwrap();
        assert_ne!(ctl.working().unwrap(), &img);
        ctl.apply_effect(&Effect::Negative).unwrap();
        assert_eq!(ctl.working().unwrap(), &img);
    }
}
