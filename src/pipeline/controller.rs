/// Pipeline state and sequencing
///
/// Owns the original and working images plus the channel selection, and
/// derives display and export buffers from them on request.

use crate::data::buffer::{Channel, ImageBuffer};
use crate::log::session::SessionLog;
use super::channel::isolate;
use super::effects::Effect;
use super::error::{PipelineError, PipelineResult};
use super::viewport::fit_to_viewport;

/// Whether an image is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Empty,
    Loaded,
}

/// Original/working pair; both present or both absent
#[derive(Debug, Clone)]
struct Images {
    original: ImageBuffer,
    working: ImageBuffer,
}

#[derive(Debug, Default)]
pub struct PipelineController {
    images: Option<Images>,
    channel: Channel,
    /// Bumped on every visible state change
    revision: u64,
    log: SessionLog,
}

impl PipelineController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PipelineStatus {
        if self.images.is_some() {
            PipelineStatus::Loaded
        } else {
            PipelineStatus::Empty
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn original(&self) -> Option<&ImageBuffer> {
        self.images.as_ref().map(|i| &i.original)
    }

    pub fn working(&self) -> Option<&ImageBuffer> {
        self.images.as_ref().map(|i| &i.working)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    /// Replace the original image and reset the working copy from it.
    /// `source` names where the image came from, for the session log.
    pub fn load(&mut self, buffer: ImageBuffer, source: &str) {
        let (w, h) = buffer.dimensions();
        self.log.set_source(source);
        self.log.add_entry("Load", &format!("{} ({}×{})", source, w, h));
        self.images = Some(Images {
            working: buffer.clone(),
            original: buffer,
        });
        self.channel = Channel::Original;
        self.revision += 1;
    }

    /// Discard all effects and return to the original image
    pub fn reset(&mut self) -> PipelineResult<()> {
        let images = self.images.as_mut().ok_or(PipelineError::NoImageLoaded)?;
        images.working = images.original.clone();
        self.channel = Channel::Original;
        self.revision += 1;
        self.log.add_entry("Reset", "working image restored from original");
        Ok(())
    }

    /// Apply an effect to the working image. On error nothing changes.
    pub fn apply_effect(&mut self, effect: &Effect) -> PipelineResult<()> {
        let images = self.images.as_mut().ok_or(PipelineError::NoImageLoaded)?;
        let next = effect.apply(&images.working)?;
        let (w, h) = next.dimensions();
        images.working = next;
        self.revision += 1;
        self.log
            .add_entry("Effect", &format!("{} → {}×{}", effect, w, h));
        Ok(())
    }

    pub fn set_channel(&mut self, channel: Channel) {
        if self.channel != channel {
            self.channel = channel;
            self.revision += 1;
            self.log.add_entry("Channel", channel.label());
        }
    }

    /// Note a failed capture attempt. The current image, if any, is kept.
    pub fn capture_failed(&mut self, reason: &str) {
        log::warn!("Capture failed, keeping current image: {}", reason);
        self.log.add_entry("Capture failed", reason);
    }

    /// Channel-isolated, viewport-fitted copy of the working image.
    /// `None` when nothing is loaded or the viewport is too small.
    pub fn render(&self, viewport_width: u32, viewport_height: u32) -> Option<ImageBuffer> {
        let working = self.working()?;
        let isolated = isolate(working, self.channel);
        fit_to_viewport(&isolated, viewport_width, viewport_height)
    }

    /// Full-resolution buffer to persist, with the current channel applied
    pub fn export_buffer(&self) -> PipelineResult<ImageBuffer> {
        let working = self.working().ok_or(PipelineError::NoImageLoaded)?;
        Ok(isolate(working, self.channel))
    }

    /// Record a completed export in the session log
    pub fn note_export(&mut self, target: &str) {
        self.log
            .add_entry("Save", &format!("{} ({} channel)", target, self.channel));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white(w: u32, h: u32) -> ImageBuffer {
        ImageBuffer::filled(w, h, [255, 255, 255]).unwrap()
    }

    #[test]
    fn test_empty_state() {
        let mut ctl = PipelineController::new();
        assert_eq!(ctl.status(), PipelineStatus::Empty);
        assert!(matches!(ctl.reset(), Err(PipelineError::NoImageLoaded)));
        assert!(matches!(ctl.export_buffer(), Err(PipelineError::NoImageLoaded)));
        assert!(ctl.render(100, 100).is_none());
    }

    #[test]
    fn test_apply_effect_on_empty_leaves_state() {
        let mut ctl = PipelineController::new();
        let rev = ctl.revision();
        let err = ctl.apply_effect(&Effect::Negative).unwrap_err();
        assert!(matches!(err, PipelineError::NoImageLoaded));
        assert_eq!(ctl.status(), PipelineStatus::Empty);
        assert_eq!(ctl.revision(), rev);
        assert!(ctl.working().is_none());
    }

    #[test]
    fn test_load_sets_both_buffers() {
        let mut ctl = PipelineController::new();
        ctl.set_channel(Channel::Blue);
        ctl.load(white(4, 4), "white.png");
        assert_eq!(ctl.status(), PipelineStatus::Loaded);
        assert_eq!(ctl.channel(), Channel::Original);
        assert_eq!(ctl.original(), ctl.working());
    }

    #[test]
    fn test_effects_replace_working_only() {
        let mut ctl = PipelineController::new();
        ctl.load(white(4, 4), "white.png");
        ctl.apply_effect(&Effect::Negative).unwrap();
        ctl.apply_effect(&Effect::border(2)).unwrap();
        assert_eq!(ctl.working().unwrap().dimensions(), (8, 8));
        assert_eq!(ctl.working().unwrap().pixel(4, 4), [0, 0, 0]);
        assert_eq!(ctl.original().unwrap(), &white(4, 4));
    }

    #[test]
    fn test_failed_effect_is_atomic() {
        let mut ctl = PipelineController::new();
        ctl.load(white(3, 3), "white.png");
        ctl.apply_effect(&Effect::Negative).unwrap();
        let before = ctl.working().unwrap().clone();
        let rev = ctl.revision();
        assert!(ctl.apply_effect(&Effect::border(0)).is_err());
        assert_eq!(ctl.working().unwrap(), &before);
        assert_eq!(ctl.revision(), rev);
    }

    #[test]
    fn test_reset_restores_original_and_channel() {
        let mut ctl = PipelineController::new();
        ctl.load(white(4, 4), "white.png");
        ctl.apply_effect(&Effect::Negative).unwrap();
        ctl.set_channel(Channel::Green);
        ctl.reset().unwrap();
        assert_eq!(ctl.working(), ctl.original());
        assert_eq!(ctl.channel(), Channel::Original);
    }

    #[test]
    fn test_channel_is_view_only() {
        let mut ctl = PipelineController::new();
        ctl.load(white(2, 2), "white.png");
        ctl.set_channel(Channel::Red);
        assert_eq!(ctl.working().unwrap(), &white(2, 2));

        let shown = ctl.render(100, 100).unwrap();
        assert_eq!(shown.pixel(0, 0), [255, 0, 0]);
        let saved = ctl.export_buffer().unwrap();
        assert_eq!(saved.pixel(1, 1), [255, 0, 0]);
        assert_eq!(saved.dimensions(), (2, 2));
    }

    #[test]
    fn test_export_is_full_resolution() {
        let mut ctl = PipelineController::new();
        ctl.load(white(64, 32), "white.png");
        let shown = ctl.render(16, 16).unwrap();
        assert_eq!(shown.dimensions(), (16, 8));
        assert_eq!(ctl.export_buffer().unwrap().dimensions(), (64, 32));
    }

    #[test]
    fn test_failed_capture_keeps_image() {
        let mut ctl = PipelineController::new();
        ctl.load(white(2, 2), "white.png");
        ctl.capture_failed("device busy");
        assert_eq!(ctl.status(), PipelineStatus::Loaded);
        assert_eq!(ctl.working().unwrap(), &white(2, 2));
    }

    #[test]
    fn test_revision_tracks_changes() {
        let mut ctl = PipelineController::new();
        let r0 = ctl.revision();
        ctl.load(white(2, 2), "white.png");
        let r1 = ctl.revision();
        assert!(r1 > r0);
        ctl.set_channel(Channel::Original);
        assert_eq!(ctl.revision(), r1);
        ctl.set_channel(Channel::Red);
        assert!(ctl.revision() > r1);
    }

    #[test]
    fn test_operations_are_logged() {
        let mut ctl = PipelineController::new();
        ctl.load(white(2, 2), "white.png");
        ctl.apply_effect(&Effect::Negative).unwrap();
        ctl.note_export("out.png");
        let ops: Vec<_> = ctl.log().entries.iter().map(|e| e.operation.as_str()).collect();
        assert_eq!(ops, vec!["Load", "Effect", "Save"]);
        assert_eq!(ctl.log().source, "white.png");
    }
}
