/// In-memory image representation shared by the pipeline and the display layer
///
/// Pixels are stored as tightly packed 8-bit RGB samples in row-major order.
/// Buffers are never edited in place by the pipeline; every transform builds
/// a new one.

use serde::{Deserialize, Serialize};

use crate::pipeline::error::{PipelineError, PipelineResult};

/// Samples per pixel (RGB)
pub const CHANNELS: usize = 3;

/// An RGB colour triple
pub type Rgb = [u8; 3];

/// Default border fill (purple)
pub const BORDER_PURPLE: Rgb = [128, 0, 128];

/// Default line colour (green)
pub const LINE_GREEN: Rgb = [0, 255, 0];

/// Display channel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Channel {
    #[default]
    Original,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Original, Channel::Red, Channel::Green, Channel::Blue];

    /// Sample index within a pixel, `None` for the unfiltered view
    pub fn index(&self) -> Option<usize> {
        match self {
            Channel::Original => None,
            Channel::Red => Some(0),
            Channel::Green => Some(1),
            Channel::Blue => Some(2),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Original => "Original",
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageBuffer {
    /// Wrap raw RGB samples, checking that the length matches the shape
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidArgument(format!(
                "image dimensions must be positive, got {}×{}",
                width, height
            )));
        }
        let expected = Self::sample_count(width, height)?;
        if data.len() != expected {
            return Err(PipelineError::InvalidArgument(format!(
                "expected {} samples for {}×{} RGB, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self { width, height, data })
    }

    /// A buffer where every pixel has the same colour
    pub fn filled(width: u32, height: u32, color: Rgb) -> PipelineResult<Self> {
        let pixels = Self::sample_count(width, height)? / CHANNELS;
        let data = color.repeat(pixels);
        Self::new(width, height, data)
    }

    fn sample_count(width: u32, height: u32) -> PipelineResult<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or_else(|| {
                PipelineError::InvalidArgument(format!("image {}×{} is too large", width, height))
            })
    }

    /// New buffer with this buffer's shape and the given samples
    pub(crate) fn with_data(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Colour at `(x, y)`; both coordinates must be inside the image
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}×{}",
            x,
            y,
            self.width,
            self.height
        );
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn from_rgb_image(img: image::RgbImage) -> PipelineResult<Self> {
        let (w, h) = img.dimensions();
        Self::new(w, h, img.into_raw())
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Texture-ready copy for egui
    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgb([self.width as usize, self.height as usize], &self.data)
    }
}
