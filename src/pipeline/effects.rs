/// Image effects
///
/// Each effect reads its input buffer and returns a new one; the input is
/// never modified. Effects are described by `Effect` so the controller can
/// apply and log them uniformly.

use serde::{Deserialize, Serialize};

use crate::data::buffer::{ImageBuffer, Rgb, BORDER_PURPLE, CHANNELS, LINE_GREEN};
use super::error::{PipelineError, PipelineResult};

/// Effect descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Negative,
    Border { size: u32, color: Rgb },
    Line { from: (i32, i32), to: (i32, i32), thickness: u32, color: Rgb },
}

impl Effect {
    pub fn border(size: u32) -> Self {
        Effect::Border { size, color: BORDER_PURPLE }
    }

    pub fn line(from: (i32, i32), to: (i32, i32), thickness: u32) -> Self {
        Effect::Line { from, to, thickness, color: LINE_GREEN }
    }

    pub fn apply(&self, buffer: &ImageBuffer) -> PipelineResult<ImageBuffer> {
        match self {
            Effect::Negative => Ok(negate(buffer)),
            Effect::Border { size, color } => add_border(buffer, *size, *color),
            Effect::Line { from, to, thickness, color } => {
                draw_line(buffer, *from, *to, *thickness, *color)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Negative => "Negative",
            Effect::Border { .. } => "Border",
            Effect::Line { .. } => "Line",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::Negative => write!(f, "Negative"),
            Effect::Border { size, color } => {
                write!(f, "Border ({} px, rgb{:?})", size, color)
            }
            Effect::Line { from, to, thickness, color } => write!(
                f,
                "Line ({}, {}) → ({}, {}), {} px, rgb{:?}",
                from.0, from.1, to.0, to.1, thickness, color
            ),
        }
    }
}

// =========================================================================
//  Negative
// =========================================================================

/// Invert every sample (255 - s)
pub fn negate(buffer: &ImageBuffer) -> ImageBuffer {
    let data = buffer.as_raw().iter().map(|&s| !s).collect();
    buffer.with_data(data)
}

// =========================================================================
//  Border
// =========================================================================

/// Surround the image with a constant-colour frame `size` pixels wide
pub fn add_border(buffer: &ImageBuffer, size: u32, color: Rgb) -> PipelineResult<ImageBuffer> {
    if size == 0 {
        return Err(PipelineError::InvalidArgument(
            "border size must be positive".to_string(),
        ));
    }

    let grow = |dim: u32| {
        size.checked_mul(2).and_then(|s| dim.checked_add(s)).ok_or_else(|| {
            PipelineError::InvalidArgument(format!("border of {} px is too large", size))
        })
    };
    let new_w = grow(buffer.width())?;
    let new_h = grow(buffer.height())?;

    let mut out = ImageBuffer::filled(new_w, new_h, color)?.into_raw();
    let src_stride = buffer.stride();
    let dst_stride = new_w as usize * CHANNELS;
    let offset = size as usize;

    for (y, row) in buffer.as_raw().chunks_exact(src_stride).enumerate() {
        let start = (y + offset) * dst_stride + offset * CHANNELS;
        out[start..start + src_stride].copy_from_slice(row);
    }

    ImageBuffer::new(new_w, new_h, out)
}

// =========================================================================
//  Line
// =========================================================================

/// Draw a straight segment from `from` to `to` on a copy of the buffer.
///
/// Endpoints may lie outside the image; the visible part is drawn and the
/// rest is clipped. Thickness grows the stroke symmetrically with round
/// ends, so a zero-length segment produces a dot.
pub fn draw_line(
    buffer: &ImageBuffer,
    from: (i32, i32),
    to: (i32, i32),
    thickness: u32,
    color: Rgb,
) -> PipelineResult<ImageBuffer> {
    if thickness == 0 {
        return Err(PipelineError::InvalidArgument(
            "line thickness must be at least 1".to_string(),
        ));
    }

    let mut out = buffer.as_raw().to_vec();
    let a = (from.0 as f64, from.1 as f64);
    let b = (to.0 as f64, to.1 as f64);
    if thickness == 1 {
        stroke_thin(&mut out, buffer.dimensions(), a, b, color);
    } else {
        stroke_round(&mut out, buffer.dimensions(), a, b, thickness as f64 / 2.0, color);
    }
    Ok(buffer.with_data(out))
}

/// One-pixel Bresenham walk over the part of the segment inside the image
fn stroke_thin(out: &mut [u8], (w, h): (u32, u32), a: (f64, f64), b: (f64, f64), color: Rgb) {
    let (w, h) = (w as i64, h as i64);
    let clipped = clip_segment(a, b, (-1.0, -1.0), (w as f64, h as f64));
    let ((x0, y0), (x1, y1)) = match clipped {
        Some(seg) => seg,
        None => return,
    };

    let (x0, y0) = (x0.round() as i64, y0.round() as i64);
    let (x1, y1) = (x1.round() as i64, y1.round() as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut cx, mut cy) = (x0, y0);
    loop {
        if cx >= 0 && cx < w && cy >= 0 && cy < h {
            let i = (cy as usize * w as usize + cx as usize) * CHANNELS;
            out[i..i + CHANNELS].copy_from_slice(&color);
        }
        if cx == x1 && cy == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            cx += sx;
        }
        if e2 <= dx {
            err += dx;
            cy += sy;
        }
    }
}

/// Fill every pixel whose centre lies within `radius` of the segment.
///
/// Only the stroke's bounding box clipped to the image is visited, so the
/// cost never exceeds one pass over the buffer whatever the radius.
fn stroke_round(
    out: &mut [u8],
    (w, h): (u32, u32),
    a: (f64, f64),
    b: (f64, f64),
    radius: f64,
    color: Rgb,
) {
    let x_lo = (a.0.min(b.0) - radius).ceil().max(0.0);
    let x_hi = (a.0.max(b.0) + radius).floor().min(w as f64 - 1.0);
    let y_lo = (a.1.min(b.1) - radius).ceil().max(0.0);
    let y_hi = (a.1.max(b.1) + radius).floor().min(h as f64 - 1.0);
    if x_lo > x_hi || y_lo > y_hi {
        return;
    }

    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len2 = dx * dx + dy * dy;
    let r2 = radius * radius;
    let stride = w as usize * CHANNELS;

    for y in y_lo as usize..=y_hi as usize {
        let row = &mut out[y * stride..(y + 1) * stride];
        for x in x_lo as usize..=x_hi as usize {
            let (px, py) = (x as f64 - a.0, y as f64 - a.1);
            let t = if len2 > 0.0 {
                ((px * dx + py * dy) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (ex, ey) = (px - t * dx, py - t * dy);
            if ex * ex + ey * ey <= r2 {
                row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&color);
            }
        }
    }
}

/// Liang–Barsky clipping of a segment against an axis-aligned rectangle.
/// Returns `None` when the segment lies entirely outside.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    min: (f64, f64),
    max: (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let edges = [
        (-dx, p0.0 - min.0),
        (dx, max.0 - p0.0),
        (-dy, p0.1 - min.1),
        (dy, max.1 - p0.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
    ))
}
