/// Fit-to-viewport scaling for display
///
/// Images are only ever shrunk to fit; an image that already fits is shown
/// at its native size. Downsampling uses area averaging so that thin
/// features (e.g. a 1 px line) fade instead of disappearing.

use crate::data::buffer::{ImageBuffer, CHANNELS};

/// Smallest viewport edge (in pixels) worth rendering into
pub const MIN_VIEWPORT: u32 = 2;

/// Scale factor that fits `width × height` inside the viewport, never above 1.0
pub fn fit_scale(width: u32, height: u32, viewport_width: u32, viewport_height: u32) -> f64 {
    let sx = viewport_width as f64 / width as f64;
    let sy = viewport_height as f64 / height as f64;
    sx.min(sy).min(1.0)
}

/// Resample `buffer` so it fits the viewport, preserving aspect ratio.
/// Returns `None` for a degenerate viewport.
pub fn fit_to_viewport(
    buffer: &ImageBuffer,
    viewport_width: u32,
    viewport_height: u32,
) -> Option<ImageBuffer> {
    if viewport_width < MIN_VIEWPORT || viewport_height < MIN_VIEWPORT {
        return None;
    }

    let (w, h) = buffer.dimensions();
    let scale = fit_scale(w, h, viewport_width, viewport_height);
    if scale >= 1.0 {
        return Some(buffer.clone());
    }

    let new_w = ((w as f64 * scale).round() as u32).clamp(1, w);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, h);
    if (new_w, new_h) == (w, h) {
        return Some(buffer.clone());
    }

    log::debug!("Fit {}×{} → {}×{} (scale {:.3})", w, h, new_w, new_h, scale);
    Some(area_resize(buffer, new_w, new_h))
}

/// One destination sample's source contributions: (source index, weight)
type Taps = Vec<(usize, f32)>;

/// Box-filter taps for shrinking `src_len` samples to `dst_len`.
/// Each destination cell averages the source cells it covers, weighting
/// partially covered cells by their overlap.
fn area_taps(src_len: u32, dst_len: u32) -> Vec<Taps> {
    let ratio = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * ratio;
            let end = ((i + 1) as f64 * ratio).min(src_len as f64);
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len as usize);
            (first..last)
                .filter_map(|j| {
                    let overlap = (end.min((j + 1) as f64) - start.max(j as f64)) / ratio;
                    (overlap > 0.0).then_some((j, overlap as f32))
                })
                .collect()
        })
        .collect()
}

/// Area-averaging resize to an exact size no larger than the source
fn area_resize(buffer: &ImageBuffer, new_w: u32, new_h: u32) -> ImageBuffer {
    let (w, h) = buffer.dimensions();
    let src = buffer.as_raw();
    let x_taps = area_taps(w, new_w);
    let y_taps = area_taps(h, new_h);

    // Horizontal pass: h rows × new_w columns
    let mid_stride = new_w as usize * CHANNELS;
    let mut mid = vec![0f32; h as usize * mid_stride];
    for (y, row) in src.chunks_exact(buffer.stride()).enumerate() {
        let out_row = &mut mid[y * mid_stride..(y + 1) * mid_stride];
        for (x, taps) in x_taps.iter().enumerate() {
            let mut acc = [0f32; CHANNELS];
            for &(sx, wgt) in taps {
                let px = &row[sx * CHANNELS..(sx + 1) * CHANNELS];
                for c in 0..CHANNELS {
                    acc[c] += px[c] as f32 * wgt;
                }
            }
            out_row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
        }
    }

    // Vertical pass
    let mut out = vec![0u8; new_h as usize * mid_stride];
    for (y, taps) in y_taps.iter().enumerate() {
        let out_row = &mut out[y * mid_stride..(y + 1) * mid_stride];
        for (i, sample) in out_row.iter_mut().enumerate() {
            let v: f32 = taps
                .iter()
                .map(|&(sy, wgt)| mid[sy * mid_stride + i] * wgt)
                .sum();
            *sample = v.round().clamp(0.0, 255.0) as u8;
        }
    }

    match ImageBuffer::new(new_w, new_h, out) {
        Ok(img) => img,
        Err(e) => {
            log::error!("Resize produced an inconsistent buffer: {}", e);
            buffer.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_viewport_returns_none() {
        let img = ImageBuffer::filled(4, 4, [10, 20, 30]).unwrap();
        assert!(fit_to_viewport(&img, 1, 1).is_none());
        assert!(fit_to_viewport(&img, 100, 1).is_none());
        assert!(fit_to_viewport(&img, 0, 100).is_none());
    }

    #[test]
    fn test_never_upscales() {
        let img = ImageBuffer::filled(30, 20, [1, 2, 3]).unwrap();
        let out = fit_to_viewport(&img, 1000, 800).unwrap();
        assert_eq!(out.dimensions(), (30, 20));
        assert_eq!(out, img);

        let exact = fit_to_viewport(&img, 30, 20).unwrap();
        assert_eq!(exact.dimensions(), (30, 20));
    }

    #[test]
    fn test_shrinks_preserving_aspect() {
        let img = ImageBuffer::filled(400, 200, [0, 0, 0]).unwrap();
        let out = fit_to_viewport(&img, 100, 100).unwrap();
        assert_eq!(out.dimensions(), (100, 50));

        let tall = ImageBuffer::filled(200, 400, [0, 0, 0]).unwrap();
        let out = fit_to_viewport(&tall, 300, 100).unwrap();
        assert_eq!(out.dimensions(), (50, 100));
    }

    #[test]
    fn test_result_never_larger_than_source() {
        let img = ImageBuffer::filled(7, 3, [5, 5, 5]).unwrap();
        for (vw, vh) in [(2, 2), (3, 100), (100, 2), (6, 3), (7, 2)] {
            let out = fit_to_viewport(&img, vw, vh).unwrap();
            assert!(out.width() <= 7 && out.height() <= 3);
            assert!(out.width() <= vw.max(1) && out.height() <= vh.max(1));
        }
    }

    #[test]
    fn test_area_average_of_checkerboard() {
        let mut data = Vec::new();
        for y in 0..4u32 {
            for x in 0..4u32 {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        let img = ImageBuffer::new(4, 4, data).unwrap();
        let out = fit_to_viewport(&img, 2, 2).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        for s in out.as_raw() {
            assert!((*s as i32 - 128).abs() <= 1, "sample {}", s);
        }
    }

    #[test]
    fn test_uniform_colour_survives_fractional_scale() {
        let img = ImageBuffer::filled(10, 10, [40, 80, 120]).unwrap();
        let out = fit_to_viewport(&img, 3, 3).unwrap();
        assert_eq!(out.dimensions(), (3, 3));
        for px in out.as_raw().chunks(3) {
            assert_eq!(px, [40, 80, 120]);
        }
    }

    #[test]
    fn test_fit_scale_clamped() {
        assert_eq!(fit_scale(10, 10, 50, 50), 1.0);
        assert_eq!(fit_scale(100, 50, 50, 50), 0.5);
    }
}
