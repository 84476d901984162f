/// Single-channel isolation for inspection and export

use crate::data::buffer::{Channel, ImageBuffer, CHANNELS};

/// Keep only the selected channel, zeroing the other two.
/// `Channel::Original` returns an untouched copy.
pub fn isolate(buffer: &ImageBuffer, channel: Channel) -> ImageBuffer {
    let idx = match channel.index() {
        Some(i) => i,
        None => return buffer.clone(),
    };

    let mut out = vec![0u8; buffer.as_raw().len()];
    for (dst, src) in out
        .chunks_exact_mut(CHANNELS)
        .zip(buffer.as_raw().chunks_exact(CHANNELS))
    {
        dst[idx] = src[idx];
    }
    buffer.with_data(out)
}
