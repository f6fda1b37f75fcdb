//! Channel reduction
//!
//! Collapses a stereo buffer to mono according to a [`ChannelMode`].

use crate::engine::{ChannelMode, PcmBuffer};

/// Reduce `buffer` to one channel unless `mode` is `Both`
///
/// Mono buffers and `Both` pass through untouched. `Left` and `Right`
/// copy channel 0 or 1; `Mix` averages them.
pub fn reduce_channels(buffer: PcmBuffer, mode: ChannelMode) -> PcmBuffer {
    if mode == ChannelMode::Both || buffer.num_channels() < 2 {
        return buffer;
    }

    let sample_rate = buffer.sample_rate();
    let mut channels = buffer.into_channels();
    let right = channels.swap_remove(1);
    let left = channels.swap_remove(0);

    let reduced = match mode {
        ChannelMode::Left => left,
        ChannelMode::Right => right,
        ChannelMode::Mix | ChannelMode::Both => left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| (l + r) / 2.0)
            .collect(),
    };

    PcmBuffer::from_parts(vec![reduced], sample_rate)
}
