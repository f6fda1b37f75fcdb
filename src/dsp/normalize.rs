//! Peak normalization
//!
//! Scales a buffer so its loudest sample reaches full scale. Buffers that
//! already reach or exceed full scale are never amplified, and silent
//! buffers are left alone.
//!
//! A peak within `2 * f32::EPSILON` below 1.0 is treated as full scale and
//! left unscaled. Any lower peak is scaled by `1 / peak`.

use crate::engine::PcmBuffer;

/// Peaks this close below 1.0 count as full scale, so a normalized buffer
/// is a fixed point of [`normalize`] despite `x * (1 / x)` rounding.
const FULL_SCALE_TOLERANCE: f32 = 2.0 * f32::EPSILON;

/// What [`normalize`] did to a buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizeOutcome {
    /// Every sample was multiplied by `gain` (`1.0 / peak`)
    Scaled { gain: f32 },
    /// Peak was already at or above 1.0; buffer unchanged
    AlreadyFullScale { peak: f32 },
    /// Peak was zero; scaling skipped
    SilentBufferNoOp,
}

/// Peak-normalize every channel of `buffer`
///
/// # Returns
/// The (possibly rescaled) buffer, same shape as the input, and the
/// outcome.
pub fn normalize(buffer: PcmBuffer) -> (PcmBuffer, NormalizeOutcome) {
    let peak = buffer.peak();

    if peak >= 1.0 - FULL_SCALE_TOLERANCE {
        return (buffer, NormalizeOutcome::AlreadyFullScale { peak });
    }

    if peak <= 0.0 {
        log::debug!("Silent buffer, skipping normalization");
        return (buffer, NormalizeOutcome::SilentBufferNoOp);
    }

    let gain = 1.0 / peak;
    (buffer.scaled(gain), NormalizeOutcome::Scaled { gain })
}
