//! Signal processing stages
//!
//! Channel reduction, normalization and quantization, plus the pipeline
//! that sequences them behind the external resampler.

pub mod channels;
pub mod normalize;
pub mod pipeline;
pub mod quantize;

pub use channels::reduce_channels;
pub use normalize::{normalize, NormalizeOutcome};
pub use pipeline::{convert, render_wav, transcode};
pub use quantize::{quantize, quantize_buffer};
