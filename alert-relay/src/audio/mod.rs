//! Audio subsystem: decode the alarm asset and loop it on the output device
//!
//! **Architecture:** symphonia (decode) + rubato (resample) + cpal (output)

pub mod decoder;
pub mod output;
pub mod resampler;
pub mod sink;
pub mod types;

pub use decoder::SimpleDecoder;
pub use sink::{AudioSink, CpalSink, OutputDevice};
pub use types::{AudioClip, AudioFrame, LoopingSource};
