//! Core audio data types
//!
//! Decoded clips and the looping frame source fed to the output callback.

use std::sync::Arc;

/// Decoded audio held fully in RAM.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Interleaved: [ch0, ch1, ..., ch0, ch1, ...]
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved PCM samples
    pub samples: Arc<[f32]>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Channel count in the interleaved data
    pub channels: u16,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count() as u64 * 1000) / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }
}

/// Single stereo audio frame (left and right channels).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Endless frame source over a clip.
///
/// Mono clips are duplicated to both channels; clips with more than two
/// channels contribute their first two. An empty clip yields silence.
pub struct LoopingSource {
    clip: AudioClip,
    frame: usize,
}

impl LoopingSource {
    pub fn new(clip: AudioClip) -> Self {
        Self { clip, frame: 0 }
    }

    /// Next frame, wrapping to the clip start after the last one.
    pub fn next_frame(&mut self) -> AudioFrame {
        let frames = self.clip.frame_count();
        if frames == 0 {
            return AudioFrame::zero();
        }

        let channels = self.clip.channels as usize;
        let base = self.frame * channels;
        let left = self.clip.samples[base];
        let right = if channels > 1 {
            self.clip.samples[base + 1]
        } else {
            left
        };

        self.frame = (self.frame + 1) % frames;
        AudioFrame { left, right }
    }

    /// Frame index that will be produced next
    pub fn position(&self) -> usize {
        self.frame
    }
}
