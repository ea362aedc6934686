//! Alarm player
//!
//! Process-wide alarm controller with two states, `Idle` and `Playing`.
//! Shared by handle (`Arc<AlarmPlayer>`) between the HTTP layer and the
//! event channel.
//!
//! `start` decodes the configured asset and loops it on the audio sink.
//! It is meant to run fire-and-forget via [`AlarmPlayer::trigger`]; its
//! failures are only logged. `stop` is the only operation whose errors reach
//! a caller.
//!
//! Every `stop` bumps a generation counter. A `start` that began decoding
//! before a stop sees the new generation and does not play. Sink calls
//! (play and halt) are serialized, so a halt can never land between a play
//! and the state change that records it.

use crate::audio::{AudioClip, AudioSink, SimpleDecoder};
use crate::error::{Error, Result};
use crate::state::SharedState;
use alert_common::events::ServerEvent;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Alarm playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Idle,
    Playing,
}

#[derive(Debug)]
struct Status {
    state: AlarmState,
    /// Number of stops so far
    generation: u64,
}

/// Alarm controller
pub struct AlarmPlayer {
    sound_path: PathBuf,
    /// None when the audio subsystem failed to initialize
    output: Option<Arc<dyn AudioSink>>,
    status: Mutex<Status>,
    /// Held across every sink call
    transition: Mutex<()>,
    shared: Arc<SharedState>,
}

impl AlarmPlayer {
    pub fn new(
        sound_path: impl Into<PathBuf>,
        output: Option<Arc<dyn AudioSink>>,
        shared: Arc<SharedState>,
    ) -> Self {
        Self {
            sound_path: sound_path.into(),
            output,
            status: Mutex::new(Status {
                state: AlarmState::Idle,
                generation: 0,
            }),
            transition: Mutex::new(()),
            shared,
        }
    }

    /// True if an audio output was available at startup
    pub fn is_initialized(&self) -> bool {
        self.output.is_some()
    }

    pub fn state(&self) -> AlarmState {
        self.lock_status().state
    }

    pub fn sound_path(&self) -> &Path {
        &self.sound_path
    }

    /// Start looping the alarm sound (`Idle -> Playing`).
    ///
    /// No-op if already playing, or if a stop arrives while the asset is
    /// being decoded. Blocking: decodes the asset on the calling thread.
    ///
    /// # Errors
    /// - `Playback` if the audio subsystem is not initialized
    /// - `NotFound` if the alarm asset is missing
    /// - `Decode` / `AudioOutput` on lower-level audio failures
    pub fn start(&self) -> Result<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            Error::Playback("Audio subsystem is not initialized".to_string())
        })?;

        let generation = {
            let status = self.lock_status();
            if status.state == AlarmState::Playing {
                debug!("Alarm already playing, ignoring start");
                return Ok(());
            }
            status.generation
        };

        if !self.sound_path.exists() {
            return Err(Error::NotFound(format!(
                "Alarm sound file {}",
                self.sound_path.display()
            )));
        }

        let clip = SimpleDecoder::decode_file(&self.sound_path)?;
        self.commit_start(output.as_ref(), generation, clip)
    }

    /// Play `clip` unless a stop happened since `generation` was read or
    /// another start already won.
    fn commit_start(&self, output: &dyn AudioSink, generation: u64, clip: AudioClip) -> Result<()> {
        let _transition = self.lock_transition();

        {
            let status = self.lock_status();
            if status.generation != generation {
                info!("Alarm stopped while starting, not playing");
                return Ok(());
            }
            if status.state == AlarmState::Playing {
                debug!("Alarm started concurrently, ignoring start");
                return Ok(());
            }
        }

        output.play_looped(clip)?;
        self.lock_status().state = AlarmState::Playing;

        info!("Alarm playing: {}", self.sound_path.display());
        self.shared.broadcast_event(ServerEvent::AlarmStarted {
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    /// Start playback on the blocking worker pool without waiting for it.
    ///
    /// The returned handle may be dropped; it exists so callers that care
    /// (tests) can observe completion. Failures are logged, never returned.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<()> {
        let player = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = player.start() {
                match e {
                    Error::NotFound(_) => warn!("Alarm not started: {}", e),
                    ref e if e.is_playback_failure() => error!("Alarm playback failed: {}", e),
                    _ => error!("Alarm start failed: {}", e),
                }
            }
        })
    }

    /// Halt playback unconditionally (`Playing -> Idle`).
    ///
    /// Stopping an idle alarm is not an error; only a missing audio
    /// subsystem is. Any start still decoding is cancelled.
    pub fn stop(&self) -> Result<()> {
        let output = self.output.as_ref().ok_or_else(|| {
            Error::InvalidState("Alarm is not active: audio subsystem not initialized".to_string())
        })?;

        let _transition = self.lock_transition();
        {
            let mut status = self.lock_status();
            status.generation = status.generation.wrapping_add(1);
        }

        output.halt()?;

        let previous = std::mem::replace(&mut self.lock_status().state, AlarmState::Idle);
        if previous == AlarmState::Playing {
            info!("Alarm stopped");
            self.shared.broadcast_event(ServerEvent::AlarmStopped {
                timestamp: chrono::Utc::now(),
            });
        } else {
            debug!("Stop requested while alarm idle");
        }

        Ok(())
    }

    // Both locks guard plain data; a poisoned lock still holds a valid value
    fn lock_status(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
