//! Audio sink double that never touches a device

use alert_relay::audio::{AudioClip, AudioSink};
use alert_relay::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Records play/halt calls and how many loops would be audible.
///
/// Every `play_looped` adds a loop and only `halt` silences them, so a
/// caller that plays twice without halting shows up as two audible loops.
#[derive(Default)]
pub struct RecordingSink {
    plays: AtomicUsize,
    halts: AtomicUsize,
    audible: Mutex<usize>,
    max_audible: AtomicUsize,
}

impl RecordingSink {
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn halts(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }

    /// Loops audible right now
    pub fn audible(&self) -> usize {
        *self.audible.lock().unwrap()
    }

    /// Highest number of simultaneously audible loops ever observed
    pub fn max_audible(&self) -> usize {
        self.max_audible.load(Ordering::SeqCst)
    }
}

impl AudioSink for RecordingSink {
    fn play_looped(&self, clip: AudioClip) -> Result<()> {
        assert!(!clip.is_empty(), "sink asked to loop an empty clip");
        self.plays.fetch_add(1, Ordering::SeqCst);

        let mut audible = self.audible.lock().unwrap();
        *audible += 1;
        self.max_audible.fetch_max(*audible, Ordering::SeqCst);
        Ok(())
    }

    fn halt(&self) -> Result<()> {
        self.halts.fetch_add(1, Ordering::SeqCst);
        *self.audible.lock().unwrap() = 0;
        Ok(())
    }

    fn describe(&self) -> String {
        "recording sink".to_string()
    }
}
