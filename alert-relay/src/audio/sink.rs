//! Looping playback sinks
//!
//! [`AudioSink`] is the seam between the alarm controller and the audio
//! backend. [`CpalSink`] owns an [`OutputDevice`] on a dedicated audio
//! thread and drives it with play/halt commands; the cpal stream never
//! leaves that thread.

use crate::audio::output::AudioOutput;
use crate::audio::resampler::Resampler;
use crate::audio::types::{AudioClip, LoopingSource};
use crate::error::{Error, Result};
use std::sync::mpsc;
use std::thread;
use tracing::{debug, info, warn};

/// Output that can loop one clip at a time.
///
/// `play_looped` replaces whatever is currently playing, so at most one
/// clip is ever audible.
pub trait AudioSink: Send + Sync {
    /// Start looping `clip` indefinitely, replacing any current loop.
    fn play_looped(&self, clip: AudioClip) -> Result<()>;

    /// Halt playback. Halting an idle sink is not an error.
    fn halt(&self) -> Result<()>;

    /// Human-readable description of the output
    fn describe(&self) -> String;
}

/// Device driven by the audio thread.
///
/// Implementations only start and stop a stream; replacing a running
/// stream is the audio thread's job.
pub trait OutputDevice {
    fn device_name(&self) -> String;

    fn sample_rate(&self) -> u32;

    fn is_running(&self) -> bool;

    /// Start a stream pulling frames from `source`
    fn play(&mut self, source: LoopingSource) -> Result<()>;

    /// Stop the stream, if any
    fn stop(&mut self) -> Result<()>;
}

impl OutputDevice for AudioOutput {
    fn device_name(&self) -> String {
        AudioOutput::device_name(self)
    }

    fn sample_rate(&self) -> u32 {
        AudioOutput::sample_rate(self)
    }

    fn is_running(&self) -> bool {
        AudioOutput::is_running(self)
    }

    fn play(&mut self, mut source: LoopingSource) -> Result<()> {
        self.start(move || source.next_frame())
    }

    fn stop(&mut self) -> Result<()> {
        AudioOutput::stop(self)
    }
}

enum OutputCommand {
    Play {
        clip: AudioClip,
        reply: mpsc::Sender<Result<()>>,
    },
    Halt {
        reply: mpsc::Sender<Result<()>>,
    },
}

/// Sink backed by an output device on its own thread.
pub struct CpalSink {
    commands: mpsc::Sender<OutputCommand>,
    device_name: String,
    sample_rate: u32,
}

impl CpalSink {
    /// Spawn the audio thread and open the cpal output device on it.
    ///
    /// Returns once the device is open, or with the error that prevented it.
    pub fn open(device_name: Option<String>, volume: f32) -> Result<Self> {
        Self::spawn(move || AudioOutput::new(device_name.as_deref(), volume))
    }

    /// Spawn the audio thread, running `open_device` on it.
    fn spawn<O, F>(open_device: F) -> Result<Self>
    where
        O: OutputDevice,
        F: FnOnce() -> Result<O> + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel::<OutputCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(String, u32)>>();

        thread::Builder::new()
            .name("alarm-audio".to_string())
            .spawn(move || {
                let output = match open_device() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok((output.device_name(), output.sample_rate())));
                run_audio_thread(output, command_rx);
            })
            .map_err(|e| Error::AudioOutput(format!("Failed to spawn audio thread: {}", e)))?;

        let (device_name, sample_rate) = ready_rx.recv().map_err(|_| {
            Error::AudioOutput("Audio thread exited during initialization".to_string())
        })??;

        Ok(Self {
            commands: command_tx,
            device_name,
            sample_rate,
        })
    }

    fn request(&self, build: impl FnOnce(mpsc::Sender<Result<()>>) -> OutputCommand) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(build(reply_tx))
            .map_err(|_| Error::AudioOutput("Audio thread is not running".to_string()))?;
        reply_rx
            .recv()
            .map_err(|_| Error::AudioOutput("Audio thread dropped the request".to_string()))?
    }
}

impl AudioSink for CpalSink {
    fn play_looped(&self, clip: AudioClip) -> Result<()> {
        let clip = Resampler::conform(clip, self.sample_rate)?;
        self.request(|reply| OutputCommand::Play { clip, reply })
    }

    fn halt(&self) -> Result<()> {
        self.request(|reply| OutputCommand::Halt { reply })
    }

    fn describe(&self) -> String {
        format!("{} @ {}Hz", self.device_name, self.sample_rate)
    }
}

/// Audio thread loop: owns the output until every `CpalSink` handle is gone.
fn run_audio_thread<O: OutputDevice>(mut output: O, commands: mpsc::Receiver<OutputCommand>) {
    info!("Audio thread ready on {}", output.device_name());

    while let Ok(command) = commands.recv() {
        match command {
            OutputCommand::Play { clip, reply } => {
                let _ = reply.send(replace_loop(&mut output, clip));
            }
            OutputCommand::Halt { reply } => {
                let _ = reply.send(output.stop());
            }
        }
    }

    if let Err(e) = output.stop() {
        warn!("Failed to stop audio output on shutdown: {}", e);
    }
    debug!("Audio thread exiting");
}

/// Stop any running stream, then start looping `clip`
fn replace_loop<O: OutputDevice>(output: &mut O, clip: AudioClip) -> Result<()> {
    if output.is_running() {
        debug!("Replacing running loop");
        output.stop()?;
    }
    output.play(LoopingSource::new(clip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Device double that logs calls and counts live streams
    struct FakeOutput {
        log: Arc<Mutex<Vec<&'static str>>>,
        streams: Arc<Mutex<usize>>,
        sample_rate: u32,
    }

    impl OutputDevice for FakeOutput {
        fn device_name(&self) -> String {
            "fake".to_string()
        }

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn is_running(&self) -> bool {
            *self.streams.lock().unwrap() > 0
        }

        fn play(&mut self, _source: LoopingSource) -> Result<()> {
            self.log.lock().unwrap().push("play");
            *self.streams.lock().unwrap() += 1;
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.log.lock().unwrap().push("stop");
            *self.streams.lock().unwrap() = 0;
            Ok(())
        }
    }

    fn fake_sink() -> (CpalSink, Arc<Mutex<Vec<&'static str>>>, Arc<Mutex<usize>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let streams = Arc::new(Mutex::new(0));
        let output = FakeOutput {
            log: Arc::clone(&log),
            streams: Arc::clone(&streams),
            sample_rate: 48000,
        };
        let sink = CpalSink::spawn(move || Ok(output)).unwrap();
        (sink, log, streams)
    }

    fn clip() -> AudioClip {
        AudioClip::new(vec![0.1, -0.1, 0.2, -0.2], 48000, 1)
    }

    #[test]
    fn test_play_while_running_stops_old_stream_first() {
        let (sink, log, streams) = fake_sink();

        sink.play_looped(clip()).unwrap();
        sink.play_looped(clip()).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["play", "stop", "play"]);
        assert_eq!(*streams.lock().unwrap(), 1);
    }

    #[test]
    fn test_halt_stops_stream() {
        let (sink, log, streams) = fake_sink();

        sink.play_looped(clip()).unwrap();
        sink.halt().unwrap();
        sink.halt().unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["play", "stop", "stop"]);
        assert_eq!(*streams.lock().unwrap(), 0);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let result = CpalSink::spawn::<FakeOutput, _>(|| {
            Err(Error::AudioOutput("no device".to_string()))
        });
        assert!(matches!(result, Err(Error::AudioOutput(_))));
    }

    #[test]
    fn test_describe_uses_device_rate() {
        let (sink, _, _) = fake_sink();
        assert_eq!(sink.describe(), "fake @ 48000Hz");
    }
}
