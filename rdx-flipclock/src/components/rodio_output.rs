//! Plays the alert tone through the default output device with rodio.
//!
//! rodio's `OutputStream` is neither `Send` nor `Sync`, so each context owns a
//! dedicated audio thread and receives tones over a bounded channel.

use crate::components::alert::{AudioContext, AudioHost, ContextState, Tone};
use crate::error::{FlipclockError, Result};
use rodio::{OutputStream, Sink, Source};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

impl Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        Tone::sample_rate(self)
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration())
    }
}

/// Opens the system's default audio device.
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioHost;

impl AudioHost for RodioHost {
    /// Starts the audio thread and returns without waiting for the device.
    /// If the device cannot be opened the thread exits, and the next `play`
    /// reports the failure.
    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        let (tone_tx, tone_rx) = mpsc::sync_channel::<Tone>(4);

        thread::Builder::new()
            .name("flipclock-audio".to_string())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        warn!("Failed to open audio output: {}", e);
                        return;
                    }
                };

                while let Ok(tone) = tone_rx.recv() {
                    match Sink::try_new(&handle) {
                        Ok(sink) => {
                            sink.append(tone);
                            sink.detach();
                        }
                        Err(e) => debug!("Failed to open audio sink: {}", e),
                    }
                }
            })
            .map_err(|e| FlipclockError::Audio(e.to_string()))?;

        Ok(Box::new(RodioContext { tones: tone_tx }))
    }
}

struct RodioContext {
    tones: mpsc::SyncSender<Tone>,
}

impl AudioContext for RodioContext {
    fn state(&self) -> ContextState {
        ContextState::Running
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn play(&mut self, tone: Tone) -> Result<()> {
        self.tones
            .try_send(tone)
            .map_err(|e| match e {
                mpsc::TrySendError::Disconnected(_) => {
                    FlipclockError::Audio("audio output is unavailable".to_string())
                }
                mpsc::TrySendError::Full(_) => {
                    FlipclockError::Audio("audio queue is full".to_string())
                }
            })
    }
}
