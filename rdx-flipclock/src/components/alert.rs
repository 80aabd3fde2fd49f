//! The completion alert: a descending sine "dong" with a long decay.
//!
//! The tone is rendered in software as a finite sample stream. Playing it
//! needs an `AudioContext` obtained from the injected `AudioHost`; the
//! synthesizer opens that context lazily, once per session, and resumes it
//! whenever the platform has suspended it.
//!
//! Opening a device can block, so the engine never calls the synthesizer
//! directly. It goes through an `AlertHandle`, which runs each request on the
//! blocking pool and returns at once.
//!
//! Without the `audio` feature the default host is `BellHost`, which rings the
//! terminal bell instead of playing the rendered tone. Build with
//! `--features audio` to hear the 200 Hz to 100 Hz sweep.

use crate::config::AudioConfig;
use crate::error::{FlipclockError, Result};
use std::f64::consts::TAU;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Shape of the alert tone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub start_hz: f64,
    pub end_hz: f64,
    /// Time for the pitch to fall from `start_hz` to `end_hz`.
    pub pitch_ramp: Duration,
    pub start_gain: f64,
    pub end_gain: f64,
    /// Time for the gain to decay from `start_gain` to `end_gain`.
    pub gain_ramp: Duration,
    /// Total length of the tone.
    pub length: Duration,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            start_hz: 200.0,
            end_hz: 100.0,
            pitch_ramp: Duration::from_millis(1500),
            start_gain: 1.0,
            end_gain: 0.01,
            gain_ramp: Duration::from_secs(2),
            length: Duration::from_millis(2500),
        }
    }
}

impl ToneSpec {
    pub fn frequency_at(&self, t: f64) -> f64 {
        exponential_ramp(self.start_hz, self.end_hz, t, self.pitch_ramp.as_secs_f64())
    }

    pub fn gain_at(&self, t: f64) -> f64 {
        exponential_ramp(self.start_gain, self.end_gain, t, self.gain_ramp.as_secs_f64())
    }
}

/// `from * (to / from)^(t / over)`, holding `to` once `t >= over`.
fn exponential_ramp(from: f64, to: f64, t: f64, over: f64) -> f64 {
    if t >= over || over <= 0.0 {
        to
    } else {
        from * (to / from).powf(t / over)
    }
}

/// A rendered, mono instance of a `ToneSpec`.
#[derive(Debug, Clone)]
pub struct Tone {
    spec: ToneSpec,
    sample_rate: u32,
    volume: f32,
    index: u64,
    total: u64,
    phase: f64,
}

impl Tone {
    pub fn new(spec: ToneSpec, sample_rate: u32, volume: f32) -> Self {
        let sample_rate = sample_rate.max(1);
        let total = (spec.length.as_secs_f64() * sample_rate as f64).round() as u64;
        Self {
            spec,
            sample_rate,
            volume: volume.clamp(0.0, 1.0),
            index: 0,
            total,
            phase: 0.0,
        }
    }

    pub fn spec(&self) -> &ToneSpec {
        &self.spec
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        self.spec.length
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.index >= self.total {
            return None;
        }
        let t = self.index as f64 / self.sample_rate as f64;
        let sample = self.phase.sin() * self.spec.gain_at(t) * self.volume as f64;
        // Accumulate phase so the pitch sweep stays continuous.
        let step = TAU * self.spec.frequency_at(t) / self.sample_rate as f64;
        self.phase = (self.phase + step) % TAU;
        self.index += 1;
        Some(sample as f32)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total - self.index) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Tone {}

/// Whether an audio context is currently allowed to produce sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Running,
    /// Held back by platform policy until resumed.
    Suspended,
}

/// An open audio output owned by the synthesizer.
pub trait AudioContext: Send + Sync {
    fn state(&self) -> ContextState;
    fn resume(&mut self) -> Result<()>;
    /// Queues the tone and returns without waiting for it to finish.
    fn play(&mut self, tone: Tone) -> Result<()>;
}

/// The platform audio capability.
pub trait AudioHost: Send + Sync {
    fn create_context(&self) -> Result<Box<dyn AudioContext>>;
}

/// Plays the alert and manages the session's single audio context.
pub struct AlertSynthesizer {
    host: Arc<dyn AudioHost>,
    config: AudioConfig,
    spec: ToneSpec,
    context: Option<Box<dyn AudioContext>>,
    contexts_created: usize,
}

impl AlertSynthesizer {
    pub fn new(host: Arc<dyn AudioHost>, config: AudioConfig) -> Self {
        Self {
            host,
            config,
            spec: ToneSpec::default(),
            context: None,
            contexts_created: 0,
        }
    }

    /// Number of contexts opened this session. Never exceeds one once a
    /// context has been opened successfully.
    pub fn contexts_created(&self) -> usize {
        self.contexts_created
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Prepares audio in response to a user gesture, such as starting a timer.
    pub fn prime(&mut self) {
        if !self.config.enabled {
            return;
        }
        if let Err(e) = self.running_context().map(|_| ()) {
            warn!("Audio could not be prepared: {}", e);
        }
    }

    /// Plays the alert tone. Returns `false` if audio is disabled or failed;
    /// failure is logged and otherwise ignored.
    pub fn sound_alert(&mut self) -> bool {
        if !self.config.enabled {
            debug!("Audio disabled; skipping alert tone.");
            return false;
        }
        let tone = Tone::new(self.spec, self.config.sample_rate, self.config.volume);
        match self.running_context().and_then(|context| context.play(tone)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Alert tone not played: {}", e);
                false
            }
        }
    }

    fn running_context(&mut self) -> Result<&mut Box<dyn AudioContext>> {
        if self.context.is_none() {
            let context = self.host.create_context()?;
            self.contexts_created += 1;
            info!("Audio context opened.");
            self.context = Some(context);
        }
        let context = self
            .context
            .as_mut()
            .ok_or_else(|| FlipclockError::Audio("audio context missing".to_string()))?;
        if context.state() == ContextState::Suspended {
            debug!("Resuming suspended audio context.");
            context.resume()?;
        }
        Ok(context)
    }
}

/// A shared, non-blocking front for an `AlertSynthesizer`.
///
/// Requests made inside a tokio runtime run on the blocking pool and are not
/// awaited. Outside a runtime they run inline.
#[derive(Clone)]
pub struct AlertHandle {
    synth: Arc<Mutex<AlertSynthesizer>>,
}

impl AlertHandle {
    pub fn new(synth: AlertSynthesizer) -> Self {
        Self {
            synth: Arc::new(Mutex::new(synth)),
        }
    }

    /// Queues `AlertSynthesizer::prime`.
    pub fn prime(&self) {
        self.dispatch(|synth| synth.prime());
    }

    /// Queues `AlertSynthesizer::sound_alert`.
    pub fn sound(&self) {
        self.dispatch(|synth| {
            synth.sound_alert();
        });
    }

    /// Number of contexts opened so far. Waits for any queued request that
    /// is still running.
    pub async fn contexts_created(&self) -> usize {
        let synth = self.synth.clone();
        tokio::task::spawn_blocking(move || lock(&synth).contexts_created())
            .await
            .unwrap_or_default()
    }

    fn dispatch<F>(&self, job: F)
    where
        F: FnOnce(&mut AlertSynthesizer) + Send + 'static,
    {
        let synth = self.synth.clone();
        let run = move || job(&mut lock(&synth));
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(run);
            }
            Err(_) => run(),
        }
    }
}

fn lock(synth: &Mutex<AlertSynthesizer>) -> MutexGuard<'_, AlertSynthesizer> {
    synth.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A host with no audio capability. Every alert silently degrades.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioHost;

impl AudioHost for NullAudioHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        Err(FlipclockError::Audio("no audio capability".to_string()))
    }
}

/// Falls back to the terminal bell when no audio device is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct BellHost;

impl AudioHost for BellHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>> {
        Ok(Box::new(BellContext))
    }
}

struct BellContext;

impl AudioContext for BellContext {
    fn state(&self) -> ContextState {
        ContextState::Running
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn play(&mut self, _tone: Tone) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(b"\x07")
            .and_then(|_| stdout.flush())
            .map_err(|e| FlipclockError::Audio(e.to_string()))
    }
}
