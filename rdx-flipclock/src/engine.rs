//! The core engine that owns the display state and drives it.
//!
//! All display state lives behind one lock, so the clock refresh, the
//! countdown decrement, and user requests never interleave mid-update. Audio
//! sits outside that lock behind an `AlertHandle`, so a slow device open never
//! holds up a refresh. Each recurring
//! or delayed piece of work is a tokio task whose handle is kept in a slot
//! map; starting or stopping a timer aborts the handles it supersedes, and the
//! countdown's generation counter turns any straggler into a no-op.

use crate::common::{Preset, TaskId, TaskKind};
use crate::components::alert::{AlertHandle, AlertSynthesizer, AudioHost};
use crate::components::countdown::{Countdown, TimerState};
use crate::components::responder::{CompletionResponder, FlashWindow};
use crate::config::FlipclockConfig;
use crate::display::{select_display, DisplayFrame};
use crate::error::Result;
use crate::events::{FrameEvent, SystemEvent, TimerEvent};
use crate::time::{SystemClock, SystemTimeSource, TickEvent, TimeSource, CLOCK_PERIOD};
use crate::window::{HeadlessWindow, WindowHost};
use chrono::NaiveDateTime;
use slotmap::SlotMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// The countdown decrement period.
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// A copy of the countdown state in the flat shape renderers expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub active: bool,
    pub remaining_seconds: u32,
    pub duration_seconds: u32,
    pub flashing: bool,
    pub is_timer_mode: bool,
}

impl From<TimerState> for TimerSnapshot {
    fn from(state: TimerState) -> Self {
        Self {
            active: state.is_active(),
            remaining_seconds: state.remaining_seconds(),
            duration_seconds: state.duration_seconds(),
            flashing: state.is_flashing(),
            is_timer_mode: state.is_timer_mode(),
        }
    }
}

struct EngineState {
    clock_time: NaiveDateTime,
    countdown: Countdown,
}

struct ScheduledTask {
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Assembles a `FlipclockEngine` with injected collaborators.
pub struct EngineBuilder {
    config: FlipclockConfig,
    time_source: Option<Arc<dyn TimeSource>>,
    audio_host: Option<Arc<dyn AudioHost>>,
    window: Option<Arc<dyn WindowHost>>,
}

impl EngineBuilder {
    /// Replaces the system wall clock.
    pub fn time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = Some(time_source);
        self
    }

    /// Replaces the platform audio capability.
    pub fn audio_host(mut self, audio_host: Arc<dyn AudioHost>) -> Self {
        self.audio_host = Some(audio_host);
        self
    }

    /// Attaches the host window used for fullscreen requests.
    pub fn window_host(mut self, window: Arc<dyn WindowHost>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn build(self) -> FlipclockEngine {
        const CHANNEL_CAPACITY: usize = 256;
        let (tick_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (frame_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (system_event_sender, _) = broadcast::channel(64);
        let (timer_event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        let time_source = self
            .time_source
            .unwrap_or_else(|| Arc::new(SystemTimeSource::new(self.config.timezone)));
        let audio_host = self.audio_host.unwrap_or_else(default_audio_host);
        let window = self.window.unwrap_or_else(|| Arc::new(HeadlessWindow));

        let state = EngineState {
            clock_time: time_source.now(),
            countdown: Countdown::new(),
        };
        let alert = AlertHandle::new(AlertSynthesizer::new(
            audio_host,
            self.config.audio.clone(),
        ));

        FlipclockEngine {
            config: Arc::new(self.config),
            time_source,
            window,
            responder: CompletionResponder::default(),
            alert,
            state: Arc::new(RwLock::new(state)),
            tasks: Arc::new(Mutex::new(SlotMap::with_key())),
            tick_sender,
            frame_sender,
            system_event_sender,
            timer_event_sender,
        }
    }
}

#[cfg(feature = "audio")]
fn default_audio_host() -> Arc<dyn AudioHost> {
    Arc::new(crate::components::rodio_output::RodioHost)
}

#[cfg(not(feature = "audio"))]
fn default_audio_host() -> Arc<dyn AudioHost> {
    Arc::new(crate::components::alert::BellHost)
}

/// The main Flipclock engine.
///
/// Cloning is cheap and every clone drives the same display.
#[derive(Clone)]
pub struct FlipclockEngine {
    config: Arc<FlipclockConfig>,
    time_source: Arc<dyn TimeSource>,
    window: Arc<dyn WindowHost>,
    responder: CompletionResponder,
    alert: AlertHandle,
    state: Arc<RwLock<EngineState>>,
    tasks: Arc<Mutex<SlotMap<TaskId, ScheduledTask>>>,

    // --- Senders for each public event category ---
    tick_sender: broadcast::Sender<Arc<TickEvent>>,
    frame_sender: broadcast::Sender<FrameEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
    timer_event_sender: broadcast::Sender<TimerEvent>,
}

// Core implementation block for internal logic.
impl FlipclockEngine {
    /// Creates an engine with the system clock, the default audio host, and
    /// no window attached.
    pub fn new(config: FlipclockConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: FlipclockConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            time_source: None,
            audio_host: None,
            window: None,
        }
    }

    pub fn config(&self) -> &FlipclockConfig {
        &self.config
    }

    fn spawn_into<F>(
        &self,
        tasks: &mut SlotMap<TaskId, ScheduledTask>,
        kind: TaskKind,
        future: F,
    ) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tasks.retain(|_, task| !task.handle.is_finished());
        let handle = tokio::spawn(future);
        let id = tasks.insert(ScheduledTask { kind, handle });
        trace!("Scheduled {:?} task {:?}.", kind, id);
        self.system_event_sender
            .send(SystemEvent::TaskScheduled { id, kind })
            .ok();
        id
    }

    async fn schedule<F>(&self, kind: TaskKind, future: F) -> TaskId
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        self.spawn_into(&mut tasks, kind, future)
    }

    /// Aborts every live task of `kind`.
    async fn cancel(&self, kind: TaskKind) {
        let mut tasks = self.tasks.lock().await;
        let ids: Vec<TaskId> = tasks
            .iter()
            .filter(|(_, task)| task.kind == kind)
            .map(|(id, _)| id)
            .collect();
        for id in ids {
            if let Some(task) = tasks.remove(id) {
                if !task.handle.is_finished() {
                    task.handle.abort();
                    debug!("Cancelled {:?} task {:?}.", kind, id);
                    self.system_event_sender
                        .send(SystemEvent::TaskCancelled { id, kind })
                        .ok();
                }
            }
        }
    }

    /// Selects the current frame and broadcasts it.
    async fn render(&self) -> DisplayFrame {
        let (frame, clock_time) = {
            let state = self.state.read().await;
            (
                select_display(&state.clock_time, &state.countdown.state()),
                state.clock_time,
            )
        };
        self.frame_sender
            .send(FrameEvent {
                frame: frame.clone(),
                clock_time,
            })
            .ok();
        frame
    }

    async fn on_clock_tick(&self, tick: TickEvent) {
        self.state.write().await.clock_time = tick.now;
        self.tick_sender.send(Arc::new(tick)).ok();
        self.render().await;
    }

    /// Decrements the countdown once per period until it completes or its
    /// lifecycle is superseded.
    async fn countdown_loop(self, generation: u64) {
        let start = Instant::now() + COUNTDOWN_PERIOD;
        let mut ticker = tokio::time::interval_at(start, COUNTDOWN_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let completed = {
                let mut state = self.state.write().await;
                if state.countdown.generation() != generation {
                    debug!("Countdown generation {} superseded; exiting.", generation);
                    return;
                }
                match state.countdown.tick() {
                    None => {
                        let remaining_seconds = state.countdown.state().remaining_seconds();
                        trace!("Countdown at {}s.", remaining_seconds);
                        self.timer_event_sender
                            .send(TimerEvent::Ticked { remaining_seconds })
                            .ok();
                        None
                    }
                    Some(completion) => {
                        self.timer_event_sender
                            .send(TimerEvent::Completed {
                                duration_seconds: completion.duration_seconds,
                            })
                            .ok();
                        Some(self.responder.respond(
                            &mut state.countdown,
                            &self.alert,
                            completion,
                            Instant::now(),
                        ))
                    }
                }
            };

            let Some(window) = completed else {
                self.render().await;
                continue;
            };
            if let Some(window) = window {
                let engine = self.clone();
                self.schedule(TaskKind::FlashReset, engine.flash_reset(window))
                    .await;
            }
            self.render().await;
            return;
        }
    }

    /// Returns the display to clock mode once the flash window has elapsed.
    async fn flash_reset(self, window: FlashWindow) {
        tokio::time::sleep_until(window.until).await;
        let closed = {
            let mut state = self.state.write().await;
            self.responder.close(&mut state.countdown, &window)
        };
        if closed {
            info!("Flash window closed; back to clock mode.");
            self.timer_event_sender.send(TimerEvent::FlashEnded).ok();
            self.render().await;
        }
    }
}

// Public API implementation block.
impl FlipclockEngine {
    /// Starts the wall-clock refresh. The first refresh happens immediately.
    ///
    /// Calling this on an already active engine does nothing.
    pub async fn activate(&self) {
        let mut tasks = self.tasks.lock().await;
        let running = tasks
            .values()
            .any(|task| task.kind == TaskKind::Clock && !task.handle.is_finished());
        if running {
            return;
        }

        let engine = self.clone();
        let clock = SystemClock::new(CLOCK_PERIOD, self.time_source.clone());
        let ticking = clock.run(move |tick| {
            let engine = engine.clone();
            async move { engine.on_clock_tick(tick).await }
        });
        self.spawn_into(&mut tasks, TaskKind::Clock, ticking);

        info!("Flipclock engine activated.");
        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: Instant::now(),
            })
            .ok();
    }

    /// Runs the engine until Ctrl+C, then shuts it down.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.activate().await;
        info!("Flipclock running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received. Cancelling all tasks...");
        self.shutdown().await;
        Ok(())
    }

    /// Cancels every scheduled task: the clock, any countdown, and any
    /// pending flash reset.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        for (id, task) in tasks.drain() {
            if !task.handle.is_finished() {
                task.handle.abort();
                self.system_event_sender
                    .send(SystemEvent::TaskCancelled {
                        id,
                        kind: task.kind,
                    })
                    .ok();
            }
        }
        self.system_event_sender
            .send(SystemEvent::EngineShutdown)
            .ok();
        info!("Flipclock engine has shut down.");
    }

    /// Starts a countdown of `minutes`, replacing any countdown or flash in
    /// progress.
    ///
    /// Zero minutes is rejected and leaves the display untouched.
    pub async fn start_timer(&self, minutes: u32) -> Result<()> {
        let (duration_seconds, generation) = {
            let mut state = self.state.write().await;
            let duration_seconds = match state.countdown.start(minutes) {
                Ok(seconds) => seconds,
                Err(e) => {
                    warn!("Timer start rejected: {}", e);
                    self.timer_event_sender
                        .send(TimerEvent::Rejected { minutes })
                        .ok();
                    return Err(e);
                }
            };
            (duration_seconds, state.countdown.generation())
        };

        self.alert.prime();
        self.cancel(TaskKind::Countdown).await;
        self.cancel(TaskKind::FlashReset).await;
        let engine = self.clone();
        self.schedule(TaskKind::Countdown, engine.countdown_loop(generation))
            .await;

        info!("Timer started: {} minute(s).", minutes);
        self.timer_event_sender
            .send(TimerEvent::Started {
                minutes,
                duration_seconds,
            })
            .ok();
        self.render().await;
        Ok(())
    }

    pub async fn start_preset(&self, preset: Preset) -> Result<()> {
        self.start_timer(preset.minutes()).await
    }

    /// Returns to clock mode immediately, clearing any flash and cancelling
    /// the pending flash reset. Never sounds the alert.
    pub async fn stop_timer(&self) {
        let was_timer_mode = self.state.write().await.countdown.stop();
        self.cancel(TaskKind::Countdown).await;
        self.cancel(TaskKind::FlashReset).await;
        if was_timer_mode {
            info!("Timer stopped.");
            self.timer_event_sender.send(TimerEvent::Stopped).ok();
        }
        self.render().await;
    }

    /// Asks the host window to toggle fullscreen.
    ///
    /// A rejection is reported on the system channel and changes nothing else.
    pub fn toggle_fullscreen(&self) -> Result<bool> {
        match self.window.toggle_fullscreen() {
            Ok(fullscreen) => {
                info!("Fullscreen {}.", if fullscreen { "on" } else { "off" });
                Ok(fullscreen)
            }
            Err(e) => {
                warn!("{}", e);
                self.system_event_sender
                    .send(SystemEvent::Diagnostic {
                        message: e.to_string(),
                    })
                    .ok();
                Err(e)
            }
        }
    }

    /// The frame for the current state, without broadcasting it.
    pub async fn frame(&self) -> DisplayFrame {
        let state = self.state.read().await;
        select_display(&state.clock_time, &state.countdown.state())
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.state.read().await.countdown.state().into()
    }

    pub async fn timer_state(&self) -> TimerState {
        self.state.read().await.countdown.state()
    }

    /// The wall-clock time as of the last clock refresh.
    pub async fn clock_time(&self) -> NaiveDateTime {
        self.state.read().await.clock_time
    }

    /// Number of audio contexts opened this session.
    pub async fn audio_contexts_created(&self) -> usize {
        self.alert.contexts_created().await
    }

    /// Kinds of the tasks still alive, for diagnostics.
    pub async fn live_tasks(&self) -> Vec<TaskKind> {
        self.tasks
            .lock()
            .await
            .values()
            .filter(|task| !task.handle.is_finished())
            .map(|task| task.kind)
            .collect()
    }

    /// Subscribes to the raw clock `TickEvent` stream.
    pub fn subscribe_tick_events(&self) -> broadcast::Receiver<Arc<TickEvent>> {
        self.tick_sender.subscribe()
    }

    /// Subscribes to the `FrameEvent` stream.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<FrameEvent> {
        self.frame_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }

    /// Subscribes to the `TimerEvent` stream.
    pub fn subscribe_timer_events(&self) -> broadcast::Receiver<TimerEvent> {
        self.timer_event_sender.subscribe()
    }
}
