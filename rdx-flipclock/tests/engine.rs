//! End-to-end behaviour of the engine on a paused tokio clock.
//!
//! Checks are made between ticks, never on a tick boundary, so they never
//! race the countdown task.

use chrono::NaiveDate;
use flipclock::prelude::*;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Default)]
struct AudioLog {
    created: usize,
    resumed: usize,
    played: usize,
}

/// Contexts start suspended, the way autoplay policy leaves them.
#[derive(Clone, Default)]
struct RecordingHost {
    log: Arc<Mutex<AudioLog>>,
}

struct RecordingContext {
    state: flipclock::components::alert::ContextState,
    log: Arc<Mutex<AudioLog>>,
}

impl AudioHost for RecordingHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, FlipclockError> {
        self.log.lock().unwrap().created += 1;
        Ok(Box::new(RecordingContext {
            state: flipclock::components::alert::ContextState::Suspended,
            log: self.log.clone(),
        }))
    }
}

impl AudioContext for RecordingContext {
    fn state(&self) -> flipclock::components::alert::ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), FlipclockError> {
        self.log.lock().unwrap().resumed += 1;
        self.state = flipclock::components::alert::ContextState::Running;
        Ok(())
    }

    fn play(&mut self, _tone: flipclock::components::alert::Tone) -> Result<(), FlipclockError> {
        self.log.lock().unwrap().played += 1;
        Ok(())
    }
}

/// Holds `create_context` until the test lets the device "open".
struct GatedHost {
    gate: Mutex<mpsc::Receiver<()>>,
    inner: RecordingHost,
}

impl AudioHost for GatedHost {
    fn create_context(&self) -> Result<Box<dyn AudioContext>, FlipclockError> {
        self.gate.lock().unwrap().recv().ok();
        self.inner.create_context()
    }
}

fn afternoon() -> FixedTimeSource {
    FixedTimeSource::new(
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(14, 15, 0)
            .unwrap(),
    )
}

fn engine_with(host: Arc<dyn AudioHost>) -> FlipclockEngine {
    FlipclockEngine::builder(FlipclockConfig::default())
        .time_source(Arc::new(afternoon()))
        .audio_host(host)
        .build()
}

fn silent_engine() -> FlipclockEngine {
    engine_with(Arc::new(NullAudioHost))
}

async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

fn drain(rx: &mut broadcast::Receiver<TimerEvent>) -> Vec<TimerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count(events: &[TimerEvent], wanted: &TimerEvent) -> usize {
    events.iter().filter(|e| *e == wanted).count()
}

#[tokio::test(start_paused = true)]
async fn twenty_five_minutes_counts_down() {
    let engine = silent_engine();
    engine.start_timer(25).await.unwrap();

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.remaining_seconds, 1500);
    assert_eq!(snapshot.duration_seconds, 1500);
    assert!(snapshot.active);

    advance(1500).await;
    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.remaining_seconds, 1499);
    assert!(snapshot.is_timer_mode);

    let frame = engine.frame().await;
    assert_eq!((frame.left.as_str(), frame.right.as_str()), ("24", "59"));
    assert_eq!(frame.ampm_or_label, "MIN : SEC");
    assert_eq!(frame.subtitle, "02:15 PM");
    assert!(frame.controls.show_stop);
}

#[tokio::test(start_paused = true)]
async fn completion_flashes_for_five_seconds_then_returns_to_clock() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();
    engine.start_timer(1).await.unwrap();

    advance(59_500).await;
    assert_eq!(engine.snapshot().await.remaining_seconds, 1);
    assert!(!engine.snapshot().await.flashing);

    advance(1_000).await;
    let snapshot = engine.snapshot().await;
    assert!(snapshot.flashing);
    assert!(snapshot.is_timer_mode);
    assert!(!snapshot.active);
    assert_eq!(snapshot.remaining_seconds, 0);
    assert_eq!(snapshot.duration_seconds, 60);
    assert!(engine.frame().await.is_flashing);

    advance(4_000).await;
    assert!(engine.snapshot().await.flashing);

    advance(1_000).await;
    let snapshot = engine.snapshot().await;
    assert!(!snapshot.flashing);
    assert!(!snapshot.is_timer_mode);
    assert_eq!(snapshot.duration_seconds, 0);

    let frame = engine.frame().await;
    assert_eq!(frame.ampm_or_label, "PM");
    assert_eq!(frame.subtitle, "Sunday, October 18, 2026");

    let events = drain(&mut events);
    assert_eq!(
        count(&events, &TimerEvent::Completed { duration_seconds: 60 }),
        1
    );
    assert_eq!(count(&events, &TimerEvent::FlashEnded), 1);
    assert_eq!(
        events.iter().filter(|e| matches!(e, TimerEvent::Ticked { .. })).count(),
        59
    );
}

#[tokio::test(start_paused = true)]
async fn stop_during_flash_cancels_the_pending_reset() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();
    engine.start_timer(1).await.unwrap();

    advance(62_000).await;
    assert!(engine.snapshot().await.flashing);

    engine.stop_timer().await;
    let snapshot = engine.snapshot().await;
    assert!(!snapshot.is_timer_mode);
    assert!(!snapshot.flashing);
    assert_eq!(snapshot.duration_seconds, 0);
    assert!(!engine.live_tasks().await.contains(&TaskKind::FlashReset));

    // A new timer started inside the old window must survive its deadline.
    engine.start_preset(Preset::Five).await.unwrap();
    advance(4_500).await;
    let snapshot = engine.snapshot().await;
    assert!(snapshot.active);
    assert_eq!(snapshot.remaining_seconds, 296);

    let events = drain(&mut events);
    assert_eq!(count(&events, &TimerEvent::FlashEnded), 0);
    assert_eq!(count(&events, &TimerEvent::Stopped), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_replaces_the_running_countdown() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();
    engine.start_timer(60).await.unwrap();

    advance(2_500).await;
    assert_eq!(engine.snapshot().await.remaining_seconds, 3598);
    drain(&mut events);

    engine.start_timer(5).await.unwrap();
    advance(2_500).await;

    let ticks: Vec<u32> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            TimerEvent::Ticked { remaining_seconds } => Some(remaining_seconds),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![299, 298]);
    assert_eq!(engine.snapshot().await.duration_seconds, 300);
    assert_eq!(
        engine
            .live_tasks()
            .await
            .iter()
            .filter(|kind| **kind == TaskKind::Countdown)
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn label_switches_when_an_hour_timer_drops_below_sixty_minutes() {
    let engine = silent_engine();
    engine.start_preset(Preset::Hour).await.unwrap();

    let frame = engine.frame().await;
    assert_eq!(frame.ampm_or_label, "HR : MIN");
    assert_eq!((frame.left.as_str(), frame.right.as_str()), ("01", "00"));

    advance(1_500).await;
    let frame = engine.frame().await;
    assert_eq!(frame.ampm_or_label, "MIN : SEC");
    assert_eq!((frame.left.as_str(), frame.right.as_str()), ("59", "59"));
}

#[tokio::test(start_paused = true)]
async fn zero_minutes_is_rejected_without_changing_mode() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();

    let err = engine.start_timer(0).await.unwrap_err();
    assert!(matches!(err, FlipclockError::InvalidDuration { minutes: 0 }));
    assert!(!engine.snapshot().await.is_timer_mode);
    assert!(engine.live_tasks().await.is_empty());

    engine.start_timer(5).await.unwrap();
    advance(1_500).await;
    assert!(engine.start_timer(0).await.is_err());
    assert_eq!(engine.snapshot().await.remaining_seconds, 299);

    let events = drain(&mut events);
    assert_eq!(count(&events, &TimerEvent::Rejected { minutes: 0 }), 2);
}

#[tokio::test(start_paused = true)]
async fn one_audio_context_is_opened_and_resumed() {
    let host = RecordingHost::default();
    let engine = engine_with(Arc::new(host.clone()));

    engine.start_timer(1).await.unwrap();
    advance(60_500).await;
    engine.start_timer(1).await.unwrap();
    advance(60_250).await;

    assert!(engine.snapshot().await.flashing);
    assert_eq!(engine.audio_contexts_created().await, 1);
    let log = host.log.lock().unwrap();
    assert_eq!(log.created, 1);
    assert_eq!(log.resumed, 1);
    assert_eq!(log.played, 2);
}

#[tokio::test(start_paused = true)]
async fn clock_refreshes_every_second_until_shutdown() {
    let source = afternoon();
    let engine = FlipclockEngine::builder(FlipclockConfig::default())
        .time_source(Arc::new(source.clone()))
        .audio_host(Arc::new(NullAudioHost))
        .build();
    let mut ticks = engine.subscribe_tick_events();

    engine.activate().await;
    engine.activate().await;
    advance(500).await;
    assert_eq!(ticks.try_recv().unwrap().tick_count, 1);

    source.advance(chrono::Duration::minutes(46));
    advance(1_000).await;
    assert_eq!(ticks.try_recv().unwrap().tick_count, 2);
    assert!(ticks.try_recv().is_err());
    let frame = engine.frame().await;
    assert_eq!((frame.left.as_str(), frame.right.as_str()), ("03", "01"));

    engine.shutdown().await;
    assert!(engine.live_tasks().await.is_empty());
    advance(3_000).await;
    assert!(ticks.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn rejected_fullscreen_is_reported_as_a_diagnostic() {
    let engine = silent_engine();
    let mut system = engine.subscribe_system_events();

    assert!(engine.toggle_fullscreen().is_err());
    assert!(!engine.snapshot().await.is_timer_mode);

    let mut diagnostics = 0;
    while let Ok(event) = system.try_recv() {
        if matches!(event, SystemEvent::Diagnostic { .. }) {
            diagnostics += 1;
        }
    }
    assert_eq!(diagnostics, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_audio_open_does_not_hold_up_the_display() {
    let (open, gate) = mpsc::channel();
    let recording = RecordingHost::default();
    let engine = engine_with(Arc::new(GatedHost {
        gate: Mutex::new(gate),
        inner: recording.clone(),
    }));

    engine.start_timer(5).await.unwrap();
    let snapshot = engine.snapshot().await;
    assert!(snapshot.active);
    assert_eq!(snapshot.remaining_seconds, 300);
    assert_eq!(engine.frame().await.ampm_or_label, "MIN : SEC");
    assert_eq!(recording.log.lock().unwrap().created, 0);

    open.send(()).unwrap();
    advance(1_500).await;
    assert_eq!(engine.snapshot().await.remaining_seconds, 299);
    assert_eq!(engine.audio_contexts_created().await, 1);
    assert_eq!(recording.log.lock().unwrap().resumed, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_a_running_countdown() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();
    engine.activate().await;
    engine.start_preset(Preset::Five).await.unwrap();

    advance(1_500).await;
    assert_eq!(engine.snapshot().await.remaining_seconds, 299);
    drain(&mut events);

    engine.shutdown().await;
    assert!(engine.live_tasks().await.is_empty());
    advance(5_000).await;

    assert_eq!(engine.snapshot().await.remaining_seconds, 299);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_flash_cancels_the_pending_reset() {
    let engine = silent_engine();
    let mut events = engine.subscribe_timer_events();
    engine.start_timer(1).await.unwrap();

    advance(61_500).await;
    assert!(engine.snapshot().await.flashing);
    assert!(engine.live_tasks().await.contains(&TaskKind::FlashReset));

    engine.shutdown().await;
    assert!(engine.live_tasks().await.is_empty());
    advance(10_000).await;

    let snapshot = engine.snapshot().await;
    assert!(snapshot.flashing);
    assert_eq!(snapshot.duration_seconds, 60);
    assert_eq!(count(&drain(&mut events), &TimerEvent::FlashEnded), 0);
}
