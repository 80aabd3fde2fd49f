//! The wall-clock source that drives the display.
//!
//! `SystemClock` ticks once per period starting immediately, reads the
//! injected `TimeSource`, and hands each `TickEvent` to the engine. It is
//! spawned as a task and stopped by aborting that task.

use chrono::{Local, NaiveDateTime, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::trace;

/// The wall-clock refresh period.
pub const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// A single refresh of the wall clock.
#[derive(Debug, Clone)]
pub struct TickEvent {
    /// Number of ticks since the clock was activated, starting at 1.
    pub tick_count: u64,
    /// The local wall-clock time read on this tick.
    pub now: NaiveDateTime,
}

/// Supplies the current local wall-clock time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the operating system clock, in the configured zone or the local one.
#[derive(Debug, Clone, Default)]
pub struct SystemTimeSource {
    timezone: Option<Tz>,
}

impl SystemTimeSource {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> NaiveDateTime {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).naive_local(),
            None => Local::now().naive_local(),
        }
    }
}

/// A manually driven clock for tests and demos.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl FixedTimeSource {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The recurring wall-clock ticker.
pub struct SystemClock {
    period: Duration,
    time_source: Arc<dyn TimeSource>,
}

impl SystemClock {
    pub fn new(period: Duration, time_source: Arc<dyn TimeSource>) -> Self {
        Self {
            period,
            time_source,
        }
    }

    /// Ticks forever, running `on_tick` to completion before waiting for the
    /// next period. The first tick fires immediately.
    pub async fn run<F, Fut>(self, mut on_tick: F)
    where
        F: FnMut(TickEvent) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick_count = 0u64;
        loop {
            ticker.tick().await;
            tick_count += 1;
            let event = TickEvent {
                tick_count,
                now: self.time_source.now(),
            };
            trace!("Clock tick #{} at {}", event.tick_count, event.now);
            on_tick(event).await;
        }
    }
}
