use anyhow::Result;
use flipclock::prelude::*;
use flipclock::render::render_frame;
use std::io::Write;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration from flipclock.toml / FLIPCLOCK_* variables.
    let config = FlipclockConfig::load()?;

    // 2. Initialize structured logging, preferring RUST_LOG when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // 3. Create the engine with the terminal as its window.
    let engine = FlipclockEngine::builder(config)
        .window_host(Arc::new(TerminalWindow::new()))
        .build();

    // 4. Redraw on every frame and log timer transitions.
    spawn_renderer(&engine);
    spawn_event_listeners(&engine);

    // 5. Optionally start a preset given on the command line, e.g. `flipclock 25m`.
    if let Some(label) = std::env::args().nth(1) {
        match Preset::from_label(&label) {
            Some(preset) => engine.start_preset(preset).await?,
            None => anyhow::bail!("unknown preset '{}'; expected one of 5m, 25m, 1h, 8h", label),
        }
    }

    // 6. Run until Ctrl+C.
    engine.run().await?;
    Ok(())
}

/// Redraws the display in place each time the engine selects a frame.
fn spawn_renderer(engine: &FlipclockEngine) {
    let mut frames = engine.subscribe_frames();
    tokio::spawn(async move {
        while let Ok(event) = frames.recv().await {
            let mut stdout = std::io::stdout();
            // Clear the screen and home the cursor before drawing.
            writeln!(stdout, "\x1b[2J\x1b[H{}", render_frame(&event.frame)).ok();
            stdout.flush().ok();
        }
    });
}

fn spawn_event_listeners(engine: &FlipclockEngine) {
    let mut timer_rx = engine.subscribe_timer_events();
    tokio::spawn(async move {
        while let Ok(event) = timer_rx.recv().await {
            if !matches!(event, TimerEvent::Ticked { .. }) {
                info!("[TIMER] => {:?}", event);
            }
        }
    });

    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            if let SystemEvent::Diagnostic { message } = event {
                info!("[DIAGNOSTIC] => {}", message);
            }
        }
    });
}
