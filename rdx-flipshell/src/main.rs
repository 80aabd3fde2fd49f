use anyhow::Result;
use colored::Colorize;
use flipclock::prelude::*;
use flipclock::render::render_frame;
use flipclock::{ENGINE_NAME, VERSION as LIB_VERSION};
use rustyline::highlight::Highlighter;
use rustyline::Editor;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A rustyline helper that highlights the command word.
#[derive(Completer, Helper, Hinter, Validator)]
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if let Some((command, rest)) = line.split_once(' ') {
            Cow::Owned(format!("{} {}", command.yellow().bold(), rest.yellow()))
        } else {
            Cow::Owned(line.yellow().bold().to_string())
        }
    }
    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn print_banner() {
    if env::var("QUIET_MODE").is_ok() {
        return;
    }
    const LOGO_TEXT: &str = include_str!("../logo.log");
    println!("{}", LOGO_TEXT.cyan());

    let version_string = format!(
        "          Shell   v{:<8} Library   v{:<8}",
        SHELL_VERSION, LIB_VERSION
    );
    println!("{}", "-".repeat(64).dimmed());
    println!("{}", version_string);
    println!("{}", "-".repeat(64).dimmed());
}

/// Prints every frame the engine selects while `watching` is set, and
/// surfaces timer transitions and diagnostics as they happen.
fn spawn_event_listeners(engine: &FlipclockEngine, watching: Arc<AtomicBool>) {
    let mut frame_rx = engine.subscribe_frames();
    tokio::spawn(async move {
        while let Ok(event) = frame_rx.recv().await {
            if watching.load(Ordering::Relaxed) {
                println!("\n{}\n", render_frame(&event.frame));
            }
        }
    });

    let mut timer_rx = engine.subscribe_timer_events();
    tokio::spawn(async move {
        while let Ok(event) = timer_rx.recv().await {
            match event {
                TimerEvent::Completed { duration_seconds } => println!(
                    "\n<-- {}",
                    format!("[TIMER] {} minute timer complete!", duration_seconds / 60)
                        .red()
                        .bold()
                ),
                TimerEvent::FlashEnded => println!("\n<-- [TIMER] Back to the clock."),
                _ => {}
            }
        }
    });

    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            if let SystemEvent::Diagnostic { message } = event {
                println!("\n<-- {} {}", "[DIAGNOSTIC]".magenta(), message);
            }
        }
    });
}

async fn start(engine: &FlipclockEngine, label: &str) {
    match Preset::from_label(label) {
        Some(preset) => match engine.start_preset(preset).await {
            Ok(()) => println!("--> Started the {} timer.", preset),
            Err(e) => println!("Error: {}", e),
        },
        None => println!(
            "Error: '{}' is not a preset. Choose one of 5m, 25m, 1h, 8h.",
            label
        ),
    }
}

fn print_help() {
    println!("Available commands:");
    println!("  5m | 25m | 1h | 8h    - Starts a countdown with that preset.");
    println!("  start <PRESET>        - Same as typing the preset.");
    println!("  stop                  - Stops the countdown or clears the flash.");
    println!("  show                  - Draws the display once.");
    println!("  status                - Shows the raw countdown state.");
    println!("  watch on|off          - Draws the display on every refresh.");
    println!("  fullscreen            - Toggles the alternate screen.");
    println!("  exit                  - Quits the shell.");
}

#[tokio::main]
async fn main() -> Result<()> {
    print_banner();

    let config = FlipclockConfig::load()?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let engine = FlipclockEngine::builder(config)
        .window_host(Arc::new(TerminalWindow::new()))
        .build();

    let watching = Arc::new(AtomicBool::new(false));
    spawn_event_listeners(&engine, watching.clone());

    info!("Activating {}...", ENGINE_NAME.cyan());
    engine.activate().await;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CommandHighlighter));

    println!(
        "{} is running. Type 'help' for commands or 'exit' to quit.",
        ENGINE_NAME.cyan()
    );

    loop {
        let prompt = format!("{}", ">> ".cyan().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let args = line.split_whitespace().collect::<Vec<_>>();

                match args.as_slice() {
                    [] => {}
                    [label @ ("5m" | "25m" | "1h" | "8h")] => start(&engine, label).await,
                    ["start", label] => start(&engine, label).await,
                    ["start"] => println!("Usage: start <5m|25m|1h|8h>"),
                    ["stop"] => {
                        if engine.snapshot().await.is_timer_mode {
                            engine.stop_timer().await;
                            println!("--> Timer stopped.");
                        } else {
                            println!("--> No timer is running.");
                        }
                    }
                    ["show"] => println!("{}", render_frame(&engine.frame().await)),
                    ["status"] => {
                        let snapshot = engine.snapshot().await;
                        println!(
                            "active={} remaining={}s duration={}s flashing={} timer_mode={}",
                            snapshot.active,
                            snapshot.remaining_seconds,
                            snapshot.duration_seconds,
                            snapshot.flashing,
                            snapshot.is_timer_mode
                        );
                    }
                    ["watch", "on"] => {
                        watching.store(true, Ordering::Relaxed);
                        println!("--> Drawing every refresh.");
                    }
                    ["watch", "off"] => {
                        watching.store(false, Ordering::Relaxed);
                        println!("--> Stopped drawing.");
                    }
                    ["watch", ..] => println!("Usage: watch on|off"),
                    ["fullscreen"] => match engine.toggle_fullscreen() {
                        Ok(true) => println!("--> Fullscreen on."),
                        Ok(false) => println!("--> Fullscreen off."),
                        Err(_) => {}
                    },
                    ["help"] => print_help(),
                    ["exit"] => break,
                    _ => println!("Unknown command: '{}'. Type 'help'.", line.trim()),
                }
            }
            Err(_) => {
                println!("Exiting flipshell...");
                break;
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}
