use std::sync::Arc;
use std::time::{Duration, Instant};

use touchpad_link::config::load_config;
use touchpad_link::dispatch::LogBus;
use touchpad_link::feedback::NullFeedback;
use touchpad_link::input::SurfaceEvent;
use touchpad_link::logging;
use touchpad_link::service::TouchpadService;

/// Trace player: replays a recorded surface-event trace against the
/// gesture engine, logging every service call it would make.
///
/// Usage: `touchpad_link [config.json] [trace.json]`
fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "touchpad.json".to_string());
    let trace_path = args.next();

    let config = load_config(&config_path)?;
    logging::init(config.debug_logging);

    let mut service = TouchpadService::new(config, Arc::new(LogBus), Arc::new(NullFeedback))?;
    let handle = service.start();

    let Some(trace_path) = trace_path else {
        tracing::info!("no trace file given, nothing to replay");
        service.stop();
        return Ok(());
    };

    let content = std::fs::read_to_string(&trace_path)?;
    let events: Vec<SurfaceEvent> = serde_json::from_str(&content)?;
    tracing::info!(count = events.len(), path = %trace_path, "replaying surface trace");

    let started = Instant::now();
    for event in events {
        let due = Duration::from_millis(event.at_ms);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            std::thread::sleep(wait);
        }
        if !handle.push(event) {
            break;
        }
    }

    // Let trailing timers (long press, inactivity watchdog) play out
    // before shutting the worker down.
    let settle = service
        .config()
        .long_press_threshold
        .max(service.config().drag_inactivity_timeout);
    std::thread::sleep(Duration::from_millis(settle + 50));

    service.stop();
    Ok(())
}
