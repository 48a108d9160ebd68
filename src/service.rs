use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use once_cell::sync::OnceCell;

use crate::config::TouchpadConfig;
use crate::dispatch::{ActionDispatcher, ServiceBus};
use crate::engine::{EngineOutput, GestureEngine, GestureEvent, TimerKind};
use crate::feedback::FeedbackSink;
use crate::input::{ContactEvent, InputNormalizer, SurfaceEvent};

enum WorkerMessage {
    Surface(SurfaceEvent),
    Stop,
}

/// Clonable handle the input surface pushes raw events through.
#[derive(Clone)]
pub struct SurfaceHandle {
    tx: Sender<WorkerMessage>,
}

impl SurfaceHandle {
    /// Returns `false` once the worker is gone.
    pub fn push(&self, event: SurfaceEvent) -> bool {
        self.tx.send(WorkerMessage::Surface(event)).is_ok()
    }
}

struct WorkerHandle {
    tx: Sender<WorkerMessage>,
    join: JoinHandle<()>,
}

/// Owns one gesture engine instance and its collaborators on a worker
/// thread. Reconfiguration means building a new service; the config is
/// invariant for this one's lifetime.
pub struct TouchpadService {
    config: TouchpadConfig,
    bus: Arc<dyn ServiceBus>,
    feedback: Arc<dyn FeedbackSink>,
    worker: Option<WorkerHandle>,
}

impl TouchpadService {
    /// Fails when the configuration names no coordinate entity; the
    /// caller is expected to render a static placeholder instead of a
    /// live surface.
    pub fn new(
        config: TouchpadConfig,
        bus: Arc<dyn ServiceBus>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bus,
            feedback,
            worker: None,
        })
    }

    pub fn config(&self) -> &TouchpadConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Idempotent; a second call returns a handle to the running worker.
    pub fn start(&mut self) -> SurfaceHandle {
        if let Some(worker) = &self.worker {
            return SurfaceHandle {
                tx: worker.tx.clone(),
            };
        }

        let (tx, rx) = mpsc::channel();
        let engine = GestureEngine::new(self.config.tuning());
        let dispatcher = ActionDispatcher::new(&self.config, Arc::clone(&self.bus));
        let feedback = Arc::clone(&self.feedback);
        let join = thread::spawn(move || worker_loop(engine, dispatcher, feedback, rx));
        self.worker = Some(WorkerHandle { tx: tx.clone(), join });
        SurfaceHandle { tx }
    }

    /// Idempotent. Queued surface events are drained before the worker
    /// exits, and a still-held drag is released on the way out.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.tx.send(WorkerMessage::Stop);
            let _ = worker.join.join();
        }
    }
}

struct TimerSlot {
    deadline: Instant,
    generation: u64,
}

fn worker_loop(
    mut engine: GestureEngine,
    dispatcher: ActionDispatcher,
    feedback: Arc<dyn FeedbackSink>,
    rx: Receiver<WorkerMessage>,
) {
    let mut normalizer = InputNormalizer::new();
    let mut long_press: Option<TimerSlot> = None;
    let mut watchdog: Option<TimerSlot> = None;

    loop {
        let next_deadline = [long_press.as_ref(), watchdog.as_ref()]
            .into_iter()
            .flatten()
            .map(|slot| slot.deadline)
            .min();

        let message = match next_deadline {
            Some(deadline) => {
                let wait = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(wait) {
                    Ok(message) => Some(message),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };

        match message {
            Some(WorkerMessage::Stop) => break,
            Some(WorkerMessage::Surface(event)) => {
                if let Some(contact) = normalizer.normalize(&event) {
                    let outputs = match contact {
                        ContactEvent::Down(sample) => engine.contact_down(sample),
                        ContactEvent::Move(sample) => engine.contact_move(sample),
                        ContactEvent::Up { .. } => engine.contact_up(),
                        ContactEvent::Cancel => engine.contact_cancel(),
                    };
                    apply_outputs(outputs, &dispatcher, &feedback, &mut long_press, &mut watchdog);
                }
            }
            None => {}
        }

        let now = Instant::now();
        let mut fired = Vec::new();
        if long_press.as_ref().map(|slot| slot.deadline <= now).unwrap_or(false) {
            if let Some(slot) = long_press.take() {
                fired.push((TimerKind::LongPress, slot.generation));
            }
        }
        if watchdog.as_ref().map(|slot| slot.deadline <= now).unwrap_or(false) {
            if let Some(slot) = watchdog.take() {
                fired.push((TimerKind::DragWatchdog, slot.generation));
            }
        }
        for (kind, generation) in fired {
            let outputs = engine.timer_fired(kind, generation);
            apply_outputs(outputs, &dispatcher, &feedback, &mut long_press, &mut watchdog);
        }
    }

    // Shutdown is a forced termination; releasing a held drag here keeps
    // the controlled peer usable.
    let outputs = engine.contact_cancel();
    apply_outputs(outputs, &dispatcher, &feedback, &mut long_press, &mut watchdog);
}

fn apply_outputs(
    outputs: Vec<EngineOutput>,
    dispatcher: &ActionDispatcher,
    feedback: &Arc<dyn FeedbackSink>,
    long_press: &mut Option<TimerSlot>,
    watchdog: &mut Option<TimerSlot>,
) {
    for output in outputs {
        match output {
            EngineOutput::Gesture(GestureEvent::DragMove { dx, dy }) => dispatcher.send_move(dx, dy),
            EngineOutput::Gesture(event) => dispatcher.dispatch(&event),
            EngineOutput::Haptic(pulse) => feedback.haptic(pulse),
            EngineOutput::Indicator(hint) => feedback.indicator(hint),
            EngineOutput::ArmTimer {
                kind,
                generation,
                delay,
            } => {
                let slot = TimerSlot {
                    deadline: Instant::now() + delay,
                    generation,
                };
                match kind {
                    TimerKind::LongPress => *long_press = Some(slot),
                    TimerKind::DragWatchdog => *watchdog = Some(slot),
                }
            }
            EngineOutput::CancelTimer(TimerKind::LongPress) => *long_press = None,
            EngineOutput::CancelTimer(TimerKind::DragWatchdog) => *watchdog = None,
        }
    }
}

static SERVICE: OnceCell<Mutex<Option<TouchpadService>>> = OnceCell::new();

fn service_cell() -> &'static Mutex<Option<TouchpadService>> {
    SERVICE.get_or_init(|| Mutex::new(None))
}

/// Install the process-wide service instance, returning the previous
/// one. For embedders whose surface callbacks cannot carry state.
pub fn install_service(service: TouchpadService) -> Option<TouchpadService> {
    match service_cell().lock() {
        Ok(mut guard) => guard.replace(service),
        Err(err) => {
            tracing::error!(?err, "failed to lock touchpad service");
            None
        }
    }
}

pub fn take_service() -> Option<TouchpadService> {
    match service_cell().lock() {
        Ok(mut guard) => guard.take(),
        Err(err) => {
            tracing::error!(?err, "failed to lock touchpad service");
            None
        }
    }
}

pub fn with_service<F>(f: F)
where
    F: FnOnce(&mut TouchpadService),
{
    match service_cell().lock() {
        Ok(mut guard) => {
            if let Some(service) = guard.as_mut() {
                f(service);
            }
        }
        Err(err) => tracing::error!(?err, "failed to lock touchpad service"),
    }
}
