use std::time::Duration;

use crate::feedback::{FlashKind, HapticPulse, IndicatorHint};
use crate::input::{ContactCount, PointerSample};

/// Two-finger vertical travel (px) past which the gesture can no longer
/// end in a right click.
const TWO_FINGER_LATCH_PX: f64 = 2.0;

/// Numeric tunables of the motion model. Copied out of the full
/// configuration at construction; invariant for the engine's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTuning {
    pub sensitivity: f64,
    pub acceleration: f64,
    /// Cumulative distance from the origin (px) past which a contact
    /// counts as moved and can no longer become a tap or long press.
    pub movement_threshold: f64,
    pub long_press_threshold: Duration,
    pub drag_inactivity_timeout: Duration,
    /// Accumulated two-finger travel (px) drained per scroll tick.
    pub scroll_sensitivity: f64,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            acceleration: 1.5,
            movement_threshold: 5.0,
            long_press_threshold: Duration::from_millis(300),
            drag_inactivity_timeout: Duration::from_millis(600),
            scroll_sensitivity: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Tap,
    RightClick,
    DragStart,
    DragMove { dx: i32, dy: i32 },
    DragEnd,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    LongPress,
    DragWatchdog,
}

/// Everything the engine asks of its host. The engine performs no I/O
/// itself; the host routes these to the dispatcher, the feedback sink
/// and its timer facility.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Gesture(GestureEvent),
    Haptic(HapticPulse),
    Indicator(IndicatorHint),
    /// Arm (or re-arm) a timer. When it elapses the host must call
    /// [`GestureEngine::timer_fired`] with the same generation; firings
    /// whose generation no longer matches are ignored.
    ArmTimer {
        kind: TimerKind,
        generation: u64,
        delay: Duration,
    },
    CancelTimer(TimerKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Debug)]
enum SessionKind {
    Single {
        origin: Point,
        last: Point,
        last_move_ms: u64,
        moved: bool,
        long_press_fired: bool,
    },
    TwoFinger {
        last_mid_y: f64,
        scroll_accum: f64,
        moved: bool,
    },
}

/// State for one contact sequence, created wholesale on contact down
/// and dropped wholesale on end or cancel. `id` is the generation tag
/// carried by every timer armed on the session's behalf.
#[derive(Debug)]
struct GestureSession {
    id: u64,
    kind: SessionKind,
}

/// The gesture state machine. Single-threaded; every entry point
/// returns the side effects to perform, in order.
///
/// The drag hold ("mouse held down", entered via long press) is engine
/// state rather than session state: it deliberately outlives the
/// session that latched it, so a held drag can span several contact
/// cycles until a release tap or the inactivity watchdog ends it.
#[derive(Debug)]
pub struct GestureEngine {
    tuning: MotionTuning,
    session: Option<GestureSession>,
    drag_hold: Option<u64>,
    next_session_id: u64,
}

impl GestureEngine {
    pub fn new(tuning: MotionTuning) -> Self {
        Self {
            tuning,
            session: None,
            drag_hold: None,
            next_session_id: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.session.is_none()
    }

    pub fn drag_held(&self) -> bool {
        self.drag_hold.is_some()
    }

    pub fn contact_down(&mut self, sample: PointerSample) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        if self.session.is_some() {
            // The surface must fully terminate a contact sequence before
            // starting the next one; never continue a lingering session.
            tracing::warn!("contact down with a live session, terminating the stale one");
            self.drop_session(&mut out);
        }

        let id = self.next_session_id;
        self.next_session_id += 1;

        match sample.contacts {
            ContactCount::Two => {
                tracing::debug!(session = id, "two-contact session started");
                self.session = Some(GestureSession {
                    id,
                    kind: SessionKind::TwoFinger {
                        last_mid_y: sample.y,
                        scroll_accum: 0.0,
                        moved: false,
                    },
                });
            }
            ContactCount::One => {
                tracing::debug!(session = id, held = self.drag_hold.is_some(), "session started");
                self.session = Some(GestureSession {
                    id,
                    kind: SessionKind::Single {
                        origin: Point { x: sample.x, y: sample.y },
                        last: Point { x: sample.x, y: sample.y },
                        last_move_ms: sample.at_ms,
                        moved: false,
                        long_press_fired: false,
                    },
                });
                // A contact that arrives while the drag hold is active is
                // dedicated to that hold (it releases it or extends it);
                // it can never become a tap or a second long press.
                if self.drag_hold.is_none() {
                    out.push(EngineOutput::ArmTimer {
                        kind: TimerKind::LongPress,
                        generation: id,
                        delay: self.tuning.long_press_threshold,
                    });
                }
                out.push(EngineOutput::Indicator(IndicatorHint::ActiveContact));
            }
        }
        out
    }

    pub fn contact_move(&mut self, sample: PointerSample) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let Some(session) = self.session.as_mut() else {
            return out;
        };

        match &mut session.kind {
            SessionKind::TwoFinger {
                last_mid_y,
                scroll_accum,
                moved,
            } => {
                if sample.contacts != ContactCount::Two {
                    return out;
                }
                let dy = sample.y - *last_mid_y;
                if dy.abs() > TWO_FINGER_LATCH_PX {
                    *moved = true;
                }
                *scroll_accum += dy;
                *last_mid_y = sample.y;

                let step = self.tuning.scroll_sensitivity;
                while *scroll_accum < -step {
                    out.push(EngineOutput::Gesture(GestureEvent::ScrollUp));
                    *scroll_accum += step;
                }
                while *scroll_accum > step {
                    out.push(EngineOutput::Gesture(GestureEvent::ScrollDown));
                    *scroll_accum -= step;
                }
            }
            SessionKind::Single {
                origin,
                last,
                last_move_ms,
                moved,
                ..
            } => {
                let dx = sample.x - last.x;
                let dy = sample.y - last.y;
                // Redundant samples would otherwise produce velocity
                // spikes from a stale last-move time.
                if dx == 0.0 && dy == 0.0 {
                    return out;
                }

                let total_dx = sample.x - origin.x;
                let total_dy = sample.y - origin.y;
                let total = (total_dx * total_dx + total_dy * total_dy).sqrt();
                if !*moved && total > self.tuning.movement_threshold {
                    *moved = true;
                    out.push(EngineOutput::CancelTimer(TimerKind::LongPress));
                }

                if *moved {
                    let dt = sample.at_ms.saturating_sub(*last_move_ms).max(1) as f64;
                    let distance = (dx * dx + dy * dy).sqrt();
                    let velocity = distance / dt;
                    let multiplier = 1.0 + velocity * self.tuning.acceleration;
                    let scaled_dx = (dx * self.tuning.sensitivity * multiplier).round() as i32;
                    let scaled_dy = (dy * self.tuning.sensitivity * multiplier).round() as i32;

                    *last = Point { x: sample.x, y: sample.y };
                    *last_move_ms = sample.at_ms;

                    out.push(EngineOutput::Gesture(GestureEvent::DragMove {
                        dx: scaled_dx,
                        dy: scaled_dy,
                    }));
                    if let Some(generation) = self.drag_hold {
                        out.push(EngineOutput::ArmTimer {
                            kind: TimerKind::DragWatchdog,
                            generation,
                            delay: self.tuning.drag_inactivity_timeout,
                        });
                    }
                }
            }
        }
        out
    }

    pub fn contact_up(&mut self) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let Some(session) = self.session.take() else {
            return out;
        };
        out.push(EngineOutput::CancelTimer(TimerKind::LongPress));

        match session.kind {
            SessionKind::TwoFinger { moved, .. } => {
                if !moved {
                    tracing::debug!(session = session.id, "two-finger tap");
                    out.push(EngineOutput::Gesture(GestureEvent::RightClick));
                    out.push(EngineOutput::Haptic(HapticPulse::RightClick));
                    out.push(EngineOutput::Indicator(IndicatorHint::Flash(FlashKind::RightClick)));
                }
            }
            SessionKind::Single {
                moved,
                long_press_fired,
                ..
            } => {
                if self.drag_hold.is_some() && !moved {
                    // The deliberate release of a held drag.
                    tracing::debug!(session = session.id, "drag released");
                    self.drag_hold = None;
                    out.push(EngineOutput::CancelTimer(TimerKind::DragWatchdog));
                    out.push(EngineOutput::Gesture(GestureEvent::DragEnd));
                    out.push(EngineOutput::Haptic(HapticPulse::DragEnd));
                } else if !moved && !long_press_fired {
                    tracing::debug!(session = session.id, "tap");
                    out.push(EngineOutput::Gesture(GestureEvent::Tap));
                    out.push(EngineOutput::Haptic(HapticPulse::Tap));
                    out.push(EngineOutput::Indicator(IndicatorHint::Flash(FlashKind::Tap)));
                }
                // moved = true: motion was already reported sample by
                // sample; if the hold is active it stays latched for the
                // next contact cycle.
            }
        }

        out.push(EngineOutput::Indicator(self.resting_hint()));
        out
    }

    /// Forced termination (surface lost, contact cancelled). Idempotent;
    /// always leaves the engine idle with both timers cancelled. A held
    /// drag is released rather than left pressing the controlled peer.
    pub fn contact_cancel(&mut self) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let had_session = self.session.take().is_some();
        if had_session {
            out.push(EngineOutput::CancelTimer(TimerKind::LongPress));
        }
        if self.drag_hold.take().is_some() {
            tracing::debug!("cancelled while drag held, releasing");
            out.push(EngineOutput::CancelTimer(TimerKind::DragWatchdog));
            out.push(EngineOutput::Gesture(GestureEvent::DragEnd));
            out.push(EngineOutput::Haptic(HapticPulse::DragEnd));
            out.push(EngineOutput::Indicator(IndicatorHint::Idle));
        } else if had_session {
            out.push(EngineOutput::Indicator(IndicatorHint::Idle));
        }
        out
    }

    pub fn timer_fired(&mut self, kind: TimerKind, generation: u64) -> Vec<EngineOutput> {
        match kind {
            TimerKind::LongPress => self.long_press_elapsed(generation),
            TimerKind::DragWatchdog => self.watchdog_elapsed(generation),
        }
    }

    fn long_press_elapsed(&mut self, generation: u64) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        let held = self.drag_hold.is_some();
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(generation, "stale long-press timer ignored");
            return out;
        };
        if session.id != generation {
            tracing::debug!(generation, current = session.id, "stale long-press timer ignored");
            return out;
        }
        let SessionKind::Single {
            moved,
            long_press_fired,
            ..
        } = &mut session.kind
        else {
            return out;
        };
        if *moved || held {
            return out;
        }

        tracing::debug!(session = generation, "long press, entering drag mode");
        *long_press_fired = true;
        self.drag_hold = Some(generation);
        out.push(EngineOutput::Gesture(GestureEvent::DragStart));
        out.push(EngineOutput::Haptic(HapticPulse::DragStart));
        out.push(EngineOutput::Indicator(IndicatorHint::DragMode));
        out.push(EngineOutput::ArmTimer {
            kind: TimerKind::DragWatchdog,
            generation,
            delay: self.tuning.drag_inactivity_timeout,
        });
        out
    }

    fn watchdog_elapsed(&mut self, generation: u64) -> Vec<EngineOutput> {
        let mut out = Vec::new();
        if self.drag_hold != Some(generation) {
            tracing::debug!(generation, "stale drag watchdog ignored");
            return out;
        }

        tracing::debug!(generation, "drag inactivity timeout, releasing");
        self.drag_hold = None;
        out.push(EngineOutput::Gesture(GestureEvent::DragEnd));
        out.push(EngineOutput::Haptic(HapticPulse::DragEnd));
        if self.session.take().is_some() {
            out.push(EngineOutput::CancelTimer(TimerKind::LongPress));
        }
        out.push(EngineOutput::Indicator(IndicatorHint::Idle));
        out
    }

    fn drop_session(&mut self, out: &mut Vec<EngineOutput>) {
        if self.session.take().is_some() {
            out.push(EngineOutput::CancelTimer(TimerKind::LongPress));
            out.push(EngineOutput::Indicator(self.resting_hint()));
        }
    }

    fn resting_hint(&self) -> IndicatorHint {
        if self.drag_hold.is_some() {
            IndicatorHint::DragMode
        } else {
            IndicatorHint::Idle
        }
    }
}
