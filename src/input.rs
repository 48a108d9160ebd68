use serde::{Deserialize, Serialize};

/// Mouse events arriving this soon after a touch event are treated as
/// synthesized duplicates and dropped.
pub const MOUSE_SUPPRESS_WINDOW_MS: u64 = 500;

/// Where a raw surface event originated. Only the input boundary cares;
/// the gesture engine never sees the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfacePhase {
    Down,
    Move,
    Up,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub x: f64,
    pub y: f64,
}

/// One raw callback from the input surface, before normalization.
/// `points` carries the device coordinates of each contact; up and
/// cancel events may carry none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEvent {
    pub phase: SurfacePhase,
    pub source: ContactSource,
    #[serde(default)]
    pub points: Vec<ContactPoint>,
    pub at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactCount {
    One,
    Two,
}

/// Normalized sample handed to the gesture engine. For two-contact
/// samples `x`/`y` are the midpoint of the first two contacts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub at_ms: u64,
    pub contacts: ContactCount,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up { at_ms: u64 },
    Cancel,
}

/// Stateful boundary between the raw surface and the engine. Owns the
/// mouse-after-touch debounce so the engine can treat all contacts
/// identically.
#[derive(Debug, Default)]
pub struct InputNormalizer {
    last_touch_ms: Option<u64>,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when the event is swallowed: a mouse event inside
    /// the suppression window, or a down/move with no contact points.
    pub fn normalize(&mut self, event: &SurfaceEvent) -> Option<ContactEvent> {
        match event.source {
            ContactSource::Touch => {
                self.last_touch_ms = Some(event.at_ms);
            }
            ContactSource::Mouse => {
                let suppressed = self
                    .last_touch_ms
                    .map(|touch_ms| event.at_ms.saturating_sub(touch_ms) < MOUSE_SUPPRESS_WINDOW_MS)
                    .unwrap_or(false);
                if suppressed {
                    tracing::debug!(at_ms = event.at_ms, "dropping mouse event after recent touch");
                    return None;
                }
            }
        }

        match event.phase {
            SurfacePhase::Down => sample_from_points(&event.points, event.at_ms).map(ContactEvent::Down),
            SurfacePhase::Move => sample_from_points(&event.points, event.at_ms).map(ContactEvent::Move),
            SurfacePhase::Up => Some(ContactEvent::Up { at_ms: event.at_ms }),
            SurfacePhase::Cancel => Some(ContactEvent::Cancel),
        }
    }
}

fn sample_from_points(points: &[ContactPoint], at_ms: u64) -> Option<PointerSample> {
    match points {
        [] => None,
        [p] => Some(PointerSample {
            x: p.x,
            y: p.y,
            at_ms,
            contacts: ContactCount::One,
        }),
        // Contacts beyond the second are ignored.
        [a, b, ..] => Some(PointerSample {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
            at_ms,
            contacts: ContactCount::Two,
        }),
    }
}
