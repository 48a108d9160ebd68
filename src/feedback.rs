/// Haptic pulse fired alongside a recognized gesture. `pattern` is a
/// vibrate/pause alternation in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticPulse {
    Tap,
    RightClick,
    DragStart,
    DragEnd,
}

impl HapticPulse {
    pub fn pattern(self) -> &'static [u64] {
        match self {
            HapticPulse::Tap => &[10],
            HapticPulse::RightClick => &[15],
            HapticPulse::DragStart => &[50, 30, 50],
            HapticPulse::DragEnd => &[20],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Tap,
    RightClick,
}

/// Visual state hint for the host's indicator. `Flash` is momentary;
/// the presenter decides how long to show it and what color it maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorHint {
    Idle,
    ActiveContact,
    DragMode,
    Flash(FlashKind),
}

/// Fire-and-forget side-effect sink for haptics and indicator state.
/// Nothing flows back into the engine.
pub trait FeedbackSink: Send + Sync {
    fn indicator(&self, hint: IndicatorHint);
    fn haptic(&self, pulse: HapticPulse);
}

#[derive(Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn indicator(&self, _hint: IndicatorHint) {}

    fn haptic(&self, _pulse: HapticPulse) {}
}
