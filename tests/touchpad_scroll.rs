use std::time::Duration;

use touchpad_link::engine::{EngineOutput, GestureEngine, GestureEvent, MotionTuning};
use touchpad_link::input::{ContactCount, PointerSample};

fn tuning() -> MotionTuning {
    MotionTuning {
        sensitivity: 1.0,
        acceleration: 0.0,
        movement_threshold: 5.0,
        long_press_threshold: Duration::from_millis(300),
        drag_inactivity_timeout: Duration::from_millis(600),
        scroll_sensitivity: 20.0,
    }
}

fn two(mid_y: f64, at_ms: u64) -> PointerSample {
    PointerSample {
        x: 0.0,
        y: mid_y,
        at_ms,
        contacts: ContactCount::Two,
    }
}

fn one(x: f64, y: f64, at_ms: u64) -> PointerSample {
    PointerSample {
        x,
        y,
        at_ms,
        contacts: ContactCount::One,
    }
}

fn gestures(outputs: &[EngineOutput]) -> Vec<GestureEvent> {
    outputs
        .iter()
        .filter_map(|output| match output {
            EngineOutput::Gesture(event) => Some(*event),
            _ => None,
        })
        .collect()
}

#[test]
fn two_finger_tap_fires_right_click() {
    let mut engine = GestureEngine::new(tuning());
    assert!(engine.contact_down(two(100.0, 0)).is_empty());

    // Jitter at or under 2 px never counts as motion.
    assert!(gestures(&engine.contact_move(two(101.5, 20))).is_empty());
    assert!(gestures(&engine.contact_move(two(100.0, 40))).is_empty());

    let up = engine.contact_up();
    assert_eq!(gestures(&up), vec![GestureEvent::RightClick]);
    assert!(engine.is_idle());
}

#[test]
fn scroll_motion_suppresses_right_click() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(0.0, 0));

    // +25 px: one tick drains, remainder 5 stays in the accumulator.
    let outputs = engine.contact_move(two(25.0, 50));
    assert_eq!(gestures(&outputs), vec![GestureEvent::ScrollDown]);

    // 5 + 10 = 15, below the 20 px step: no tick yet.
    let outputs = engine.contact_move(two(35.0, 100));
    assert!(gestures(&outputs).is_empty());

    let up = engine.contact_up();
    assert!(gestures(&up).is_empty());
}

#[test]
fn fast_move_drains_multiple_ticks() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(0.0, 0));

    // 65 px in one sample: 65 -> 45 -> 25 -> 5.
    let outputs = engine.contact_move(two(65.0, 50));
    assert_eq!(
        gestures(&outputs),
        vec![
            GestureEvent::ScrollDown,
            GestureEvent::ScrollDown,
            GestureEvent::ScrollDown,
        ]
    );

    // The 5 px remainder carries into the next sample.
    let outputs = engine.contact_move(two(81.0, 100));
    assert_eq!(gestures(&outputs), vec![GestureEvent::ScrollDown]);
}

#[test]
fn upward_motion_scrolls_up() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(100.0, 0));

    let outputs = engine.contact_move(two(75.0, 50));
    assert_eq!(gestures(&outputs), vec![GestureEvent::ScrollUp]);

    let up = engine.contact_up();
    assert!(gestures(&up).is_empty());
}

#[test]
fn accumulator_at_exact_step_does_not_tick() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(0.0, 0));

    assert!(gestures(&engine.contact_move(two(20.0, 50))).is_empty());

    // One more pixel pushes it past the step.
    let outputs = engine.contact_move(two(21.0, 100));
    assert_eq!(gestures(&outputs), vec![GestureEvent::ScrollDown]);
}

#[test]
fn remainder_keeps_its_sign_across_direction_change() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(0.0, 0));

    assert!(gestures(&engine.contact_move(two(15.0, 50))).is_empty());

    // 15 - 36 = -21: one upward tick, remainder -1.
    let outputs = engine.contact_move(two(-21.0, 100));
    assert_eq!(gestures(&outputs), vec![GestureEvent::ScrollUp]);

    // -1 - 18 = -19: still short of a tick.
    assert!(gestures(&engine.contact_move(two(-39.0, 150))).is_empty());
}

#[test]
fn interpretation_commits_at_first_contact() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(one(0.0, 0.0, 0));

    // A second finger arriving mid-session does not switch the gesture
    // to a scroll; the sample is treated as ordinary motion.
    let outputs = engine.contact_move(two(30.0, 50));
    assert_eq!(gestures(&outputs), vec![GestureEvent::DragMove { dx: 0, dy: 30 }]);
}

#[test]
fn single_contact_sample_in_two_finger_session_is_ignored() {
    let mut engine = GestureEngine::new(tuning());
    engine.contact_down(two(0.0, 0));

    assert!(engine.contact_move(one(0.0, 50.0, 50)).is_empty());

    let up = engine.contact_up();
    assert_eq!(gestures(&up), vec![GestureEvent::RightClick]);
}
