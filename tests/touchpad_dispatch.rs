use std::sync::{Arc, Mutex};

use serde_json::json;
use touchpad_link::config::{ActionDescriptor, TouchpadConfig};
use touchpad_link::dispatch::{format_delta, ActionDispatcher, ServiceBus};
use touchpad_link::engine::GestureEvent;

#[derive(Default)]
struct RecordingBus {
    calls: Mutex<Vec<(String, String, serde_json::Value)>>,
    paths: Mutex<Vec<String>>,
    events: Mutex<Vec<serde_json::Value>>,
}

impl RecordingBus {
    fn calls(&self) -> Vec<(String, String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }

    fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<serde_json::Value> {
        self.events.lock().unwrap().clone()
    }
}

impl ServiceBus for RecordingBus {
    fn call_service(&self, domain: &str, service: &str, data: serde_json::Value) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((domain.to_string(), service.to_string(), data));
        Ok(())
    }

    fn navigate(&self, path: &str) -> anyhow::Result<()> {
        self.paths.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn fire_event(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(payload);
        Ok(())
    }
}

fn config() -> TouchpadConfig {
    let mut config = TouchpadConfig::default();
    config.coord_entity = "input_text.mouse_coords".to_string();
    config
}

fn dispatcher(config: &TouchpadConfig) -> (ActionDispatcher, Arc<RecordingBus>) {
    let bus = Arc::new(RecordingBus::default());
    (ActionDispatcher::new(config, bus.clone()), bus)
}

#[test]
fn delta_wire_format_is_sign_prefixed() {
    assert_eq!(format_delta(3, -12), "+3,-12");
    assert_eq!(format_delta(0, 0), "+0,+0");
    assert_eq!(format_delta(-1, 25), "-1,+25");
}

#[test]
fn send_move_targets_the_coordinate_entity() {
    let config = config();
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.send_move(8, -3);

    assert_eq!(
        bus.calls(),
        vec![(
            "input_text".to_string(),
            "set_value".to_string(),
            json!({ "entity_id": "input_text.mouse_coords", "value": "+8,-3" }),
        )]
    );
}

#[test]
fn tap_routes_to_its_slot() {
    let mut config = config();
    config.actions.tap_action = ActionDescriptor::CallService {
        service: "media_player.play_pause".to_string(),
        data: json!({ "entity_id": "media_player.tv" }),
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::Tap);

    assert_eq!(
        bus.calls(),
        vec![(
            "media_player".to_string(),
            "play_pause".to_string(),
            json!({ "entity_id": "media_player.tv" }),
        )]
    );
}

#[test]
fn unconfigured_slot_is_a_noop() {
    let config = config();
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::Tap);
    dispatcher.dispatch(&GestureEvent::ScrollUp);
    dispatcher.dispatch(&GestureEvent::DragEnd);

    assert!(bus.calls().is_empty());
    assert!(bus.paths().is_empty());
    assert!(bus.events().is_empty());
}

#[test]
fn toggle_targets_the_entity_domain() {
    let mut config = config();
    config.actions.right_click_action = ActionDescriptor::Toggle {
        entity_id: "light.desk".to_string(),
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::RightClick);

    assert_eq!(
        bus.calls(),
        vec![(
            "light".to_string(),
            "toggle".to_string(),
            json!({ "entity_id": "light.desk" }),
        )]
    );
}

#[test]
fn navigate_routes_to_the_bus() {
    let mut config = config();
    config.actions.scroll_down_action = ActionDescriptor::Navigate {
        navigation_path: "/lovelace/media".to_string(),
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::ScrollDown);

    assert_eq!(bus.paths(), vec!["/lovelace/media".to_string()]);
}

#[test]
fn generic_descriptor_fires_a_host_event() {
    let mut config = config();
    config.actions.drag_start_action = ActionDescriptor::Generic {
        payload: json!({ "kind": "hold", "strength": 2 }),
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::DragStart);

    assert_eq!(bus.events(), vec![json!({ "kind": "hold", "strength": 2 })]);
}

#[test]
fn malformed_service_is_absorbed() {
    let mut config = config();
    config.actions.tap_action = ActionDescriptor::CallService {
        service: "no_dot_here".to_string(),
        data: serde_json::Value::Null,
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::Tap);

    assert!(bus.calls().is_empty());
}

#[test]
fn toggle_without_domain_is_absorbed() {
    let mut config = config();
    config.actions.right_click_action = ActionDescriptor::Toggle {
        entity_id: "desk".to_string(),
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::RightClick);

    assert!(bus.calls().is_empty());
}

#[test]
fn drag_move_never_routes_through_slots() {
    let mut config = config();
    config.actions.tap_action = ActionDescriptor::CallService {
        service: "light.turn_on".to_string(),
        data: serde_json::Value::Null,
    };
    let (dispatcher, bus) = dispatcher(&config);

    dispatcher.dispatch(&GestureEvent::DragMove { dx: 5, dy: 5 });

    assert!(bus.calls().is_empty());
}
