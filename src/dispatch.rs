use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use url::Url;

use crate::config::{ActionDescriptor, ActionSlots, TouchpadConfig};
use crate::engine::GestureEvent;

/// The host dashboard's service-call interface. Calls are synchronous
/// and fire-and-forget from the engine's point of view; no retries, no
/// queueing.
pub trait ServiceBus: Send + Sync {
    fn call_service(&self, domain: &str, service: &str, data: serde_json::Value) -> Result<()>;
    fn navigate(&self, path: &str) -> Result<()>;
    fn fire_event(&self, payload: serde_json::Value) -> Result<()>;
}

/// Bus that only logs what it would do. Used by the trace player; also
/// handy when wiring a surface before the real backend exists.
#[derive(Debug, Default)]
pub struct LogBus;

impl ServiceBus for LogBus {
    fn call_service(&self, domain: &str, service: &str, data: serde_json::Value) -> Result<()> {
        tracing::info!(%domain, %service, %data, "call_service");
        Ok(())
    }

    fn navigate(&self, path: &str) -> Result<()> {
        tracing::info!(%path, "navigate");
        Ok(())
    }

    fn fire_event(&self, payload: serde_json::Value) -> Result<()> {
        tracing::info!(%payload, "fire_event");
        Ok(())
    }
}

/// Maps fired gestures to their configured actions and performs them
/// against the bus. Failures are absorbed with a warning; a dispatch
/// never feeds back into gesture recognition.
pub struct ActionDispatcher {
    bus: Arc<dyn ServiceBus>,
    coord_entity: String,
    coord_domain: String,
    slots: ActionSlots,
}

impl ActionDispatcher {
    pub fn new(config: &TouchpadConfig, bus: Arc<dyn ServiceBus>) -> Self {
        Self {
            bus,
            coord_entity: config.coord_entity.clone(),
            coord_domain: domain_of(&config.coord_entity).to_string(),
            slots: config.actions.clone(),
        }
    }

    /// Route one fired gesture to its slot. Motion deltas do not go
    /// through slots; see [`ActionDispatcher::send_move`].
    pub fn dispatch(&self, event: &GestureEvent) {
        let Some(descriptor) = self.slot(event) else {
            return;
        };
        if let Err(err) = self.perform(descriptor) {
            tracing::warn!(?event, ?err, "touchpad action failed");
        }
    }

    /// Push one velocity-scaled cursor delta to the coordinate entity.
    pub fn send_move(&self, dx: i32, dy: i32) {
        let data = json!({
            "entity_id": self.coord_entity,
            "value": format_delta(dx, dy),
        });
        if let Err(err) = self.bus.call_service(&self.coord_domain, "set_value", data) {
            tracing::warn!(?err, "failed to send cursor delta");
        }
    }

    fn slot(&self, event: &GestureEvent) -> Option<&ActionDescriptor> {
        let descriptor = match event {
            GestureEvent::Tap => &self.slots.tap_action,
            GestureEvent::RightClick => &self.slots.right_click_action,
            GestureEvent::ScrollUp => &self.slots.scroll_up_action,
            GestureEvent::ScrollDown => &self.slots.scroll_down_action,
            GestureEvent::DragStart => &self.slots.drag_start_action,
            GestureEvent::DragEnd => &self.slots.drag_end_action,
            GestureEvent::DragMove { .. } => return None,
        };
        if descriptor.is_none() {
            None
        } else {
            Some(descriptor)
        }
    }

    fn perform(&self, descriptor: &ActionDescriptor) -> Result<()> {
        match descriptor {
            ActionDescriptor::None => Ok(()),
            ActionDescriptor::CallService { service, data } => {
                let (domain, service) = split_service(service)?;
                self.bus.call_service(domain, service, data.clone())
            }
            ActionDescriptor::Navigate { navigation_path } => self.bus.navigate(navigation_path),
            ActionDescriptor::Url { url_path } => {
                let url = Url::parse(url_path).with_context(|| format!("invalid url `{url_path}`"))?;
                open::that_detached(url.as_str())?;
                Ok(())
            }
            ActionDescriptor::Toggle { entity_id } => {
                let domain = domain_of(entity_id);
                if domain.is_empty() || domain == entity_id {
                    bail!("toggle target `{entity_id}` has no domain");
                }
                self.bus
                    .call_service(domain, "toggle", json!({ "entity_id": entity_id }))
            }
            ActionDescriptor::Generic { payload } => self.bus.fire_event(payload.clone()),
        }
    }
}

/// Sign-prefixed relative delta, e.g. `+3,-12`. Non-negative components
/// carry an explicit `+` so the receiver can tell the value is relative.
pub fn format_delta(dx: i32, dy: i32) -> String {
    format!("{dx:+},{dy:+}")
}

fn split_service(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('.') {
        Some((domain, service)) if !domain.is_empty() && !service.is_empty() => Ok((domain, service)),
        _ => bail!("malformed service `{raw}`, expected `domain.service`"),
    }
}

fn domain_of(entity_id: &str) -> &str {
    entity_id.split_once('.').map(|(domain, _)| domain).unwrap_or(entity_id)
}
