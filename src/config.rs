use std::time::Duration;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::engine::MotionTuning;

/// What to perform when a gesture fires. Closed set; anything the host
/// dashboard understands beyond these goes through `Generic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ActionDescriptor {
    None,
    CallService {
        /// `domain.service`, e.g. `media_player.play_pause`.
        service: String,
        #[serde(default)]
        data: serde_json::Value,
    },
    Navigate {
        navigation_path: String,
    },
    Url {
        url_path: String,
    },
    Toggle {
        entity_id: String,
    },
    Generic {
        payload: serde_json::Value,
    },
}

impl Default for ActionDescriptor {
    fn default() -> Self {
        ActionDescriptor::None
    }
}

impl ActionDescriptor {
    pub fn is_none(&self) -> bool {
        matches!(self, ActionDescriptor::None)
    }
}

/// One action slot per gesture. Slots default to `None`, which makes
/// the matching dispatch a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSlots {
    #[serde(default)]
    pub tap_action: ActionDescriptor,
    #[serde(default)]
    pub right_click_action: ActionDescriptor,
    #[serde(default)]
    pub scroll_up_action: ActionDescriptor,
    #[serde(default)]
    pub scroll_down_action: ActionDescriptor,
    #[serde(default)]
    pub drag_start_action: ActionDescriptor,
    #[serde(default)]
    pub drag_end_action: ActionDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchpadConfig {
    /// Entity that receives relative cursor deltas via `set_value`.
    /// Required; an empty value fails validation and the surface is
    /// expected to render a static placeholder instead.
    #[serde(default)]
    pub coord_entity: String,
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    /// Distance in px a contact must travel before it counts as a drag.
    #[serde(default = "default_movement_threshold")]
    pub movement_threshold: f64,
    /// Milliseconds a motionless contact is held before drag mode engages.
    #[serde(default = "default_long_press_threshold")]
    pub long_press_threshold: u64,
    /// Milliseconds without qualifying motion before a held drag is
    /// force-released.
    #[serde(default = "default_drag_inactivity_timeout")]
    pub drag_inactivity_timeout: u64,
    /// Accumulated two-finger travel in px per emitted scroll tick.
    #[serde(default = "default_scroll_sensitivity")]
    pub scroll_sensitivity: f64,
    /// When enabled the binary initialises the logger at debug level.
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(flatten)]
    pub actions: ActionSlots,
}

fn default_sensitivity() -> f64 {
    1.0
}

fn default_acceleration() -> f64 {
    1.5
}

fn default_movement_threshold() -> f64 {
    5.0
}

fn default_long_press_threshold() -> u64 {
    300
}

fn default_drag_inactivity_timeout() -> u64 {
    600
}

fn default_scroll_sensitivity() -> f64 {
    20.0
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        Self {
            coord_entity: String::new(),
            sensitivity: default_sensitivity(),
            acceleration: default_acceleration(),
            movement_threshold: default_movement_threshold(),
            long_press_threshold: default_long_press_threshold(),
            drag_inactivity_timeout: default_drag_inactivity_timeout(),
            scroll_sensitivity: default_scroll_sensitivity(),
            debug_logging: false,
            actions: ActionSlots::default(),
        }
    }
}

impl TouchpadConfig {
    /// Startup-only gate: a config without a coordinate target never
    /// gets an engine.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.coord_entity.trim().is_empty() {
            bail!("coord_entity is not configured");
        }
        if !self.coord_entity.contains('.') {
            bail!(
                "coord_entity `{}` is not a `domain.object_id` entity id",
                self.coord_entity
            );
        }
        Ok(())
    }

    pub fn tuning(&self) -> MotionTuning {
        MotionTuning {
            sensitivity: self.sensitivity,
            acceleration: self.acceleration,
            movement_threshold: self.movement_threshold,
            long_press_threshold: Duration::from_millis(self.long_press_threshold),
            drag_inactivity_timeout: Duration::from_millis(self.drag_inactivity_timeout),
            scroll_sensitivity: self.scroll_sensitivity,
        }
    }
}

pub fn load_config(path: &str) -> anyhow::Result<TouchpadConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TouchpadConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_config(path: &str, config: &TouchpadConfig) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}
