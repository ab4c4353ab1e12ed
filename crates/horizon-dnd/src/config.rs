//! Settings for the drag and drop manager.
//!
//! Settings can be built in code or loaded from TOML:
//!
//! ```
//! use horizon_dnd::{DndConfig, StrategyKind};
//!
//! let config = DndConfig::from_toml_str(r#"
//!     minimum_distance_to_start_drag = 5.0
//!     strategy = "touch"
//! "#).unwrap();
//! assert_eq!(config.strategy, StrategyKind::Touch);
//! assert_eq!(config.source_style_poll_interval_ms, 30);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DndError, DndResult};

/// Which event handling strategy the manager uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Pick from platform capabilities ([`DndConfig::touch_support`]).
    #[default]
    Auto,
    /// Mouse-oriented strategy.
    Default,
    /// Touch-oriented strategy.
    Touch,
}

/// Drag and drop manager settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DndConfig {
    /// Movement in pixels, on either axis, required before a pressed drag starts.
    pub minimum_distance_to_start_drag: f64,
    /// How often the drag source style is re-checked after a drop request.
    pub source_style_poll_interval_ms: u64,
    /// Class applied to the drag source's root element while dragging.
    pub active_drag_source_class: String,
    /// Class applied to the drag image element.
    pub drag_element_class: String,
    /// Event handling strategy.
    pub strategy: StrategyKind,
    /// Whether the platform delivers touch input. Used by [`StrategyKind::Auto`].
    pub touch_support: bool,
}

impl Default for DndConfig {
    fn default() -> Self {
        Self {
            minimum_distance_to_start_drag: 3.0,
            source_style_poll_interval_ms: 30,
            active_drag_source_class: "hl-active-drag-source".to_string(),
            drag_element_class: "hl-drag-element".to_string(),
            strategy: StrategyKind::Auto,
            touch_support: false,
        }
    }
}

impl DndConfig {
    /// Parses and validates settings from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> DndResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> DndResult<()> {
        if !self.minimum_distance_to_start_drag.is_finite()
            || self.minimum_distance_to_start_drag < 0.0
        {
            return Err(DndError::InvalidConfig(format!(
                "minimum_distance_to_start_drag must be a non-negative number, got {}",
                self.minimum_distance_to_start_drag
            )));
        }
        if self.source_style_poll_interval_ms == 0 {
            return Err(DndError::InvalidConfig(
                "source_style_poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        for (key, value) in [
            ("active_drag_source_class", &self.active_drag_source_class),
            ("drag_element_class", &self.drag_element_class),
        ] {
            if value.trim().is_empty() {
                return Err(DndError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// The source style poll interval as a duration.
    pub fn source_style_poll_interval(&self) -> Duration {
        Duration::from_millis(self.source_style_poll_interval_ms)
    }
}
