//! The payload carried by a drag.

use horizon_dnd_core::WidgetId;
use serde_json::{Map, Value};

/// Data carried from a drag source to a drop target.
///
/// Values are keyed by data flavor. The drag source is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Transferable {
    drag_source: WidgetId,
    data: Map<String, Value>,
}

impl Transferable {
    /// Creates an empty transferable originating from `drag_source`.
    pub fn new(drag_source: WidgetId) -> Self {
        Self {
            drag_source,
            data: Map::new(),
        }
    }

    /// Returns the widget the drag started from.
    pub fn drag_source(&self) -> WidgetId {
        self.drag_source
    }

    /// Stores a value under a data flavor, replacing any previous value.
    pub fn set_data(&mut self, flavor: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(flavor.into(), value.into());
    }

    /// Returns the value stored under a data flavor.
    pub fn get_data(&self, flavor: &str) -> Option<&Value> {
        self.data.get(flavor)
    }

    /// Returns the data flavors present, sorted by name.
    pub fn data_flavors(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// Returns true if a value is stored under the flavor.
    pub fn has_flavor(&self, flavor: &str) -> bool {
        self.data.contains_key(flavor)
    }

    /// Returns the raw payload map sent to the server.
    pub fn variable_map(&self) -> &Map<String, Value> {
        &self.data
    }
}
