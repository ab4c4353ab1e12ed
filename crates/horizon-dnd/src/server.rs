//! Server round trips made during a drag.
//!
//! A drop handler's server-side counterpart is reached through its
//! [`ServerConnection`]. Requests carry a visit ID; the host hands the reply
//! back to [`handle_server_response`], which only applies it when the ID still
//! matches the latest visit.
//!
//! [`handle_server_response`]: crate::DragAndDropManager::handle_server_response

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::drag_event::DragEventType;
use crate::drop_handler::{DeferredCommand, ServerCallback};
use crate::error::DndResult;

/// The channel to the server-side counterpart of a drop handler.
///
/// Implementations queue the request and return; the response must be
/// delivered later through the manager, never from inside `send`.
pub trait ServerConnection {
    /// Queues a drag request.
    fn send(&self, request: DragRequest);

    /// Returns true while any request on this connection is unanswered.
    fn has_active_request(&self) -> bool;
}

/// A drag request as sent to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragRequest {
    /// Correlation ID echoed in the response.
    #[serde(rename = "visitId")]
    pub visit_id: u32,
    /// ID of the drag that issued the request.
    #[serde(rename = "eventId")]
    pub event_id: u32,
    /// Connector of the widget owning the drop handler.
    #[serde(rename = "dhowner")]
    pub drop_handler_owner: Option<String>,
    /// Connector of the drag source.
    #[serde(rename = "component")]
    pub drag_source: Option<String>,
    /// [`DragEventType`] ordinal.
    #[serde(rename = "type")]
    pub event_type: u8,
    /// Drop details, including the `mouseEvent` snapshot.
    #[serde(rename = "evt")]
    pub drop_details: Map<String, Value>,
    /// The transferable's payload.
    #[serde(rename = "tra")]
    pub transferable: Map<String, Value>,
}

impl DragRequest {
    /// Returns the request kind.
    pub fn drag_event_type(&self) -> Option<DragEventType> {
        match self.event_type {
            0 => Some(DragEventType::Enter),
            1 => Some(DragEventType::Leave),
            2 => Some(DragEventType::Over),
            3 => Some(DragEventType::Drop),
            _ => None,
        }
    }

    /// Serializes the request to JSON.
    pub fn to_json(&self) -> DndResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A response to a drag request: an attribute bag with `visitId` and `accepted`
/// plus whatever the issuing criterion needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerResponse {
    attributes: Map<String, Value>,
}

impl ServerResponse {
    /// Creates a response for a visit.
    pub fn new(visit_id: u32, accepted: bool) -> Self {
        let mut attributes = Map::new();
        attributes.insert("visitId".to_string(), Value::from(visit_id));
        attributes.insert("accepted".to_string(), Value::from(accepted));
        Self { attributes }
    }

    /// Parses a JSON object.
    pub fn from_json(source: &str) -> DndResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// The echoed visit ID. Missing or malformed IDs read as `0`.
    pub fn visit_id(&self) -> u32 {
        self.attributes
            .get("visitId")
            .and_then(Value::as_u64)
            .and_then(|id| u32::try_from(id).ok())
            .unwrap_or(0)
    }

    /// Whether the server accepted. Missing reads as `false`.
    pub fn accepted(&self) -> bool {
        self.attributes
            .get("accepted")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns a raw attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Reads a string array attribute. Missing attributes and non-string
    /// entries are skipped.
    pub fn string_array(&self, name: &str) -> Vec<String> {
        self.attributes
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Bookkeeping for server visits of the active drag.
#[derive(Default)]
pub(crate) struct ServerVisits {
    /// ID of the latest visit; `0` when no drag is active.
    pub(crate) visit_id: u32,
    /// Invoked with the response matching `visit_id`.
    pub(crate) server_callback: Option<ServerCallback>,
    /// Single command waiting for the pending visit to finish.
    pub(crate) deferred_command: Option<DeferredCommand>,
}

impl ServerVisits {
    pub(crate) fn is_busy(&self) -> bool {
        self.server_callback.is_some()
    }

    pub(crate) fn reset(&mut self) {
        self.visit_id = 0;
        self.server_callback = None;
        self.deferred_command = None;
    }
}

impl std::fmt::Debug for ServerVisits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerVisits")
            .field("visit_id", &self.visit_id)
            .field("busy", &self.is_busy())
            .field("deferred", &self.deferred_command.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_json() {
        let json = r#"{"visitId": 5, "accepted": true, "allowedIds": ["1", "3", 4]}"#;
        let response = ServerResponse::from_json(json).unwrap();
        assert_eq!(response.visit_id(), 5);
        assert!(response.accepted());
        assert_eq!(response.string_array("allowedIds"), vec!["1", "3"]);
        assert!(response.string_array("missing").is_empty());
    }

    #[test]
    fn test_response_defaults() {
        let response = ServerResponse::from_json("{}").unwrap();
        assert_eq!(response.visit_id(), 0);
        assert!(!response.accepted());
        assert!(ServerResponse::from_json("[1]").is_err());
    }

    #[test]
    fn test_request_wire_keys() {
        let mut tra = Map::new();
        tra.insert("itemId".to_string(), Value::from(7));
        let request = DragRequest {
            visit_id: 2,
            event_id: 9,
            drop_handler_owner: Some("5".to_string()),
            drag_source: None,
            event_type: DragEventType::Drop.ordinal(),
            drop_details: Map::new(),
            transferable: tra,
        };
        let json: Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["visitId"], 2);
        assert_eq!(json["eventId"], 9);
        assert_eq!(json["dhowner"], "5");
        assert_eq!(json["component"], Value::Null);
        assert_eq!(json["type"], 3);
        assert_eq!(json["tra"]["itemId"], 7);
        assert_eq!(request.drag_event_type(), Some(DragEventType::Drop));
    }
}
