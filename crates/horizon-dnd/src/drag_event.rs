//! Per-drag state shared with drop handlers and criteria.

use std::sync::atomic::{AtomicU32, Ordering};

use horizon_dnd_core::{NativeEvent, NodeId, Point};
use serde_json::{Map, Value};

use crate::transferable::Transferable;

static NEXT_EVENT_ID: AtomicU32 = AtomicU32::new(1);

/// The kind of a drag request sent to the server.
///
/// The discriminant is the wire `type` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DragEventType {
    /// Entering a drop target; also used for criterion checks.
    Enter = 0,
    /// Leaving a drop target.
    Leave = 1,
    /// Moving over a drop target.
    Over = 2,
    /// Dropping on a drop target.
    Drop = 3,
}

impl DragEventType {
    /// Returns the wire ordinal.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// State of one drag operation.
///
/// Created by [`DragAndDropManager::start_drag`](crate::DragAndDropManager::start_drag)
/// and dropped when the drag ends. The event ID is unique per process and
/// correlates server visits with the drag that issued them.
#[derive(Debug)]
pub struct DragEvent {
    event_id: u32,
    transferable: Transferable,
    start_client: Option<Point>,
    current_event: Option<NativeEvent>,
    drop_details: Map<String, Value>,
    element_over: Option<NodeId>,
}

impl DragEvent {
    /// Creates drag state for a transferable and the event that started the drag.
    pub fn new(transferable: Transferable, start_event: Option<&NativeEvent>) -> Self {
        Self {
            event_id: NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed),
            transferable,
            start_client: start_event.map(NativeEvent::client),
            current_event: start_event.cloned(),
            drop_details: Map::new(),
            element_over: None,
        }
    }

    /// Returns the unique ID of this drag.
    pub fn event_id(&self) -> u32 {
        self.event_id
    }

    /// Returns the payload.
    pub fn transferable(&self) -> &Transferable {
        &self.transferable
    }

    /// Returns the payload for modification.
    pub fn transferable_mut(&mut self) -> &mut Transferable {
        &mut self.transferable
    }

    /// Client coordinates of the event that started the drag.
    pub fn start_client(&self) -> Option<Point> {
        self.start_client
    }

    /// Returns the most recent native event of the drag.
    pub fn current_event(&self) -> Option<&NativeEvent> {
        self.current_event.as_ref()
    }

    /// Replaces the most recent native event.
    pub fn set_current_event(&mut self, event: Option<NativeEvent>) {
        self.current_event = event;
    }

    /// Details about the drop location, sent with every server visit.
    pub fn drop_details(&self) -> &Map<String, Value> {
        &self.drop_details
    }

    /// Mutable drop details.
    pub fn drop_details_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.drop_details
    }

    /// Returns the element the drag is logically over.
    pub fn element_over(&self) -> Option<NodeId> {
        self.element_over
    }

    /// Sets the element the drag is logically over.
    pub fn set_element_over(&mut self, element: Option<NodeId>) {
        self.element_over = element;
    }
}
