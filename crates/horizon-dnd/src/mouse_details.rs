//! Mouse event snapshots sent with server visits.

use std::fmt;

use horizon_dnd_core::{MouseButton, NativeEvent};

use crate::error::{DndError, DndResult};

const DELIMITER: char = ',';

/// A serializable description of a mouse or touch event.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseEventDetails {
    /// Pressed button. Touch events report [`MouseButton::Left`].
    pub button: MouseButton,
    /// Client X coordinate.
    pub client_x: i32,
    /// Client Y coordinate.
    pub client_y: i32,
    /// Alt was held.
    pub alt_key: bool,
    /// Control was held.
    pub ctrl_key: bool,
    /// Meta was held.
    pub meta_key: bool,
    /// Shift was held.
    pub shift_key: bool,
    /// DOM event type name.
    pub event_type: &'static str,
    /// X relative to a reference element, or `-1`.
    pub relative_x: i32,
    /// Y relative to a reference element, or `-1`.
    pub relative_y: i32,
}

impl MouseEventDetails {
    /// Describes a native event. Only mouse and touch events qualify.
    pub fn from_event(event: &NativeEvent) -> DndResult<Self> {
        let kind = event.kind();
        if !kind.is_mouse() && !kind.is_touch() {
            return Err(DndError::MouseEventSnapshot(kind.name()));
        }
        let client = event.client();
        let modifiers = event.modifiers();
        Ok(Self {
            button: if kind.is_touch() {
                MouseButton::Left
            } else {
                event.button()
            },
            client_x: client.x.round() as i32,
            client_y: client.y.round() as i32,
            alt_key: modifiers.alt,
            ctrl_key: modifiers.control,
            meta_key: modifiers.meta,
            shift_key: modifiers.shift,
            event_type: kind.name(),
            relative_x: -1,
            relative_y: -1,
        })
    }

    /// Serializes to the comma separated wire form.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MouseEventDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = DELIMITER;
        write!(
            f,
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            self.button.name(),
            self.client_x,
            self.client_y,
            self.alt_key,
            self.ctrl_key,
            self.meta_key,
            self.shift_key,
            self.event_type,
            self.relative_x,
            self.relative_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use horizon_dnd_core::{EventKind, Key, Modifiers, Point};

    use super::*;

    #[test]
    fn test_serialize_mouse_event() {
        let event = NativeEvent::new(EventKind::MouseUp, Point::new(10.4, 20.6))
            .with_button(MouseButton::Right)
            .with_modifiers(Modifiers {
                shift: true,
                ..Modifiers::default()
            });
        let details = MouseEventDetails::from_event(&event).unwrap();
        assert_eq!(
            details.serialize(),
            "right,10,21,false,false,false,true,mouseup,-1,-1"
        );
    }

    #[test]
    fn test_touch_reports_left_button() {
        let event = NativeEvent::new(EventKind::TouchMove, Point::new(1.0, 2.0))
            .with_button(MouseButton::Middle);
        let details = MouseEventDetails::from_event(&event).unwrap();
        assert_eq!(details.button, MouseButton::Left);
        assert_eq!(details.event_type, "touchmove");
    }

    #[test]
    fn test_key_events_cannot_be_snapshotted() {
        let event = NativeEvent::key_down(Key::Enter);
        assert!(matches!(
            MouseEventDetails::from_event(&event),
            Err(DndError::MouseEventSnapshot("keydown"))
        ));
    }
}
