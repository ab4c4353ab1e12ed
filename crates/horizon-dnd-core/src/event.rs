//! Native input events delivered by the host.
//!
//! A [`NativeEvent`] is what the host's event loop hands to interested
//! previewers before normal dispatch. Previewers may cancel the event, prevent
//! its default action or stop its propagation; those decisions are recorded on
//! the event itself so the host can act on them after the preview returns.

use std::cell::Cell;

use crate::dom::NodeId;
use crate::geometry::Point;

/// The kind of a native input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A mouse button was pressed.
    MouseDown,
    /// A mouse button was released.
    MouseUp,
    /// The mouse moved.
    MouseMove,
    /// The mouse entered an element.
    MouseOver,
    /// The mouse left an element.
    MouseOut,
    /// A click was synthesized after press and release.
    Click,
    /// A touch point was placed.
    TouchStart,
    /// A touch point moved.
    TouchMove,
    /// A touch point was lifted.
    TouchEnd,
    /// The touch sequence was cancelled by the platform.
    TouchCancel,
    /// A key was pressed.
    KeyDown,
    /// A character key produced input.
    KeyPress,
    /// A key was released.
    KeyUp,
    /// An element gained focus.
    Focus,
    /// An element lost focus.
    Blur,
    /// A pointer-events compatibility event duplicating a mouse or touch event.
    Pointer,
    /// The page or an element scrolled.
    Scroll,
}

impl EventKind {
    /// Returns the DOM event type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::MouseMove => "mousemove",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::Click => "click",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::KeyDown => "keydown",
            Self::KeyPress => "keypress",
            Self::KeyUp => "keyup",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::Pointer => "pointer",
            Self::Scroll => "scroll",
        }
    }

    /// Returns true for touch events.
    pub fn is_touch(self) -> bool {
        matches!(
            self,
            Self::TouchStart | Self::TouchMove | Self::TouchEnd | Self::TouchCancel
        )
    }

    /// Returns true for mouse events.
    pub fn is_mouse(self) -> bool {
        matches!(
            self,
            Self::MouseDown
                | Self::MouseUp
                | Self::MouseMove
                | Self::MouseOver
                | Self::MouseOut
                | Self::Click
        )
    }

    /// Returns true for keyboard events.
    pub fn is_key(self) -> bool {
        matches!(self, Self::KeyDown | Self::KeyPress | Self::KeyUp)
    }

    /// Returns true for events that start a press gesture.
    pub fn is_press(self) -> bool {
        matches!(self, Self::MouseDown | Self::TouchStart)
    }
}

/// Keys the drag and drop machinery cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// The Escape key.
    Escape,
    /// The Enter key.
    Enter,
    /// The Tab key.
    Tab,
    /// A printable character.
    Character(char),
    /// Any other key, by platform key code.
    Other(u32),
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    /// Primary button (usually left).
    #[default]
    Left,
    /// Secondary button (usually right).
    Right,
    /// Middle button (scroll wheel click).
    Middle,
}

impl MouseButton {
    /// Returns the lowercase name used in serialized event snapshots.
    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Middle => "middle",
        }
    }
}

/// Keyboard modifiers held during an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Modifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta key is held.
    pub meta: bool,
}

/// A native input event as seen by preview handlers.
#[derive(Debug, Clone)]
pub struct NativeEvent {
    kind: EventKind,
    client: Point,
    target: Option<NodeId>,
    related_target: Option<NodeId>,
    current_target: Option<NodeId>,
    key: Option<Key>,
    button: MouseButton,
    modifiers: Modifiers,
    canceled: Cell<bool>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl NativeEvent {
    /// Creates an event of the given kind at client coordinates.
    pub fn new(kind: EventKind, client: Point) -> Self {
        Self {
            kind,
            client,
            target: None,
            related_target: None,
            current_target: None,
            key: None,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
            canceled: Cell::new(false),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    /// Creates a mouse event targeted at a node.
    pub fn mouse(kind: EventKind, client: Point, target: NodeId) -> Self {
        Self::new(kind, client).with_target(target)
    }

    /// Creates a touch event. Touch events report the first touch point.
    pub fn touch(kind: EventKind, client: Point, target: NodeId) -> Self {
        Self::new(kind, client).with_target(target)
    }

    /// Creates a key-down event.
    pub fn key_down(key: Key) -> Self {
        let mut event = Self::new(EventKind::KeyDown, Point::ZERO);
        event.key = Some(key);
        event
    }

    /// Sets the event target.
    pub fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the related target (the node being entered on `mouseout`).
    pub fn with_related_target(mut self, related: NodeId) -> Self {
        self.related_target = Some(related);
        self
    }

    /// Sets the node whose listener is currently handling the event.
    pub fn with_current_target(mut self, current: NodeId) -> Self {
        self.current_target = Some(current);
        self
    }

    /// Sets the key for keyboard events.
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets the mouse button.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Sets the keyboard modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Returns the event kind.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the client coordinates of the mouse or first touch point.
    pub fn client(&self) -> Point {
        self.client
    }

    /// Returns the node the event was dispatched to.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Returns the related target, if any.
    pub fn related_target(&self) -> Option<NodeId> {
        self.related_target
    }

    /// Returns the node whose listener is handling the event.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    /// Returns the key for keyboard events.
    pub fn key(&self) -> Option<Key> {
        self.key
    }

    /// Returns the mouse button.
    pub fn button(&self) -> MouseButton {
        self.button
    }

    /// Returns the keyboard modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Returns true for touch events.
    pub fn is_touch(&self) -> bool {
        self.kind.is_touch()
    }

    /// Cancels the preview: the event is not dispatched to its target.
    pub fn cancel(&self) {
        self.canceled.set(true);
    }

    /// Returns true if a previewer canceled the event.
    pub fn is_canceled(&self) -> bool {
        self.canceled.get()
    }

    /// Prevents the event's default action.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    /// Returns true if the default action was prevented.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stops further propagation of the event.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Returns true if propagation was stopped.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Cancels the event, prevents its default action and stops propagation.
    pub fn suppress(&self) {
        self.stop_propagation();
        self.prevent_default();
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_classification() {
        assert!(EventKind::TouchMove.is_touch());
        assert!(!EventKind::MouseMove.is_touch());
        assert!(EventKind::MouseOut.is_mouse());
        assert!(EventKind::KeyUp.is_key());
        assert!(EventKind::TouchStart.is_press());
        assert!(!EventKind::MouseUp.is_press());
        assert_eq!(EventKind::MouseMove.name(), "mousemove");
    }

    #[test]
    fn test_suppress_sets_all_flags() {
        let event = NativeEvent::new(EventKind::MouseMove, Point::new(1.0, 2.0));
        assert!(!event.is_canceled());
        event.suppress();
        assert!(event.is_canceled());
        assert!(event.is_default_prevented());
        assert!(event.is_propagation_stopped());
    }

    #[test]
    fn test_key_down() {
        let event = NativeEvent::key_down(Key::Escape);
        assert_eq!(event.kind(), EventKind::KeyDown);
        assert_eq!(event.key(), Some(Key::Escape));
        assert!(event.target().is_none());
    }
}
