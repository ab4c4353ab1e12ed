//! Interpretation of native events during an active drag.
//!
//! The manager hands every previewed event to its [`EventHandleStrategy`]. The
//! strategy decides whether the event interrupts the drag, finds the element
//! the drag is logically over and drives enter/over/leave/drop through the
//! manager. Every method has a default; strategies override the steps that
//! differ per platform.
//!
//! While a drag image follows the cursor it would be the target of every
//! mouse event. Strategies therefore hit-test by coordinate with the image
//! hidden, see [`EventHandleStrategy::get_target_element`].

use std::rc::Rc;

use horizon_dnd_core::{Display, EventKind, Key, NativeEvent, NodeId};

use crate::error::DndResult;
use crate::manager::DragAndDropManager;

/// Platform policy for interpreting native events during a drag.
pub trait EventHandleStrategy {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns true if the event cancels the drag (Escape pressed).
    fn is_drag_interrupted(&self, event: &NativeEvent) -> bool {
        event.kind() == EventKind::KeyDown && event.key() == Some(Key::Escape)
    }

    /// Handles any other key-down event. Processing of the event stops after.
    fn handle_key_down_event(&self, _event: &NativeEvent, _manager: &mut DragAndDropManager) {}

    /// Returns true if the target must be found by coordinate rather than
    /// taken from the event.
    fn needs_coordinate_hit_test(&self, event: &NativeEvent, manager: &DragAndDropManager) -> bool {
        event.is_touch() || manager.drag_element().is_some()
    }

    /// Moves the drag image to the cursor and hides it. Returns the display
    /// value to restore.
    fn update_drag_image(
        &self,
        _event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) -> DndResult<Option<Display>> {
        manager.update_drag_image_position()?;
        manager.hide_drag_element()
    }

    /// Restores the drag image hidden by [`update_drag_image`](Self::update_drag_image).
    fn restore_drag_image(
        &self,
        saved: Option<Display>,
        manager: &mut DragAndDropManager,
    ) -> DndResult<()> {
        manager.restore_drag_element(saved)
    }

    /// Finds the element under the cursor, looking through the drag image.
    fn get_target_element(
        &self,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) -> DndResult<Option<NodeId>> {
        let saved = self.update_drag_image(event, manager)?;
        let hit = manager.document().read().element_from_point(event.client());
        self.restore_drag_image(saved, manager)?;
        tracing::trace!(target: "horizon_dnd::strategy", ?hit, "hit-tested through drag image");
        Ok(hit)
    }

    /// Handles events whose target was found by coordinate.
    ///
    /// Returns true if the event is fully handled.
    fn handle_drag_image_event(
        &self,
        target: Option<NodeId>,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) -> bool {
        let Some(element) = target else {
            tracing::trace!(
                target: "horizon_dnd::strategy",
                "nothing under the drag image, event suppressed"
            );
            event.cancel();
            event.stop_propagation();
            return true;
        };

        match event.kind() {
            // Fired because the image moved under the cursor.
            EventKind::MouseOver | EventKind::MouseOut => true,
            EventKind::MouseMove | EventKind::TouchMove => {
                let found = manager.find_drag_target(Some(element));
                if !manager.is_current_drop_target(found.as_ref()) {
                    if manager.current_drop_target().is_some() {
                        manager.fire_drag_leave(true);
                    }
                    if let Some(found) = found {
                        manager.fire_drag_enter(found, Some(element));
                    }
                } else if found.is_some() {
                    manager.fire_drag_over(Some(element));
                }
                event.prevent_default();
                true
            }
            _ => {
                manager.set_element_over(Some(element));
                false
            }
        }
    }

    /// Dispatches an event once its target element is known.
    fn handle_event(
        &self,
        target: Option<NodeId>,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        match event.kind() {
            EventKind::MouseOver => self.handle_mouse_over(target, event, manager),
            EventKind::MouseOut => self.handle_mouse_out(target, event, manager),
            EventKind::MouseMove | EventKind::TouchMove => {
                self.handle_mouse_move(target, event, manager)
            }
            EventKind::TouchEnd => self.handle_touch_end(target, event, manager),
            EventKind::MouseUp => self.handle_mouse_up(target, event, manager),
            _ => {}
        }
    }

    /// The cursor entered `target`: switch drop targets if it belongs to another.
    fn handle_mouse_over(
        &self,
        target: Option<NodeId>,
        _event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        match manager.find_drag_target(target) {
            Some(found) if !manager.is_current_drop_target(Some(&found)) => {
                if manager.current_drop_target().is_some() {
                    manager.fire_drag_leave(false);
                }
                manager.fire_drag_enter(found, target);
            }
            None if manager.current_drop_target().is_some() => {
                manager.fire_drag_leave(false);
            }
            _ => {}
        }
    }

    /// The cursor left an element: leave the drop target unless the element
    /// entered belongs to it or to the drag image.
    fn handle_mouse_out(
        &self,
        _target: Option<NodeId>,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        let related = event.related_target();
        if let (Some(image), Some(related)) = (manager.drag_element(), related) {
            if manager.document().read().is_or_has_child(image, related) {
                return;
            }
        }
        let entered = manager.find_drag_target(related);
        if manager.current_drop_target().is_some()
            && !manager.is_current_drop_target(entered.as_ref())
        {
            manager.fire_drag_leave(true);
        }
    }

    /// The cursor moved over the current drop target.
    fn handle_mouse_move(
        &self,
        target: Option<NodeId>,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        if manager.current_drop_target().is_some() {
            manager.fire_drag_over(target);
        }
        event.prevent_default();
    }

    /// A touch drag was released. The default action is prevented so no
    /// emulated mouse event repeats the drop.
    fn handle_touch_end(
        &self,
        _target: Option<NodeId>,
        event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        event.prevent_default();
        manager.end_drag();
    }

    /// A mouse drag was released.
    fn handle_mouse_up(
        &self,
        _target: Option<NodeId>,
        _event: &NativeEvent,
        manager: &mut DragAndDropManager,
    ) {
        manager.end_drag();
    }
}

/// Strategy for mouse-driven platforms.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEventHandleStrategy;

impl EventHandleStrategy for DefaultEventHandleStrategy {
    fn name(&self) -> &'static str {
        "default"
    }
}

/// Strategy for touch platforms.
///
/// Always hit-tests by coordinate and ignores the `mouseover`/`mouseout`
/// events touch browsers emulate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TouchEventHandleStrategy;

impl EventHandleStrategy for TouchEventHandleStrategy {
    fn name(&self) -> &'static str {
        "touch"
    }

    fn needs_coordinate_hit_test(
        &self,
        _event: &NativeEvent,
        _manager: &DragAndDropManager,
    ) -> bool {
        true
    }

    fn handle_mouse_over(
        &self,
        _target: Option<NodeId>,
        _event: &NativeEvent,
        _manager: &mut DragAndDropManager,
    ) {
    }

    fn handle_mouse_out(
        &self,
        _target: Option<NodeId>,
        _event: &NativeEvent,
        _manager: &mut DragAndDropManager,
    ) {
    }
}

/// Input capabilities of the running platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    /// The platform delivers touch events.
    pub touch_support: bool,
}

/// Picks the strategy for a platform.
pub fn select_strategy(capabilities: &PlatformCapabilities) -> Rc<dyn EventHandleStrategy> {
    let strategy: Rc<dyn EventHandleStrategy> = if capabilities.touch_support {
        Rc::new(TouchEventHandleStrategy)
    } else {
        Rc::new(DefaultEventHandleStrategy)
    };
    tracing::debug!(
        target: "horizon_dnd::strategy",
        strategy = strategy.name(),
        "selected event strategy"
    );
    strategy
}

#[cfg(test)]
mod tests {
    use horizon_dnd_core::Point;

    use super::*;

    #[test]
    fn test_escape_interrupts() {
        let strategy = DefaultEventHandleStrategy;
        assert!(strategy.is_drag_interrupted(&NativeEvent::key_down(Key::Escape)));
        assert!(!strategy.is_drag_interrupted(&NativeEvent::key_down(Key::Enter)));
        let key_up = NativeEvent::new(EventKind::KeyUp, Point::ZERO).with_key(Key::Escape);
        assert!(!strategy.is_drag_interrupted(&key_up));
    }

    #[test]
    fn test_select_strategy() {
        let touch = select_strategy(&PlatformCapabilities { touch_support: true });
        assert_eq!(touch.name(), "touch");
        let mouse = select_strategy(&PlatformCapabilities::default());
        assert_eq!(mouse.name(), "default");
    }
}
