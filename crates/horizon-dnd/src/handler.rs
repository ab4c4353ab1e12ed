//! Raw press-move-release tracking for widgets that need a drag gesture
//! without drop targets, such as resize handles.
//!
//! [`DragAndDropHandler`] waits after a press until the pointer moves past a
//! threshold, asks its [`DragAndDropCallback`] whether to start, and then
//! reports every move until release, Escape or touch cancel. While dragging
//! every previewed event is suppressed.

use horizon_dnd_core::{EventKind, Key, NativeEvent, SharedDocument};

/// Receives the gesture reported by a [`DragAndDropHandler`].
pub trait DragAndDropCallback {
    /// The pointer moved past the threshold. Returning false vetoes the drag.
    fn on_drag_start(&mut self, start_event: &NativeEvent) -> bool;

    /// The pointer moved while dragging. Also called with the event that
    /// started the drag and with the release event.
    fn on_drag_update(&mut self, event: &NativeEvent);

    /// The drag was released.
    fn on_drop(&mut self);

    /// The drag was canceled by Escape or touch cancel.
    fn on_drag_cancel(&mut self);

    /// The drag finished, by drop or cancel. Always the last call.
    fn on_drag_end(&mut self);
}

enum HandlerState {
    Idle,
    Pending {
        start_event: NativeEvent,
        callback: Box<dyn DragAndDropCallback>,
    },
    Dragging {
        callback: Box<dyn DragAndDropCallback>,
    },
}

/// Tracks one drag gesture at a time.
pub struct DragAndDropHandler {
    document: SharedDocument,
    threshold: f64,
    state: HandlerState,
}

impl DragAndDropHandler {
    /// Default start threshold in pixels.
    pub const DEFAULT_THRESHOLD: f64 = 3.0;

    /// Creates an idle handler.
    pub fn new(document: SharedDocument) -> Self {
        Self {
            document,
            threshold: Self::DEFAULT_THRESHOLD,
            state: HandlerState::Idle,
        }
    }

    /// Sets the movement needed on either axis before a drag starts.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Returns true while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, HandlerState::Dragging { .. })
    }

    /// Returns true while a press waits for the threshold.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, HandlerState::Pending { .. })
    }

    /// Begins watching for a drag after a press on a draggable element.
    ///
    /// Replaces a press that has not started dragging yet. Ignored while a
    /// drag is in progress.
    pub fn on_drag_start_on_draggable_element(
        &mut self,
        start_event: &NativeEvent,
        callback: Box<dyn DragAndDropCallback>,
    ) {
        if self.is_dragging() {
            tracing::debug!(target: "horizon_dnd::handler", "drag in progress, press ignored");
            return;
        }
        self.state = HandlerState::Pending {
            start_event: start_event.clone(),
            callback,
        };
    }

    /// Handles a native event. Does nothing while idle.
    pub fn preview_native_event(&mut self, event: &NativeEvent) {
        match std::mem::replace(&mut self.state, HandlerState::Idle) {
            HandlerState::Idle => {}
            HandlerState::Pending {
                start_event,
                callback,
            } => self.preview_pending(start_event, callback, event),
            HandlerState::Dragging { callback } => self.preview_dragging(callback, event),
        }
    }

    fn preview_pending(
        &mut self,
        start_event: NativeEvent,
        callback: Box<dyn DragAndDropCallback>,
        event: &NativeEvent,
    ) {
        match event.kind() {
            EventKind::Pointer
            | EventKind::MouseOver
            | EventKind::MouseOut
            | EventKind::KeyDown
            | EventKind::KeyPress
            | EventKind::KeyUp
            | EventKind::Focus
            | EventKind::Blur => {
                self.state = HandlerState::Pending {
                    start_event,
                    callback,
                };
            }
            EventKind::MouseMove | EventKind::TouchMove => {
                if event
                    .client()
                    .exceeds_axis_threshold(start_event.client(), self.threshold)
                {
                    self.start_drag(&start_event, callback, event);
                } else {
                    self.state = HandlerState::Pending {
                        start_event,
                        callback,
                    };
                }
            }
            kind => {
                tracing::trace!(
                    target: "horizon_dnd::handler",
                    kind = kind.name(),
                    "pending drag abandoned"
                );
            }
        }
    }

    fn start_drag(
        &mut self,
        start_event: &NativeEvent,
        mut callback: Box<dyn DragAndDropCallback>,
        trigger: &NativeEvent,
    ) {
        if !callback.on_drag_start(start_event) {
            tracing::debug!(target: "horizon_dnd::handler", "drag start vetoed");
            return;
        }
        tracing::debug!(target: "horizon_dnd::handler", "drag started");
        {
            let mut doc = self.document.write();
            let body = doc.body();
            if let Err(err) = doc.set_capture(body) {
                tracing::debug!(target: "horizon_dnd::handler", %err, "capture not set");
            }
        }
        callback.on_drag_update(trigger);
        self.state = HandlerState::Dragging { callback };
    }

    fn preview_dragging(
        &mut self,
        mut callback: Box<dyn DragAndDropCallback>,
        event: &NativeEvent,
    ) {
        let finished = match event.kind() {
            EventKind::MouseMove | EventKind::TouchMove => {
                callback.on_drag_update(event);
                false
            }
            EventKind::KeyDown if event.key() == Some(Key::Escape) => {
                callback.on_drag_cancel();
                true
            }
            EventKind::TouchCancel => {
                callback.on_drag_cancel();
                true
            }
            EventKind::TouchEnd | EventKind::MouseUp => {
                callback.on_drag_update(event);
                callback.on_drop();
                true
            }
            _ => false,
        };
        event.suppress();

        if finished {
            self.stop_drag(callback);
        } else {
            self.state = HandlerState::Dragging { callback };
        }
    }

    fn stop_drag(&mut self, mut callback: Box<dyn DragAndDropCallback>) {
        self.document.write().release_capture();
        tracing::debug!(target: "horizon_dnd::handler", "drag ended");
        callback.on_drag_end();
    }
}

impl std::fmt::Debug for DragAndDropHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            HandlerState::Idle => "idle",
            HandlerState::Pending { .. } => "pending",
            HandlerState::Dragging { .. } => "dragging",
        };
        f.debug_struct("DragAndDropHandler")
            .field("threshold", &self.threshold)
            .field("state", &state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use horizon_dnd_core::{Document, Point};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Rc<RefCell<Vec<String>>>,
        veto: bool,
    }

    impl DragAndDropCallback for Recorder {
        fn on_drag_start(&mut self, start_event: &NativeEvent) -> bool {
            self.calls
                .borrow_mut()
                .push(format!("start {}", start_event.kind().name()));
            !self.veto
        }

        fn on_drag_update(&mut self, event: &NativeEvent) {
            self.calls.borrow_mut().push(format!("update {}", event.client().x));
        }

        fn on_drop(&mut self) {
            self.calls.borrow_mut().push("drop".to_string());
        }

        fn on_drag_cancel(&mut self) {
            self.calls.borrow_mut().push("cancel".to_string());
        }

        fn on_drag_end(&mut self) {
            self.calls.borrow_mut().push("end".to_string());
        }
    }

    fn mouse(kind: EventKind, x: f64) -> NativeEvent {
        NativeEvent::new(kind, Point::new(x, 0.0))
    }

    fn pressed(veto: bool) -> (DragAndDropHandler, Rc<RefCell<Vec<String>>>, SharedDocument) {
        let document = SharedDocument::new(Document::new());
        let mut handler = DragAndDropHandler::new(document.clone());
        let calls = Rc::new(RefCell::new(Vec::new()));
        handler.on_drag_start_on_draggable_element(
            &mouse(EventKind::MouseDown, 0.0),
            Box::new(Recorder {
                calls: Rc::clone(&calls),
                veto,
            }),
        );
        (handler, calls, document)
    }

    #[test]
    fn test_threshold_then_drop() {
        let (mut handler, calls, document) = pressed(false);

        handler.preview_native_event(&mouse(EventKind::MouseMove, 2.0));
        assert!(handler.is_pending());
        assert!(calls.borrow().is_empty());

        handler.preview_native_event(&mouse(EventKind::MouseMove, 4.0));
        assert!(handler.is_dragging());
        assert_eq!(document.read().capture(), Some(document.read().body()));

        handler.preview_native_event(&mouse(EventKind::MouseMove, 9.0));
        let release = mouse(EventKind::MouseUp, 10.0);
        handler.preview_native_event(&release);
        assert!(release.is_propagation_stopped());
        assert!(release.is_default_prevented());
        assert!(!handler.is_dragging());
        assert_eq!(document.read().capture(), None);

        assert_eq!(
            *calls.borrow(),
            ["start mousedown", "update 4", "update 9", "update 10", "drop", "end"]
        );
    }

    #[test]
    fn test_escape_cancels() {
        let (mut handler, calls, _document) = pressed(false);
        handler.preview_native_event(&mouse(EventKind::MouseMove, 5.0));
        handler.preview_native_event(&NativeEvent::key_down(Key::Enter));
        assert!(handler.is_dragging());
        handler.preview_native_event(&NativeEvent::key_down(Key::Escape));
        assert_eq!(*calls.borrow(), ["start mousedown", "update 5", "cancel", "end"]);
    }

    #[test]
    fn test_touch_cancel() {
        let (mut handler, calls, _document) = pressed(false);
        handler.preview_native_event(&mouse(EventKind::TouchMove, 5.0));
        handler.preview_native_event(&mouse(EventKind::TouchCancel, 5.0));
        assert!(!handler.is_dragging());
        assert_eq!(calls.borrow().last().map(String::as_str), Some("end"));
        assert!(calls.borrow().contains(&"cancel".to_string()));
    }

    #[test]
    fn test_veto_and_abandon() {
        let (mut handler, calls, _document) = pressed(true);
        handler.preview_native_event(&mouse(EventKind::MouseMove, 5.0));
        assert!(!handler.is_dragging());
        assert!(!handler.is_pending());
        assert_eq!(*calls.borrow(), ["start mousedown"]);

        let (mut handler, calls, _document) = pressed(false);
        handler.preview_native_event(&NativeEvent::new(EventKind::Focus, Point::ZERO));
        assert!(handler.is_pending());
        handler.preview_native_event(&mouse(EventKind::MouseUp, 1.0));
        assert!(!handler.is_pending());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_click_while_dragging_is_swallowed() {
        let (mut handler, calls, _document) = pressed(false);
        handler.preview_native_event(&mouse(EventKind::MouseMove, 5.0));
        let click = mouse(EventKind::Click, 5.0);
        handler.preview_native_event(&click);
        assert!(click.is_canceled());
        assert!(handler.is_dragging());
        assert_eq!(calls.borrow().len(), 2);
    }
}
