//! A small element that can be dragged to adjust something, like a column
//! resize grip.

use std::cell::RefCell;
use std::rc::Rc;

use horizon_dnd_core::{EventKind, MouseButton, NativeEvent, NodeId, Point, SharedDocument};

use crate::error::DndResult;
use crate::handler::{DragAndDropCallback, DragAndDropHandler};

/// Receives the gesture performed on a [`DragHandle`].
pub trait DragHandleCallback {
    /// Dragging started.
    fn on_start(&mut self);

    /// The pointer is `delta_x`, `delta_y` pixels away from where it was pressed.
    fn on_update(&mut self, delta_x: f64, delta_y: f64);

    /// Dragging was canceled.
    fn on_cancel(&mut self);

    /// Dragging finished with a release.
    fn on_complete(&mut self);
}

/// A `div` with class `<base>-dragelement` that reports drags to a callback.
///
/// The host forwards events dispatched to [`element`](Self::element) to
/// [`on_browser_event`](Self::on_browser_event) and, while the handle
/// [is active](Self::is_active), every previewed event to
/// [`preview_native_event`](Self::preview_native_event). The element carries
/// `<base>-dragged` while a drag is in progress.
pub struct DragHandle {
    document: SharedDocument,
    element: NodeId,
    dragged_class: Rc<str>,
    handler: DragAndDropHandler,
    callback: Rc<RefCell<dyn DragHandleCallback>>,
}

impl DragHandle {
    /// Creates a detached handle.
    pub fn new(
        document: SharedDocument,
        base_name: &str,
        callback: impl DragHandleCallback + 'static,
    ) -> DndResult<Self> {
        let element = {
            let mut doc = document.write();
            let element = doc.create_element("div");
            doc.add_class(element, &format!("{base_name}-dragelement"))?;
            element
        };
        Ok(Self {
            handler: DragAndDropHandler::new(document.clone()),
            document,
            element,
            dragged_class: Rc::from(format!("{base_name}-dragged")),
            callback: Rc::new(RefCell::new(callback)),
        })
    }

    /// The handle element.
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Appends the handle to `parent`.
    pub fn add_to(&self, parent: NodeId) -> DndResult<()> {
        self.document.write().append_child(parent, self.element)?;
        Ok(())
    }

    /// Detaches the handle.
    pub fn remove_from_parent(&self) -> DndResult<()> {
        self.document.write().remove_from_parent(self.element)?;
        Ok(())
    }

    /// Returns true while a press is pending or a drag is in progress.
    pub fn is_active(&self) -> bool {
        self.handler.is_pending() || self.handler.is_dragging()
    }

    /// Returns true while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.handler.is_dragging()
    }

    /// Handles an event dispatched to the handle element.
    ///
    /// A left-button press or a touch start arms the drag and stops the
    /// event's propagation. Returns true if the event was taken.
    pub fn on_browser_event(&mut self, event: &NativeEvent) -> bool {
        let arms = match event.kind() {
            EventKind::MouseDown => event.button() == MouseButton::Left,
            EventKind::TouchStart => true,
            _ => false,
        };
        if !arms {
            return false;
        }
        let adapter = HandleDragAdapter {
            document: self.document.clone(),
            element: self.element,
            dragged_class: Rc::clone(&self.dragged_class),
            start: event.client(),
            callback: Rc::clone(&self.callback),
        };
        self.handler
            .on_drag_start_on_draggable_element(event, Box::new(adapter));
        event.stop_propagation();
        true
    }

    /// Handles a previewed native event while the handle is active.
    pub fn preview_native_event(&mut self, event: &NativeEvent) {
        self.handler.preview_native_event(event);
    }
}

impl std::fmt::Debug for DragHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DragHandle")
            .field("element", &self.element)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Translates the handler's gesture into handle deltas and styling.
struct HandleDragAdapter {
    document: SharedDocument,
    element: NodeId,
    dragged_class: Rc<str>,
    start: Point,
    callback: Rc<RefCell<dyn DragHandleCallback>>,
}

impl HandleDragAdapter {
    fn notify(&self, f: impl FnOnce(&mut dyn DragHandleCallback)) {
        match self.callback.try_borrow_mut() {
            Ok(mut callback) => f(&mut *callback),
            Err(_) => {
                tracing::warn!(
                    target: "horizon_dnd::handler",
                    "drag handle callback re-entered, call skipped"
                )
            }
        }
    }

    fn set_dragged(&self, dragged: bool) {
        let mut doc = self.document.write();
        let result = if dragged {
            doc.add_class(self.element, &self.dragged_class)
        } else {
            doc.remove_class(self.element, &self.dragged_class)
        };
        if let Err(err) = result {
            tracing::debug!(target: "horizon_dnd::handler", %err, "drag handle style not updated");
        }
    }
}

impl DragAndDropCallback for HandleDragAdapter {
    fn on_drag_start(&mut self, start_event: &NativeEvent) -> bool {
        self.start = start_event.client();
        self.set_dragged(true);
        self.notify(|callback| callback.on_start());
        true
    }

    fn on_drag_update(&mut self, event: &NativeEvent) {
        let (delta_x, delta_y) = event.client().delta_from(self.start);
        self.notify(|callback| callback.on_update(delta_x, delta_y));
    }

    fn on_drop(&mut self) {
        self.set_dragged(false);
        self.notify(|callback| callback.on_complete());
    }

    fn on_drag_cancel(&mut self) {
        self.set_dragged(false);
        self.notify(|callback| callback.on_cancel());
    }

    fn on_drag_end(&mut self) {}
}
