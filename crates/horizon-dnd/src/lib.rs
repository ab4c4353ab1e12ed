//! Drag and drop coordination for Horizon.
//!
//! This crate tracks a drag across widgets, decides which drop target it is
//! over and keeps enter/over/leave/drop notifications consistent while accept
//! rules are checked locally or verified by the server.
//!
//! - **Manager**: [`DragAndDropManager`] owns the active drag, the current drop
//!   target, the drag image and the server visit bookkeeping
//! - **Strategies**: [`EventHandleStrategy`] turns native events into drop
//!   target notifications, with mouse and touch variants
//! - **Drop targets**: widgets implement [`DropHandler`] and usually delegate
//!   their accept rules to [`DropHandlerBase`]
//! - **Accept criteria**: composable [`criteria`] evaluated locally or on the
//!   server
//! - **Lightweight drags**: [`DragAndDropHandler`] and [`DragHandle`] track a
//!   press-move-release gesture without drop targets
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use horizon_dnd::{
//!     DragAndDropManager, DragRequest, DropContext, DropHandler, ServerConnection,
//!     Transferable,
//! };
//! use horizon_dnd_core::{Document, EventKind, NativeEvent, Point, SharedDocument, WidgetId};
//!
//! #[derive(Default)]
//! struct Outbox(RefCell<Vec<DragRequest>>);
//!
//! impl ServerConnection for Outbox {
//!     fn send(&self, request: DragRequest) {
//!         self.0.borrow_mut().push(request);
//!     }
//!     fn has_active_request(&self) -> bool {
//!         false
//!     }
//! }
//!
//! struct Trash {
//!     owner: WidgetId,
//!     outbox: Rc<Outbox>,
//!     entered: u32,
//! }
//!
//! impl DropHandler for Trash {
//!     fn drag_enter(&mut self, _cx: &mut DropContext<'_>) {
//!         self.entered += 1;
//!     }
//!     fn drop(&mut self, _cx: &mut DropContext<'_>) -> bool {
//!         true
//!     }
//!     fn owner(&self) -> WidgetId {
//!         self.owner
//!     }
//!     fn connection(&self) -> Rc<dyn ServerConnection> {
//!         self.outbox.clone()
//!     }
//! }
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let (item_root, trash_root) = (doc.create_element("li"), doc.create_element("div"));
//! doc.append_child(body, item_root).unwrap();
//! doc.append_child(body, trash_root).unwrap();
//! let item = doc.create_widget(item_root, "1").unwrap();
//! let trash = doc.create_widget(trash_root, "2").unwrap();
//!
//! let outbox = Rc::new(Outbox::default());
//! let handler = Rc::new(RefCell::new(Trash { owner: trash, outbox: outbox.clone(), entered: 0 }));
//! let mut manager = DragAndDropManager::new(SharedDocument::new(doc));
//! manager.register_drop_target(trash, handler.clone()).unwrap();
//!
//! let mut transferable = Transferable::new(item);
//! transferable.set_data("itemId", 7);
//! let press = NativeEvent::mouse(EventKind::MouseDown, Point::new(5.0, 5.0), item_root);
//! manager.start_drag(transferable, Some(&press), true);
//!
//! for event in [
//!     NativeEvent::mouse(EventKind::MouseMove, Point::new(50.0, 5.0), item_root),
//!     NativeEvent::mouse(EventKind::MouseOver, Point::new(50.0, 50.0), trash_root),
//!     NativeEvent::mouse(EventKind::MouseUp, Point::new(50.0, 50.0), trash_root),
//! ] {
//!     manager.preview_native_event(&event).unwrap();
//! }
//!
//! assert_eq!(handler.borrow().entered, 1);
//! assert_eq!(outbox.0.borrow()[0].transferable["itemId"], 7);
//! assert!(manager.current_drag().is_none());
//! ```

mod config;
pub mod criteria;
mod drag_event;
mod drag_handle;
mod drop_handler;
mod error;
mod handler;
mod manager;
mod mouse_details;
mod server;
pub mod strategy;
mod transferable;

#[cfg(test)]
mod test_support;

pub use config::{DndConfig, StrategyKind};
pub use criteria::{AcceptCriterion, CriterionConfig, CriterionRegistry};
pub use drag_event::{DragEvent, DragEventType};
pub use drag_handle::{DragHandle, DragHandleCallback};
pub use drop_handler::{
    AcceptCallback, DeferredCommand, DropContext, DropHandler, DropHandlerBase, DropHandlerRef,
    DropTarget, DropTargetRegistry, ServerCallback,
};
pub use error::{CriterionError, DndError, DndResult};
pub use handler::{DragAndDropCallback, DragAndDropHandler};
pub use manager::{DragAndDropManager, DragAndDropManagerBuilder};
pub use mouse_details::MouseEventDetails;
pub use server::{DragRequest, ServerConnection, ServerResponse};
pub use strategy::{
    DefaultEventHandleStrategy, EventHandleStrategy, PlatformCapabilities,
    TouchEventHandleStrategy, select_strategy,
};
pub use transferable::Transferable;

// Drags live on the UI thread.
static_assertions::assert_not_impl_any!(DragAndDropManager: Send, Sync);
static_assertions::assert_impl_all!(DndError: Send, Sync, std::error::Error);
static_assertions::assert_impl_all!(CriterionError: Clone, Send, Sync);
