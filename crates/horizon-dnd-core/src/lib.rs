//! Core primitives for Horizon DnD.
//!
//! This crate provides the host-facing building blocks the drag and drop
//! machinery runs on:
//!
//! - **Document**: An arena-backed element tree with classes, inline style,
//!   layout bounds, hit testing and pointer capture
//! - **Widgets**: Widgets mapped onto root elements, with logical parents,
//!   enabled state and server connector IDs
//! - **Native Events**: Mouse, touch and keyboard events with cancel,
//!   prevent-default and stop-propagation flags
//! - **Scheduler**: Fixed-delay polling commands driven by the host loop
//! - **Logging**: Tracing targets, performance spans and tree dumps
//!
//! # Example
//!
//! ```
//! use horizon_dnd_core::{Document, Point, Rect, SharedDocument};
//!
//! let document = SharedDocument::new(Document::new());
//! let mut doc = document.write();
//! let body = doc.body();
//! doc.set_bounds(body, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
//!
//! let panel = doc.create_element("div");
//! doc.set_bounds(panel, Rect::new(10.0, 10.0, 100.0, 100.0)).unwrap();
//! doc.append_child(body, panel).unwrap();
//! let widget = doc.create_widget(panel, "42").unwrap();
//!
//! let hit = doc.element_from_point(Point::new(20.0, 20.0)).unwrap();
//! assert_eq!(doc.find_widget(hit).unwrap(), Some(widget));
//! ```

pub mod dom;
mod error;
pub mod event;
pub mod geometry;
pub mod logging;
pub mod scheduler;

pub use dom::{ConnectorId, Display, Document, NodeId, NodeKind, SharedDocument, Style, WidgetId};
pub use error::{DomError, DomResult, SchedulerError};
pub use event::{EventKind, Key, Modifiers, MouseButton, NativeEvent};
pub use geometry::{Point, Rect};
pub use logging::{DocumentTreeDebug, PerfSpan, TreeFormatOptions, TreeStyle};
pub use scheduler::{ScheduledCommandId, Scheduler};

static_assertions::assert_impl_all!(Document: Send, Sync);
static_assertions::assert_not_impl_any!(NativeEvent: Sync);
