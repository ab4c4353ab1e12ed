//! Recording doubles shared by unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use horizon_dnd_core::{Document, SharedDocument, WidgetId};

use crate::criteria::{AcceptCriterion, CriterionConfig, CriterionRegistry};
use crate::drag_event::DragEvent;
use crate::drop_handler::{DropContext, DropHandler, DropHandlerRef, DropTarget};
use crate::error::CriterionError;
use crate::server::{DragRequest, ServerConnection, ServerResponse, ServerVisits};
use crate::transferable::Transferable;

#[derive(Default)]
pub(crate) struct RecordingConnection {
    pub(crate) requests: RefCell<Vec<DragRequest>>,
    pub(crate) active: Cell<bool>,
}

impl ServerConnection for RecordingConnection {
    fn send(&self, request: DragRequest) {
        self.requests.borrow_mut().push(request);
    }

    fn has_active_request(&self) -> bool {
        self.active.get()
    }
}

pub(crate) struct InertHandler {
    owner: WidgetId,
    connection: Rc<RecordingConnection>,
}

impl InertHandler {
    pub(crate) fn new(owner: WidgetId, connection: Rc<RecordingConnection>) -> Self {
        Self { owner, connection }
    }
}

impl DropHandler for InertHandler {
    fn drag_enter(&mut self, _cx: &mut DropContext<'_>) {}

    fn drop(&mut self, _cx: &mut DropContext<'_>) -> bool {
        false
    }

    fn owner(&self) -> WidgetId {
        self.owner
    }

    fn connection(&self) -> Rc<dyn ServerConnection> {
        self.connection.clone()
    }
}

/// A criterion with a fixed answer that counts its calls.
pub(crate) struct CountingCriterion {
    pub(crate) name: &'static str,
    pub(crate) result: bool,
    pub(crate) server: bool,
    pub(crate) calls: Cell<usize>,
}

impl CountingCriterion {
    pub(crate) fn new(name: &'static str, result: bool) -> Rc<Self> {
        Rc::new(Self {
            name,
            result,
            server: false,
            calls: Cell::new(0),
        })
    }

    pub(crate) fn server(name: &'static str) -> Rc<Self> {
        Rc::new(Self {
            name,
            result: false,
            server: true,
            calls: Cell::new(0),
        })
    }
}

impl AcceptCriterion for CountingCriterion {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(
        &self,
        _cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.result)
    }

    fn needs_server_side_check(&self, _drag: &DragEvent, _config: &CriterionConfig) -> bool {
        if self.server {
            self.calls.set(self.calls.get() + 1);
        }
        self.server
    }
}

/// The pieces of a drag, owned so a [`DropContext`] can be built on demand.
pub(crate) struct Fixture {
    pub(crate) document: SharedDocument,
    pub(crate) drag: DragEvent,
    pub(crate) visits: ServerVisits,
    pub(crate) criteria: Rc<CriterionRegistry>,
    pub(crate) target: Option<DropTarget>,
    pub(crate) connection: Rc<RecordingConnection>,
    pub(crate) source: WidgetId,
    pub(crate) other: WidgetId,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        Self::with_registry(CriterionRegistry::with_builtins())
    }

    pub(crate) fn with_registry(registry: CriterionRegistry) -> Self {
        let mut doc = Document::new();
        let source_root = doc.create_element("div");
        let other_root = doc.create_element("div");
        let source = doc.create_widget(source_root, "source").unwrap();
        let other = doc.create_widget(other_root, "other").unwrap();
        Self {
            document: SharedDocument::new(doc),
            drag: DragEvent::new(Transferable::new(source), None),
            visits: ServerVisits::default(),
            criteria: Rc::new(registry),
            target: None,
            connection: Rc::new(RecordingConnection::default()),
            source,
            other,
        }
    }

    pub(crate) fn set_target(&mut self, owner: WidgetId) {
        let handler: DropHandlerRef = Rc::new(RefCell::new(InertHandler {
            owner,
            connection: self.connection.clone(),
        }));
        self.target = Some(DropTarget::new(handler).unwrap());
    }

    pub(crate) fn with_cx<R>(&mut self, f: impl FnOnce(&mut DropContext<'_>) -> R) -> R {
        let mut cx = DropContext::new(
            &mut self.drag,
            &mut self.visits,
            self.target.as_ref(),
            &self.document,
            &self.criteria,
        );
        f(&mut cx)
    }

    /// Delivers a response the way the manager does.
    pub(crate) fn respond(&mut self, response: &ServerResponse) {
        let matches = response.visit_id() == self.visits.visit_id;
        self.with_cx(|cx| {
            if matches {
                cx.invoke_server_callback(response);
            }
            cx.run_deferred_commands();
        });
    }

    pub(crate) fn sent(&self) -> usize {
        self.connection.requests.borrow().len()
    }
}
