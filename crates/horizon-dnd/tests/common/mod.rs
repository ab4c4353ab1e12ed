//! Shared scene for the integration tests.
//!
//! ```text
//! body (0,0 800x600)
//! ├── a      (0,0 100x100)     drop target "a"
//! ├── b      (200,0 100x100)   drop target "b"
//! └── source (0,300 50x50)     drag source
//! ```

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use horizon_dnd::{
    CriterionConfig, CriterionRegistry, DndConfig, DragAndDropManager, DragRequest, DropContext,
    DropHandler, DropHandlerBase, ServerConnection, Transferable,
};
use horizon_dnd_core::{
    Document, EventKind, NativeEvent, NodeId, Point, Rect, Scheduler, SharedDocument, WidgetId,
};

pub type Log = Rc<RefCell<Vec<String>>>;

/// Records requests instead of sending them.
#[derive(Default)]
pub struct Outbox {
    pub requests: RefCell<Vec<DragRequest>>,
    pub active: Cell<bool>,
}

impl ServerConnection for Outbox {
    fn send(&self, request: DragRequest) {
        self.requests.borrow_mut().push(request);
    }

    fn has_active_request(&self) -> bool {
        self.active.get()
    }
}

/// A drop target that logs every notification.
pub struct Recorder {
    pub name: &'static str,
    pub owner: WidgetId,
    pub outbox: Rc<Outbox>,
    pub log: Log,
    pub base: DropHandlerBase,
}

impl Recorder {
    fn push(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl DropHandler for Recorder {
    fn drag_enter(&mut self, cx: &mut DropContext<'_>) {
        self.push(format!("enter {}", self.name));
        let log = Rc::clone(&self.log);
        let name = self.name;
        self.base
            .drag_enter(cx, Box::new(move |_| log.borrow_mut().push(format!("accepted {name}"))));
    }

    fn drag_over(&mut self, _cx: &mut DropContext<'_>) {
        self.push(format!("over {}", self.name));
    }

    fn drag_leave(&mut self, _cx: &mut DropContext<'_>) {
        self.push(format!("leave {}", self.name));
    }

    fn drop(&mut self, cx: &mut DropContext<'_>) -> bool {
        self.push(format!("drop {}", self.name));
        self.base.drop(cx)
    }

    fn owner(&self) -> WidgetId {
        self.owner
    }

    fn connection(&self) -> Rc<dyn ServerConnection> {
        self.outbox.clone()
    }
}

pub struct Scene {
    pub document: SharedDocument,
    pub scheduler: Rc<Scheduler>,
    pub manager: DragAndDropManager,
    pub outbox: Rc<Outbox>,
    pub log: Log,
    pub body: NodeId,
    pub a_root: NodeId,
    pub b_root: NodeId,
    pub source_root: NodeId,
    pub a: WidgetId,
    pub b: WidgetId,
    pub source: WidgetId,
    pub a_handler: Rc<RefCell<Recorder>>,
    pub b_handler: Rc<RefCell<Recorder>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::with_config(DndConfig::default())
    }

    pub fn with_config(config: DndConfig) -> Self {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_bounds(body, Rect::new(0.0, 0.0, 800.0, 600.0)).unwrap();
        let a_root = element(&mut doc, body, Rect::new(0.0, 0.0, 100.0, 100.0));
        let b_root = element(&mut doc, body, Rect::new(200.0, 0.0, 100.0, 100.0));
        let source_root = element(&mut doc, body, Rect::new(0.0, 300.0, 50.0, 50.0));
        let a = doc.create_widget(a_root, "10").unwrap();
        let b = doc.create_widget(b_root, "20").unwrap();
        let source = doc.create_widget(source_root, "30").unwrap();

        let document = SharedDocument::new(doc);
        let scheduler = Rc::new(Scheduler::new());
        let mut manager = DragAndDropManager::builder(document.clone())
            .config(config)
            .scheduler(Rc::clone(&scheduler))
            .build()
            .unwrap();

        let outbox = Rc::new(Outbox::default());
        let log: Log = Rc::default();
        let recorder = |name, owner| {
            Rc::new(RefCell::new(Recorder {
                name,
                owner,
                outbox: Rc::clone(&outbox),
                log: Rc::clone(&log),
                base: DropHandlerBase::new(),
            }))
        };
        let a_handler = recorder("a", a);
        let b_handler = recorder("b", b);
        manager.register_drop_target(a, a_handler.clone()).unwrap();
        manager.register_drop_target(b, b_handler.clone()).unwrap();

        Self {
            document,
            scheduler,
            manager,
            outbox,
            log,
            body,
            a_root,
            b_root,
            source_root,
            a,
            b,
            source,
            a_handler,
            b_handler,
        }
    }

    /// Makes both targets ask the server before accepting.
    pub fn require_server_checks(&self) {
        let registry = CriterionRegistry::with_builtins();
        for handler in [&self.a_handler, &self.b_handler] {
            handler
                .borrow_mut()
                .base
                .update_accept_rules(CriterionConfig::new("server-side"), &registry)
                .unwrap();
        }
    }

    /// Presses on the drag source without moving.
    pub fn press(&mut self) {
        let press =
            NativeEvent::mouse(EventKind::MouseDown, Point::new(10.0, 310.0), self.source_root);
        let mut transferable = Transferable::new(self.source);
        transferable.set_data("itemId", "row-7");
        self.manager.start_drag(transferable, Some(&press), true);
    }

    /// Presses on the drag source and moves far enough to start dragging.
    pub fn start(&mut self) {
        self.press();
        self.send(EventKind::MouseMove, 30.0, 310.0, self.source_root);
        assert!(self.manager.is_started());
    }

    /// Previews a mouse event and returns it for flag inspection.
    pub fn send(&mut self, kind: EventKind, x: f64, y: f64, target: NodeId) -> NativeEvent {
        let event = NativeEvent::mouse(kind, Point::new(x, y), target);
        self.manager.preview_native_event(&event).unwrap();
        event
    }

    pub fn over_a(&mut self) {
        self.send(EventKind::MouseOver, 50.0, 50.0, self.a_root);
    }

    pub fn over_b(&mut self) {
        self.send(EventKind::MouseOver, 250.0, 50.0, self.b_root);
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn requests(&self) -> Vec<DragRequest> {
        self.outbox.requests.borrow().clone()
    }

    pub fn has_source_style(&self) -> bool {
        self.document
            .read()
            .has_class(self.source_root, "hl-active-drag-source")
    }

    /// Runs scheduled commands as if `elapsed` had passed.
    pub fn advance(&self, elapsed: Duration) -> usize {
        self.scheduler.process_ready_at(Instant::now() + elapsed)
    }
}

fn element(doc: &mut Document, parent: NodeId, bounds: Rect) -> NodeId {
    let node = doc.create_element("div");
    doc.set_bounds(node, bounds).unwrap();
    doc.append_child(parent, node).unwrap();
    node
}
