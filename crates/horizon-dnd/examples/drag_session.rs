//! Drives a scripted drag from a list row onto a trash can whose accept rules
//! are verified by a simulated server.
//!
//! Run with: RUST_LOG=horizon_dnd=debug cargo run -p horizon-dnd --example drag_session

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use horizon_dnd::{
    CriterionConfig, CriterionRegistry, DndConfig, DragAndDropManager, DragRequest, DropContext,
    DropHandler, DropHandlerBase, ServerConnection, ServerResponse, Transferable,
};
use horizon_dnd_core::{
    Document, DocumentTreeDebug, EventKind, NativeEvent, NodeId, Point, Rect, Scheduler,
    SharedDocument, WidgetId,
};
use tracing_subscriber::EnvFilter;

const SETTINGS: &str = r#"
minimum_distance_to_start_drag = 4.0
source_style_poll_interval_ms = 10
"#;

/// Queues requests until the "server" answers them.
#[derive(Default)]
struct Wire {
    pending: RefCell<VecDeque<DragRequest>>,
}

impl ServerConnection for Wire {
    fn send(&self, request: DragRequest) {
        match request.to_json() {
            Ok(json) => println!("  -> {json}"),
            Err(err) => println!("  -> unserializable request: {err}"),
        }
        self.pending.borrow_mut().push_back(request);
    }

    fn has_active_request(&self) -> bool {
        !self.pending.borrow().is_empty()
    }
}

/// Accepts drops of rows whose id is even.
fn answer(request: &DragRequest) -> ServerResponse {
    let even = request.transferable["itemId"]
        .as_u64()
        .is_some_and(|id| id % 2 == 0);
    ServerResponse::new(request.visit_id, even)
}

struct Trash {
    owner: WidgetId,
    wire: Rc<Wire>,
    base: DropHandlerBase,
}

impl DropHandler for Trash {
    fn drag_enter(&mut self, cx: &mut DropContext<'_>) {
        println!("  trash: drag entered");
        self.base.drag_enter(
            cx,
            Box::new(|_| println!("  trash: highlighted as a valid drop target")),
        );
    }

    fn drag_leave(&mut self, _cx: &mut DropContext<'_>) {
        println!("  trash: drag left");
    }

    fn drop(&mut self, cx: &mut DropContext<'_>) -> bool {
        println!("  trash: drop");
        self.base.drop(cx)
    }

    fn owner(&self) -> WidgetId {
        self.owner
    }

    fn connection(&self) -> Rc<dyn ServerConnection> {
        self.wire.clone()
    }
}

struct Demo {
    manager: DragAndDropManager,
    scheduler: Rc<Scheduler>,
    wire: Rc<Wire>,
    rows: Vec<(NodeId, WidgetId)>,
    trash_root: NodeId,
}

impl Demo {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let mut doc = Document::new();
        let body = doc.body();
        doc.set_bounds(body, Rect::new(0.0, 0.0, 640.0, 480.0))?;

        let list = doc.create_element("ul");
        doc.set_bounds(list, Rect::new(0.0, 0.0, 200.0, 480.0))?;
        doc.append_child(body, list)?;
        let list_widget = doc.create_widget(list, "1")?;

        let mut rows = Vec::new();
        for index in 0..3u32 {
            let row = doc.create_element("li");
            doc.set_bounds(row, Rect::new(0.0, f64::from(index) * 24.0, 200.0, 24.0))?;
            doc.append_child(list, row)?;
            let widget = doc.create_widget(row, (10 + index).to_string())?;
            doc.set_widget_parent(widget, Some(list_widget))?;
            rows.push((row, widget));
        }

        let trash_root = doc.create_element("div");
        doc.set_bounds(trash_root, Rect::new(400.0, 200.0, 120.0, 120.0))?;
        doc.append_child(body, trash_root)?;
        let trash = doc.create_widget(trash_root, "2")?;

        let document = SharedDocument::new(doc);
        let scheduler = Rc::new(Scheduler::new());
        let mut manager = DragAndDropManager::builder(document)
            .config(DndConfig::from_toml_str(SETTINGS)?)
            .scheduler(Rc::clone(&scheduler))
            .build()?;

        let wire = Rc::new(Wire::default());
        let mut base = DropHandlerBase::new();
        base.update_accept_rules(
            CriterionConfig::from_json(r#"{"name": "server-side"}"#)?,
            &CriterionRegistry::with_builtins(),
        )?;
        let handler = Rc::new(RefCell::new(Trash {
            owner: trash,
            wire: Rc::clone(&wire),
            base,
        }));
        manager.register_drop_target(trash, handler)?;

        Ok(Self {
            manager,
            scheduler,
            wire,
            rows,
            trash_root,
        })
    }

    fn preview(
        &mut self,
        kind: EventKind,
        x: f64,
        y: f64,
        target: NodeId,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let event = NativeEvent::mouse(kind, Point::new(x, y), target);
        self.manager.preview_native_event(&event)?;
        Ok(())
    }

    /// Answers every queued request, as the server would on its next round trip.
    fn round_trip(&mut self) {
        loop {
            let Some(request) = self.wire.pending.borrow_mut().pop_front() else {
                break;
            };
            let response = answer(&request);
            println!("  <- visit {} accepted={}", response.visit_id(), response.accepted());
            self.manager.handle_server_response(&response);
        }
    }

    fn drag_row(&mut self, index: usize, item_id: u64) -> Result<(), Box<dyn std::error::Error>> {
        let (row, widget) = self.rows[index];
        let y = index as f64 * 24.0 + 12.0;
        println!("dragging row {index} (item {item_id})");

        let mut transferable = Transferable::new(widget);
        transferable.set_data("itemId", item_id);
        let press = NativeEvent::mouse(EventKind::MouseDown, Point::new(20.0, y), row);
        self.manager.start_drag(transferable, Some(&press), true);

        self.preview(EventKind::MouseMove, 30.0, y, row)?;
        if let Some(source) = self
            .manager
            .current_drag()
            .map(|drag| drag.transferable().drag_source())
        {
            println!("  drag started from {source:?}");
        }
        if let Some(image) = self.manager.create_drag_image(row, true)? {
            println!("  drag image {image:?} follows the cursor");
        }

        self.preview(EventKind::MouseMove, 300.0, 150.0, row)?;
        self.preview(EventKind::MouseMove, 450.0, 250.0, self.trash_root)?;
        self.round_trip();
        self.preview(EventKind::MouseUp, 450.0, 250.0, self.trash_root)?;
        self.round_trip();

        let ran = self
            .scheduler
            .process_ready_at(Instant::now() + Duration::from_millis(50));
        println!("  {ran} scheduled command(s) ran, drag finished\n");
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("horizon_dnd=info")),
        )
        .init();

    let mut demo = Demo::new()?;
    demo.drag_row(0, 10)?;
    demo.drag_row(1, 11)?;

    let tree = DocumentTreeDebug::new().format_document(&demo.manager.document().read())?;
    println!("{tree}");
    Ok(())
}
