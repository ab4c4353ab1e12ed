//! The drag and drop manager.
//!
//! One [`DragAndDropManager`] is created at application root and passed to
//! every widget that starts drags or accepts drops. It owns the active drag,
//! the drop target the drag is over, the drag image and the server visit
//! bookkeeping.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start_drag(press, handle events)──▶ DeferredStart ──moved past threshold──▶ Active
//!   ▲                     │                        │                                    │
//!   │                     └──otherwise─────────────┼───────────────────────────────────▶│
//!   │                                              │ other event                         │
//!   └──────────────────────────────────────────────┴──────end_drag / interrupt_drag──────┘
//! ```
//!
//! While a drag is pending or active the host feeds every native event to
//! [`DragAndDropManager::preview_native_event`]. Active drags are interpreted
//! by the manager's [`EventHandleStrategy`].
//!
//! # Example
//!
//! ```
//! use horizon_dnd::{DragAndDropManager, Transferable};
//! use horizon_dnd_core::{Document, EventKind, NativeEvent, Point, SharedDocument};
//!
//! let mut doc = Document::new();
//! let root = doc.create_element("div");
//! doc.append_child(doc.body(), root).unwrap();
//! let source = doc.create_widget(root, "1").unwrap();
//!
//! let mut manager = DragAndDropManager::new(SharedDocument::new(doc));
//! let press = NativeEvent::mouse(EventKind::MouseDown, Point::new(10.0, 10.0), root);
//! manager.start_drag(Transferable::new(source), Some(&press), true);
//! assert!(!manager.is_started());
//!
//! let moved = NativeEvent::mouse(EventKind::MouseMove, Point::new(20.0, 10.0), root);
//! manager.preview_native_event(&moved).unwrap();
//! assert!(manager.is_started());
//! ```

use std::fmt;
use std::rc::Rc;

use horizon_dnd_core::logging::span_names;
use horizon_dnd_core::{
    Display, DomError, DomResult, EventKind, NativeEvent, NodeId, PerfSpan, Point, Scheduler,
    SharedDocument, WidgetId,
};

use crate::config::{DndConfig, StrategyKind};
use crate::criteria::CriterionRegistry;
use crate::drag_event::{DragEvent, DragEventType};
use crate::drop_handler::{
    DeferredCommand, DropContext, DropHandler, DropHandlerRef, DropTarget, DropTargetRegistry,
    ServerCallback,
};
use crate::error::DndResult;
use crate::server::{ServerResponse, ServerVisits};
use crate::strategy::{
    DefaultEventHandleStrategy, EventHandleStrategy, PlatformCapabilities, TouchEventHandleStrategy,
    select_strategy,
};
use crate::transferable::Transferable;

/// How native events are currently intercepted.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PreviewState {
    /// No interception.
    Idle,
    /// Waiting for the pointer to move past the start threshold.
    DeferredStart {
        origin: Point,
        handle_drag_events: bool,
    },
    /// Events are interpreted by the strategy.
    Active,
}

/// Coordinates drags between drag sources, drop targets and the server.
pub struct DragAndDropManager {
    document: SharedDocument,
    scheduler: Rc<Scheduler>,
    config: DndConfig,
    strategy: Rc<dyn EventHandleStrategy>,
    criteria: Rc<CriterionRegistry>,
    drop_targets: DropTargetRegistry,
    current_drag: Option<DragEvent>,
    current_target: Option<DropTarget>,
    visits: ServerVisits,
    drag_element: Option<NodeId>,
    preview: PreviewState,
    started: bool,
}

impl DragAndDropManager {
    /// Creates a manager with default settings.
    pub fn new(document: SharedDocument) -> Self {
        Self::assemble(
            document,
            DndConfig::default(),
            Rc::new(Scheduler::new()),
            None,
            Rc::new(CriterionRegistry::with_builtins()),
        )
    }

    /// Starts building a manager with custom settings.
    pub fn builder(document: SharedDocument) -> DragAndDropManagerBuilder {
        DragAndDropManagerBuilder::new(document)
    }

    fn assemble(
        document: SharedDocument,
        config: DndConfig,
        scheduler: Rc<Scheduler>,
        strategy: Option<Rc<dyn EventHandleStrategy>>,
        criteria: Rc<CriterionRegistry>,
    ) -> Self {
        let strategy = strategy.unwrap_or_else(|| match config.strategy {
            StrategyKind::Auto => select_strategy(&PlatformCapabilities {
                touch_support: config.touch_support,
            }),
            StrategyKind::Default => Rc::new(DefaultEventHandleStrategy),
            StrategyKind::Touch => Rc::new(TouchEventHandleStrategy),
        });
        Self {
            document,
            scheduler,
            config,
            strategy,
            criteria,
            drop_targets: DropTargetRegistry::new(),
            current_drag: None,
            current_target: None,
            visits: ServerVisits::default(),
            drag_element: None,
            preview: PreviewState::Idle,
            started: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The document.
    pub fn document(&self) -> &SharedDocument {
        &self.document
    }

    /// The scheduler running the source style polling.
    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// The settings.
    pub fn config(&self) -> &DndConfig {
        &self.config
    }

    /// The event handling strategy.
    pub fn strategy(&self) -> &Rc<dyn EventHandleStrategy> {
        &self.strategy
    }

    /// The accept criterion registry.
    pub fn criteria(&self) -> &Rc<CriterionRegistry> {
        &self.criteria
    }

    /// The active drag, if any.
    pub fn current_drag(&self) -> Option<&DragEvent> {
        self.current_drag.as_ref()
    }

    /// The active drag, mutably.
    pub fn current_drag_mut(&mut self) -> Option<&mut DragEvent> {
        self.current_drag.as_mut()
    }

    /// The drop target the drag is over.
    pub fn current_drop_target(&self) -> Option<&DropTarget> {
        self.current_target.as_ref()
    }

    /// Replaces the current drop target without calling any handler.
    ///
    /// For hosts that resolve targets themselves. Ignored when no drag is active.
    pub fn set_current_drop_target(&mut self, target: Option<DropTarget>) {
        if self.current_drag.is_some() {
            self.current_target = target;
        }
    }

    /// Returns true if `candidate` is the current drop target. Two absent
    /// targets compare equal.
    pub fn is_current_drop_target(&self, candidate: Option<&DropTarget>) -> bool {
        match (self.current_target.as_ref(), candidate) {
            (None, None) => true,
            (Some(current), Some(candidate)) => current.is_same_handler(candidate),
            _ => false,
        }
    }

    /// Returns true once the drag has passed the start threshold.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns true while a drag waits for the start threshold.
    pub fn is_start_pending(&self) -> bool {
        matches!(self.preview, PreviewState::DeferredStart { .. })
    }

    /// Returns true while native events should be routed to
    /// [`preview_native_event`](Self::preview_native_event).
    pub fn is_intercepting(&self) -> bool {
        self.preview != PreviewState::Idle
    }

    /// ID of the latest server visit; `0` when no drag is active.
    pub fn visit_id(&self) -> u32 {
        self.visits.visit_id
    }

    /// Returns true while a server visit is pending.
    pub fn is_busy(&self) -> bool {
        self.visits.is_busy()
    }

    /// The drag image, if one is set.
    pub fn drag_element(&self) -> Option<NodeId> {
        self.drag_element
    }

    // =========================================================================
    // Drop targets
    // =========================================================================

    /// Makes `widget` a drop target served by `handler`.
    pub fn register_drop_target(
        &mut self,
        widget: WidgetId,
        handler: DropHandlerRef,
    ) -> DndResult<()> {
        self.drop_targets.register(widget, handler)?;
        tracing::debug!(target: "horizon_dnd::manager", ?widget, "registered drop target");
        Ok(())
    }

    /// Removes the drop handler of `widget`.
    pub fn unregister_drop_target(&mut self, widget: WidgetId) -> Option<DropTarget> {
        self.drop_targets.unregister(widget)
    }

    /// Finds the drop target for an element.
    ///
    /// Walks from the widget owning `element` up the logical widget parents
    /// and returns the first registered drop target whose owner is enabled.
    /// Lookup failures (removed nodes, broken widget chains) yield `None`.
    pub fn find_drag_target(&self, element: Option<NodeId>) -> Option<DropTarget> {
        let element = element?;
        match self.resolve_drop_target(element) {
            Ok(found) => found,
            Err(err) => {
                tracing::trace!(target: "horizon_dnd::manager", %err, "drop target lookup failed");
                None
            }
        }
    }

    fn resolve_drop_target(&self, element: NodeId) -> DomResult<Option<DropTarget>> {
        let doc = self.document.read();
        if !doc.is_attached(element) {
            return Ok(None);
        }
        let mut widget = doc.find_widget(element)?;
        let mut steps = 0;
        while let Some(id) = widget {
            if let Some(target) = self.drop_targets.get(id) {
                if doc.is_enabled(target.owner())? {
                    return Ok(Some(target.clone()));
                }
            }
            steps += 1;
            if steps > doc.widget_count() {
                return Err(DomError::UnterminatedWidgetChain);
            }
            widget = doc.widget_parent(id)?;
        }
        Ok(None)
    }

    // =========================================================================
    // Drag lifecycle
    // =========================================================================

    /// Starts a drag, interrupting any drag in progress.
    ///
    /// With `handle_drag_events` the manager interprets native events itself.
    /// If the drag was started by a press it stays pending until the pointer
    /// moves past [`DndConfig::minimum_distance_to_start_drag`] on either axis.
    /// Returns the new drag.
    pub fn start_drag(
        &mut self,
        transferable: Transferable,
        start_event: Option<&NativeEvent>,
        handle_drag_events: bool,
    ) -> &mut DragEvent {
        self.interrupt_drag();
        self.started = false;

        let drag = DragEvent::new(transferable, start_event);
        tracing::debug!(
            target: "horizon_dnd::manager",
            event_id = drag.event_id(),
            handle_drag_events,
            "drag requested"
        );

        match start_event {
            Some(event) if handle_drag_events && event.kind().is_press() => {
                self.preview = PreviewState::DeferredStart {
                    origin: event.client(),
                    handle_drag_events,
                };
                self.current_drag.insert(drag)
            }
            _ => self.promote(drag, handle_drag_events),
        }
    }

    fn promote(&mut self, mut drag: DragEvent, handle_drag_events: bool) -> &mut DragEvent {
        self.started = true;
        self.preview = PreviewState::Idle;
        self.set_source_style(drag.transferable().drag_source(), true);

        let element = drag
            .current_event()
            .and_then(|event| self.initial_target_element(event));
        tracing::debug!(
            target: "horizon_dnd::manager",
            event_id = drag.event_id(),
            ?element,
            "drag started"
        );
        if let Some(target) = self.find_drag_target(element) {
            tracing::debug!(target: "horizon_dnd::manager", owner = ?target.owner(), "drag enter");
            drag.set_element_over(element);
            self.current_target = Some(target.clone());
            self.dispatch_with(&mut drag, &target, |handler, cx| handler.drag_enter(cx));
        }

        if handle_drag_events {
            self.preview = PreviewState::Active;
            if let Err(err) = self.attach_drag_element() {
                tracing::debug!(target: "horizon_dnd::manager", %err, "drag image not attached");
            }
        }

        {
            let mut doc = self.document.write();
            let body = doc.body();
            if let Err(err) = doc.set_capture(body) {
                tracing::debug!(target: "horizon_dnd::manager", %err, "capture not set");
            }
        }
        self.current_drag.insert(drag)
    }

    /// Ends the drag with a drop on the current target.
    pub fn end_drag(&mut self) {
        self.finish_drag(true);
    }

    /// Ends the drag without a drop. The current target gets a leave.
    pub fn interrupt_drag(&mut self) {
        self.finish_drag(false);
    }

    fn finish_drag(&mut self, do_drop: bool) {
        let was_active = self.current_drag.is_some();
        self.preview = PreviewState::Idle;
        let mut sent = false;

        if let Some(target) = self.current_target.clone() {
            if do_drop {
                let send = self
                    .dispatch(&target, |handler, cx| handler.drop(cx))
                    .unwrap_or(false);
                tracing::debug!(
                    target: "horizon_dnd::manager",
                    owner = ?target.owner(),
                    send,
                    "drop"
                );
                if send {
                    self.with_context(|cx| cx.do_request(DragEventType::Drop));
                    sent = true;
                    if let Some(source) = self.drag_source() {
                        self.schedule_source_style_cleanup(&target, source);
                    }
                }
            } else {
                if let Some(drag) = self.current_drag.as_mut() {
                    drag.set_current_event(None);
                }
                tracing::debug!(
                    target: "horizon_dnd::manager",
                    owner = ?target.owner(),
                    "drag leave on interrupt"
                );
                self.dispatch(&target, |handler, cx| handler.drag_leave(cx));
            }
            self.current_target = None;
        }

        if was_active {
            self.visits.reset();
        }
        if !sent {
            if let Some(source) = self.drag_source() {
                self.set_source_style(source, false);
            }
        }
        self.current_drag = None;
        self.started = false;
        self.clear_drag_element();

        if was_active {
            self.document.write().release_capture();
            tracing::debug!(target: "horizon_dnd::manager", do_drop, sent, "drag ended");
        }
    }

    fn drag_source(&self) -> Option<WidgetId> {
        self.current_drag
            .as_ref()
            .map(|drag| drag.transferable().drag_source())
    }

    fn set_source_style(&self, source: WidgetId, active: bool) {
        let class = self.config.active_drag_source_class.as_str();
        let mut doc = self.document.write();
        let result = doc.widget_root(source).and_then(|root| {
            if active {
                doc.add_class(root, class)
            } else {
                doc.remove_class(root, class)
            }
        });
        if let Err(err) = result {
            tracing::debug!(
                target: "horizon_dnd::manager",
                %err,
                active,
                "drag source style not updated"
            );
        }
    }

    /// Removes the source style once the drop request has been answered.
    fn schedule_source_style_cleanup(&self, target: &DropTarget, source: WidgetId) {
        let root = match self.document.read().widget_root(source) {
            Ok(root) => root,
            Err(err) => {
                tracing::debug!(
                    target: "horizon_dnd::manager",
                    %err,
                    "drag source gone, style left"
                );
                return;
            }
        };
        let document = self.document.clone();
        let connection = Rc::clone(target.connection());
        let class = self.config.active_drag_source_class.clone();
        self.scheduler
            .schedule_fixed_delay(self.config.source_style_poll_interval(), move || {
                if connection.has_active_request() {
                    return true;
                }
                if let Err(err) = document.write().remove_class(root, &class) {
                    tracing::trace!(
                        target: "horizon_dnd::manager",
                        %err,
                        "drag source style not removed"
                    );
                }
                false
            });
    }

    // =========================================================================
    // Native event preview
    // =========================================================================

    /// Handles a native event while a drag is pending or active.
    ///
    /// Events are ignored when no drag intercepts input. Errors from the
    /// drag image hit-test are returned after the image has been restored.
    pub fn preview_native_event(&mut self, event: &NativeEvent) -> DndResult<()> {
        match self.preview {
            PreviewState::Idle => Ok(()),
            PreviewState::DeferredStart {
                origin,
                handle_drag_events,
            } => {
                self.preview_deferred_start(origin, handle_drag_events, event);
                Ok(())
            }
            PreviewState::Active => self.preview_active(event),
        }
    }

    fn preview_deferred_start(
        &mut self,
        origin: Point,
        handle_drag_events: bool,
        event: &NativeEvent,
    ) {
        let moved = match event.kind() {
            EventKind::Pointer
            | EventKind::MouseOver
            | EventKind::KeyDown
            | EventKind::KeyPress
            | EventKind::KeyUp
            | EventKind::Focus
            | EventKind::Blur => return,
            EventKind::MouseOut => {
                let Some(image) = self.drag_element else {
                    return;
                };
                // Leaving into the drag image counts as a move.
                let into_image = event
                    .related_target()
                    .is_none_or(|related| self.document.read().is_or_has_child(image, related));
                if !into_image {
                    return;
                }
                true
            }
            EventKind::MouseMove | EventKind::TouchMove => true,
            _ => false,
        };

        if !moved {
            tracing::debug!(
                target: "horizon_dnd::manager",
                kind = event.kind().name(),
                "pending drag aborted"
            );
            self.preview = PreviewState::Idle;
            self.current_drag = None;
            self.clear_drag_element();
            return;
        }

        let threshold = self.config.minimum_distance_to_start_drag;
        if event.client().exceeds_axis_threshold(origin, threshold) {
            if let Some(mut drag) = self.current_drag.take() {
                drag.set_current_event(Some(event.clone()));
                self.promote(drag, handle_drag_events);
            }
        } else {
            tracing::trace!(
                target: "horizon_dnd::manager",
                client = %event.client(),
                "below start threshold"
            );
        }
    }

    fn preview_active(&mut self, event: &NativeEvent) -> DndResult<()> {
        let _span = PerfSpan::new(span_names::PREVIEW);
        let strategy = Rc::clone(&self.strategy);

        if strategy.is_drag_interrupted(event) {
            tracing::debug!(target: "horizon_dnd::manager", "drag interrupted by escape");
            self.interrupt_drag();
            event.cancel();
            event.prevent_default();
            return Ok(());
        }
        if event.kind() == EventKind::KeyDown {
            strategy.handle_key_down_event(event, self);
            return Ok(());
        }

        if let Some(drag) = self.current_drag.as_mut() {
            drag.set_current_event(Some(event.clone()));
        }
        self.update_drag_image_position()?;

        let mut target = self.event_target_element(event);
        if strategy.needs_coordinate_hit_test(event, self) {
            target = strategy.get_target_element(event, self)?;
            if strategy.handle_drag_image_event(target, event, self) {
                return Ok(());
            }
        }
        tracing::trace!(
            target: "horizon_dnd::manager",
            kind = event.kind().name(),
            ?target,
            "dispatching drag event"
        );
        strategy.handle_event(target, event, self);
        Ok(())
    }

    /// The element an event targets: its target, or the parent element of a
    /// non-element target.
    pub fn event_target_element(&self, event: &NativeEvent) -> Option<NodeId> {
        let target = event.target()?;
        let doc = self.document.read();
        if doc.is_element(target) {
            Some(target)
        } else {
            doc.parent_element(target).ok().flatten()
        }
    }

    /// Touch events report the node the touch started on, so their target
    /// is found by coordinate.
    fn initial_target_element(&self, event: &NativeEvent) -> Option<NodeId> {
        if event.is_touch() {
            self.document.read().element_from_point(event.client())
        } else {
            self.event_target_element(event)
        }
    }

    // =========================================================================
    // Drop target notifications
    // =========================================================================

    /// Makes `target` current and calls its `drag_enter`.
    pub fn fire_drag_enter(&mut self, target: DropTarget, element: Option<NodeId>) {
        if self.current_drag.is_none() {
            return;
        }
        tracing::debug!(target: "horizon_dnd::manager", owner = ?target.owner(), "drag enter");
        self.current_target = Some(target.clone());
        self.set_element_over(element);
        self.dispatch(&target, |handler, cx| handler.drag_enter(cx));
    }

    /// Calls `drag_over` on the current target.
    pub fn fire_drag_over(&mut self, element: Option<NodeId>) {
        let Some(target) = self.current_target.clone() else {
            return;
        };
        tracing::trace!(target: "horizon_dnd::manager", owner = ?target.owner(), "drag over");
        self.set_element_over(element);
        self.dispatch(&target, |handler, cx| handler.drag_over(cx));
    }

    /// Calls `drag_leave` on the current target, clears the drop details and
    /// forgets the target. With `clear_callback` a pending server callback is
    /// dropped too.
    pub fn fire_drag_leave(&mut self, clear_callback: bool) {
        let Some(target) = self.current_target.clone() else {
            return;
        };
        tracing::debug!(target: "horizon_dnd::manager", owner = ?target.owner(), "drag leave");
        self.dispatch(&target, |handler, cx| handler.drag_leave(cx));
        if let Some(drag) = self.current_drag.as_mut() {
            drag.drop_details_mut().clear();
        }
        self.current_target = None;
        if clear_callback {
            self.visits.server_callback = None;
        }
    }

    /// Records the element the drag is over.
    pub fn set_element_over(&mut self, element: Option<NodeId>) {
        if let Some(drag) = self.current_drag.as_mut() {
            drag.set_element_over(element);
        }
    }

    fn dispatch<R>(
        &mut self,
        target: &DropTarget,
        f: impl FnOnce(&mut dyn DropHandler, &mut DropContext<'_>) -> R,
    ) -> Option<R> {
        let mut drag = self.current_drag.take()?;
        let result = self.dispatch_with(&mut drag, target, f);
        self.current_drag = Some(drag);
        result
    }

    /// Calls a handler with a context over `drag`, which need not be stored
    /// in the manager yet.
    fn dispatch_with<R>(
        &mut self,
        drag: &mut DragEvent,
        target: &DropTarget,
        f: impl FnOnce(&mut dyn DropHandler, &mut DropContext<'_>) -> R,
    ) -> Option<R> {
        let handler = Rc::clone(target.handler());
        let Ok(mut guard) = handler.try_borrow_mut() else {
            tracing::warn!(
                target: "horizon_dnd::manager",
                owner = ?target.owner(),
                "drop handler re-entered, call skipped"
            );
            return None;
        };
        let mut cx = DropContext::new(
            drag,
            &mut self.visits,
            self.current_target.as_ref(),
            &self.document,
            &self.criteria,
        );
        Some(f(&mut *guard, &mut cx))
    }

    fn with_context<R>(&mut self, f: impl FnOnce(&mut DropContext<'_>) -> R) -> Option<R> {
        let drag = self.current_drag.as_mut()?;
        let mut cx = DropContext::new(
            drag,
            &mut self.visits,
            self.current_target.as_ref(),
            &self.document,
            &self.criteria,
        );
        Some(f(&mut cx))
    }

    // =========================================================================
    // Server visits
    // =========================================================================

    /// Asks the current drop target's server counterpart about the drag.
    ///
    /// See [`DropContext::visit_server`]. Does nothing without an active drag.
    pub fn visit_server(&mut self, callback: ServerCallback) {
        if self.with_context(|cx| cx.visit_server(callback)).is_none() {
            tracing::trace!(target: "horizon_dnd::manager", "no active drag, visit skipped");
        }
    }

    /// Runs `command` now or once the pending visit completes.
    ///
    /// See [`DropContext::execute_when_ready`]. Commands given without an
    /// active drag are dropped.
    pub fn execute_when_ready(&mut self, command: DeferredCommand) {
        if self
            .with_context(|cx| cx.execute_when_ready(command))
            .is_none()
        {
            tracing::trace!(target: "horizon_dnd::manager", "no active drag, command dropped");
        }
    }

    /// Delivers a server response.
    ///
    /// The pending callback runs only if the response carries the latest visit
    /// ID. A stale response leaves the callback waiting. Deferred commands run
    /// afterwards while no visit is pending, so a stale response also leaves a
    /// deferred command queued until the matching response arrives.
    pub fn handle_server_response(&mut self, response: &ServerResponse) {
        if !self.visits.is_busy() {
            tracing::trace!(target: "horizon_dnd::manager", "no visit pending, response ignored");
            return;
        }
        let _span = PerfSpan::new(span_names::SERVER_RESPONSE);
        let expected = self.visits.visit_id;
        let received = response.visit_id();

        let handled = self.with_context(|cx| {
            if received == expected {
                cx.invoke_server_callback(response);
            } else {
                tracing::debug!(
                    target: "horizon_dnd::manager",
                    expected,
                    received,
                    "stale server response ignored"
                );
            }
            cx.run_deferred_commands();
        });
        if handled.is_none() {
            self.visits.reset();
        }
    }

    // =========================================================================
    // Drag image
    // =========================================================================

    /// Sets the element that follows the cursor.
    ///
    /// Replaces and detaches a previous image. The element gets
    /// [`DndConfig::drag_element_class`] and is attached right away when the
    /// drag has started, otherwise on promotion. Ignored without a drag.
    pub fn set_drag_element(&mut self, node: NodeId) -> DndResult<()> {
        if self.current_drag.is_none() {
            tracing::trace!(target: "horizon_dnd::manager", "no active drag, drag image ignored");
            return Ok(());
        }
        if self.drag_element == Some(node) {
            return Ok(());
        }
        self.clear_drag_element();
        self.document
            .write()
            .add_class(node, &self.config.drag_element_class)?;
        self.drag_element = Some(node);
        self.update_drag_image_position()?;
        if self.started {
            self.attach_drag_element()?;
        }
        Ok(())
    }

    /// Clones `source` as the drag image.
    ///
    /// With `align_to_event` the clone is offset by margins so it keeps the
    /// source's position relative to the cursor. Returns the clone, or `None`
    /// without an active drag.
    pub fn create_drag_image(
        &mut self,
        source: NodeId,
        align_to_event: bool,
    ) -> DndResult<Option<NodeId>> {
        let Some(drag) = self.current_drag.as_ref() else {
            return Ok(None);
        };
        let anchor = drag
            .current_event()
            .map(NativeEvent::client)
            .or(drag.start_client());

        let image = {
            let mut doc = self.document.write();
            let image = doc.clone_node(source, true)?;
            if let (true, Some(anchor)) = (align_to_event, anchor) {
                let origin = doc.bounds(source)?.origin;
                doc.set_margin(image, Point::new(origin.x - anchor.x, origin.y - anchor.y))?;
            }
            image
        };
        self.set_drag_element(image)?;
        Ok(Some(image))
    }

    /// Moves the drag image to the cursor of the current event.
    pub fn update_drag_image_position(&mut self) -> DndResult<()> {
        let Some(image) = self.live_drag_element() else {
            return Ok(());
        };
        let Some(client) = self
            .current_drag
            .as_ref()
            .and_then(DragEvent::current_event)
            .map(NativeEvent::client)
        else {
            return Ok(());
        };
        self.document.write().set_position(image, client)?;
        Ok(())
    }

    /// Hides the drag image. Returns the display value to restore.
    pub fn hide_drag_element(&mut self) -> DndResult<Option<Display>> {
        let Some(image) = self.live_drag_element() else {
            return Ok(None);
        };
        let mut doc = self.document.write();
        let saved = doc.display(image)?;
        doc.set_display(image, Display::None)?;
        Ok(Some(saved))
    }

    /// Restores the drag image's display value.
    pub fn restore_drag_element(&mut self, saved: Option<Display>) -> DndResult<()> {
        if let (Some(image), Some(display)) = (self.live_drag_element(), saved) {
            self.document.write().set_display(image, display)?;
        }
        Ok(())
    }

    /// The drag image, forgotten if the host removed it from the document.
    ///
    /// Without an image, targets come from the events themselves again.
    fn live_drag_element(&mut self) -> Option<NodeId> {
        let image = self.drag_element?;
        if self.document.read().contains(image) {
            return Some(image);
        }
        tracing::trace!(target: "horizon_dnd::manager", ?image, "drag image removed, forgotten");
        self.drag_element = None;
        None
    }

    fn attach_drag_element(&mut self) -> DndResult<()> {
        let Some(image) = self.drag_element else {
            return Ok(());
        };
        let mut doc = self.document.write();
        if doc.parent(image)?.is_some() {
            return Ok(());
        }
        let container = match doc.overlay_container() {
            Some(container) => container,
            None => {
                tracing::error!(
                    target: "horizon_dnd::manager",
                    "no overlay container, drag image attached to body"
                );
                doc.body()
            }
        };
        doc.append_child(container, image)?;
        Ok(())
    }

    fn clear_drag_element(&mut self) {
        if let Some(image) = self.drag_element.take() {
            if let Err(err) = self.document.write().remove_from_parent(image) {
                tracing::trace!(target: "horizon_dnd::manager", %err, "drag image not detached");
            }
        }
    }
}

impl fmt::Debug for DragAndDropManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragAndDropManager")
            .field("strategy", &self.strategy.name())
            .field("preview", &self.preview)
            .field("started", &self.started)
            .field("current_drag", &self.current_drag.as_ref().map(DragEvent::event_id))
            .field("current_target", &self.current_target)
            .field("visits", &self.visits)
            .field("drag_element", &self.drag_element)
            .field("drop_targets", &self.drop_targets.len())
            .finish()
    }
}

/// Builder for [`DragAndDropManager`].
pub struct DragAndDropManagerBuilder {
    document: SharedDocument,
    config: DndConfig,
    scheduler: Option<Rc<Scheduler>>,
    strategy: Option<Rc<dyn EventHandleStrategy>>,
    criteria: Option<Rc<CriterionRegistry>>,
}

impl DragAndDropManagerBuilder {
    fn new(document: SharedDocument) -> Self {
        Self {
            document,
            config: DndConfig::default(),
            scheduler: None,
            strategy: None,
            criteria: None,
        }
    }

    /// Sets the settings.
    pub fn config(mut self, config: DndConfig) -> Self {
        self.config = config;
        self
    }

    /// Shares a scheduler driven by the host event loop.
    pub fn scheduler(mut self, scheduler: Rc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Uses an explicit strategy instead of the configured one.
    pub fn strategy(mut self, strategy: Rc<dyn EventHandleStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Uses a custom criterion registry.
    pub fn criteria(mut self, criteria: Rc<CriterionRegistry>) -> Self {
        self.criteria = Some(criteria);
        self
    }

    /// Validates the settings and builds the manager.
    pub fn build(self) -> DndResult<DragAndDropManager> {
        self.config.validate()?;
        Ok(DragAndDropManager::assemble(
            self.document,
            self.config,
            self.scheduler.unwrap_or_else(|| Rc::new(Scheduler::new())),
            self.strategy,
            self.criteria
                .unwrap_or_else(|| Rc::new(CriterionRegistry::with_builtins())),
        ))
    }
}

impl fmt::Debug for DragAndDropManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragAndDropManagerBuilder")
            .field("config", &self.config)
            .field("strategy", &self.strategy.as_ref().map(|s| s.name()))
            .finish_non_exhaustive()
    }
}
