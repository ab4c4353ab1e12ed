//! Drop targets and the context they are called with.
//!
//! A widget becomes a drop target by registering a [`DropHandler`] with the
//! manager. During a drag the manager calls the handler with a
//! [`DropContext`], which gives access to the drag, the document, the
//! criterion registry and the server visit machinery for the duration of one
//! callback.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use horizon_dnd_core::{SharedDocument, WidgetId};
use serde_json::Value;

use crate::criteria::{AcceptAll, AcceptCriterion, CriterionConfig, CriterionRegistry};
use crate::drag_event::{DragEvent, DragEventType};
use crate::error::{CriterionError, DndError, DndResult};
use crate::mouse_details::MouseEventDetails;
use crate::server::{DragRequest, ServerConnection, ServerResponse, ServerVisits};

/// Invoked with the response to a server visit: `(context, accepted, response)`.
pub type ServerCallback = Box<dyn FnOnce(&mut DropContext<'_>, bool, &ServerResponse)>;

/// A command run once no server visit is pending.
pub type DeferredCommand = Box<dyn FnOnce(&mut DropContext<'_>)>;

/// Invoked when an accept criterion accepts. Never invoked on rejection.
pub type AcceptCallback = Box<dyn FnOnce(&mut DropContext<'_>)>;

/// A shared, mutable drop handler.
pub type DropHandlerRef = Rc<RefCell<dyn DropHandler>>;

/// Capability implemented by widgets that accept drops.
pub trait DropHandler {
    /// The drag entered this target.
    fn drag_enter(&mut self, cx: &mut DropContext<'_>);

    /// The drag moved within this target.
    fn drag_over(&mut self, _cx: &mut DropContext<'_>) {}

    /// The drag left this target or was interrupted over it.
    fn drag_leave(&mut self, _cx: &mut DropContext<'_>) {}

    /// The drag was released over this target.
    ///
    /// Returns true if the transferable must be sent to the server.
    fn drop(&mut self, cx: &mut DropContext<'_>) -> bool;

    /// The widget that owns this handler. Drops are only offered while it is
    /// enabled.
    fn owner(&self) -> WidgetId;

    /// The connection to this handler's server-side counterpart.
    fn connection(&self) -> Rc<dyn ServerConnection>;
}

/// A registered drop handler with its owner and connection resolved.
#[derive(Clone)]
pub struct DropTarget {
    handler: DropHandlerRef,
    owner: WidgetId,
    connection: Rc<dyn ServerConnection>,
}

impl DropTarget {
    /// Resolves the owner and connection of a handler.
    pub fn new(handler: DropHandlerRef) -> DndResult<Self> {
        let (owner, connection) = {
            let guard = handler.try_borrow().map_err(|_| DndError::HandlerBusy)?;
            (guard.owner(), guard.connection())
        };
        Ok(Self {
            handler,
            owner,
            connection,
        })
    }

    /// The handler.
    pub fn handler(&self) -> &DropHandlerRef {
        &self.handler
    }

    /// The owning widget.
    pub fn owner(&self) -> WidgetId {
        self.owner
    }

    /// The server connection.
    pub fn connection(&self) -> &Rc<dyn ServerConnection> {
        &self.connection
    }

    /// Returns true if both targets wrap the same handler instance.
    pub fn is_same_handler(&self, other: &DropTarget) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.handler), Rc::as_ptr(&other.handler))
    }
}

impl fmt::Debug for DropTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropTarget")
            .field("owner", &self.owner)
            .field("handler", &Rc::as_ptr(&self.handler))
            .finish()
    }
}

/// Maps widgets to the drop handlers they expose.
#[derive(Debug, Default)]
pub struct DropTargetRegistry {
    targets: HashMap<WidgetId, DropTarget>,
}

impl DropTargetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `widget` exposes `handler`. Replaces any previous handler.
    pub fn register(&mut self, widget: WidgetId, handler: DropHandlerRef) -> DndResult<()> {
        let target = DropTarget::new(handler)?;
        self.targets.insert(widget, target);
        Ok(())
    }

    /// Removes the handler of a widget.
    pub fn unregister(&mut self, widget: WidgetId) -> Option<DropTarget> {
        self.targets.remove(&widget)
    }

    /// Returns the handler exposed by a widget.
    pub fn get(&self, widget: WidgetId) -> Option<&DropTarget> {
        self.targets.get(&widget)
    }

    /// Number of registered widgets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if no widget is registered.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Access to the active drag for drop handlers, criteria and callbacks.
pub struct DropContext<'a> {
    drag: &'a mut DragEvent,
    visits: &'a mut ServerVisits,
    target: Option<&'a DropTarget>,
    document: &'a SharedDocument,
    criteria: &'a Rc<CriterionRegistry>,
}

impl<'a> DropContext<'a> {
    pub(crate) fn new(
        drag: &'a mut DragEvent,
        visits: &'a mut ServerVisits,
        target: Option<&'a DropTarget>,
        document: &'a SharedDocument,
        criteria: &'a Rc<CriterionRegistry>,
    ) -> Self {
        Self {
            drag,
            visits,
            target,
            document,
            criteria,
        }
    }

    /// The active drag.
    pub fn drag(&self) -> &DragEvent {
        self.drag
    }

    /// The active drag, mutably.
    pub fn drag_mut(&mut self) -> &mut DragEvent {
        self.drag
    }

    /// The document.
    pub fn document(&self) -> &SharedDocument {
        self.document
    }

    /// The criterion registry.
    pub fn criteria(&self) -> Rc<CriterionRegistry> {
        Rc::clone(self.criteria)
    }

    /// The current drop target, if the drag is over one.
    pub fn drop_target(&self) -> Option<&DropTarget> {
        self.target
    }

    /// Owner of the current drop target.
    pub fn drop_target_owner(&self) -> Option<WidgetId> {
        self.target.map(DropTarget::owner)
    }

    /// ID of the latest server visit.
    pub fn visit_id(&self) -> u32 {
        self.visits.visit_id
    }

    /// Returns true while a server visit is pending.
    pub fn is_busy(&self) -> bool {
        self.visits.is_busy()
    }

    /// Asks the current drop target's server counterpart about the drag.
    ///
    /// `callback` replaces any callback still waiting for an earlier visit;
    /// the earlier response will then fail the visit ID check.
    pub fn visit_server(&mut self, callback: ServerCallback) {
        self.do_request(DragEventType::Enter);
        self.visits.server_callback = Some(callback);
    }

    /// Runs `command` now, or once the pending server visit completes.
    ///
    /// Only one command waits at a time; a later one replaces it.
    pub fn execute_when_ready(&mut self, command: DeferredCommand) {
        if self.is_busy() {
            tracing::trace!(
                target: "horizon_dnd::server",
                "deferring command until visit completes"
            );
            self.visits.deferred_command = Some(command);
        } else {
            command(self);
        }
    }

    pub(crate) fn invoke_server_callback(&mut self, response: &ServerResponse) {
        if let Some(callback) = self.visits.server_callback.take() {
            callback(self, response.accepted(), response);
        }
    }

    pub(crate) fn run_deferred_commands(&mut self) {
        while !self.is_busy() {
            let Some(command) = self.visits.deferred_command.take() else {
                break;
            };
            command(self);
        }
    }

    pub(crate) fn do_request(&mut self, kind: DragEventType) {
        let Some(target) = self.target else {
            tracing::trace!(
                target: "horizon_dnd::server",
                ?kind,
                "no drop target, request skipped"
            );
            return;
        };
        self.visits.visit_id += 1;

        let snapshot = match self.drag.current_event() {
            Some(event) => match MouseEventDetails::from_event(event) {
                Ok(details) => Value::from(details.serialize()),
                Err(err) => {
                    tracing::trace!(
                        target: "horizon_dnd::server",
                        %err,
                        "mouse event snapshot unavailable"
                    );
                    Value::Null
                }
            },
            None => Value::Null,
        };
        self.drag
            .drop_details_mut()
            .insert("mouseEvent".to_string(), snapshot);

        let (drop_handler_owner, drag_source) = {
            let doc = self.document.read();
            (
                doc.connector(target.owner()).ok().map(ToString::to_string),
                doc.connector(self.drag.transferable().drag_source())
                    .ok()
                    .map(ToString::to_string),
            )
        };

        let request = DragRequest {
            visit_id: self.visits.visit_id,
            event_id: self.drag.event_id(),
            drop_handler_owner,
            drag_source,
            event_type: kind.ordinal(),
            drop_details: self.drag.drop_details().clone(),
            transferable: self.drag.transferable().variable_map().clone(),
        };
        tracing::debug!(
            target: "horizon_dnd::server",
            visit_id = request.visit_id,
            event_id = request.event_id,
            ?kind,
            "sending drag request"
        );
        target.connection().send(request);
    }
}

impl fmt::Debug for DropContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropContext")
            .field("event_id", &self.drag.event_id())
            .field("visits", &self.visits)
            .field("target", &self.target)
            .finish()
    }
}

/// Accept-rule plumbing shared by drop handlers.
///
/// Holds the criterion configuration sent by the server. The default rules
/// accept everything.
pub struct DropHandlerBase {
    criterion: Rc<dyn AcceptCriterion>,
    config: CriterionConfig,
}

impl DropHandlerBase {
    /// Creates a base that accepts all drops.
    pub fn new() -> Self {
        Self {
            criterion: Rc::new(AcceptAll),
            config: CriterionConfig::new(AcceptAll::NAME),
        }
    }

    /// Replaces the accept rules.
    pub fn update_accept_rules(
        &mut self,
        config: CriterionConfig,
        registry: &CriterionRegistry,
    ) -> Result<(), CriterionError> {
        config.check_tag()?;
        self.criterion = registry.resolve(&config.name)?;
        self.config = config;
        Ok(())
    }

    /// The current accept rule configuration.
    pub fn accept_rules(&self) -> &CriterionConfig {
        &self.config
    }

    /// Evaluates the accept rules once no server visit is pending, calling
    /// `on_accepted` if they accept.
    pub fn validate(&self, cx: &mut DropContext<'_>, on_accepted: AcceptCallback) {
        let criterion = Rc::clone(&self.criterion);
        let config = self.config.clone();
        cx.execute_when_ready(Box::new(move |cx| {
            criterion.accept(cx, &config, on_accepted);
        }));
    }

    /// Validates on enter; `on_accepted` typically turns on drop emphasis.
    pub fn drag_enter(&self, cx: &mut DropContext<'_>, on_accepted: AcceptCallback) {
        self.validate(cx, on_accepted);
    }

    /// Decides a drop. Rules that need the server are left to the server and
    /// return true; otherwise the rules are evaluated now.
    pub fn drop(&self, cx: &mut DropContext<'_>) -> bool {
        if self.criterion.needs_server_side_check(cx.drag(), &self.config) {
            return true;
        }
        let validated = Rc::new(Cell::new(false));
        let flag = Rc::clone(&validated);
        self.criterion
            .accept(cx, &self.config, Box::new(move |_| flag.set(true)));
        validated.get()
    }
}

impl Default for DropHandlerBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DropHandlerBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DropHandlerBase")
            .field("criterion", &self.criterion.name())
            .field("config", &self.config)
            .finish()
    }
}
