//! Document model for Horizon DnD.
//!
//! Provides an arena-backed document tree standing in for the host DOM:
//! - Element and text nodes with parent-child links
//! - CSS class lists and a small inline style (display, absolute position, margins)
//! - Layout bounds and coordinate hit testing
//! - Pointer capture and an overlay container for floating elements
//! - Widgets mapped onto root elements, with their own logical parent chain
//!
//! # Key Types
//!
//! - [`Document`] - The node and widget arena
//! - [`SharedDocument`] - Cloneable, lock-protected handle shared by the drag
//!   machinery and the host
//! - [`NodeId`] / [`WidgetId`] - Stable handles into the arena
//! - [`ConnectorId`] - Identifier of a widget's server-side counterpart

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use slotmap::{SlotMap, new_key_type};

use crate::error::{DomError, DomResult};
use crate::geometry::{Point, Rect};

new_key_type! {
    /// A handle to a node in a [`Document`].
    ///
    /// Handles stay valid while the node exists, whether or not it is attached
    /// to the body.
    pub struct NodeId;

    /// A handle to a widget registered in a [`Document`].
    pub struct WidgetId;
}

/// Identifier of a widget's server-side counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(String);

impl ConnectorId {
    /// Creates a connector ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConnectorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The kind of a document node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// An element with a tag name.
    Element {
        /// Lowercase tag name, e.g. `div`.
        tag: String,
    },
    /// A text node. Text nodes are never hit-test results.
    Text,
}

/// The CSS `display` value of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    /// No inline value; the element renders with its natural display.
    #[default]
    Unset,
    /// `display: none`. The element and its subtree are not rendered.
    None,
    /// `display: block`.
    Block,
    /// `display: inline`.
    Inline,
    /// `display: inline-block`.
    InlineBlock,
}

/// Inline style of an element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    /// The display value.
    pub display: Display,
    /// Absolute `left`/`top`, when the element is positioned.
    pub position: Option<Point>,
    /// `margin-left`/`margin-top`.
    pub margin: Point,
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    classes: Vec<String>,
    style: Style,
    /// Layout box in client coordinates. Positioned elements keep only the size.
    bounds: Rect,
    /// The widget whose root element this node is.
    widget: Option<WidgetId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            classes: Vec::new(),
            style: Style::default(),
            bounds: Rect::ZERO,
            widget: None,
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }

    fn layout_rect(&self) -> Rect {
        match self.style.position {
            Some(position) => self.bounds.with_origin(position + self.style.margin),
            None => self.bounds,
        }
    }
}

struct WidgetData {
    root: NodeId,
    parent: Option<WidgetId>,
    enabled: bool,
    connector: ConnectorId,
}

/// An arena of nodes and widgets.
///
/// The document always owns a `body` element. Nodes not reachable from the
/// body are detached: they exist and can be mutated but are never hit.
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    widgets: SlotMap<WidgetId, WidgetData>,
    body: NodeId,
    overlay_container: Option<NodeId>,
    capture: Option<NodeId>,
}

impl Document {
    /// Creates a document containing only an empty body.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(NodeData::new(NodeKind::Element {
            tag: "body".to_string(),
        }));
        Self {
            nodes,
            widgets: SlotMap::with_key(),
            body,
            overlay_container: None,
            capture: None,
        }
    }

    /// Returns the body element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    // -------------------------------------------------------------------------
    // Node lifecycle
    // -------------------------------------------------------------------------

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.nodes.insert(NodeData::new(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
        }));
        tracing::trace!(target: "horizon_dnd_core::dom", ?id, tag, "created element");
        id
    }

    /// Creates a detached text node.
    pub fn create_text_node(&mut self) -> NodeId {
        self.nodes.insert(NodeData::new(NodeKind::Text))
    }

    /// Returns true if the node exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    /// Removes a node and its subtree from the arena.
    ///
    /// Widgets rooted in the removed subtree stay registered but their root
    /// becomes invalid; lookups through them report [`DomError::InvalidNode`].
    pub fn remove_node(&mut self, node: NodeId) -> DomResult<()> {
        if node == self.body {
            return Err(DomError::CircularParentage);
        }
        self.detach(node)?;
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(current) {
                stack.extend(data.children);
            }
            if self.capture == Some(current) {
                self.capture = None;
            }
            if self.overlay_container == Some(current) {
                self.overlay_container = None;
            }
        }
        Ok(())
    }

    /// Deep or shallow copy of a node. The copy is detached and owned by no widget.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> DomResult<NodeId> {
        let data = self.node(node)?;
        let mut copy = NodeData::new(data.kind.clone());
        copy.classes = data.classes.clone();
        copy.style = data.style;
        copy.bounds = data.bounds;
        let children = if deep { data.children.clone() } else { Vec::new() };

        let id = self.nodes.insert(copy);
        for child in children {
            let child_copy = self.clone_node(child, true)?;
            self.append_child(id, child_copy)?;
        }
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------------

    /// Appends `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.node(parent)?.is_element() {
            return Err(DomError::NotAnElement);
        }
        self.node(child)?;
        if self.is_or_has_child(child, parent) {
            return Err(DomError::CircularParentage);
        }

        self.detach(child)?;
        if let Some(data) = self.nodes.get_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.nodes.get_mut(parent) {
            data.children.push(child);
        }
        Ok(())
    }

    /// Detaches a node from its parent. Detaching a detached node is a no-op.
    pub fn remove_from_parent(&mut self, node: NodeId) -> DomResult<()> {
        self.detach(node)
    }

    fn detach(&mut self, node: NodeId) -> DomResult<()> {
        let parent = self.node(node)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_data) = self.nodes.get_mut(parent) {
                parent_data.children.retain(|&c| c != node);
            }
        }
        if let Some(data) = self.nodes.get_mut(node) {
            data.parent = None;
        }
        Ok(())
    }

    /// Returns the parent node.
    pub fn parent(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.node(node)?.parent)
    }

    /// Returns the parent if it is an element.
    pub fn parent_element(&self, node: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self
            .node(node)?
            .parent
            .filter(|&p| self.nodes.get(p).is_some_and(NodeData::is_element)))
    }

    /// Returns the children of a node.
    pub fn children(&self, node: NodeId) -> DomResult<&[NodeId]> {
        Ok(self.node(node)?.children.as_slice())
    }

    /// Returns the node kind.
    pub fn kind(&self, node: NodeId) -> DomResult<&NodeKind> {
        Ok(&self.node(node)?.kind)
    }

    /// Returns true if the node exists and is an element.
    pub fn is_element(&self, node: NodeId) -> bool {
        self.nodes.get(node).is_some_and(NodeData::is_element)
    }

    /// Returns true if `node` is `ancestor` or one of its descendants.
    pub fn is_or_has_child(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(|d| d.parent);
        }
        false
    }

    /// Returns true if the node is reachable from the body.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.is_or_has_child(self.body, node)
    }

    // -------------------------------------------------------------------------
    // Classes and style
    // -------------------------------------------------------------------------

    /// Adds a class name. Adding an existing class is a no-op.
    pub fn add_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        let data = self.node_mut(node)?;
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
        Ok(())
    }

    /// Removes a class name.
    pub fn remove_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        self.node_mut(node)?.classes.retain(|c| c != class);
        Ok(())
    }

    /// Returns true if the node carries the class.
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|d| d.classes.iter().any(|c| c == class))
    }

    /// Returns the class list.
    pub fn classes(&self, node: NodeId) -> DomResult<&[String]> {
        Ok(self.node(node)?.classes.as_slice())
    }

    /// Returns the inline style.
    pub fn style(&self, node: NodeId) -> DomResult<Style> {
        Ok(self.node(node)?.style)
    }

    /// Returns the inline display value.
    pub fn display(&self, node: NodeId) -> DomResult<Display> {
        Ok(self.node(node)?.style.display)
    }

    /// Sets the inline display value.
    pub fn set_display(&mut self, node: NodeId, display: Display) -> DomResult<()> {
        self.node_mut(node)?.style.display = display;
        Ok(())
    }

    /// Positions the element absolutely at `left`/`top` client coordinates.
    pub fn set_position(&mut self, node: NodeId, position: Point) -> DomResult<()> {
        self.node_mut(node)?.style.position = Some(position);
        Ok(())
    }

    /// Sets `margin-left`/`margin-top`.
    pub fn set_margin(&mut self, node: NodeId, margin: Point) -> DomResult<()> {
        self.node_mut(node)?.style.margin = margin;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Layout and hit testing
    // -------------------------------------------------------------------------

    /// Sets the layout box of a node.
    ///
    /// For positioned elements only the size is used; the origin follows the
    /// inline position and margins.
    pub fn set_bounds(&mut self, node: NodeId, bounds: Rect) -> DomResult<()> {
        self.node_mut(node)?.bounds = bounds;
        Ok(())
    }

    /// Returns the rendered box of a node in client coordinates.
    pub fn bounds(&self, node: NodeId) -> DomResult<Rect> {
        Ok(self.node(node)?.layout_rect())
    }

    /// Returns the topmost rendered element at a client coordinate.
    ///
    /// Later siblings paint above earlier ones and children above their
    /// parent. Elements with `display: none` hide their whole subtree.
    pub fn element_from_point(&self, point: Point) -> Option<NodeId> {
        let hit = self.hit_test(self.body, point);
        tracing::trace!(target: "horizon_dnd_core::dom", %point, ?hit, "element from point");
        hit
    }

    fn hit_test(&self, node: NodeId, point: Point) -> Option<NodeId> {
        let data = self.nodes.get(node)?;
        if !data.is_element() || data.style.display == Display::None {
            return None;
        }
        for &child in data.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, point) {
                return Some(hit);
            }
        }
        data.layout_rect().contains(point).then_some(node)
    }

    // -------------------------------------------------------------------------
    // Capture and overlay
    // -------------------------------------------------------------------------

    /// Routes pointer input to `node` until released.
    pub fn set_capture(&mut self, node: NodeId) -> DomResult<()> {
        self.node(node)?;
        self.capture = Some(node);
        Ok(())
    }

    /// Releases pointer capture.
    pub fn release_capture(&mut self) {
        self.capture = None;
    }

    /// Returns the node currently capturing pointer input.
    pub fn capture(&self) -> Option<NodeId> {
        self.capture
    }

    /// Returns the container floating elements are attached to.
    pub fn overlay_container(&self) -> Option<NodeId> {
        self.overlay_container
    }

    /// Sets the container floating elements are attached to.
    pub fn set_overlay_container(&mut self, node: NodeId) -> DomResult<()> {
        if !self.node(node)?.is_element() {
            return Err(DomError::NotAnElement);
        }
        self.overlay_container = Some(node);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Widgets
    // -------------------------------------------------------------------------

    /// Registers a widget rooted at `root`.
    pub fn create_widget(
        &mut self,
        root: NodeId,
        connector: impl Into<ConnectorId>,
    ) -> DomResult<WidgetId> {
        let data = self.node(root)?;
        if !data.is_element() {
            return Err(DomError::NotAnElement);
        }
        let connector = connector.into();
        let id = self.widgets.insert(WidgetData {
            root,
            parent: None,
            enabled: true,
            connector,
        });
        self.node_mut(root)?.widget = Some(id);
        tracing::trace!(target: "horizon_dnd_core::dom", ?id, ?root, "registered widget");
        Ok(id)
    }

    /// Removes a widget registration. The root element is left in place.
    pub fn remove_widget(&mut self, widget: WidgetId) -> DomResult<()> {
        let data = self.widgets.remove(widget).ok_or(DomError::InvalidWidget)?;
        if let Some(root) = self.nodes.get_mut(data.root) {
            root.widget = None;
        }
        for other in self.widgets.values_mut() {
            if other.parent == Some(widget) {
                other.parent = None;
            }
        }
        Ok(())
    }

    /// Sets the logical parent of a widget.
    pub fn set_widget_parent(
        &mut self,
        widget: WidgetId,
        parent: Option<WidgetId>,
    ) -> DomResult<()> {
        self.widget(widget)?;
        if let Some(parent) = parent {
            self.widget(parent)?;
            let mut current = Some(parent);
            while let Some(id) = current {
                if id == widget {
                    return Err(DomError::CircularParentage);
                }
                current = self.widgets.get(id).and_then(|w| w.parent);
            }
        }
        self.widget_mut(widget)?.parent = parent;
        Ok(())
    }

    /// Returns the logical parent of a widget.
    pub fn widget_parent(&self, widget: WidgetId) -> DomResult<Option<WidgetId>> {
        Ok(self.widget(widget)?.parent)
    }

    /// Returns the root element of a widget.
    pub fn widget_root(&self, widget: WidgetId) -> DomResult<NodeId> {
        let root = self.widget(widget)?.root;
        self.node(root)?;
        Ok(root)
    }

    /// Returns the connector ID of a widget.
    pub fn connector(&self, widget: WidgetId) -> DomResult<&ConnectorId> {
        Ok(&self.widget(widget)?.connector)
    }

    /// Sets the widget's own enabled flag.
    pub fn set_enabled(&mut self, widget: WidgetId, enabled: bool) -> DomResult<()> {
        self.widget_mut(widget)?.enabled = enabled;
        Ok(())
    }

    /// Returns true if the widget and all its logical ancestors are enabled.
    pub fn is_enabled(&self, widget: WidgetId) -> DomResult<bool> {
        let mut current = Some(widget);
        let mut steps = 0;
        while let Some(id) = current {
            let data = self.widget(id)?;
            if !data.enabled {
                return Ok(false);
            }
            steps += 1;
            if steps > self.widgets.len() {
                return Err(DomError::UnterminatedWidgetChain);
            }
            current = data.parent;
        }
        Ok(true)
    }

    /// Finds the widget owning a node: the nearest node, starting at `node`
    /// and walking up its ancestors, that is a widget's root element.
    pub fn find_widget(&self, node: NodeId) -> DomResult<Option<WidgetId>> {
        let mut current = Some(node);
        while let Some(id) = current {
            let data = self.node(id)?;
            if let Some(widget) = data.widget {
                if self.widgets.contains_key(widget) {
                    return Ok(Some(widget));
                }
            }
            current = data.parent;
        }
        Ok(None)
    }

    /// Returns the number of registered widgets.
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// Returns the number of nodes, including the body.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, node: NodeId) -> DomResult<&NodeData> {
        self.nodes.get(node).ok_or(DomError::InvalidNode)
    }

    fn node_mut(&mut self, node: NodeId) -> DomResult<&mut NodeData> {
        self.nodes.get_mut(node).ok_or(DomError::InvalidNode)
    }

    fn widget(&self, widget: WidgetId) -> DomResult<&WidgetData> {
        self.widgets.get(widget).ok_or(DomError::InvalidWidget)
    }

    fn widget_mut(&mut self, widget: WidgetId) -> DomResult<&mut WidgetData> {
        self.widgets.get_mut(widget).ok_or(DomError::InvalidWidget)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("widgets", &self.widgets.len())
            .field("body", &self.body)
            .field("capture", &self.capture)
            .finish()
    }
}

/// A cloneable handle to a lock-protected [`Document`].
///
/// Locks are held only for the duration of a single call; never keep a guard
/// alive across a call into drop handlers or criteria.
#[derive(Clone, Default)]
pub struct SharedDocument {
    inner: Arc<RwLock<Document>>,
}

impl SharedDocument {
    /// Wraps a document.
    pub fn new(document: Document) -> Self {
        Self {
            inner: Arc::new(RwLock::new(document)),
        }
    }

    /// Acquires a read guard.
    pub fn read(&self) -> RwLockReadGuard<'_, Document> {
        self.inner.read()
    }

    /// Acquires a write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, Document> {
        self.inner.write()
    }

    /// Runs a closure with read access.
    pub fn with_read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs a closure with write access.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut self.inner.write())
    }
}

impl fmt::Debug for SharedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(doc) => fmt::Debug::fmt(&*doc, f),
            None => f.write_str("SharedDocument(<locked>)"),
        }
    }
}

static_assertions::assert_impl_all!(SharedDocument: Send, Sync);
