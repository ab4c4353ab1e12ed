//! Logging and debugging facilities for Horizon DnD.
//!
//! This module provides:
//! - Target and span names for filtering `tracing` output by subsystem
//! - Debug visualization for document trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon DnD uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_dnd=debug")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`DocumentTreeDebug`] to dump the node hierarchy, including widget
//! ownership and class lists:
//!
//! ```ignore
//! use horizon_dnd_core::logging::DocumentTreeDebug;
//!
//! let text = DocumentTreeDebug::new().format_document(&document.read());
//! println!("{text}");
//! ```

use std::fmt::Write as FmtWrite;

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::DomResult;

/// Span names used throughout Horizon DnD for tracing.
pub mod span_names {
    /// Processing of a server response.
    pub const SERVER_RESPONSE: &str = "horizon_dnd::server_response";
    /// Preview of a native event during a drag.
    pub const PREVIEW: &str = "horizon_dnd::preview";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core primitives target.
    pub const CORE: &str = "horizon_dnd_core";
    /// Document model target.
    pub const DOM: &str = "horizon_dnd_core::dom";
    /// Command scheduler target.
    pub const SCHEDULER: &str = "horizon_dnd_core::scheduler";
    /// Drag manager lifecycle target.
    pub const MANAGER: &str = "horizon_dnd::manager";
    /// Event handling strategy target.
    pub const STRATEGY: &str = "horizon_dnd::strategy";
    /// Accept criteria target.
    pub const CRITERIA: &str = "horizon_dnd::criteria";
    /// Server round-trip target.
    pub const SERVER: &str = "horizon_dnd::server";
    /// Lightweight drag handler target.
    pub const HANDLER: &str = "horizon_dnd::handler";
}

/// Style options for document tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
}

/// Configuration for document tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show class lists.
    pub show_classes: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_classes: true,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for minimal output: tag names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_classes: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing document trees.
#[derive(Debug, Clone, Default)]
pub struct DocumentTreeDebug {
    options: TreeFormatOptions,
}

impl DocumentTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the tree reachable from the body.
    pub fn format_document(&self, document: &Document) -> DomResult<String> {
        let mut output = String::new();
        let _ = writeln!(
            output,
            "Document ({} nodes, {} widgets):",
            document.node_count(),
            document.widget_count()
        );
        self.format_subtree_into(document, document.body(), 0, true, &mut output)?;
        Ok(output)
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, document: &Document, root: NodeId) -> DomResult<String> {
        let mut output = String::new();
        self.format_subtree_into(document, root, 0, true, &mut output)?;
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        document: &Document,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) -> DomResult<()> {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        output.push_str(&self.build_prefix(depth, is_last));
        match document.kind(id)? {
            NodeKind::Element { tag } => output.push_str(tag),
            NodeKind::Text => output.push_str("#text"),
        }
        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        if self.options.show_classes {
            let classes = document.classes(id)?;
            if !classes.is_empty() {
                let _ = write!(output, " .{}", classes.join("."));
            }
        }
        if document.capture() == Some(id) {
            output.push_str(" (capture)");
        }
        output.push('\n');

        let children = document.children(id)?;
        let count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(document, child, depth + 1, i + 1 == count, output)?;
        }
        Ok(())
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }
        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => (
                "\u{2502}",
                "\u{251c}\u{2500}\u{2500}",
                "\u{2514}\u{2500}\u{2500}",
            ),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.push_str("  ");
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_dnd::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}
