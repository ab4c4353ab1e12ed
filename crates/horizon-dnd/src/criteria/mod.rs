//! Accept criteria: rules deciding whether a drop target accepts a drag.
//!
//! A criterion is named and configured by a [`CriterionConfig`] tree that the
//! server sends to the drop handler. Criteria either decide on the client or
//! ask the server through a visit. Acceptance is signalled by invoking the
//! supplied [`AcceptCallback`]; rejection invokes nothing.
//!
//! # Built-in criteria
//!
//! | Name | Decides |
//! |------|---------|
//! | `and`, `or`, `not` | Boolean combination of child criteria |
//! | `accept-all` | Always accepts |
//! | `server-side` | Always asks the server |
//! | `contains-data-flavor` | Transferable carries every flavor in `flavors` |
//! | `source-is-target` | Drag source is the drop target's owner |
//! | `drag-source-is` | Drag source connector is listed in `components` |
//! | `target-detail-is` | Drop detail `p` equals `v` |
//! | `lazy-init-item-identifiers` | Item over is in a server-provided set |

mod builtin;
mod combinators;
mod lazy;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::drag_event::DragEvent;
use crate::drop_handler::{AcceptCallback, DropContext};
use crate::error::{CriterionError, DndResult};

pub use builtin::{
    AcceptAll, ContainsDataFlavor, DragSourceIs, ServerSideCriterion, SourceIsTarget,
    TargetDetailIs,
};
pub use combinators::{And, Not, Or};
pub use lazy::LazyInitItemIdentifiers;

/// Tag carried by every criterion configuration node.
pub const CRITERION_TAG: &str = "-ac";

fn default_tag() -> String {
    CRITERION_TAG.to_string()
}

/// A rule deciding whether the current drop target accepts the drag.
pub trait AcceptCriterion {
    /// The registry name.
    fn name(&self) -> &str;

    /// Decides on the client. Any error rejects.
    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError>;

    /// Returns true if the decision must come from the server.
    fn needs_server_side_check(&self, _drag: &DragEvent, _config: &CriterionConfig) -> bool {
        false
    }

    /// Invokes `callback` if the drag is accepted, either now or when the
    /// server answers.
    fn accept(&self, cx: &mut DropContext<'_>, config: &CriterionConfig, callback: AcceptCallback) {
        if self.needs_server_side_check(cx.drag(), config) {
            tracing::trace!(
                target: "horizon_dnd::criteria",
                criterion = self.name(),
                "asking server"
            );
            cx.visit_server(Box::new(move |cx, accepted, _response| {
                if accepted {
                    callback(cx);
                }
            }));
            return;
        }

        match self.evaluate(cx, config) {
            Ok(true) => callback(cx),
            Ok(false) => {
                tracing::trace!(
                    target: "horizon_dnd::criteria",
                    criterion = self.name(),
                    "rejected"
                );
            }
            Err(err) => {
                tracing::trace!(
                    target: "horizon_dnd::criteria",
                    criterion = self.name(),
                    %err,
                    "rejected on error"
                );
            }
        }
    }
}

/// Declarative configuration of a criterion and its children.
///
/// ```
/// use horizon_dnd::criteria::CriterionConfig;
///
/// let config = CriterionConfig::from_json(r#"{
///     "tag": "-ac",
///     "name": "and",
///     "children": [
///         {"name": "contains-data-flavor", "attributes": {"flavors": ["itemId"]}},
///         {"name": "source-is-target"}
///     ]
/// }"#).unwrap();
/// assert_eq!(config.child_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionConfig {
    /// Node tag, always `-ac`.
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Registry name of the criterion.
    pub name: String,
    /// Criterion attributes.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    /// Child criteria for combinators.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CriterionConfig>,
}

impl CriterionConfig {
    /// Creates a configuration naming a criterion.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tag: default_tag(),
            name: name.into(),
            attributes: Map::new(),
            children: Vec::new(),
        }
    }

    /// Parses a configuration tree and checks its tags.
    pub fn from_json(source: &str) -> DndResult<Self> {
        let config: Self = serde_json::from_str(source)?;
        config.check_tag()?;
        Ok(config)
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Adds a child criterion.
    pub fn with_child(mut self, child: CriterionConfig) -> Self {
        self.children.push(child);
        self
    }

    /// Checks that this node and all descendants carry the criterion tag.
    pub fn check_tag(&self) -> Result<(), CriterionError> {
        if self.tag != CRITERION_TAG {
            return Err(CriterionError::WrongTag(self.tag.clone()));
        }
        self.children.iter().try_for_each(CriterionConfig::check_tag)
    }

    /// Number of child criteria.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a child criterion.
    pub fn child(&self, index: usize) -> Result<&CriterionConfig, CriterionError> {
        self.children
            .get(index)
            .ok_or_else(|| CriterionError::MissingChild {
                criterion: self.name.clone(),
                index,
            })
    }

    /// Returns a raw attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns a required attribute.
    pub fn required_attribute(&self, name: &str) -> Result<&Value, CriterionError> {
        self.attributes
            .get(name)
            .ok_or_else(|| CriterionError::MissingAttribute {
                criterion: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    /// Returns a required string attribute.
    pub fn string_attribute(&self, name: &str) -> Result<&str, CriterionError> {
        self.required_attribute(name)?
            .as_str()
            .ok_or_else(|| self.invalid(name))
    }

    /// Returns a required string array attribute.
    pub fn string_array_attribute(&self, name: &str) -> Result<Vec<&str>, CriterionError> {
        self.required_attribute(name)?
            .as_array()
            .ok_or_else(|| self.invalid(name))?
            .iter()
            .map(|item| item.as_str().ok_or_else(|| self.invalid(name)))
            .collect()
    }

    fn invalid(&self, attribute: &str) -> CriterionError {
        CriterionError::InvalidAttribute {
            criterion: self.name.clone(),
            attribute: attribute.to_string(),
        }
    }
}

/// Named accept criteria available to drop handlers.
pub struct CriterionRegistry {
    criteria: HashMap<String, Rc<dyn AcceptCriterion>>,
}

impl CriterionRegistry {
    /// Creates a registry without any criteria.
    pub fn empty() -> Self {
        Self {
            criteria: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in criteria.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Rc::new(And));
        registry.register(Rc::new(Or));
        registry.register(Rc::new(Not));
        registry.register(Rc::new(AcceptAll));
        registry.register(Rc::new(ServerSideCriterion));
        registry.register(Rc::new(ContainsDataFlavor));
        registry.register(Rc::new(SourceIsTarget));
        registry.register(Rc::new(DragSourceIs));
        registry.register(Rc::new(TargetDetailIs));
        registry.register(Rc::new(LazyInitItemIdentifiers::new()));
        registry
    }

    /// Registers a criterion under its own name, replacing any previous one.
    pub fn register(&mut self, criterion: Rc<dyn AcceptCriterion>) {
        let name = criterion.name().to_string();
        tracing::trace!(target: "horizon_dnd::criteria", %name, "registered criterion");
        self.criteria.insert(name, criterion);
    }

    /// Looks up a criterion.
    pub fn get(&self, name: &str) -> Option<Rc<dyn AcceptCriterion>> {
        self.criteria.get(name).cloned()
    }

    /// Looks up a criterion, failing for unknown names.
    pub fn resolve(&self, name: &str) -> Result<Rc<dyn AcceptCriterion>, CriterionError> {
        self.get(name)
            .ok_or_else(|| CriterionError::UnknownCriterion(name.to_string()))
    }

    /// Returns true if a criterion is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.criteria.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.criteria.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for CriterionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriterionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Resolves the criterion named by `config` and runs it. Unknown names reject.
pub fn accept(cx: &mut DropContext<'_>, config: &CriterionConfig, callback: AcceptCallback) {
    match cx.criteria().resolve(&config.name) {
        Ok(criterion) => criterion.accept(cx, config, callback),
        Err(err) => {
            tracing::debug!(target: "horizon_dnd::criteria", %err, "rejected");
        }
    }
}
