//! Item identifier criterion loaded lazily from the server.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;

use super::{AcceptCriterion, CriterionConfig};
use crate::drag_event::DragEvent;
use crate::drop_handler::{AcceptCallback, DropContext};
use crate::error::CriterionError;

#[derive(Debug, Default)]
struct LazyState {
    /// The drag the allowed set belongs to.
    event_id: Option<u32>,
    /// `None` until the server answered for `event_id`.
    allowed: Option<HashSet<String>>,
}

/// Accepts if the item under the cursor (drop detail `itemIdOver`) is in a set
/// of identifiers fetched from the server.
///
/// The first check of a drag asks the server, which answers with `accepted`
/// and the full `allowedIds` list. Later checks of the same drag use the list
/// without another visit. Once loaded, the criterion reports that it needs a
/// server check so a drop is confirmed by the server.
#[derive(Debug, Clone)]
pub struct LazyInitItemIdentifiers {
    name: String,
    state: Rc<RefCell<LazyState>>,
}

impl LazyInitItemIdentifiers {
    /// Registry name of the default instance.
    pub const NAME: &'static str = "lazy-init-item-identifiers";

    /// Creates an instance registered as [`Self::NAME`].
    pub fn new() -> Self {
        Self::with_name(Self::NAME)
    }

    /// Creates an instance with its own name and cache, for widgets that
    /// need separate identifier sets.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Rc::new(RefCell::new(LazyState::default())),
        }
    }

    fn item_over(drag: &DragEvent) -> Option<String> {
        match drag.drop_details().get("itemIdOver")? {
            Value::String(id) => Some(id.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl Default for LazyInitItemIdentifiers {
    fn default() -> Self {
        Self::new()
    }
}

impl AcceptCriterion for LazyInitItemIdentifiers {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        _cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        // Decisions are made in `accept` from the cached set.
        Ok(false)
    }

    fn needs_server_side_check(&self, drag: &DragEvent, _config: &CriterionConfig) -> bool {
        let state = self.state.borrow();
        state.event_id == Some(drag.event_id()) && state.allowed.is_some()
    }

    fn accept(
        &self,
        cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
        callback: AcceptCallback,
    ) {
        let event_id = cx.drag().event_id();
        let decision = {
            let mut state = self.state.borrow_mut();
            if state.event_id != Some(event_id) {
                state.event_id = Some(event_id);
                state.allowed = None;
            }
            state.allowed.as_ref().map(|allowed| {
                Self::item_over(cx.drag()).is_some_and(|item| allowed.contains(&item))
            })
        };

        match decision {
            Some(true) => callback(cx),
            Some(false) => {
                tracing::trace!(
                    target: "horizon_dnd::criteria",
                    criterion = %self.name,
                    "item not allowed"
                );
            }
            None => {
                let state = Rc::clone(&self.state);
                cx.visit_server(Box::new(move |cx, accepted, response| {
                    {
                        let mut state = state.borrow_mut();
                        if state.event_id == Some(event_id) {
                            let allowed = response.string_array("allowedIds");
                            state.allowed = Some(allowed.into_iter().collect());
                        }
                    }
                    if accepted {
                        callback(cx);
                    }
                }));
            }
        }
    }
}
