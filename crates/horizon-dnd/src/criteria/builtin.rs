//! Leaf criteria.

use super::{AcceptCriterion, CriterionConfig};
use crate::drag_event::DragEvent;
use crate::drop_handler::DropContext;
use crate::error::CriterionError;

/// Accepts every drag.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl AcceptAll {
    /// Registry name.
    pub const NAME: &'static str = "accept-all";
}

impl AcceptCriterion for AcceptAll {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        _cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        Ok(true)
    }
}

/// Leaves every decision to the server.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerSideCriterion;

impl ServerSideCriterion {
    /// Registry name.
    pub const NAME: &'static str = "server-side";
}

impl AcceptCriterion for ServerSideCriterion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        _cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        Ok(false)
    }

    fn needs_server_side_check(&self, _drag: &DragEvent, _config: &CriterionConfig) -> bool {
        true
    }
}

/// Accepts if the transferable carries every flavor listed in `flavors`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainsDataFlavor;

impl ContainsDataFlavor {
    /// Registry name.
    pub const NAME: &'static str = "contains-data-flavor";
}

impl AcceptCriterion for ContainsDataFlavor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        let transferable = cx.drag().transferable();
        Ok(config
            .string_array_attribute("flavors")?
            .into_iter()
            .all(|flavor| transferable.has_flavor(flavor)))
    }
}

/// Accepts if the drag started from the drop target's own widget.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceIsTarget;

impl SourceIsTarget {
    /// Registry name.
    pub const NAME: &'static str = "source-is-target";
}

impl AcceptCriterion for SourceIsTarget {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        _config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        let owner = cx.drop_target_owner().ok_or(CriterionError::NoDropTarget)?;
        Ok(owner == cx.drag().transferable().drag_source())
    }
}

/// Accepts if the drag source's connector is listed in `components`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DragSourceIs;

impl DragSourceIs {
    /// Registry name.
    pub const NAME: &'static str = "drag-source-is";
}

impl AcceptCriterion for DragSourceIs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        let components = config.string_array_attribute("components")?;
        let source = cx.drag().transferable().drag_source();
        let doc = cx.document().read();
        let connector = doc.connector(source)?;
        Ok(components.contains(&connector.as_str()))
    }
}

/// Accepts if drop detail `p` equals the value `v`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TargetDetailIs;

impl TargetDetailIs {
    /// Registry name.
    pub const NAME: &'static str = "target-detail-is";
}

impl AcceptCriterion for TargetDetailIs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        let detail = config.string_attribute("p")?;
        let expected = config.required_attribute("v")?;
        Ok(cx.drag().drop_details().get(detail) == Some(expected))
    }
}
