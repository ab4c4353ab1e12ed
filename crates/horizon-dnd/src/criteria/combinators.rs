//! Boolean combinators over child criteria.
//!
//! Children are run through their own `accept` with a callback that raises a
//! local flag, and the flag is read as soon as `accept` returns. A child that
//! defers to the server has not answered at that point, so it counts as
//! rejecting inside `and` and `or` and as accepting inside `not`.

use std::cell::Cell;
use std::rc::Rc;

use super::{AcceptCriterion, CriterionConfig};
use crate::drop_handler::DropContext;
use crate::error::CriterionError;

/// Runs one child criterion and reports whether it accepted synchronously.
fn child_accepts(
    cx: &mut DropContext<'_>,
    config: &CriterionConfig,
    index: usize,
) -> Result<bool, CriterionError> {
    let child_config = config.child(index)?;
    let child = cx.criteria().resolve(&child_config.name)?;
    let accepted = Rc::new(Cell::new(false));
    let flag = Rc::clone(&accepted);
    child.accept(cx, child_config, Box::new(move |_| flag.set(true)));
    Ok(accepted.get())
}

/// Accepts if every child accepts. Stops at the first child that does not.
#[derive(Debug, Default, Clone, Copy)]
pub struct And;

impl And {
    /// Registry name.
    pub const NAME: &'static str = "and";
}

impl AcceptCriterion for And {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        for index in 0..config.child_count() {
            if !child_accepts(cx, config, index)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Accepts if any child accepts. Stops at the first child that does.
#[derive(Debug, Default, Clone, Copy)]
pub struct Or;

impl Or {
    /// Registry name.
    pub const NAME: &'static str = "or";
}

impl AcceptCriterion for Or {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        for index in 0..config.child_count() {
            if child_accepts(cx, config, index)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Accepts if its single child does not.
#[derive(Debug, Default, Clone, Copy)]
pub struct Not;

impl Not {
    /// Registry name.
    pub const NAME: &'static str = "not";
}

impl AcceptCriterion for Not {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn evaluate(
        &self,
        cx: &mut DropContext<'_>,
        config: &CriterionConfig,
    ) -> Result<bool, CriterionError> {
        if config.child_count() != 1 {
            return Err(CriterionError::ChildCount {
                criterion: Self::NAME.to_string(),
                expected: 1,
                found: config.child_count(),
            });
        }
        Ok(!child_accepts(cx, config, 0)?)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::criteria::CriterionRegistry;
    use crate::server::ServerResponse;
    use crate::test_support::{CountingCriterion, Fixture};

    fn run(fixture: &mut Fixture, config: &CriterionConfig) -> bool {
        let accepted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&accepted);
        fixture.with_cx(|cx| {
            crate::criteria::accept(cx, config, Box::new(move |_| flag.set(true)))
        });
        accepted.get()
    }

    fn registry(criteria: &[Rc<CountingCriterion>]) -> CriterionRegistry {
        let mut registry = CriterionRegistry::with_builtins();
        for criterion in criteria {
            registry.register(criterion.clone());
        }
        registry
    }

    fn combine(name: &str, children: &[&str]) -> CriterionConfig {
        children
            .iter()
            .fold(CriterionConfig::new(name), |config, child| {
                config.with_child(CriterionConfig::new(*child))
            })
    }

    #[test]
    fn test_and_short_circuits_on_rejection() {
        let first = CountingCriterion::new("first", false);
        let second = CountingCriterion::new("second", true);
        let mut fixture = Fixture::with_registry(registry(&[first.clone(), second.clone()]));

        assert!(!run(&mut fixture, &combine(And::NAME, &["first", "second"])));
        assert_eq!(first.calls.get(), 1);
        assert_eq!(second.calls.get(), 0);
    }

    #[test]
    fn test_and_accepts_when_all_accept() {
        let first = CountingCriterion::new("first", true);
        let second = CountingCriterion::new("second", true);
        let mut fixture = Fixture::with_registry(registry(&[first.clone(), second.clone()]));

        assert!(run(&mut fixture, &combine(And::NAME, &["first", "second"])));
        assert_eq!(second.calls.get(), 1);
    }

    #[test]
    fn test_or_short_circuits_on_acceptance() {
        let first = CountingCriterion::new("first", false);
        let second = CountingCriterion::new("second", true);
        let third = CountingCriterion::new("third", true);
        let mut fixture =
            Fixture::with_registry(registry(&[first.clone(), second.clone(), third.clone()]));

        assert!(run(&mut fixture, &combine(Or::NAME, &["first", "second", "third"])));
        assert_eq!(first.calls.get(), 1);
        assert_eq!(second.calls.get(), 1);
        assert_eq!(third.calls.get(), 0);
    }

    #[test]
    fn test_or_without_children_rejects() {
        let mut fixture = Fixture::new();
        assert!(!run(&mut fixture, &CriterionConfig::new(Or::NAME)));
        assert!(run(&mut fixture, &CriterionConfig::new(And::NAME)));
    }

    #[test]
    fn test_not_inverts_single_child() {
        let mut fixture = Fixture::new();
        assert!(!run(&mut fixture, &combine(Not::NAME, &["accept-all"])));
        assert!(run(
            &mut fixture,
            &CriterionConfig::new(Not::NAME).with_child(
                CriterionConfig::new("contains-data-flavor")
                    .with_attribute("flavors", serde_json::json!(["x"]))
            )
        ));
    }

    #[test]
    fn test_not_requires_exactly_one_child() {
        let mut fixture = Fixture::new();
        assert!(!run(&mut fixture, &CriterionConfig::new(Not::NAME)));
        assert!(!run(&mut fixture, &combine(Not::NAME, &["or", "or"])));
    }

    #[test]
    fn test_unknown_child_rejects() {
        let mut fixture = Fixture::new();
        assert!(!run(&mut fixture, &combine(Or::NAME, &["missing", "accept-all"])));
    }

    /// An `and` reads its child's flag before the server answers, so a
    /// server-checked child always counts as rejecting, and the later
    /// acceptance does not reach the caller.
    #[test]
    fn test_and_with_server_child_rejects_before_answer() {
        let remote = CountingCriterion::server("remote");
        let mut fixture = Fixture::with_registry(registry(&[remote.clone()]));
        fixture.set_target(fixture.other);

        let accepted = Rc::new(Cell::new(false));
        let flag = Rc::clone(&accepted);
        let config = combine(And::NAME, &["remote", "accept-all"]);
        fixture.with_cx(|cx| {
            crate::criteria::accept(cx, &config, Box::new(move |_| flag.set(true)))
        });
        assert!(!accepted.get());
        assert_eq!(fixture.sent(), 1);

        fixture.respond(&ServerResponse::new(1, true));
        assert!(!accepted.get());
    }
}
