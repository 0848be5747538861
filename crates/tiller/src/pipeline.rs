//! The middleware execution pipeline model.
//!
//! Execution walks a fixed sequence of stages; each stage holds zero or
//! more units run in ascending order key. A unit does its work against the
//! context and returns [`Outcome::Continue`] or short-circuits the rest of
//! the pipeline with a specific exit code (help display, validation
//! failure, cancellation). The driver folds the ordered list and stops at
//! the first short-circuit.
//!
//! The built-in units (tokenize, transform, build, parse, bind, invoke)
//! are registered at order 0 of their stages; third-party units intersperse
//! freely around them.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::context::CommandContext;
use crate::error::PipelineError;

/// The fixed stage sequence. Each stage exits with a documented guarantee
/// later units may rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MiddlewareStage {
    /// First-pass tokenization has run: `tokens` holds the classified raw
    /// arguments, untransformed.
    PreTransformTokens,
    /// All token transformations have been applied and recorded in the
    /// transformation log.
    TransformTokens,
    PostTransformTokensPreBuild,
    /// The command tree is built and validated.
    Build,
    PostBuildPreParseInput,
    /// The parse result is populated: target command resolved, argument
    /// values collected, invocation chain structured.
    ParseInput,
    PostParseInputPreBindValues,
    /// Every invocation step carries its bound, typed values.
    BindValues,
    PostBindValuesPreInvoke,
    /// Interceptors and the target action run. Final stage.
    Invoke,
}

impl MiddlewareStage {
    pub const ALL: [MiddlewareStage; 10] = [
        MiddlewareStage::PreTransformTokens,
        MiddlewareStage::TransformTokens,
        MiddlewareStage::PostTransformTokensPreBuild,
        MiddlewareStage::Build,
        MiddlewareStage::PostBuildPreParseInput,
        MiddlewareStage::ParseInput,
        MiddlewareStage::PostParseInputPreBindValues,
        MiddlewareStage::BindValues,
        MiddlewareStage::PostBindValuesPreInvoke,
        MiddlewareStage::Invoke,
    ];
}

impl fmt::Display for MiddlewareStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// What a middleware unit decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Proceed to the next unit.
    Continue,
    /// Stop the pipeline and exit with this code.
    ShortCircuit(i32),
}

/// A third-party middleware unit.
pub type MiddlewareFn = Rc<dyn Fn(&mut CommandContext) -> Result<Outcome, PipelineError>>;

/// The framework-provided units, dispatched by the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BuiltInUnit {
    Tokenize,
    TransformTokens,
    Build,
    ParseInput,
    ParseReport,
    PromptValues,
    BindValues,
    Invoke,
}

#[derive(Clone)]
pub(crate) enum UnitAction {
    BuiltIn(BuiltInUnit),
    User(MiddlewareFn),
}

/// One registered unit: a name for diagnostics, its stage, and its order
/// key within the stage.
#[derive(Clone)]
pub(crate) struct MiddlewareUnit {
    pub name: String,
    pub stage: MiddlewareStage,
    pub order: i32,
    pub action: UnitAction,
}

impl MiddlewareUnit {
    pub(crate) fn built_in(name: &str, stage: MiddlewareStage, unit: BuiltInUnit) -> Self {
        Self {
            name: name.to_string(),
            stage,
            order: 0,
            action: UnitAction::BuiltIn(unit),
        }
    }
}

impl fmt::Debug for MiddlewareUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareUnit")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("order", &self.order)
            .finish()
    }
}

/// Stable order: stage sequence first, then order key; registration order
/// breaks ties.
pub(crate) fn sort_units(units: &mut [MiddlewareUnit]) {
    units.sort_by_key(|u| (u.stage, u.order));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_as_declared() {
        let mut previous = None;
        for stage in MiddlewareStage::ALL {
            if let Some(p) = previous {
                assert!(p < stage);
            }
            previous = Some(stage);
        }
        assert!(MiddlewareStage::PreTransformTokens < MiddlewareStage::Invoke);
        assert!(MiddlewareStage::ParseInput < MiddlewareStage::BindValues);
    }

    #[test]
    fn sort_is_stable_within_equal_keys() {
        let mut units = vec![
            MiddlewareUnit {
                name: "b".into(),
                stage: MiddlewareStage::ParseInput,
                order: 0,
                action: UnitAction::BuiltIn(BuiltInUnit::ParseInput),
            },
            MiddlewareUnit {
                name: "a".into(),
                stage: MiddlewareStage::PreTransformTokens,
                order: 5,
                action: UnitAction::BuiltIn(BuiltInUnit::Tokenize),
            },
            MiddlewareUnit {
                name: "a2".into(),
                stage: MiddlewareStage::PreTransformTokens,
                order: 5,
                action: UnitAction::BuiltIn(BuiltInUnit::Tokenize),
            },
            MiddlewareUnit {
                name: "a0".into(),
                stage: MiddlewareStage::PreTransformTokens,
                order: -10,
                action: UnitAction::BuiltIn(BuiltInUnit::Tokenize),
            },
        ];
        sort_units(&mut units);
        let names: Vec<_> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["a0", "a", "a2", "b"]);
    }
}
