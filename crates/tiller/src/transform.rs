//! Named, ordered token transformations with full history.
//!
//! Transformations rewrite the token collection between tokenization and
//! parsing. Each is a pure function over the whole collection; steps run in
//! ascending order key and never observe a partial result of a later step.
//! The state before and after every step is retained for the parse trace.

use std::rc::Rc;

use tiller_tokens::TokenCollection;

use crate::context::CommandContext;
use crate::error::PipelineError;

/// A transformation step: `(context, tokens) -> tokens'`.
pub type TransformFn =
    Rc<dyn Fn(&CommandContext, &TokenCollection) -> Result<TokenCollection, PipelineError>>;

/// A registered rewrite pass.
#[derive(Clone)]
pub struct TokenTransformation {
    pub name: String,
    pub order: i32,
    pub(crate) func: TransformFn,
}

impl TokenTransformation {
    pub fn new<F>(name: impl Into<String>, order: i32, func: F) -> Self
    where
        F: Fn(&CommandContext, &TokenCollection) -> Result<TokenCollection, PipelineError> + 'static,
    {
        Self {
            name: name.into(),
            order,
            func: Rc::new(func),
        }
    }
}

impl std::fmt::Debug for TokenTransformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTransformation")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish()
    }
}

/// One applied step in the history.
#[derive(Debug, Clone)]
pub struct TransformStep {
    pub name: String,
    /// The collection after this step.
    pub tokens: TokenCollection,
    /// False when the step returned the collection unchanged.
    pub changed: bool,
}

/// Before/after history of the transformation pipeline, retained for the
/// parse trace.
#[derive(Debug, Clone, Default)]
pub struct TransformLog {
    initial: Option<TokenCollection>,
    steps: Vec<TransformStep>,
}

impl TransformLog {
    /// The collection as it came from the shell, before any step.
    pub fn initial(&self) -> Option<&TokenCollection> {
        self.initial.as_ref()
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.initial.is_none()
    }

    pub(crate) fn record_initial(&mut self, tokens: TokenCollection) {
        self.initial = Some(tokens);
    }

    pub(crate) fn record_step(&mut self, name: &str, tokens: TokenCollection, changed: bool) {
        self.steps.push(TransformStep {
            name: name.to_string(),
            tokens,
            changed,
        });
    }
}

/// Applies every registered transformation in ascending order, recording
/// the history on the context. The context's tokens are replaced with the
/// final collection.
pub(crate) fn apply_transformations(
    transformations: &[TokenTransformation],
    ctx: &mut CommandContext,
) -> Result<(), PipelineError> {
    let mut ordered: Vec<&TokenTransformation> = transformations.iter().collect();
    ordered.sort_by_key(|t| t.order);

    let mut tokens = ctx.tokens.clone().unwrap_or_default();
    ctx.transform_log.record_initial(tokens.clone());

    for transformation in ordered {
        let result = (transformation.func)(ctx, &tokens)?;
        let changed = result != tokens;
        ctx.transform_log.record_step(&transformation.name, result.clone(), changed);
        tokens = result;
    }

    ctx.tokens = Some(tokens);
    Ok(())
}
