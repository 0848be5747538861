//! The declarative command definition.
//!
//! A [`CommandDefinition`] is the abstract tree the framework consumes: it
//! says what exists (commands, operands, options, defaults) without saying
//! how tokens are matched. Build one with the fluent API here, or
//! deserialize the structure from a declarative table and attach actions
//! afterwards; [`CommandTree::build`](crate::CommandTree::build) turns it
//! into the runtime tree and validates it.
//!
//! # Example
//!
//! ```rust
//! use tiller::{ArgumentDefinition, CommandDefinition};
//!
//! let definition = CommandDefinition::new("calc")
//!     .describe("Toy calculator")
//!     .subcommand(
//!         CommandDefinition::new("Add")
//!             .operand(ArgumentDefinition::operand("x").integer())
//!             .operand(ArgumentDefinition::operand("y").integer())
//!             .action(|inv, ctx| {
//!                 let sum = inv.get_i64("x")? + inv.get_i64("y")?;
//!                 ctx.console.out_line(sum.to_string());
//!                 Ok(0)
//!             }),
//!     );
//! assert_eq!(definition.children()[0].name(), "Add");
//! ```

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::argument::{ArgumentKind, BooleanMode, ScalarKind, Shape};
use crate::binder::Invocation;
use crate::context::CommandContext;
use crate::pipeline::Outcome;
use crate::settings::SeparatorStrategy;

/// Action bound to an executable command. Returns the exit code.
pub type CommandAction = Rc<dyn Fn(&Invocation, &mut CommandContext) -> anyhow::Result<i32>>;

/// Action bound to an interceptor command, run before its descendants.
/// Returning [`Outcome::ShortCircuit`] stops the invocation chain.
pub type InterceptorAction = Rc<dyn Fn(&Invocation, &mut CommandContext) -> anyhow::Result<Outcome>>;

/// Declaration of a single operand or option.
#[derive(Clone, Serialize, Deserialize)]
pub struct ArgumentDefinition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    kind: ArgumentKind,
    #[serde(default = "default_scalar")]
    scalar: ScalarKind,
    #[serde(default = "default_shape")]
    shape: Shape,
    #[serde(default)]
    boolean_mode: Option<BooleanMode>,
    #[serde(default)]
    short: Option<char>,
    #[serde(default)]
    long: Option<String>,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    default_key: Option<String>,
    #[serde(default)]
    allowed_values: Vec<String>,
    #[serde(default)]
    required: bool,
}

fn default_scalar() -> ScalarKind {
    ScalarKind::Text
}

fn default_shape() -> Shape {
    Shape::Scalar
}

impl ArgumentDefinition {
    /// Declares a positional argument. Text scalar unless re-typed.
    pub fn operand(name: impl Into<String>) -> Self {
        Self::new(name, ArgumentKind::Operand)
    }

    /// Declares a named argument. Its long name defaults to the argument
    /// name.
    pub fn option(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut def = Self::new(name.clone(), ArgumentKind::Option);
        def.long = Some(name);
        def
    }

    fn new(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            scalar: ScalarKind::Text,
            shape: Shape::Scalar,
            boolean_mode: None,
            short: None,
            long: None,
            default: None,
            default_key: None,
            allowed_values: Vec::new(),
            required: false,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn text(mut self) -> Self {
        self.scalar = ScalarKind::Text;
        self
    }

    pub fn integer(mut self) -> Self {
        self.scalar = ScalarKind::Integer;
        self
    }

    pub fn float(mut self) -> Self {
        self.scalar = ScalarKind::Float;
        self
    }

    /// An implicit boolean option: presence means true, no value token is
    /// ever consumed.
    pub fn flag(mut self) -> Self {
        self.scalar = ScalarKind::Boolean;
        self.shape = Shape::Flag;
        self.boolean_mode = Some(BooleanMode::Implicit);
        self
    }

    /// A boolean that requires a literal `true`/`false` value token.
    pub fn explicit_boolean(mut self) -> Self {
        self.scalar = ScalarKind::Boolean;
        self.shape = Shape::Scalar;
        self.boolean_mode = Some(BooleanMode::Explicit);
        self
    }

    /// Zero-or-one value.
    pub fn optional(mut self) -> Self {
        self.shape = Shape::Optional;
        self
    }

    /// Zero-or-more values. Combine with [`required`](Self::required) for
    /// one-or-more.
    pub fn collection(mut self) -> Self {
        self.shape = Shape::Collection;
        self
    }

    /// For collections: require at least one value.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Declared default, as the raw string the converter will receive.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attribute-scoped key into the registered default-value providers.
    pub fn default_key(mut self, key: impl Into<String>) -> Self {
        self.default_key = Some(key.into());
        self
    }

    /// Closed set of permitted raw values.
    pub fn allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }

    pub(crate) fn description_ref(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub(crate) fn scalar_kind(&self) -> ScalarKind {
        self.scalar
    }

    pub(crate) fn shape_ref(&self) -> Shape {
        self.shape
    }

    pub(crate) fn boolean_mode_ref(&self) -> Option<BooleanMode> {
        self.boolean_mode
    }

    pub(crate) fn short_ref(&self) -> Option<char> {
        self.short
    }

    pub(crate) fn long_ref(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub(crate) fn default_ref(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub(crate) fn default_key_ref(&self) -> Option<&str> {
        self.default_key.as_deref()
    }

    pub(crate) fn allowed_values_ref(&self) -> &[String] {
        &self.allowed_values
    }

    pub(crate) fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Debug for ArgumentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentDefinition")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("scalar", &self.scalar)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// A node in the declarative command tree.
#[derive(Clone, Serialize, Deserialize)]
pub struct CommandDefinition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    arguments: Vec<ArgumentDefinition>,
    #[serde(default)]
    children: Vec<CommandDefinition>,
    #[serde(default)]
    separator_strategy: Option<SeparatorStrategy>,
    #[serde(skip)]
    action: Option<CommandAction>,
    #[serde(skip)]
    interceptor: Option<InterceptorAction>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            children: Vec::new(),
            separator_strategy: None,
            action: None,
            interceptor: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn operand(self, argument: ArgumentDefinition) -> Self {
        self.argument(argument)
    }

    pub fn option(self, argument: ArgumentDefinition) -> Self {
        self.argument(argument)
    }

    /// Appends an argument declaration in order.
    pub fn argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn subcommand(mut self, child: CommandDefinition) -> Self {
        self.children.push(child);
        self
    }

    /// Overrides the app-wide separator strategy for this command.
    pub fn separator_strategy(mut self, strategy: SeparatorStrategy) -> Self {
        self.separator_strategy = Some(strategy);
        self
    }

    /// Binds the command's action, marking it executable.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Invocation, &mut CommandContext) -> anyhow::Result<i32> + 'static,
    {
        self.action = Some(Rc::new(action));
        self
    }

    /// Binds an interceptor run before any descendant's action. The
    /// interceptor's own options apply to all descendants.
    pub fn interceptor<F>(mut self, interceptor: F) -> Self
    where
        F: Fn(&Invocation, &mut CommandContext) -> anyhow::Result<Outcome> + 'static,
    {
        self.interceptor = Some(Rc::new(interceptor));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn arguments(&self) -> &[ArgumentDefinition] {
        &self.arguments
    }

    pub fn children(&self) -> &[CommandDefinition] {
        &self.children
    }

    pub fn is_executable(&self) -> bool {
        self.action.is_some()
    }

    pub(crate) fn separator_strategy_ref(&self) -> Option<SeparatorStrategy> {
        self.separator_strategy
    }

    pub(crate) fn action_ref(&self) -> Option<&CommandAction> {
        self.action.as_ref()
    }

    pub(crate) fn interceptor_ref(&self) -> Option<&InterceptorAction> {
        self.interceptor.as_ref()
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("arguments", &self.arguments.len())
            .field("children", &self.children)
            .field("executable", &self.action.is_some())
            .finish()
    }
}
