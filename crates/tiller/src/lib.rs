//! Declarative command-line front-end framework.
//!
//! tiller turns a declarative tree of commands and typed arguments plus a
//! raw argument vector into a validated, strongly-typed invocation, and
//! dispatches it through an extensible middleware pipeline:
//!
//! ```text
//! raw args → tokenizer → token transformations → parser → binder → invoke
//! ```
//!
//! Each step is a built-in middleware unit in a fixed stage sequence
//! ([`MiddlewareStage`]); third-party units register at any stage and order
//! without touching the core. The token stream keeps its full
//! transformation history, so the `[parse:t]` directive can replay exactly
//! how the input was rewritten.
//!
//! # Quick Start
//!
//! ```rust
//! use tiller::{AppRunner, ArgumentDefinition, CommandDefinition};
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
//!
//! let exit = AppRunner::new(definition).run(["Add", "1", "2"]);
//! assert_eq!(exit, 0);
//! ```
//!
//! # Crate layout
//!
//! - [`tiller_tokens`] (re-exported as [`tokens`]) owns the lexical layer;
//! - [`tiller_suggest`] provides the did-you-mean ranking used on
//!   unrecognized names;
//! - this crate owns the command tree, parser, binder, middleware pipeline
//!   and the [`AppRunner`] surface.

mod argument;
mod binder;
mod command;
mod context;
mod definition;
mod directives;
mod error;
mod parser;
mod pipeline;
mod prompt;
mod providers;
mod runner;
mod settings;
mod transform;
mod types;

pub use argument::{
    Argument, ArgumentKind, Arity, BooleanMode, InputValue, ScalarKind, Shape, ValueSource,
};
pub use binder::{BoundValue, Invocation, InvocationPipeline, InvocationStep};
pub use command::{ArgumentId, Command, CommandId, CommandTree};
pub use context::{CancellationToken, CommandContext, Console, ConsoleCapture, Services};
pub use definition::{ArgumentDefinition, CommandAction, CommandDefinition, InterceptorAction};
pub use directives::render_transform_trace;
pub use error::{
    exit_code, BindError, ConfigurationError, ParseError, PipelineError, TokenizeError,
};
pub use parser::ParseResult;
pub use pipeline::{MiddlewareFn, MiddlewareStage, Outcome};
pub use prompt::{PromptError, Prompter, QueuedPrompter, StdPrompter};
pub use providers::{AppSettingsProvider, DefaultValueProvider, EnvVarProvider};
pub use runner::{AppConfig, AppRunner};
pub use settings::{AppSettings, SeparatorStrategy};
pub use transform::{TokenTransformation, TransformFn, TransformLog, TransformStep};
pub use types::{ConvertFn, TypeDescriptorRegistry, TypedValue};

/// The lexical layer, re-exported for convenience.
pub use tiller_tokens as tokens;

pub use tiller_suggest::suggest;
