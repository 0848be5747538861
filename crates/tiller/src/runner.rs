//! The application runner: configuration surface and pipeline driver.
//!
//! [`AppRunner`] owns the command definition, the settings, and everything
//! registered through [`configure`](AppRunner::configure) or the `use_*`
//! extensions. [`run`](AppRunner::run) creates a fresh context, assembles
//! the middleware units (built-ins plus third-party), and folds them in
//! stage order. The pipeline is the sole caller of the tokenizer, the
//! transformation pipeline, the tree build, the parser and the binder.
//!
//! User-input errors are captured here, enriched with suggestions, written
//! to the context console and converted to an exit code; they never
//! propagate as panics. Definition errors are fatal and reported
//! immediately.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tiller_tokens::{
    expand_clubbed_flags, split_option_assignments, tokenize, TokenCollection, TokenizeOptions,
    EXPAND_CLUBBED_FLAGS, SPLIT_OPTION_ASSIGNMENTS,
};

use crate::argument::{Argument, InputValue, ScalarKind, ValueSource};
use crate::command::ArgumentId;
use crate::binder::{bind, InvocationPipeline};
use crate::command::CommandTree;
use crate::context::{CancellationToken, CommandContext, Console};
use crate::definition::CommandDefinition;
use crate::directives;
use crate::error::{exit_code, ConfigurationError, ParseError, PipelineError};
use crate::pipeline::{
    sort_units, BuiltInUnit, MiddlewareStage, MiddlewareUnit, Outcome, UnitAction,
};
use crate::prompt::Prompter;
use crate::providers::{AppSettingsProvider, DefaultValueProvider, EnvVarProvider};
use crate::settings::AppSettings;
use crate::transform::{apply_transformations, TokenTransformation};
use crate::types::{TypeDescriptorRegistry, TypedValue};

/// Mutable registration surface handed to [`AppRunner::configure`]
/// closures.
pub struct AppConfig {
    pub(crate) middleware: Vec<MiddlewareUnit>,
    pub(crate) transformations: Vec<TokenTransformation>,
    pub(crate) providers: Vec<Rc<dyn DefaultValueProvider>>,
    pub(crate) type_registry: TypeDescriptorRegistry,
    pub(crate) prompter: Option<Rc<RefCell<dyn Prompter>>>,
    pub(crate) parse_directive: bool,
}

impl AppConfig {
    fn new() -> Self {
        Self {
            middleware: Vec::new(),
            transformations: built_in_transformations(),
            providers: Vec::new(),
            type_registry: TypeDescriptorRegistry::default(),
            prompter: None,
            parse_directive: false,
        }
    }

    /// Registers a third-party middleware unit at a stage and order key.
    /// The built-in unit of each stage sits at order 0; negative orders run
    /// before it, positive after.
    pub fn use_middleware<F>(
        &mut self,
        name: impl Into<String>,
        stage: MiddlewareStage,
        order: i32,
        unit: F,
    ) where
        F: Fn(&mut CommandContext) -> Result<Outcome, PipelineError> + 'static,
    {
        self.middleware.push(MiddlewareUnit {
            name: name.into(),
            stage,
            order,
            action: UnitAction::User(Rc::new(unit)),
        });
    }

    /// Registers a named token transformation. Steps run in ascending order
    /// key; the built-ins sit at orders 1 and 2.
    pub fn use_token_transformation<F>(&mut self, name: impl Into<String>, order: i32, step: F)
    where
        F: Fn(&CommandContext, &TokenCollection) -> Result<TokenCollection, PipelineError> + 'static,
    {
        self.transformations.push(TokenTransformation::new(name, order, step));
    }

    /// Replaces the conversion for one scalar kind.
    pub fn register_type_descriptor<F>(&mut self, kind: ScalarKind, convert: F)
    where
        F: Fn(&str) -> Result<TypedValue, String> + 'static,
    {
        self.type_registry.register(kind, convert);
    }

    /// Appends a default-value provider. Providers are consulted in
    /// registration order; attribute-scoped keys always win over
    /// naming-convention keys regardless of that order.
    pub fn add_default_value_provider<P>(&mut self, provider: P)
    where
        P: DefaultValueProvider + 'static,
    {
        self.providers.push(Rc::new(provider));
    }
}

/// The built-in transformation passes at their fixed relative orders.
pub(crate) fn built_in_transformations() -> Vec<TokenTransformation> {
    vec![
        TokenTransformation::new(EXPAND_CLUBBED_FLAGS, 1, |_ctx, tokens| {
            Ok(expand_clubbed_flags(tokens))
        }),
        TokenTransformation::new(SPLIT_OPTION_ASSIGNMENTS, 2, |_ctx, tokens| {
            Ok(split_option_assignments(tokens))
        }),
    ]
}

/// Configures and runs a command-line application.
///
/// # Example
///
/// ```rust
/// use tiller::{AppRunner, ArgumentDefinition, CommandDefinition};
///
/// let definition = CommandDefinition::new("calc").subcommand(
///     CommandDefinition::new("Add")
///         .operand(ArgumentDefinition::operand("x").integer())
///         .operand(ArgumentDefinition::operand("y").integer())
///         .action(|inv, ctx| {
///             let sum = inv.get_i64("x")? + inv.get_i64("y")?;
///             ctx.console.out_line(sum.to_string());
///             Ok(0)
///         }),
/// );
///
/// let runner = AppRunner::new(definition);
/// assert_eq!(runner.run(["Add", "1", "2"]), 0);
/// ```
pub struct AppRunner {
    definition: CommandDefinition,
    settings: AppSettings,
    config: AppConfig,
    console: Console,
    cancellation: CancellationToken,
    tree_cache: RefCell<Option<Rc<CommandTree>>>,
}

impl AppRunner {
    pub fn new(definition: CommandDefinition) -> Self {
        Self {
            definition,
            settings: AppSettings::default(),
            config: AppConfig::new(),
            console: Console::stdio(),
            cancellation: CancellationToken::new(),
            tree_cache: RefCell::new(None),
        }
    }

    pub fn settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replaces the output surface; tests pass an in-memory console.
    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Uses an external cancellation token, e.g. one tripped by a signal
    /// handler.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Opens the registration surface for middleware, token
    /// transformations, type descriptors and default-value providers.
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        configure(&mut self.config);
        self
    }

    /// Enables the `[parse]` / `[parse:t]` directive. Requires
    /// [`AppSettings::enable_directives`].
    pub fn use_parse_directive(mut self) -> Self {
        self.config.parse_directive = true;
        self
    }

    /// Serves attribute-scoped default keys from the given variables.
    pub fn use_defaults_from_env_var(mut self, vars: HashMap<String, String>) -> Self {
        self.config.providers.push(Rc::new(EnvVarProvider::from_map(vars)));
        self
    }

    /// Serves attribute-scoped default keys from a snapshot of the process
    /// environment.
    pub fn use_defaults_from_process_env(mut self) -> Self {
        self.config.providers.push(Rc::new(EnvVarProvider::from_process_env()));
        self
    }

    /// Serves default keys from a settings collection, optionally including
    /// naming-convention keys (`--long`, `-s`, operand names).
    pub fn use_defaults_from_app_settings(
        mut self,
        settings: HashMap<String, String>,
        include_naming_conventions: bool,
    ) -> Self {
        let mut provider = AppSettingsProvider::from_map(settings);
        if include_naming_conventions {
            provider = provider.with_naming_conventions();
        }
        self.config.providers.push(Rc::new(provider));
        self
    }

    /// Prompts for required arguments the user left empty.
    pub fn use_prompting<P>(mut self, prompter: P) -> Self
    where
        P: Prompter + 'static,
    {
        self.config.prompter = Some(Rc::new(RefCell::new(prompter)));
        self
    }

    /// Runs the pipeline for one argument vector (without the program
    /// name). Never panics on user input; returns the exit code.
    pub fn run<I, S>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();

        if self.config.parse_directive && !self.settings.enable_directives {
            let error = ConfigurationError::new(
                "directives are not enabled; set AppSettings.enable_directives to use [parse]",
            );
            self.console.err_line(error.to_string());
            return exit_code::CONFIG;
        }

        let mut ctx = CommandContext::new(args, self.settings.clone());
        ctx.console = self.console.clone();
        ctx.cancellation = self.cancellation.clone();

        let mut units = self.assemble_units();
        sort_units(&mut units);

        match self.drive(&units, &mut ctx) {
            Ok(code) => code,
            Err(error) => self.report_error(&ctx, &error),
        }
    }

    fn assemble_units(&self) -> Vec<MiddlewareUnit> {
        let mut units = vec![
            MiddlewareUnit::built_in("tokenize", MiddlewareStage::PreTransformTokens, BuiltInUnit::Tokenize),
            MiddlewareUnit::built_in("transform-tokens", MiddlewareStage::TransformTokens, BuiltInUnit::TransformTokens),
            MiddlewareUnit::built_in("build-command-tree", MiddlewareStage::Build, BuiltInUnit::Build),
            MiddlewareUnit::built_in("parse-input", MiddlewareStage::ParseInput, BuiltInUnit::ParseInput),
            MiddlewareUnit::built_in("bind-values", MiddlewareStage::BindValues, BuiltInUnit::BindValues),
            MiddlewareUnit::built_in("invoke", MiddlewareStage::Invoke, BuiltInUnit::Invoke),
        ];
        if self.config.parse_directive {
            units.push(MiddlewareUnit {
                name: "parse-directive".into(),
                stage: MiddlewareStage::PostParseInputPreBindValues,
                order: -100,
                action: UnitAction::BuiltIn(BuiltInUnit::ParseReport),
            });
        }
        if self.config.prompter.is_some() {
            units.push(MiddlewareUnit {
                name: "prompt-missing-arguments".into(),
                stage: MiddlewareStage::PostParseInputPreBindValues,
                order: 0,
                action: UnitAction::BuiltIn(BuiltInUnit::PromptValues),
            });
        }
        units.extend(self.config.middleware.iter().cloned());
        units
    }

    /// Folds the ordered unit list, stopping at the first short-circuit.
    fn drive(&self, units: &[MiddlewareUnit], ctx: &mut CommandContext) -> Result<i32, PipelineError> {
        for unit in units {
            if ctx.cancellation.is_cancelled() {
                return Ok(exit_code::CANCELLED);
            }
            let outcome = match &unit.action {
                UnitAction::User(f) => f(ctx)?,
                UnitAction::BuiltIn(built_in) => self.run_built_in(*built_in, ctx)?,
            };
            if let Outcome::ShortCircuit(code) = outcome {
                return Ok(code);
            }
        }
        Ok(exit_code::SUCCESS)
    }

    fn run_built_in(
        &self,
        unit: BuiltInUnit,
        ctx: &mut CommandContext,
    ) -> Result<Outcome, PipelineError> {
        match unit {
            BuiltInUnit::Tokenize => {
                let options = TokenizeOptions {
                    enable_directives: ctx.settings.enable_directives,
                    separator: ctx.settings.argument_separator.clone(),
                };
                ctx.tokens = Some(tokenize(&ctx.original_args, &options)?);
                Ok(Outcome::Continue)
            }
            BuiltInUnit::TransformTokens => {
                apply_transformations(&self.config.transformations, ctx)?;
                Ok(Outcome::Continue)
            }
            BuiltInUnit::Build => {
                let tree = {
                    let mut cache = self.tree_cache.borrow_mut();
                    match cache.as_ref() {
                        Some(tree) => tree.clone(),
                        None => {
                            let tree = Rc::new(CommandTree::build(&self.definition)?);
                            *cache = Some(tree.clone());
                            tree
                        }
                    }
                };
                ctx.tree = Some(tree);
                Ok(Outcome::Continue)
            }
            BuiltInUnit::ParseInput => {
                let tree = ctx.tree.clone().expect("Build stage has run");
                let tokens = ctx.tokens.clone().expect("tokenize stage has run");
                let result = crate::parser::parse(&tree, &tokens, &ctx.settings)?;
                ctx.invocations =
                    InvocationPipeline::from_chain(tree.invocation_chain(result.target_command()));
                ctx.parse_result = Some(result);
                Ok(Outcome::Continue)
            }
            BuiltInUnit::ParseReport => match directives::requested(ctx) {
                Some(flags) => {
                    let report = directives::render_parse_report(ctx, flags);
                    ctx.console.out_str(report);
                    Ok(Outcome::ShortCircuit(exit_code::SUCCESS))
                }
                None => Ok(Outcome::Continue),
            },
            BuiltInUnit::PromptValues => self.prompt_missing(ctx),
            BuiltInUnit::BindValues => {
                let tree = ctx.tree.clone().expect("Build stage has run");
                let mut invocations = std::mem::take(&mut ctx.invocations);
                let parse_result = ctx.parse_result.as_ref().expect("ParseInput stage has run");
                for step in invocations.steps_mut() {
                    step.invocation = Some(bind(
                        &tree,
                        parse_result,
                        &self.config.providers,
                        &self.config.type_registry,
                        step.command,
                    )?);
                }
                ctx.invocations = invocations;
                Ok(Outcome::Continue)
            }
            BuiltInUnit::Invoke => self.invoke(ctx),
        }
    }

    /// Runs the invocation chain: interceptors in order, the target last.
    fn invoke(&self, ctx: &mut CommandContext) -> Result<Outcome, PipelineError> {
        let tree = ctx.tree.clone().expect("Build stage has run");
        let invocations = std::mem::take(&mut ctx.invocations);

        let steps = invocations.steps();
        for (index, step) in steps.iter().enumerate() {
            if ctx.cancellation.is_cancelled() {
                ctx.invocations = invocations;
                return Ok(Outcome::ShortCircuit(exit_code::CANCELLED));
            }
            let invocation = step.invocation.as_ref().expect("BindValues stage has run");
            let node = tree.command(step.command);
            if index + 1 == steps.len() {
                let action = node.action().expect("parser validated the target as executable");
                let code = action(invocation, ctx).map_err(PipelineError::Unhandled)?;
                ctx.invocations = invocations;
                return Ok(Outcome::ShortCircuit(code));
            }
            let interceptor = node.interceptor().expect("chain steps carry interceptors");
            if let Outcome::ShortCircuit(code) =
                interceptor(invocation, ctx).map_err(PipelineError::Unhandled)?
            {
                ctx.invocations = invocations;
                return Ok(Outcome::ShortCircuit(code));
            }
        }

        ctx.invocations = invocations;
        Ok(Outcome::ShortCircuit(exit_code::SUCCESS))
    }

    fn prompt_missing(&self, ctx: &mut CommandContext) -> Result<Outcome, PipelineError> {
        let Some(prompter) = self.config.prompter.clone() else {
            return Ok(Outcome::Continue);
        };
        if !prompter.borrow().is_available() {
            return Ok(Outcome::Continue);
        }

        let tree = ctx.tree.clone().expect("Build stage has run");
        let target = ctx.parse_result().target_command();

        let mut in_scope: Vec<ArgumentId> = tree.command(target).operands().to_vec();
        in_scope.extend(tree.options_in_scope(target));

        for id in in_scope {
            if ctx.cancellation.is_cancelled() {
                return Ok(Outcome::ShortCircuit(exit_code::CANCELLED));
            }
            let argument = tree.argument(id);
            if !argument.arity.requires_at_least_one()
                || ctx.parse_result().has_values(id)
                || self.has_default(argument)
            {
                continue;
            }

            let mut values = Vec::new();
            if argument.arity.allows_many() {
                loop {
                    if ctx.cancellation.is_cancelled() {
                        return Ok(Outcome::ShortCircuit(exit_code::CANCELLED));
                    }
                    let text = format!("{} [{}]: ", argument.display_name(), values.len() + 1);
                    match self.ask(&prompter, &text)? {
                        None => return Ok(Outcome::ShortCircuit(exit_code::CANCELLED)),
                        Some(answer) if answer.is_empty() => break,
                        Some(answer) => values.push(answer),
                    }
                }
            } else {
                let text = format!("{}: ", argument.display_name());
                match self.ask(&prompter, &text)? {
                    None => return Ok(Outcome::ShortCircuit(exit_code::CANCELLED)),
                    Some(answer) if answer.is_empty() => {}
                    Some(answer) => values.push(answer),
                }
            }

            if !values.is_empty() {
                ctx.parse_result
                    .as_mut()
                    .expect("ParseInput stage has run")
                    .append_input(id, InputValue::new(ValueSource::Prompt, values));
            }
        }
        Ok(Outcome::Continue)
    }

    fn ask(
        &self,
        prompter: &Rc<RefCell<dyn Prompter>>,
        text: &str,
    ) -> Result<Option<String>, PipelineError> {
        prompter
            .borrow_mut()
            .prompt(text)
            .map_err(|e| PipelineError::Unhandled(e.into()))
    }

    /// Whether the binder would find a value for this argument without any
    /// user input.
    fn has_default(&self, argument: &Argument) -> bool {
        if argument.default.is_some() {
            return true;
        }
        if let Some(key) = &argument.default_key {
            if self.config.providers.iter().any(|p| p.lookup(key).is_some()) {
                return true;
            }
        }
        self.config.providers.iter().any(|provider| {
            provider.includes_naming_conventions()
                && argument
                    .convention_keys()
                    .iter()
                    .any(|key| provider.lookup(key).is_some())
        })
    }

    /// Reports a captured failure and maps it to an exit code.
    fn report_error(&self, ctx: &CommandContext, error: &PipelineError) -> i32 {
        if self.config.parse_directive {
            if let Some(flags) = directives::requested(ctx) {
                if flags.transformations && !ctx.transform_log.is_empty() {
                    ctx.console.out_str(directives::render_transform_trace(&ctx.transform_log));
                }
            }
        }

        let message = error.to_string();
        if ctx.console.is_styled() {
            ctx.console.err_line(console::style(&message).red().to_string());
        } else {
            ctx.console.err_line(&message);
        }

        let suggestions = error.suggestions();
        if !suggestions.is_empty() {
            let header = match error {
                PipelineError::Parse(ParseError::MissingSubcommand { .. }) => "Available subcommands:",
                _ => "Did you mean:",
            };
            ctx.console.err_line("");
            ctx.console.err_line(header);
            for suggestion in suggestions {
                ctx.console.err_line(format!("   {suggestion}"));
            }
        }

        error.exit_code()
    }
}

impl std::fmt::Debug for AppRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRunner")
            .field("definition", &self.definition)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
