//! The resolved command tree.
//!
//! Built once per configuration from a [`CommandDefinition`] and treated as
//! read-only afterwards, so it can be cached across sequential runs. Nodes
//! live in an arena addressed by [`CommandId`]; each node owns its children
//! and its own arguments and holds a non-owning parent handle used only for
//! walking inherited options upward.

use std::collections::HashSet;

use crate::argument::{Argument, ArgumentKind, Arity, BooleanMode, ScalarKind, Shape};
use crate::definition::{ArgumentDefinition, CommandAction, CommandDefinition, InterceptorAction};
use crate::error::ConfigurationError;
use crate::settings::{AppSettings, SeparatorStrategy};

/// Stable handle to a command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(usize);

/// Stable handle to an argument. Ids are assigned in declaration order
/// across the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArgumentId(usize);

/// A resolved command node.
pub struct Command {
    name: String,
    description: Option<String>,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
    operands: Vec<ArgumentId>,
    options: Vec<ArgumentId>,
    separator_strategy: Option<SeparatorStrategy>,
    action: Option<CommandAction>,
    interceptor: Option<InterceptorAction>,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parent(&self) -> Option<CommandId> {
        self.parent
    }

    pub fn children(&self) -> &[CommandId] {
        &self.children
    }

    pub fn operands(&self) -> &[ArgumentId] {
        &self.operands
    }

    pub fn options(&self) -> &[ArgumentId] {
        &self.options
    }

    /// True when the node has a bound action, as opposed to a pure grouping
    /// or interceptor node.
    pub fn is_executable(&self) -> bool {
        self.action.is_some()
    }

    pub fn has_interceptor(&self) -> bool {
        self.interceptor.is_some()
    }

    pub(crate) fn action(&self) -> Option<&CommandAction> {
        self.action.as_ref()
    }

    pub(crate) fn interceptor(&self) -> Option<&InterceptorAction> {
        self.interceptor.as_ref()
    }
}

/// Arena of command nodes plus all declared arguments.
pub struct CommandTree {
    commands: Vec<Command>,
    arguments: Vec<Argument>,
}

impl CommandTree {
    /// Builds and validates the tree. Declaration errors are fatal here and
    /// never reach the parser.
    pub fn build(definition: &CommandDefinition) -> Result<CommandTree, ConfigurationError> {
        let mut tree = CommandTree {
            commands: Vec::new(),
            arguments: Vec::new(),
        };
        tree.add_command(definition, None)?;
        Ok(tree)
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    pub fn command(&self, id: CommandId) -> &Command {
        &self.commands[id.0]
    }

    pub fn argument(&self, id: ArgumentId) -> &Argument {
        &self.arguments[id.0]
    }

    /// Command names from the root to `id`, inclusive.
    pub fn path(&self, id: CommandId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            segments.push(self.command(c).name());
            current = self.command(c).parent();
        }
        segments.reverse();
        segments
    }

    pub fn find_child(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.command(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.command(c).name == name)
    }

    /// The command's own options plus the ones inherited from ancestors,
    /// nearest declaration first.
    pub fn options_in_scope(&self, id: CommandId) -> Vec<ArgumentId> {
        let mut options = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            options.extend(self.command(c).options.iter().copied());
            current = self.command(c).parent();
        }
        options
    }

    /// Ancestors of `id` that declare an interceptor, root-most first, plus
    /// the target itself: the invocation chain.
    pub fn invocation_chain(&self, id: CommandId) -> Vec<CommandId> {
        let mut chain = Vec::new();
        let mut current = self.command(id).parent();
        while let Some(c) = current {
            if self.command(c).has_interceptor() {
                chain.push(c);
            }
            current = self.command(c).parent();
        }
        chain.reverse();
        chain.push(id);
        chain
    }

    /// Per-command attribute wins over the app-wide default.
    pub fn effective_separator_strategy(&self, id: CommandId, settings: &AppSettings) -> SeparatorStrategy {
        self.command(id)
            .separator_strategy
            .unwrap_or(settings.default_separator_strategy)
    }

    fn add_command(
        &mut self,
        definition: &CommandDefinition,
        parent: Option<CommandId>,
    ) -> Result<CommandId, ConfigurationError> {
        let id = CommandId(self.commands.len());
        self.commands.push(Command {
            name: definition.name().to_string(),
            description: definition.description().map(str::to_string),
            parent,
            children: Vec::new(),
            operands: Vec::new(),
            options: Vec::new(),
            separator_strategy: definition.separator_strategy_ref(),
            action: definition.action_ref().cloned(),
            interceptor: definition.interceptor_ref().cloned(),
        });

        self.add_arguments(id, definition)?;

        if definition.children().is_empty() && !definition.is_executable() {
            return Err(ConfigurationError::new(format!(
                "command '{}' has no action and no subcommands",
                definition.name()
            )));
        }

        let mut seen = HashSet::new();
        for child in definition.children() {
            if !seen.insert(child.name()) {
                return Err(ConfigurationError::new(format!(
                    "duplicate subcommand '{}' under '{}'",
                    child.name(),
                    definition.name()
                )));
            }
            let child_id = self.add_command(child, Some(id))?;
            self.commands[id.0].children.push(child_id);
        }
        Ok(id)
    }

    fn add_arguments(
        &mut self,
        id: CommandId,
        definition: &CommandDefinition,
    ) -> Result<(), ConfigurationError> {
        let mut names = HashSet::new();
        for def in definition.arguments() {
            if !names.insert(def.name().to_string()) {
                return Err(ConfigurationError::new(format!(
                    "duplicate argument '{}' on command '{}'",
                    def.name(),
                    definition.name()
                )));
            }
            let argument = self.resolve_argument(def, definition.name())?;
            let argument_id = ArgumentId(self.arguments.len());
            match argument.kind {
                ArgumentKind::Operand => {
                    if let Some(&last) = self.commands[id.0].operands.last() {
                        if self.arguments[last.0].arity.maximum.is_none() {
                            return Err(ConfigurationError::new(format!(
                                "operand '{}' on '{}' follows an unbounded collection operand",
                                argument.name,
                                definition.name()
                            )));
                        }
                    }
                    self.commands[id.0].operands.push(argument_id);
                }
                ArgumentKind::Option => {
                    self.check_option_collision(id, &argument, definition.name())?;
                    self.commands[id.0].options.push(argument_id);
                }
            }
            self.arguments.push(argument);
        }
        Ok(())
    }

    fn resolve_argument(
        &self,
        def: &ArgumentDefinition,
        command_name: &str,
    ) -> Result<Argument, ConfigurationError> {
        if def.boolean_mode_ref().is_some() && def.scalar_kind() != ScalarKind::Boolean {
            return Err(ConfigurationError::new(format!(
                "argument '{}' on '{}' declares a boolean mode but is not boolean",
                def.name(),
                command_name
            )));
        }
        if def.kind() == ArgumentKind::Operand
            && (def.shape_ref() == Shape::Flag || def.boolean_mode_ref() == Some(BooleanMode::Implicit))
        {
            return Err(ConfigurationError::new(format!(
                "operand '{}' on '{}' cannot be an implicit boolean flag; flags must be options",
                def.name(),
                command_name
            )));
        }
        if def.shape_ref() == Shape::Collection && def.boolean_mode_ref() == Some(BooleanMode::Implicit) {
            return Err(ConfigurationError::new(format!(
                "option '{}' on '{}' cannot be both a collection and an implicit boolean",
                def.name(),
                command_name
            )));
        }
        if let Some(default) = def.default_ref() {
            check_default_literal(def.scalar_kind(), default).map_err(|reason| {
                ConfigurationError::new(format!(
                    "default value '{}' for '{}' on '{}' is invalid: {}",
                    default,
                    def.name(),
                    command_name,
                    reason
                ))
            })?;
        }

        let arity = Arity::derive(def.shape_ref(), def.boolean_mode_ref(), def.is_required());
        Ok(Argument {
            name: def.name().to_string(),
            description: def.description_ref().map(str::to_string),
            kind: def.kind(),
            scalar: def.scalar_kind(),
            shape: def.shape_ref(),
            boolean_mode: def.boolean_mode_ref(),
            short: def.short_ref(),
            long: def.long_ref().map(str::to_string),
            arity,
            default: def.default_ref().map(str::to_string),
            default_key: def.default_key_ref().map(str::to_string),
            allowed_values: def.allowed_values_ref().to_vec(),
        })
    }

    fn check_option_collision(
        &self,
        id: CommandId,
        argument: &Argument,
        command_name: &str,
    ) -> Result<(), ConfigurationError> {
        for existing_id in self.options_in_scope(id) {
            let existing = &self.arguments[existing_id.0];
            let long_clash = argument.long.is_some() && argument.long == existing.long;
            let short_clash = argument.short.is_some() && argument.short == existing.short;
            if long_clash || short_clash {
                return Err(ConfigurationError::new(format!(
                    "option '{}' on '{}' collides with option '{}' already in scope",
                    argument.name, command_name, existing.name
                )));
            }
        }
        Ok(())
    }
}

fn check_default_literal(kind: ScalarKind, raw: &str) -> Result<(), String> {
    match kind {
        ScalarKind::Text => Ok(()),
        ScalarKind::Integer => raw
            .split(',')
            .try_for_each(|part| part.trim().parse::<i64>().map(|_| ()))
            .map_err(|_| "expected an integer".to_string()),
        ScalarKind::Float => raw
            .split(',')
            .try_for_each(|part| part.trim().parse::<f64>().map(|_| ()))
            .map_err(|_| "expected a number".to_string()),
        ScalarKind::Boolean => match raw.to_ascii_lowercase().as_str() {
            "true" | "false" => Ok(()),
            _ => Err("expected 'true' or 'false'".to_string()),
        },
    }
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTree")
            .field("commands", &self.commands.len())
            .field("arguments", &self.arguments.len())
            .finish()
    }
}
