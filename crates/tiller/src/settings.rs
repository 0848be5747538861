//! Application-wide settings.

use serde::{Deserialize, Serialize};

use tiller_tokens::DEFAULT_SEPARATOR;

/// Policy for tokens following the argument separator (`--` by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeparatorStrategy {
    /// Tokens after the separator are retained verbatim as separated
    /// arguments and never matched against options or operands.
    PassThru,
    /// Tokens after the separator are bound to operands (no option matching)
    /// and also recorded as separated arguments for introspection.
    EndOfOptions,
}

/// App-wide configuration consulted by the tokenizer, parser and binder.
///
/// A command can override the separator strategy for itself via
/// [`CommandDefinition::separator_strategy`](crate::CommandDefinition::separator_strategy);
/// everything else applies uniformly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Strategy applied when a command declares none of its own.
    pub default_separator_strategy: SeparatorStrategy,
    /// Collect unexpected operands (and unknown options) into
    /// `remaining_operands` instead of failing the parse.
    pub ignore_unexpected_operands: bool,
    /// Honor leading `[name]` directive tokens. Off by default so bracketed
    /// values never surprise an app that did not ask for directives.
    pub enable_directives: bool,
    /// The separator marker text.
    pub argument_separator: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_separator_strategy: SeparatorStrategy::EndOfOptions,
            ignore_unexpected_operands: false,
            enable_directives: false,
            argument_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}
