//! The error taxonomy.
//!
//! Two families with very different lifecycles:
//!
//! - [`ConfigurationError`] marks a malformed command definition. It is
//!   fatal at startup and intentionally not recoverable: it indicates a
//!   programming error, not bad user input.
//! - [`ParseError`] and [`BindError`] are user-input errors. The pipeline
//!   captures them, enriches unrecognized names with suggestions, reports
//!   them on the error stream and converts them to a non-zero exit code.

use thiserror::Error;

pub use tiller_tokens::TokenizeError;

/// Process exit codes, one per failure kind.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    /// Tokenize or parse failure.
    pub const PARSE: i32 = 1;
    /// Binding or validation failure.
    pub const VALIDATION: i32 = 2;
    /// A command action returned an error.
    pub const UNHANDLED: i32 = 3;
    /// The cancellation signal was observed.
    pub const CANCELLED: i32 = 4;
    /// Malformed command definition.
    pub const CONFIG: i32 = 5;
}

/// A malformed command definition, detected at command-tree build time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid command definition: {message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure while matching tokens against the command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized option '{token}'")]
    UnrecognizedOption {
        token: String,
        suggestions: Vec<String>,
    },

    #[error("Unrecognized command '{token}'")]
    UnrecognizedCommand {
        token: String,
        suggestions: Vec<String>,
    },

    #[error("Unexpected operand(s): {}", operands.join(" "))]
    UnexpectedOperands { operands: Vec<String> },

    #[error("Missing value for option '{option}'")]
    MissingOptionValue { option: String },

    #[error("'{command}' requires a subcommand")]
    MissingSubcommand {
        command: String,
        available: Vec<String>,
    },
}

impl ParseError {
    /// Did-you-mean candidates attached to unrecognized-name errors.
    pub fn suggestions(&self) -> &[String] {
        match self {
            ParseError::UnrecognizedOption { suggestions, .. }
            | ParseError::UnrecognizedCommand { suggestions, .. } => suggestions,
            ParseError::MissingSubcommand { available, .. } => available,
            _ => &[],
        }
    }
}

/// Failure while resolving or converting argument values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Missing required argument '{argument}'")]
    RequiredArgumentMissing { argument: String },

    #[error("Cannot convert '{value}' for '{argument}': {reason}")]
    ValueConversion {
        argument: String,
        value: String,
        reason: String,
    },

    #[error("Too many values for '{argument}': accepts at most {maximum}, received {actual}")]
    ArityViolation {
        argument: String,
        maximum: u32,
        actual: usize,
    },
}

/// Union of the failures the pipeline driver can surface.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),

    /// A command action or third-party middleware unit failed.
    #[error(transparent)]
    Unhandled(#[from] anyhow::Error),
}

impl PipelineError {
    /// The exit code this failure maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Tokenize(_) | PipelineError::Parse(_) => exit_code::PARSE,
            PipelineError::Bind(_) => exit_code::VALIDATION,
            PipelineError::Unhandled(_) => exit_code::UNHANDLED,
            PipelineError::Configuration(_) => exit_code::CONFIG,
        }
    }

    /// Did-you-mean candidates, when this wraps an unrecognized-name error.
    pub fn suggestions(&self) -> &[String] {
        match self {
            PipelineError::Parse(e) => e.suggestions(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_map_by_family() {
        let parse: PipelineError = ParseError::UnrecognizedOption {
            token: "-1".into(),
            suggestions: vec![],
        }
        .into();
        assert_eq!(parse.exit_code(), exit_code::PARSE);

        let bind: PipelineError = BindError::RequiredArgumentMissing {
            argument: "x".into(),
        }
        .into();
        assert_eq!(bind.exit_code(), exit_code::VALIDATION);

        let config: PipelineError = ConfigurationError::new("bad").into();
        assert_eq!(config.exit_code(), exit_code::CONFIG);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ParseError::UnrecognizedOption {
            token: "-1".into(),
            suggestions: vec![],
        };
        assert_eq!(err.to_string(), "Unrecognized option '-1'");

        let err = BindError::ValueConversion {
            argument: "x".into(),
            value: "red".into(),
            reason: "expected an integer".into(),
        };
        assert_eq!(err.to_string(), "Cannot convert 'red' for 'x': expected an integer");
    }

    #[test]
    fn suggestions_surface_through_the_union() {
        let err: PipelineError = ParseError::UnrecognizedCommand {
            token: "Sub".into(),
            suggestions: vec!["Sum".into()],
        }
        .into();
        assert_eq!(err.suggestions(), ["Sum".to_string()]);
    }
}
