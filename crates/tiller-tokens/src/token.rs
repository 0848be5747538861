//! Lexical token types.
//!
//! A [`Token`] is the immutable unit the rest of the framework operates on.
//! Transformations never mutate a token in place; they produce replacement
//! tokens instead, so every stage of the pipeline can retain the exact
//! collection it saw.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a single raw argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// A bracketed diagnostic instruction, e.g. `[parse:t]`. Only produced
    /// when directives are enabled and only for leading tokens.
    Directive,
    /// A token introduced by `-` or `--`, e.g. `-v` or `--verbose`.
    Option,
    /// The argument separator marker (`--` unless configured otherwise).
    Separator,
    /// Anything else: command names and argument values.
    Value,
    /// A token after the separator marker, retained verbatim. Never matched
    /// as an option regardless of its dash prefix.
    EndOfOptions,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Directive => write!(f, "Directive"),
            TokenType::Option => write!(f, "Option"),
            TokenType::Separator => write!(f, "Separator"),
            TokenType::Value => write!(f, "Value"),
            TokenType::EndOfOptions => write!(f, "EndOfOptions"),
        }
    }
}

/// An immutable lexical unit: the raw text, its classification and the
/// position of the raw argument it came from.
///
/// Tokens produced by a transformation keep the source position of the token
/// they replaced, so diagnostics can always point back at the original
/// argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    value: String,
    token_type: TokenType,
    source_position: usize,
}

impl Token {
    /// Creates a token.
    pub fn new(value: impl Into<String>, token_type: TokenType, source_position: usize) -> Self {
        Self {
            value: value.into(),
            token_type,
            source_position,
        }
    }

    /// The raw text of the token, exactly as supplied.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The token's classification.
    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Index into the original argument vector this token came from.
    pub fn source_position(&self) -> usize {
        self.source_position
    }

    /// Derives a replacement token at the same source position.
    pub fn derive(&self, value: impl Into<String>, token_type: TokenType) -> Token {
        Token::new(value, token_type, self.source_position)
    }

    /// For `Directive` tokens: the name and optional argument inside the
    /// brackets. `[parse:t]` yields `("parse", Some("t"))`.
    pub fn directive_parts(&self) -> Option<(&str, Option<&str>)> {
        if self.token_type != TokenType::Directive {
            return None;
        }
        let inner = &self.value[1..self.value.len() - 1];
        Some(match inner.split_once(':') {
            Some((name, args)) => (name, Some(args)),
            None => (inner, None),
        })
    }

    /// For `Option` tokens: the name with leading dashes stripped.
    pub fn option_name(&self) -> Option<&str> {
        if self.token_type != TokenType::Option {
            return None;
        }
        Some(self.value.trim_start_matches('-'))
    }

    /// True for a single-dash option token, e.g. `-v` or `-abc`.
    pub fn is_short_option(&self) -> bool {
        self.token_type == TokenType::Option
            && self.value.starts_with('-')
            && !self.value.starts_with("--")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
