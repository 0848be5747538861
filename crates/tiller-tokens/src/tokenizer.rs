//! One-pass classification of a raw argument vector.
//!
//! The tokenizer is deliberately un-opinionated: it only classifies. Whether
//! `-abc` is three clubbed flags or a mistake, and what the tokens after the
//! separator mean, are decisions for the transformation passes and the
//! parser respectively.

use thiserror::Error;

use crate::collection::TokenCollection;
use crate::token::{Token, TokenType};

/// The conventional end-of-options marker.
pub const DEFAULT_SEPARATOR: &str = "--";

/// Tokenizer configuration.
#[derive(Debug, Clone)]
pub struct TokenizeOptions {
    /// When false, bracketed leading tokens are ordinary values.
    pub enable_directives: bool,
    /// The separator marker text.
    pub separator: String,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            enable_directives: false,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Error produced for malformed directive syntax.
///
/// Only raised when directives are enabled; with directives off a bracketed
/// token is an ordinary value and nothing can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("malformed directive '{token}': expected [name] or [name:value]")]
    MalformedDirective { token: String },
}

/// Classifies each raw argument into a [`Token`].
///
/// Rules, in order:
/// - leading `[name]` / `[name:args]` tokens are directives when enabled;
/// - the first occurrence of the separator text is the separator, and every
///   token after it is retained verbatim as [`TokenType::EndOfOptions`];
/// - `-` alone is a value (conventional stdin placeholder);
/// - anything else starting with `-` is an option attempt;
/// - the rest are values.
pub fn tokenize<I, S>(args: I, options: &TokenizeOptions) -> Result<TokenCollection, TokenizeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = Vec::new();
    let mut in_directives = options.enable_directives;
    let mut separated = false;

    for (position, arg) in args.into_iter().enumerate() {
        let arg = arg.as_ref();

        if in_directives {
            if arg.starts_with('[') {
                if !is_well_formed_directive(arg) {
                    return Err(TokenizeError::MalformedDirective {
                        token: arg.to_string(),
                    });
                }
                tokens.push(Token::new(arg, TokenType::Directive, position));
                continue;
            }
            in_directives = false;
        }

        if separated {
            tokens.push(Token::new(arg, TokenType::EndOfOptions, position));
        } else if arg == options.separator {
            separated = true;
            tokens.push(Token::new(arg, TokenType::Separator, position));
        } else {
            tokens.push(classify(arg, position));
        }
    }

    Ok(TokenCollection::from_tokens(tokens))
}

/// Classifies a single unseparated argument. Used by transformations that
/// need to re-tokenize replacement text.
pub fn classify(arg: &str, position: usize) -> Token {
    if arg.len() > 1 && arg.starts_with('-') {
        Token::new(arg, TokenType::Option, position)
    } else {
        Token::new(arg, TokenType::Value, position)
    }
}

/// Convenience for transformations producing plain values.
pub fn value_token(value: impl Into<String>, position: usize) -> Token {
    Token::new(value, TokenType::Value, position)
}

fn is_well_formed_directive(arg: &str) -> bool {
    if !arg.ends_with(']') || arg.len() < 3 {
        return false;
    }
    let inner = &arg[1..arg.len() - 1];
    let name = inner.split_once(':').map(|(n, _)| n).unwrap_or(inner);
    !name.is_empty() && !name.contains('[') && !name.contains(']')
}
