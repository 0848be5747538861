//! Token pipeline for the tiller CLI framework.
//!
//! This crate owns the lexical layer: classifying a raw argument vector into
//! [`Token`]s, holding them in an ordered [`TokenCollection`] partitioned
//! around the argument separator, and the built-in rewrite passes
//! ([`expand_clubbed_flags`], [`split_option_assignments`]) the framework
//! applies before parsing.
//!
//! It has no knowledge of commands or arguments; everything here operates on
//! token shape alone.
//!
//! # Quick Start
//!
//! ```rust
//! use tiller_tokens::{tokenize, TokenizeOptions, TokenType};
//! use tiller_tokens::{expand_clubbed_flags, split_option_assignments};
//!
//! let tokens = tokenize(["add", "-ab", "--opt=v", "--", "-1"], &TokenizeOptions::default())?;
//! let tokens = split_option_assignments(&expand_clubbed_flags(&tokens));
//!
//! let values: Vec<_> = tokens.iter().map(|t| t.value()).collect();
//! assert_eq!(values, ["add", "-a", "-b", "--opt", "v", "--", "-1"]);
//! assert_eq!(tokens.separated()[0].token_type(), TokenType::EndOfOptions);
//! # Ok::<(), tiller_tokens::TokenizeError>(())
//! ```

mod collection;
mod token;
mod tokenizer;
mod transform;

pub use collection::TokenCollection;
pub use token::{Token, TokenType};
pub use tokenizer::{
    classify, tokenize, value_token, TokenizeError, TokenizeOptions, DEFAULT_SEPARATOR,
};
pub use transform::{
    expand_clubbed_flags, split_option_assignments, EXPAND_CLUBBED_FLAGS,
    SPLIT_OPTION_ASSIGNMENTS,
};
