//! Built-in token rewrite passes.
//!
//! Both passes are pure functions over the whole collection and skip
//! directives and separated tokens. They are registered by the framework at
//! fixed relative order: clubbed-flag expansion first, assignment splitting
//! second, so `-ab=c` is left for the assignment pass rather than expanded.

use crate::collection::TokenCollection;
use crate::token::{Token, TokenType};

/// Registration name of [`expand_clubbed_flags`].
pub const EXPAND_CLUBBED_FLAGS: &str = "expand-clubbed-flags";

/// Registration name of [`split_option_assignments`].
pub const SPLIT_OPTION_ASSIGNMENTS: &str = "split-option-assignments";

/// Expands clubbed short flags: `-abc` becomes `-a -b -c`.
///
/// The expansion is purely lexical: it applies to any single-dash option
/// token longer than one character whose characters are all ASCII
/// alphabetic. Whether each produced flag names a declared single-character
/// option is re-validated by the parser at match time; an unknown flag fails
/// there as an unrecognized option.
pub fn expand_clubbed_flags(tokens: &TokenCollection) -> TokenCollection {
    tokens.transform(true, true, |token| {
        if is_clubbed(token) {
            token
                .value()
                .chars()
                .skip(1)
                .map(|c| token.derive(format!("-{c}"), TokenType::Option))
                .collect()
        } else {
            vec![token.clone()]
        }
    })
}

/// Splits assignment syntax: `--opt=value` and `--opt:value` (and the short
/// forms `-o=value` / `-o:value`) become an option token followed by a value
/// token. The split happens at the first `=` or `:`, so values may contain
/// either character.
pub fn split_option_assignments(tokens: &TokenCollection) -> TokenCollection {
    tokens.transform(true, true, |token| {
        if token.token_type() != TokenType::Option {
            return vec![token.clone()];
        }
        match token.value().find(['=', ':']) {
            Some(at) => {
                let (name, value) = token.value().split_at(at);
                vec![
                    token.derive(name, TokenType::Option),
                    token.derive(&value[1..], TokenType::Value),
                ]
            }
            None => vec![token.clone()],
        }
    })
}

fn is_clubbed(token: &Token) -> bool {
    if !token.is_short_option() {
        return false;
    }
    let flags = &token.value()[1..];
    flags.len() > 1 && flags.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{tokenize, TokenizeOptions};

    fn lex(args: &[&str]) -> TokenCollection {
        tokenize(args, &TokenizeOptions::default()).unwrap()
    }

    fn rendered(tokens: &TokenCollection) -> Vec<(String, TokenType)> {
        tokens
            .iter()
            .map(|t| (t.value().to_string(), t.token_type()))
            .collect()
    }

    #[test]
    fn expands_alphabetic_clusters_only() {
        let tokens = expand_clubbed_flags(&lex(&["Do", "-abc", "-a", "-13", "--one"]));
        let values: Vec<_> = tokens.iter().map(Token::value).collect();
        assert_eq!(values, vec!["Do", "-a", "-b", "-c", "-a", "-13", "--one"]);
    }

    #[test]
    fn expansion_skips_assignment_clusters() {
        let tokens = expand_clubbed_flags(&lex(&["-ab=c"]));
        let values: Vec<_> = tokens.iter().map(Token::value).collect();
        assert_eq!(values, vec!["-ab=c"]);
    }

    #[test]
    fn expansion_skips_separated_tokens() {
        let tokens = expand_clubbed_flags(&lex(&["Do", "--", "-abc"]));
        let values: Vec<_> = tokens.iter().map(Token::value).collect();
        assert_eq!(values, vec!["Do", "--", "-abc"]);
    }

    #[test]
    fn splits_both_assignment_syntaxes() {
        let tokens = split_option_assignments(&lex(&["--three:four", "--five=six", "seven"]));
        assert_eq!(
            rendered(&tokens),
            vec![
                ("--three".into(), TokenType::Option),
                ("four".into(), TokenType::Value),
                ("--five".into(), TokenType::Option),
                ("six".into(), TokenType::Value),
                ("seven".into(), TokenType::Value),
            ]
        );
    }

    #[test]
    fn split_keeps_later_delimiters_in_the_value() {
        let tokens = split_option_assignments(&lex(&["--url=http://host:80"]));
        assert_eq!(
            rendered(&tokens),
            vec![
                ("--url".into(), TokenType::Option),
                ("http://host:80".into(), TokenType::Value),
            ]
        );
    }

    #[test]
    fn split_allows_empty_values() {
        let tokens = split_option_assignments(&lex(&["--opt="]));
        assert_eq!(
            rendered(&tokens),
            vec![("--opt".into(), TokenType::Option), ("".into(), TokenType::Value)]
        );
    }

    #[test]
    fn full_chain_matches_shell_example() {
        let tokens = lex(&["Do", "-abc", "--one", "two", "--three:four", "--five=six", "seven"]);
        let tokens = split_option_assignments(&expand_clubbed_flags(&tokens));
        let values: Vec<_> = tokens.iter().map(Token::value).collect();
        assert_eq!(
            values,
            vec!["Do", "-a", "-b", "-c", "--one", "two", "--three", "four", "--five", "six", "seven"]
        );
    }

    #[test]
    fn chain_is_idempotent_on_normalized_streams() {
        let tokens = lex(&["Do", "-abc", "--five=six", "seven"]);
        let once = split_option_assignments(&expand_clubbed_flags(&tokens));
        let twice = split_option_assignments(&expand_clubbed_flags(&once));
        assert_eq!(once, twice);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arg_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z]{1,8}",
                "-[a-z]{1,4}",
                "--[a-z]{2,8}",
                "--[a-z]{2,6}=[a-z0-9]{0,6}",
                "--[a-z]{2,6}:[a-z0-9]{0,6}",
                Just("--".to_string()),
                Just("-".to_string()),
                "-[0-9]{1,3}",
            ]
        }

        proptest! {
            #[test]
            fn second_application_changes_nothing(args in proptest::collection::vec(arg_strategy(), 0..12)) {
                let tokens = tokenize(&args, &TokenizeOptions::default()).unwrap();
                let once = split_option_assignments(&expand_clubbed_flags(&tokens));
                let twice = split_option_assignments(&expand_clubbed_flags(&once));
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn transforms_never_touch_separated_tokens(args in proptest::collection::vec(arg_strategy(), 0..12)) {
                let tokens = tokenize(&args, &TokenizeOptions::default()).unwrap();
                let rewritten = split_option_assignments(&expand_clubbed_flags(&tokens));
                let before: Vec<_> = tokens.separated().iter().map(Token::value).collect();
                let after: Vec<_> = rewritten.separated().iter().map(Token::value).collect();
                prop_assert_eq!(before, after);
            }
        }
    }
}
