//! Ordered token container with a derived separator partition.

use serde::{Deserialize, Serialize};

use crate::token::{Token, TokenType};

/// An ordered sequence of tokens plus the derived partition around the
/// argument separator: leading directives, parseable arguments, and the
/// verbatim tokens after the separator.
///
/// At most one separator boundary is active per collection; later occurrences
/// of the separator text are ordinary [`TokenType::EndOfOptions`] tokens in
/// the separated region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenCollection {
    tokens: Vec<Token>,
    directive_count: usize,
    separator_index: Option<usize>,
}

impl TokenCollection {
    /// Builds a collection, deriving the directive prefix and separator
    /// boundary from the token types.
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let directive_count = tokens
            .iter()
            .take_while(|t| t.token_type() == TokenType::Directive)
            .count();
        let separator_index = tokens
            .iter()
            .position(|t| t.token_type() == TokenType::Separator);
        Self {
            tokens,
            directive_count,
            separator_index,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Leading directive tokens.
    pub fn directives(&self) -> &[Token] {
        &self.tokens[..self.directive_count]
    }

    /// Looks up a leading directive by name.
    pub fn directive(&self, name: &str) -> Option<&Token> {
        self.directives()
            .iter()
            .find(|t| matches!(t.directive_parts(), Some((n, _)) if n == name))
    }

    /// Tokens between the directives and the separator: the region the
    /// parser matches commands, options and operands against.
    pub fn arguments(&self) -> &[Token] {
        let end = self.separator_index.unwrap_or(self.tokens.len());
        &self.tokens[self.directive_count..end]
    }

    /// True when the collection contains a separator boundary.
    pub fn has_separator(&self) -> bool {
        self.separator_index.is_some()
    }

    /// Tokens after the separator, verbatim.
    pub fn separated(&self) -> &[Token] {
        match self.separator_index {
            Some(i) => &self.tokens[i + 1..],
            None => &[],
        }
    }

    /// Applies a rewrite pass, producing a new collection.
    ///
    /// The transformation maps each token to zero or more replacement tokens.
    /// `skip_directives` and `skip_separated` keep the directive prefix and
    /// the separated region untouched, which is what almost every pass wants.
    pub fn transform<F>(&self, skip_directives: bool, skip_separated: bool, transformation: F) -> TokenCollection
    where
        F: Fn(&Token) -> Vec<Token>,
    {
        let mut out = Vec::with_capacity(self.tokens.len());
        for (index, token) in self.tokens.iter().enumerate() {
            let in_directives = index < self.directive_count;
            let in_separated = self.separator_index.map(|s| index > s).unwrap_or(false);
            let is_separator = self.separator_index == Some(index);
            if (in_directives && skip_directives) || ((in_separated || is_separator) && skip_separated) {
                out.push(token.clone());
            } else {
                out.extend(transformation(token));
            }
        }
        TokenCollection::from_tokens(out)
    }
}

impl<'a> IntoIterator for &'a TokenCollection {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(specs: &[(&str, TokenType)]) -> TokenCollection {
        TokenCollection::from_tokens(
            specs
                .iter()
                .enumerate()
                .map(|(i, (v, t))| Token::new(*v, *t, i))
                .collect(),
        )
    }

    #[test]
    fn partitions_directives_arguments_and_separated() {
        let tokens = collection(&[
            ("[parse]", TokenType::Directive),
            ("add", TokenType::Value),
            ("--verbose", TokenType::Option),
            ("--", TokenType::Separator),
            ("-1", TokenType::EndOfOptions),
            ("--", TokenType::EndOfOptions),
        ]);

        assert_eq!(tokens.directives().len(), 1);
        assert_eq!(
            tokens.arguments().iter().map(Token::value).collect::<Vec<_>>(),
            vec!["add", "--verbose"]
        );
        assert_eq!(
            tokens.separated().iter().map(Token::value).collect::<Vec<_>>(),
            vec!["-1", "--"]
        );
    }

    #[test]
    fn no_separator_means_everything_is_arguments() {
        let tokens = collection(&[("add", TokenType::Value), ("1", TokenType::Value)]);
        assert!(!tokens.has_separator());
        assert_eq!(tokens.arguments().len(), 2);
        assert!(tokens.separated().is_empty());
    }

    #[test]
    fn directive_lookup_by_name() {
        let tokens = collection(&[("[parse:t]", TokenType::Directive), ("do", TokenType::Value)]);
        assert!(tokens.directive("parse").is_some());
        assert!(tokens.directive("debug").is_none());
    }

    #[test]
    fn transform_skips_requested_regions() {
        let tokens = collection(&[
            ("[parse]", TokenType::Directive),
            ("like", TokenType::Value),
            ("--", TokenType::Separator),
            ("like", TokenType::EndOfOptions),
        ]);

        let rewritten = tokens.transform(true, true, |t| {
            if t.value() == "like" {
                vec![t.derive("roses", TokenType::Value)]
            } else {
                vec![t.clone()]
            }
        });

        let values: Vec<_> = rewritten.iter().map(Token::value).collect();
        assert_eq!(values, vec!["[parse]", "roses", "--", "like"]);
    }

    #[test]
    fn transform_can_drop_and_expand_tokens() {
        let tokens = collection(&[("-abc", TokenType::Option), ("drop", TokenType::Value)]);
        let rewritten = tokens.transform(true, true, |t| {
            if t.value() == "drop" {
                vec![]
            } else {
                vec![t.derive("-a", TokenType::Option), t.derive("-b", TokenType::Option)]
            }
        });
        let values: Vec<_> = rewritten.iter().map(Token::value).collect();
        assert_eq!(values, vec!["-a", "-b"]);
    }
}
