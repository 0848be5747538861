//! Walks the token stream against the command tree.
//!
//! Matching is greedy and left-to-right with no backtracking: once a token
//! is consumed it is never reconsidered. The parser produces raw string
//! values only; conversion and default resolution happen in the binder.

use std::collections::BTreeMap;

use tiller_tokens::{Token, TokenCollection, TokenType};

use crate::argument::{InputValue, ValueSource};
use crate::command::{ArgumentId, CommandId, CommandTree};
use crate::error::ParseError;
use crate::settings::{AppSettings, SeparatorStrategy};

const MAX_SUGGESTIONS: usize = 3;

/// The outcome of a successful parse: the resolved target command, the raw
/// values matched to each argument, and the tokens that matched nothing.
///
/// Read-only after the parse, with one sanctioned exception: a prompting
/// collaborator may append further input values for arguments the user left
/// empty, via [`append_input`](Self::append_input).
#[derive(Debug)]
pub struct ParseResult {
    target_command: CommandId,
    argument_values: BTreeMap<ArgumentId, Vec<InputValue>>,
    remaining_operands: Vec<String>,
    separated_arguments: Vec<String>,
}

impl ParseResult {
    pub fn target_command(&self) -> CommandId {
        self.target_command
    }

    /// All recorded input values for an argument, in arrival order.
    pub fn values_of(&self, id: ArgumentId) -> &[InputValue] {
        self.argument_values.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_values(&self, id: ArgumentId) -> bool {
        !self.values_of(id).is_empty()
    }

    /// Appends a later-sourced input value (e.g. from prompting).
    pub fn append_input(&mut self, id: ArgumentId, input: InputValue) {
        self.argument_values.entry(id).or_default().push(input);
    }

    /// Value tokens left over after all declared operands were filled.
    pub fn remaining_operands(&self) -> &[String] {
        &self.remaining_operands
    }

    /// Tokens after the separator, verbatim.
    pub fn separated_arguments(&self) -> &[String] {
        &self.separated_arguments
    }

    /// Arguments that received values, for introspection.
    pub fn argument_values(&self) -> impl Iterator<Item = (ArgumentId, &[InputValue])> {
        self.argument_values.iter().map(|(id, v)| (*id, v.as_slice()))
    }
}

pub(crate) fn parse(
    tree: &CommandTree,
    tokens: &TokenCollection,
    settings: &AppSettings,
) -> Result<ParseResult, ParseError> {
    Parser {
        tree,
        settings,
        argument_values: BTreeMap::new(),
        operand_counts: Vec::new(),
        operand_cursor: 0,
        remaining_operands: Vec::new(),
    }
    .run(tokens)
}

struct Parser<'a> {
    tree: &'a CommandTree,
    settings: &'a AppSettings,
    argument_values: BTreeMap<ArgumentId, Vec<InputValue>>,
    /// Values consumed so far per declared operand of the target.
    operand_counts: Vec<u32>,
    operand_cursor: usize,
    remaining_operands: Vec<String>,
}

impl<'a> Parser<'a> {
    fn run(mut self, tokens: &TokenCollection) -> Result<ParseResult, ParseError> {
        let arg_tokens = tokens.arguments();
        let (target, consumed) = self.resolve_command(arg_tokens)?;

        let options_in_scope = self.tree.options_in_scope(target);
        let operands: Vec<ArgumentId> = self.tree.command(target).operands().to_vec();
        self.operand_counts = vec![0; operands.len()];

        let mut index = consumed;
        while index < arg_tokens.len() {
            let token = &arg_tokens[index];
            index += 1;
            match token.token_type() {
                TokenType::Option => {
                    index = self.consume_option(token, arg_tokens, index, &options_in_scope)?;
                }
                _ => self.bind_operand(&operands, token.value()),
            }
        }

        let mut separated_arguments = Vec::new();
        if tokens.has_separator() {
            let strategy = self.tree.effective_separator_strategy(target, self.settings);
            for token in tokens.separated() {
                separated_arguments.push(token.value().to_string());
            }
            if strategy == SeparatorStrategy::EndOfOptions {
                for token in tokens.separated() {
                    self.bind_operand(&operands, token.value());
                }
            }
        }

        if !self.remaining_operands.is_empty() && !self.settings.ignore_unexpected_operands {
            return Err(ParseError::UnexpectedOperands {
                operands: self.remaining_operands,
            });
        }

        if !self.tree.command(target).is_executable() {
            let available = self
                .tree
                .command(target)
                .children()
                .iter()
                .map(|&c| self.tree.command(c).name().to_string())
                .collect();
            return Err(ParseError::MissingSubcommand {
                command: self.tree.command(target).name().to_string(),
                available,
            });
        }

        Ok(ParseResult {
            target_command: target,
            argument_values: self.argument_values,
            remaining_operands: self.remaining_operands,
            separated_arguments,
        })
    }

    /// Descends the tree along leading value tokens. Returns the target and
    /// how many tokens the command path consumed.
    fn resolve_command(&self, arg_tokens: &[Token]) -> Result<(CommandId, usize), ParseError> {
        let mut current = self.tree.root();
        let mut consumed = 0;
        for token in arg_tokens {
            if token.token_type() != TokenType::Value {
                break;
            }
            match self.tree.find_child(current, token.value()) {
                Some(child) => {
                    current = child;
                    consumed += 1;
                }
                None => {
                    let node = self.tree.command(current);
                    if !node.is_executable() && !node.children().is_empty() {
                        let names: Vec<&str> = node
                            .children()
                            .iter()
                            .map(|&c| self.tree.command(c).name())
                            .collect();
                        return Err(ParseError::UnrecognizedCommand {
                            token: token.value().to_string(),
                            suggestions: tiller_suggest::suggest(names, token.value(), MAX_SUGGESTIONS),
                        });
                    }
                    break;
                }
            }
        }
        Ok((current, consumed))
    }

    /// Matches one option token and consumes its value tokens per arity.
    /// Returns the next unconsumed index.
    fn consume_option(
        &mut self,
        token: &Token,
        arg_tokens: &[Token],
        mut index: usize,
        options_in_scope: &[ArgumentId],
    ) -> Result<usize, ParseError> {
        let Some(option_id) = self.find_option(token, options_in_scope) else {
            if self.settings.ignore_unexpected_operands {
                self.remaining_operands.push(token.value().to_string());
                return Ok(index);
            }
            return Err(self.unrecognized_option(token, options_in_scope));
        };

        let arity = self.tree.argument(option_id).arity;
        if !arity.accepts_more(0) {
            // Implicit boolean: presence alone means true; the next token is
            // never consumed by this option.
            self.argument_values
                .entry(option_id)
                .or_default()
                .push(InputValue::single(ValueSource::Argv, "true"));
            return Ok(index);
        }

        let mut values = Vec::new();
        while index < arg_tokens.len()
            && arg_tokens[index].token_type() == TokenType::Value
            && arity.accepts_more(values.len() as u32)
        {
            values.push(arg_tokens[index].value().to_string());
            index += 1;
        }

        if values.is_empty() && arity.requires_at_least_one() {
            return Err(ParseError::MissingOptionValue {
                option: self.tree.argument(option_id).display_name(),
            });
        }

        self.argument_values
            .entry(option_id)
            .or_default()
            .push(InputValue::new(ValueSource::Argv, values));
        Ok(index)
    }

    fn find_option(&self, token: &Token, options_in_scope: &[ArgumentId]) -> Option<ArgumentId> {
        let name = token.option_name()?;
        options_in_scope.iter().copied().find(|&id| {
            let argument = self.tree.argument(id);
            if token.is_short_option() {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => argument.short == Some(c),
                    _ => false,
                }
            } else {
                argument.long.as_deref() == Some(name)
            }
        })
    }

    fn unrecognized_option(&self, token: &Token, options_in_scope: &[ArgumentId]) -> ParseError {
        let long_names: Vec<String> = options_in_scope
            .iter()
            .filter_map(|&id| self.tree.argument(id).long.clone())
            .collect();
        let stripped = token.option_name().unwrap_or_default();
        let suggestions = tiller_suggest::suggest(&long_names, stripped, MAX_SUGGESTIONS)
            .into_iter()
            .map(|name| format!("--{name}"))
            .collect();
        ParseError::UnrecognizedOption {
            token: token.value().to_string(),
            suggestions,
        }
    }

    /// Assigns a value token to the next unfilled operand, or records it as
    /// a leftover.
    fn bind_operand(&mut self, operands: &[ArgumentId], value: &str) {
        while self.operand_cursor < operands.len() {
            let id = operands[self.operand_cursor];
            let arity = self.tree.argument(id).arity;
            let count = self.operand_counts[self.operand_cursor];
            if arity.accepts_more(count) {
                let entry = self.argument_values.entry(id).or_default();
                let appended = match entry.last_mut() {
                    Some(last) if last.source == ValueSource::Argv => {
                        last.values.push(value.to_string());
                        true
                    }
                    _ => false,
                };
                if !appended {
                    entry.push(InputValue::single(ValueSource::Argv, value));
                }
                self.operand_counts[self.operand_cursor] += 1;
                if !arity.accepts_more(count + 1) {
                    self.operand_cursor += 1;
                }
                return;
            }
            self.operand_cursor += 1;
        }
        self.remaining_operands.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{ArgumentDefinition as Arg, CommandDefinition};
    use tiller_tokens::{expand_clubbed_flags, split_option_assignments, tokenize, TokenizeOptions};

    fn math_tree() -> CommandTree {
        let def = CommandDefinition::new("math")
            .option(Arg::option("verbose").short('v').flag())
            .interceptor(|_, _| Ok(crate::Outcome::Continue))
            .subcommand(
                CommandDefinition::new("Add")
                    .operand(Arg::operand("x").integer())
                    .operand(Arg::operand("y").integer())
                    .action(|_, _| Ok(0)),
            )
            .subcommand(
                CommandDefinition::new("Sum")
                    .operand(Arg::operand("values").integer().collection())
                    .option(Arg::option("round").flag())
                    .action(|_, _| Ok(0)),
            );
        CommandTree::build(&def).unwrap()
    }

    fn lex(args: &[&str]) -> TokenCollection {
        let tokens = tokenize(args, &TokenizeOptions::default()).unwrap();
        split_option_assignments(&expand_clubbed_flags(&tokens))
    }

    fn parse_args(tree: &CommandTree, settings: &AppSettings, args: &[&str]) -> Result<ParseResult, ParseError> {
        parse(tree, &lex(args), settings)
    }

    fn raw_values(tree: &CommandTree, result: &ParseResult, name: &str) -> Vec<String> {
        result
            .argument_values()
            .filter(|(id, _)| tree.argument(*id).name == name)
            .flat_map(|(_, inputs)| inputs.iter().flat_map(|i| i.values.clone()))
            .collect()
    }

    #[test]
    fn resolves_nested_target_and_operands() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let result = parse_args(&tree, &settings, &["Add", "1", "2"]).unwrap();
        assert_eq!(tree.command(result.target_command()).name(), "Add");
        assert_eq!(raw_values(&tree, &result, "x"), vec!["1"]);
        assert_eq!(raw_values(&tree, &result, "y"), vec!["2"]);
    }

    #[test]
    fn unknown_subcommand_of_group_fails_with_suggestions() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let err = parse_args(&tree, &settings, &["Sub", "1"]).unwrap_err();
        match err {
            ParseError::UnrecognizedCommand { token, suggestions } => {
                assert_eq!(token, "Sub");
                assert_eq!(suggestions[0], "Sum");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn dashed_operand_is_an_option_attempt() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let err = parse_args(&tree, &settings, &["Add", "-1", "-3"]).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedOption { ref token, .. } if token == "-1"));
    }

    #[test]
    fn end_of_options_binds_separated_tokens_to_operands() {
        let tree = math_tree();
        let settings = AppSettings::default(); // EndOfOptions
        let result = parse_args(&tree, &settings, &["Add", "--", "-1", "-3"]).unwrap();
        assert_eq!(raw_values(&tree, &result, "x"), vec!["-1"]);
        assert_eq!(raw_values(&tree, &result, "y"), vec!["-3"]);
        assert_eq!(result.separated_arguments(), ["-1", "-3"]);
    }

    #[test]
    fn pass_thru_keeps_separated_tokens_out_of_operands() {
        let tree = math_tree();
        let settings = AppSettings {
            default_separator_strategy: SeparatorStrategy::PassThru,
            ..Default::default()
        };
        let result = parse_args(&tree, &settings, &["Add", "--", "-1", "-3"]).unwrap();
        assert!(raw_values(&tree, &result, "x").is_empty());
        assert_eq!(result.separated_arguments(), ["-1", "-3"]);
        assert!(result.remaining_operands().is_empty());
    }

    #[test]
    fn second_separator_is_verbatim_in_both_views() {
        let tree = math_tree();
        let settings = AppSettings {
            ignore_unexpected_operands: true,
            ..Default::default()
        };
        let result = parse_args(&tree, &settings, &["Add", "--", "-1", "-3", "--", "-5", "-7"]).unwrap();
        assert_eq!(result.separated_arguments(), ["-1", "-3", "--", "-5", "-7"]);
        assert_eq!(result.remaining_operands(), ["--", "-5", "-7"]);
    }

    #[test]
    fn extra_operands_fail_unless_ignored() {
        let tree = math_tree();
        let strict = AppSettings::default();
        let err = parse_args(&tree, &strict, &["Add", "1", "2", "3"]).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedOperands { .. }));

        let lenient = AppSettings {
            ignore_unexpected_operands: true,
            ..Default::default()
        };
        let result = parse_args(&tree, &lenient, &["Add", "1", "2", "3"]).unwrap();
        assert_eq!(result.remaining_operands(), ["3"]);
    }

    #[test]
    fn collection_operand_consumes_value_runs() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let result = parse_args(&tree, &settings, &["Sum", "1", "2", "--round", "3"]).unwrap();
        assert_eq!(raw_values(&tree, &result, "values"), vec!["1", "2", "3"]);
        assert_eq!(raw_values(&tree, &result, "round"), vec!["true"]);
    }

    #[test]
    fn inherited_option_matches_on_descendants() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let result = parse_args(&tree, &settings, &["Add", "-v", "1", "2"]).unwrap();
        assert_eq!(raw_values(&tree, &result, "verbose"), vec!["true"]);
        assert_eq!(raw_values(&tree, &result, "x"), vec!["1"]);
    }

    #[test]
    fn clubbed_flags_revalidate_at_match_time() {
        let tree = math_tree();
        let settings = AppSettings::default();
        // -vq expands lexically; 'q' resolves to nothing and fails here.
        let err = parse_args(&tree, &settings, &["Add", "-vq", "1", "2"]).unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedOption { ref token, .. } if token == "-q"));
    }

    #[test]
    fn option_without_its_required_value_fails() {
        let def = CommandDefinition::new("app").subcommand(
            CommandDefinition::new("Run")
                .option(Arg::option("name"))
                .action(|_, _| Ok(0)),
        );
        let tree = CommandTree::build(&def).unwrap();
        let settings = AppSettings::default();

        let err = parse_args(&tree, &settings, &["Run", "--name"]).unwrap_err();
        assert!(matches!(err, ParseError::MissingOptionValue { ref option } if option == "--name"));

        // A following option token is not consumed as the value either.
        let def = CommandDefinition::new("app").subcommand(
            CommandDefinition::new("Run")
                .option(Arg::option("name"))
                .option(Arg::option("loud").flag())
                .action(|_, _| Ok(0)),
        );
        let tree = CommandTree::build(&def).unwrap();
        let err = parse_args(&tree, &settings, &["Run", "--name", "--loud"]).unwrap_err();
        assert!(matches!(err, ParseError::MissingOptionValue { .. }));
    }

    #[test]
    fn group_target_requires_a_subcommand() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let err = parse_args(&tree, &settings, &[]).unwrap_err();
        match err {
            ParseError::MissingSubcommand { command, available } => {
                assert_eq!(command, "math");
                assert_eq!(available, vec!["Add", "Sum"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn typo_in_option_gets_suggestions() {
        let tree = math_tree();
        let settings = AppSettings::default();
        let err = parse_args(&tree, &settings, &["Sum", "--round2", "1"]).unwrap_err();
        match err {
            ParseError::UnrecognizedOption { suggestions, .. } => {
                assert_eq!(suggestions[0], "--round");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unknown_option_is_collected_when_ignoring_unexpected() {
        let tree = math_tree();
        let settings = AppSettings {
            ignore_unexpected_operands: true,
            ..Default::default()
        };
        let result = parse_args(&tree, &settings, &["Add", "--wat", "1", "2"]).unwrap();
        assert_eq!(result.remaining_operands(), ["--wat"]);
        assert_eq!(raw_values(&tree, &result, "x"), vec!["1"]);
    }
}
