//! End-to-end scenarios through the full pipeline: tokenize, transform,
//! parse, bind, invoke, with output captured on an in-memory console.

use std::cell::RefCell;
use std::rc::Rc;

use tiller::{
    exit_code, AppRunner, AppSettings, ArgumentDefinition, CommandDefinition, Console,
    ConsoleCapture, MiddlewareStage, Outcome, SeparatorStrategy,
};

/// A math app mirroring a classic calculator CLI: `Add` uses the app-wide
/// separator strategy, the suffixed variants pin their own.
fn math_definition() -> CommandDefinition {
    let add = |name: &str| {
        CommandDefinition::new(name)
            .operand(ArgumentDefinition::operand("x").integer().optional().default_value("0"))
            .operand(ArgumentDefinition::operand("y").integer().optional().default_value("0"))
            .action(|inv, ctx| {
                let sum = inv.get_i64("x")? + inv.get_i64("y")?;
                ctx.console.out_line(sum.to_string());
                Ok(0)
            })
    };
    CommandDefinition::new("math")
        .subcommand(add("Add"))
        .subcommand(add("Add_EndOfOptions").separator_strategy(SeparatorStrategy::EndOfOptions))
        .subcommand(add("Add_PassThru").separator_strategy(SeparatorStrategy::PassThru))
        .subcommand(
            CommandDefinition::new("Sum")
                .operand(ArgumentDefinition::operand("values").integer().collection())
                .action(|inv, ctx| {
                    let total: i64 = inv.many_i64("values")?.iter().sum();
                    ctx.console.out_line(total.to_string());
                    Ok(0)
                }),
        )
}

fn pass_thru_settings() -> AppSettings {
    AppSettings {
        default_separator_strategy: SeparatorStrategy::PassThru,
        ..Default::default()
    }
}

fn end_of_options_settings() -> AppSettings {
    AppSettings {
        default_separator_strategy: SeparatorStrategy::EndOfOptions,
        ..Default::default()
    }
}

/// Captures the parse result's separated/remaining views from a
/// post-parse middleware unit, since ParseResult is internal to the run.
#[derive(Clone, Default)]
struct ParseSpy {
    separated: Rc<RefCell<Vec<String>>>,
    remaining: Rc<RefCell<Vec<String>>>,
}

fn runner_with_spy(settings: AppSettings) -> (AppRunner, ConsoleCapture, ParseSpy) {
    let (console, capture) = Console::in_memory();
    let spy = ParseSpy::default();
    let spy_for_unit = spy.clone();
    let runner = AppRunner::new(math_definition())
        .settings(settings)
        .console(console)
        .configure(move |c| {
            let spy = spy_for_unit.clone();
            c.use_middleware("parse-spy", MiddlewareStage::PostParseInputPreBindValues, 10, move |ctx| {
                let result = ctx.parse_result();
                *spy.separated.borrow_mut() = result.separated_arguments().to_vec();
                *spy.remaining.borrow_mut() = result.remaining_operands().to_vec();
                Ok(Outcome::Continue)
            });
        });
    (runner, capture, spy)
}

#[test]
fn given_pass_thru_an_unseparated_dashed_operand_is_an_option_attempt() {
    let (runner, capture, _spy) = runner_with_spy(pass_thru_settings());
    assert_eq!(runner.run(["Add", "-1", "-3"]), exit_code::PARSE);
    assert!(capture.err_text().contains("Unrecognized option '-1'"));
}

#[test]
fn given_end_of_options_an_unseparated_dashed_operand_still_fails() {
    let (runner, capture, _spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Add", "-1", "-3"]), exit_code::PARSE);
    assert!(capture.err_text().contains("Unrecognized option '-1'"));
}

#[test]
fn given_end_of_options_by_command_an_unseparated_dashed_operand_still_fails() {
    let (runner, capture, _spy) = runner_with_spy(pass_thru_settings());
    assert_eq!(runner.run(["Add_EndOfOptions", "-1", "-3"]), exit_code::PARSE);
    assert!(capture.err_text().contains("Unrecognized option '-1'"));
}

#[test]
fn given_pass_thru_separated_operands_are_ignored_but_captured() {
    let (runner, capture, spy) = runner_with_spy(pass_thru_settings());
    assert_eq!(runner.run(["Add", "--", "-1", "-3"]), 0);
    assert_eq!(capture.out_text(), "0\n");
    assert_eq!(*spy.separated.borrow(), ["-1", "-3"]);
    assert!(spy.remaining.borrow().is_empty());
}

#[test]
fn given_pass_thru_by_command_separated_operands_are_ignored_but_captured() {
    let (runner, capture, spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Add_PassThru", "--", "-1", "-3"]), 0);
    assert_eq!(capture.out_text(), "0\n");
    assert_eq!(*spy.separated.borrow(), ["-1", "-3"]);
}

#[test]
fn given_end_of_options_separated_operands_are_parsed() {
    let (runner, capture, spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Add", "--", "-1", "-3"]), 0);
    assert_eq!(capture.out_text(), "-4\n");
    assert_eq!(*spy.separated.borrow(), ["-1", "-3"]);
}

#[test]
fn given_end_of_options_by_command_separated_operands_are_parsed() {
    let (runner, capture, spy) = runner_with_spy(pass_thru_settings());
    assert_eq!(runner.run(["Add_EndOfOptions", "--", "-1", "-3"]), 0);
    assert_eq!(capture.out_text(), "-4\n");
    assert_eq!(*spy.separated.borrow(), ["-1", "-3"]);
}

#[test]
fn extra_separated_operands_are_captured_when_ignoring_unexpected() {
    let settings = AppSettings {
        ignore_unexpected_operands: true,
        ..end_of_options_settings()
    };
    let (runner, capture, spy) = runner_with_spy(settings);
    assert_eq!(runner.run(["Add", "--", "-1", "-3", "-5", "-7"]), 0);
    assert_eq!(capture.out_text(), "-4\n");
    assert_eq!(*spy.remaining.borrow(), ["-5", "-7"]);
    assert_eq!(*spy.separated.borrow(), ["-1", "-3", "-5", "-7"]);
}

#[test]
fn a_second_separator_is_an_ordinary_separated_token() {
    let settings = AppSettings {
        ignore_unexpected_operands: true,
        ..end_of_options_settings()
    };
    let (runner, capture, spy) = runner_with_spy(settings);
    assert_eq!(runner.run(["Add", "--", "-1", "-3", "--", "-5", "-7"]), 0);
    assert_eq!(capture.out_text(), "-4\n");
    assert_eq!(*spy.remaining.borrow(), ["--", "-5", "-7"]);
    assert_eq!(*spy.separated.borrow(), ["-1", "-3", "--", "-5", "-7"]);
}

#[test]
fn extra_operands_fail_in_strict_mode() {
    let (runner, capture, _spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Add", "1", "2", "3"]), exit_code::PARSE);
    assert!(capture.err_text().contains("Unexpected operand(s): 3"));
}

#[test]
fn unknown_command_reports_suggestions() {
    let (runner, capture, _spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Sim", "1", "2"]), exit_code::PARSE);
    let err = capture.err_text();
    assert!(err.contains("Unrecognized command 'Sim'"));
    assert!(err.contains("Did you mean:"));
    assert!(err.contains("Sum"));
}

#[test]
fn bare_group_lists_its_subcommands() {
    let (runner, capture, _spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run::<[&str; 0], &str>([]), exit_code::PARSE);
    let err = capture.err_text();
    assert!(err.contains("'math' requires a subcommand"));
    assert!(err.contains("Available subcommands:"));
    assert!(err.contains("Add"));
}

mod boolean_options {
    use super::*;

    fn say_app() -> (AppRunner, ConsoleCapture) {
        let definition = CommandDefinition::new("app").subcommand(
            CommandDefinition::new("Say")
                .option(ArgumentDefinition::option("loud").short('l').flag())
                .option(ArgumentDefinition::option("dry").explicit_boolean().optional())
                .operand(ArgumentDefinition::operand("message").optional().default_value("hi"))
                .action(|inv, ctx| {
                    let mut message = inv.get_str("message")?.to_string();
                    if inv.get_bool("loud")? {
                        message = message.to_uppercase();
                    }
                    ctx.console.out_line(message);
                    Ok(0)
                }),
        );
        let (console, capture) = Console::in_memory();
        (AppRunner::new(definition).console(console), capture)
    }

    #[test]
    fn presence_alone_sets_an_implicit_boolean() {
        let (runner, capture) = say_app();
        assert_eq!(runner.run(["Say", "--loud", "hey"]), 0);
        assert_eq!(capture.out_text(), "HEY\n");
    }

    #[test]
    fn absence_binds_false() {
        let (runner, capture) = say_app();
        assert_eq!(runner.run(["Say", "hey"]), 0);
        assert_eq!(capture.out_text(), "hey\n");
    }

    #[test]
    fn an_implicit_boolean_never_consumes_a_value_token() {
        let (runner, capture) = say_app();
        // "true" lands in the message operand, not in --loud.
        assert_eq!(runner.run(["Say", "--loud", "true"]), 0);
        assert_eq!(capture.out_text(), "TRUE\n");
    }

    #[test]
    fn clubbed_short_flags_expand_and_match() {
        let definition = CommandDefinition::new("app").subcommand(
            CommandDefinition::new("Run")
                .option(ArgumentDefinition::option("all").short('a').flag())
                .option(ArgumentDefinition::option("brief").short('b').flag())
                .action(|inv, ctx| {
                    ctx.console.out_line(format!(
                        "{} {}",
                        inv.get_bool("all")?,
                        inv.get_bool("brief")?
                    ));
                    Ok(0)
                }),
        );
        let (console, capture) = Console::in_memory();
        let runner = AppRunner::new(definition).console(console);
        assert_eq!(runner.run(["Run", "-ab"]), 0);
        assert_eq!(capture.out_text(), "true true\n");
    }

    #[test]
    fn assignment_syntaxes_split_into_option_and_value() {
        let definition = CommandDefinition::new("app").subcommand(
            CommandDefinition::new("Show")
                .option(ArgumentDefinition::option("first"))
                .option(ArgumentDefinition::option("second"))
                .action(|inv, ctx| {
                    ctx.console
                        .out_line(format!("{} {}", inv.get_str("first")?, inv.get_str("second")?));
                    Ok(0)
                }),
        );
        let (console, capture) = Console::in_memory();
        let runner = AppRunner::new(definition).console(console);
        assert_eq!(runner.run(["Show", "--first=one", "--second:two"]), 0);
        assert_eq!(capture.out_text(), "one two\n");
    }

    #[test]
    fn option_typo_reports_did_you_mean() {
        let (runner, capture) = say_app();
        assert_eq!(runner.run(["Say", "--løud"]), exit_code::PARSE);
        let err = capture.err_text();
        assert!(err.contains("Unrecognized option"));
        assert!(err.contains("--loud"));
    }
}

#[test]
fn collection_operand_sums_all_values() {
    let (runner, capture, _spy) = runner_with_spy(end_of_options_settings());
    assert_eq!(runner.run(["Sum", "1", "2", "3", "4"]), 0);
    assert_eq!(capture.out_text(), "10\n");
}

#[test]
fn missing_required_value_is_a_validation_failure() {
    let definition = CommandDefinition::new("app").subcommand(
        CommandDefinition::new("Need")
            .operand(ArgumentDefinition::operand("value").integer())
            .action(|_, _| Ok(0)),
    );
    let (console, capture) = Console::in_memory();
    let runner = AppRunner::new(definition).console(console);
    assert_eq!(runner.run(["Need"]), exit_code::VALIDATION);
    assert!(capture.err_text().contains("Missing required argument 'value'"));
}

#[test]
fn conversion_failure_names_the_argument_and_value() {
    let definition = CommandDefinition::new("app").subcommand(
        CommandDefinition::new("Need")
            .operand(ArgumentDefinition::operand("value").integer())
            .action(|_, _| Ok(0)),
    );
    let (console, capture) = Console::in_memory();
    let runner = AppRunner::new(definition).console(console);
    assert_eq!(runner.run(["Need", "red"]), exit_code::VALIDATION);
    assert!(capture.err_text().contains("Cannot convert 'red' for 'value'"));
}
