//! The `[parse]` directive: parse introspection and the transformation
//! trace, including the error path.

use tiller::{
    exit_code, AppRunner, AppSettings, ArgumentDefinition, CommandDefinition, Console,
    ConsoleCapture,
};

fn do_app() -> (AppRunner, ConsoleCapture) {
    let definition = CommandDefinition::new("app").subcommand(
        CommandDefinition::new("Do")
            .operand(ArgumentDefinition::operand("arg1").optional().default_value("wet dog"))
            .option(ArgumentDefinition::option("opt1").optional())
            .action(|_, _| Ok(0)),
    );
    let (console, capture) = Console::in_memory();
    let runner = AppRunner::new(definition)
        .settings(AppSettings {
            enable_directives: true,
            ..Default::default()
        })
        .console(console)
        .use_parse_directive();
    (runner, capture)
}

#[test]
fn parse_t_shows_when_transforms_make_no_changes() {
    let (runner, capture) = do_app();
    assert_eq!(runner.run(["[parse:t]", "Do"]), 0);
    insta::assert_snapshot!(capture.out_text(), @r###"
    command: app Do

    token transformations:

    >>> from shell
      Directive: [parse:t]
      Value    : Do
    >>> after: expand-clubbed-flags (no changes)
    >>> after: split-option-assignments (no changes)
    "###);
}

#[test]
fn parse_t_trace_marks_unchanged_steps() {
    let (runner, capture) = do_app();
    assert_eq!(runner.run(["[parse:t]", "Do"]), 0);
    let out = capture.out_text();
    assert!(out.contains(">>> from shell"));
    assert!(out.contains(">>> after: expand-clubbed-flags (no changes)"));
    assert!(out.contains(">>> after: split-option-assignments (no changes)"));
}

#[test]
fn parse_t_shows_results_of_every_transform_even_when_parsing_fails() {
    let (runner, capture) = do_app();
    let exit = runner.run(["[parse:t]", "Do", "-abc", "--one", "two", "--three:four", "--five=six", "seven"]);
    assert_eq!(exit, exit_code::PARSE);

    insta::assert_snapshot!(capture.out_text(), @r###"
    token transformations:

    >>> from shell
      Directive: [parse:t]
      Value    : Do
      Option   : -abc
      Option   : --one
      Value    : two
      Option   : --three:four
      Option   : --five=six
      Value    : seven
    >>> after: expand-clubbed-flags
      Directive: [parse:t]
      Value    : Do
      Option   : -a
      Option   : -b
      Option   : -c
      Option   : --one
      Value    : two
      Option   : --three:four
      Option   : --five=six
      Value    : seven
    >>> after: split-option-assignments
      Directive: [parse:t]
      Value    : Do
      Option   : -a
      Option   : -b
      Option   : -c
      Option   : --one
      Value    : two
      Option   : --three
      Value    : four
      Option   : --five
      Value    : six
      Value    : seven
    "###);

    assert!(capture.err_text().contains("Unrecognized option '-a'"));
}

#[test]
fn parse_reports_argument_values_and_sources() {
    let (runner, capture) = do_app();
    assert_eq!(runner.run(["[parse]", "Do", "--opt1", "smells"]), 0);
    let out = capture.out_text();
    assert!(out.contains("command: app Do"));
    assert!(out.contains("--opt1 = smells (from argv)"));
    assert!(out.contains("use [parse:t] to see token transformations"));
}

#[test]
fn parse_json_emits_a_machine_readable_report() {
    let (runner, capture) = do_app();
    assert_eq!(runner.run(["[parse:json]", "Do", "--opt1", "smells"]), 0);
    let report: serde_json::Value = serde_json::from_str(&capture.out_text()).unwrap();
    assert_eq!(report["command"], "app Do");
    assert_eq!(report["arguments"][0]["argument"], "--opt1");
    assert_eq!(report["arguments"][0]["values"][0], "smells");
    assert_eq!(report["arguments"][0]["source"], "Argv");
}

#[test]
fn directives_off_treats_bracketed_tokens_as_values() {
    let definition = CommandDefinition::new("app").subcommand(
        CommandDefinition::new("Echo")
            .operand(ArgumentDefinition::operand("value"))
            .action(|inv, ctx| {
                ctx.console.out_line(inv.get_str("value")?);
                Ok(0)
            }),
    );
    let (console, capture) = Console::in_memory();
    let runner = AppRunner::new(definition).console(console);
    assert_eq!(runner.run(["Echo", "[parse]"]), 0);
    assert_eq!(capture.out_text(), "[parse]\n");
}

#[test]
fn malformed_directive_fails_tokenization() {
    let (runner, capture) = do_app();
    assert_eq!(runner.run(["[parse", "Do"]), exit_code::PARSE);
    assert!(capture.err_text().contains("malformed directive"));
}
