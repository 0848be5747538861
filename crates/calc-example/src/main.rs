//! A small calculator CLI exercising the tiller surface: nested commands,
//! an inherited `--verbose` flag, separators, env-var defaults, prompting
//! and the `[parse]` directive.
//!
//! Try:
//!
//! ```text
//! calc Add 1 2
//! calc Add -- -1 -3
//! calc Sum 1 2 3 4
//! calc -v Divide 10 4
//! CALC_PRECISION=1 calc Divide 10 3
//! calc "[parse:t]" Sum --round 1 2
//! ```

use tiller::{
    AppRunner, AppSettings, ArgumentDefinition, CommandDefinition, Outcome, SeparatorStrategy,
    StdPrompter,
};

fn definition() -> CommandDefinition {
    CommandDefinition::new("calc")
        .describe("Toy calculator demonstrating the tiller pipeline")
        .option(
            ArgumentDefinition::option("verbose")
                .short('v')
                .flag()
                .describe("Narrate what runs"),
        )
        .interceptor(|inv, ctx| {
            if inv.get_bool("verbose")? {
                ctx.console.err_line("calc: starting");
            }
            Ok(Outcome::Continue)
        })
        .subcommand(
            CommandDefinition::new("Add")
                .describe("Add two integers")
                .operand(ArgumentDefinition::operand("x").integer())
                .operand(ArgumentDefinition::operand("y").integer())
                .action(|inv, ctx| {
                    let sum = inv.get_i64("x")? + inv.get_i64("y")?;
                    ctx.console.out_line(sum.to_string());
                    Ok(0)
                }),
        )
        .subcommand(
            CommandDefinition::new("Sum")
                .describe("Sum any number of values")
                .operand(ArgumentDefinition::operand("values").float().collection().required())
                .option(ArgumentDefinition::option("round").flag())
                .action(|inv, ctx| {
                    let mut total: f64 = inv.many_f64("values")?.iter().sum();
                    if inv.get_bool("round")? {
                        total = total.round();
                    }
                    ctx.console.out_line(total.to_string());
                    Ok(0)
                }),
        )
        .subcommand(
            CommandDefinition::new("Divide")
                .describe("Divide x by y with configurable precision")
                .operand(ArgumentDefinition::operand("x").float())
                .operand(ArgumentDefinition::operand("y").float())
                .option(
                    ArgumentDefinition::option("precision")
                        .integer()
                        .optional()
                        .default_key("CALC_PRECISION")
                        .default_value("2")
                        .describe("Decimal places in the result"),
                )
                .action(|inv, ctx| {
                    let y = inv.get_f64("y")?;
                    if y == 0.0 {
                        anyhow::bail!("cannot divide by zero");
                    }
                    let precision = inv.try_get_i64("precision").unwrap_or(2).max(0) as usize;
                    let result = inv.get_f64("x")? / y;
                    ctx.console.out_line(format!("{result:.precision$}"));
                    Ok(0)
                }),
        )
}

fn main() {
    let settings = AppSettings {
        default_separator_strategy: SeparatorStrategy::EndOfOptions,
        enable_directives: true,
        ..Default::default()
    };

    let runner = AppRunner::new(definition())
        .settings(settings)
        .use_parse_directive()
        .use_defaults_from_process_env()
        .use_prompting(StdPrompter::new());

    let exit = runner.run(std::env::args().skip(1));
    std::process::exit(exit);
}
