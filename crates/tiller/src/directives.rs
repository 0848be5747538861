//! The `[parse]` directive: parse introspection without execution.
//!
//! Opt-in via [`AppRunner::use_parse_directive`](crate::AppRunner::use_parse_directive)
//! (directives must be enabled in settings). A leading `[parse]` token
//! reports how the input parsed and short-circuits the pipeline before
//! anything is invoked; `[parse:t]` additionally reports the token
//! transformation history, and `[parse:json]` emits the report as JSON.
//!
//! When parsing fails, the runner's error path still prints the
//! transformation history, so the trace is available exactly when it is
//! most needed.

use serde_json::json;

use tiller_tokens::TokenCollection;

use crate::context::CommandContext;
use crate::transform::TransformLog;

pub(crate) const PARSE_DIRECTIVE: &str = "parse";

/// What the `[parse:...]` argument asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ParseDirectiveFlags {
    pub transformations: bool,
    pub json: bool,
}

/// Reads the `[parse]` directive off the current token collection.
pub(crate) fn requested(ctx: &CommandContext) -> Option<ParseDirectiveFlags> {
    let tokens = ctx.tokens.as_ref()?;
    let token = tokens.directive(PARSE_DIRECTIVE)?;
    let (_, args) = token.directive_parts()?;
    let mut flags = ParseDirectiveFlags::default();
    if let Some(args) = args {
        for flag in args.split(':') {
            match flag {
                "t" => flags.transformations = true,
                "json" => flags.json = true,
                _ => {}
            }
        }
    }
    Some(flags)
}

/// Renders the transformation history in the trace format:
///
/// ```text
/// token transformations:
///
/// >>> from shell
///   Directive: [parse:t]
///   Value    : Do
/// >>> after: expand-clubbed-flags (no changes)
/// >>> after: split-option-assignments (no changes)
/// ```
pub fn render_transform_trace(log: &TransformLog) -> String {
    let mut out = String::from("token transformations:\n\n");
    out.push_str(">>> from shell\n");
    if let Some(initial) = log.initial() {
        render_tokens(&mut out, initial);
    }
    for step in log.steps() {
        if step.changed {
            out.push_str(&format!(">>> after: {}\n", step.name));
            render_tokens(&mut out, &step.tokens);
        } else {
            out.push_str(&format!(">>> after: {} (no changes)\n", step.name));
        }
    }
    out
}

fn render_tokens(out: &mut String, tokens: &TokenCollection) {
    for token in tokens {
        out.push_str(&format!("  {:<9}: {}\n", token.token_type().to_string(), token.value()));
    }
}

/// Renders the parse report for a successfully parsed input.
pub(crate) fn render_parse_report(ctx: &CommandContext, flags: ParseDirectiveFlags) -> String {
    if flags.json {
        return render_json_report(ctx);
    }

    let tree = ctx.tree();
    let result = ctx.parse_result();

    let mut out = String::new();
    out.push_str(&format!("command: {}\n", tree.path(result.target_command()).join(" ")));

    let mut lines = Vec::new();
    for (id, inputs) in result.argument_values() {
        let argument = tree.argument(id);
        for input in inputs {
            lines.push(format!(
                "  {} = {} (from {})",
                argument.display_name(),
                input.values.join(", "),
                input.source
            ));
        }
    }
    if !lines.is_empty() {
        out.push_str("\narguments:\n");
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !result.separated_arguments().is_empty() {
        out.push_str(&format!("\nseparated: {}\n", result.separated_arguments().join(" ")));
    }
    if !result.remaining_operands().is_empty() {
        out.push_str(&format!("\nremaining: {}\n", result.remaining_operands().join(" ")));
    }

    if flags.transformations {
        out.push('\n');
        out.push_str(&render_transform_trace(&ctx.transform_log));
    } else {
        out.push_str("\nuse [parse:t] to see token transformations\n");
    }
    out
}

fn render_json_report(ctx: &CommandContext) -> String {
    let tree = ctx.tree();
    let result = ctx.parse_result();
    let arguments: Vec<_> = result
        .argument_values()
        .flat_map(|(id, inputs)| {
            let argument = tree.argument(id);
            inputs.iter().map(move |input| {
                json!({
                    "argument": argument.display_name(),
                    "values": input.values,
                    "source": input.source,
                })
            })
        })
        .collect();

    let report = json!({
        "command": tree.path(result.target_command()).join(" "),
        "arguments": arguments,
        "separated": result.separated_arguments(),
        "remaining": result.remaining_operands(),
    });
    serde_json::to_string_pretty(&report).unwrap_or_default()
}
