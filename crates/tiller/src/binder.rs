//! Argument binding: raw strings in, typed values out.
//!
//! For each argument on the invocation path the binder resolves a final raw
//! value list through a fixed precedence chain, highest first:
//!
//! 1. token values from the parse result,
//! 2. prompt-sourced values appended later,
//! 3. the argument's attribute-scoped provider key,
//! 4. a naming-convention provider key (`--long`, `-s`, operand name),
//! 5. the argument's declared default,
//! 6. the semantic type's zero value, when the arity permits zero values.
//!
//! An exhausted chain on a required argument fails the bind. Collection
//! arguments additionally split single raw values on commas, so one
//! provider entry `mars,pluto` yields two values.

use std::rc::Rc;

use crate::argument::{Argument, ArgumentKind, InputValue, Shape, ValueSource};
use crate::command::{ArgumentId, CommandId, CommandTree};
use crate::error::BindError;
use crate::parser::ParseResult;
use crate::providers::DefaultValueProvider;
use crate::types::{TypeDescriptorRegistry, TypedValue};

/// One command level of the invocation chain: interceptors first, the
/// target last. The invocation is populated during the BindValues stage.
#[derive(Debug)]
pub struct InvocationStep {
    pub command: CommandId,
    pub invocation: Option<Invocation>,
}

/// The chain of invocation steps from root to target.
#[derive(Debug, Default)]
pub struct InvocationPipeline {
    steps: Vec<InvocationStep>,
}

impl InvocationPipeline {
    pub(crate) fn from_chain(chain: Vec<CommandId>) -> Self {
        Self {
            steps: chain
                .into_iter()
                .map(|command| InvocationStep {
                    command,
                    invocation: None,
                })
                .collect(),
        }
    }

    pub fn steps(&self) -> &[InvocationStep] {
        &self.steps
    }

    pub(crate) fn steps_mut(&mut self) -> &mut [InvocationStep] {
        &mut self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A bound argument value with its provenance.
#[derive(Debug, Clone)]
pub struct BoundValue {
    pub name: String,
    pub kind: ArgumentKind,
    pub source: ValueSource,
    pub value: TypedValue,
}

/// The typed values for one command level, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    values: Vec<BoundValue>,
}

impl Invocation {
    pub fn values(&self) -> &[BoundValue] {
        &self.values
    }

    pub fn bound(&self, name: &str) -> Option<&BoundValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.bound(name).map(|v| &v.value)
    }

    pub fn source_of(&self, name: &str) -> Option<ValueSource> {
        self.bound(name).map(|v| v.source)
    }

    pub fn get_str(&self, name: &str) -> anyhow::Result<&str> {
        self.typed(name)?
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' has no text value"))
    }

    pub fn get_i64(&self, name: &str) -> anyhow::Result<i64> {
        self.typed(name)?
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' has no integer value"))
    }

    pub fn get_f64(&self, name: &str) -> anyhow::Result<f64> {
        self.typed(name)?
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' has no numeric value"))
    }

    pub fn get_bool(&self, name: &str) -> anyhow::Result<bool> {
        self.typed(name)?
            .as_bool()
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' has no boolean value"))
    }

    /// `None` when the argument bound to its empty zero value.
    pub fn try_get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(TypedValue::as_str)
    }

    pub fn try_get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(TypedValue::as_i64)
    }

    pub fn many_str(&self, name: &str) -> anyhow::Result<Vec<&str>> {
        self.list(name)?
            .iter()
            .map(|v| v.as_str().ok_or_else(|| anyhow::anyhow!("argument '{name}' holds non-text values")))
            .collect()
    }

    pub fn many_f64(&self, name: &str) -> anyhow::Result<Vec<f64>> {
        self.list(name)?
            .iter()
            .map(|v| v.as_f64().ok_or_else(|| anyhow::anyhow!("argument '{name}' holds non-numeric values")))
            .collect()
    }

    pub fn many_i64(&self, name: &str) -> anyhow::Result<Vec<i64>> {
        self.list(name)?
            .iter()
            .map(|v| v.as_i64().ok_or_else(|| anyhow::anyhow!("argument '{name}' holds non-integer values")))
            .collect()
    }

    fn typed(&self, name: &str) -> anyhow::Result<&TypedValue> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("unknown argument '{name}'"))
    }

    fn list(&self, name: &str) -> anyhow::Result<&[TypedValue]> {
        self.typed(name)?
            .as_list()
            .ok_or_else(|| anyhow::anyhow!("argument '{name}' is not a collection"))
    }
}

/// Binds every argument declared on `command`.
pub(crate) fn bind(
    tree: &CommandTree,
    parse_result: &ParseResult,
    providers: &[Rc<dyn DefaultValueProvider>],
    registry: &TypeDescriptorRegistry,
    command: CommandId,
) -> Result<Invocation, BindError> {
    let node = tree.command(command);
    let mut values = Vec::new();
    for &id in node.operands().iter().chain(node.options()) {
        values.push(bind_argument(tree, parse_result, providers, registry, id)?);
    }
    Ok(Invocation { values })
}

fn bind_argument(
    tree: &CommandTree,
    parse_result: &ParseResult,
    providers: &[Rc<dyn DefaultValueProvider>],
    registry: &TypeDescriptorRegistry,
    id: ArgumentId,
) -> Result<BoundValue, BindError> {
    let argument = tree.argument(id);
    let resolved = resolve_raw(argument, parse_result.values_of(id), providers);

    let (raws, source) = match resolved {
        Some(resolved) => resolved,
        None => {
            if argument.arity.allows_none() {
                return Ok(BoundValue {
                    name: argument.name.clone(),
                    kind: argument.kind,
                    source: ValueSource::TypeDefault,
                    value: TypedValue::zero(argument.scalar, argument.shape == Shape::Collection),
                });
            }
            return Err(BindError::RequiredArgumentMissing {
                argument: argument.display_name(),
            });
        }
    };

    let raws = if argument.shape == Shape::Collection {
        split_csv(raws)
    } else {
        raws
    };

    if let Some(maximum) = argument.arity.maximum {
        // Implicit flags record presence as one "true"; their zero maximum
        // refers to value tokens, which were never consumed.
        let effective_max = if argument.is_flag() { 1 } else { maximum };
        if raws.len() > effective_max as usize {
            return Err(BindError::ArityViolation {
                argument: argument.display_name(),
                maximum: effective_max,
                actual: raws.len(),
            });
        }
    }

    if !argument.allowed_values.is_empty() {
        for raw in &raws {
            if !argument.allowed_values.contains(raw) {
                return Err(BindError::ValueConversion {
                    argument: argument.display_name(),
                    value: raw.clone(),
                    reason: format!("must be one of: {}", argument.allowed_values.join(", ")),
                });
            }
        }
    }

    let mut typed = Vec::with_capacity(raws.len());
    for raw in &raws {
        let value = registry.convert(argument.scalar, raw).map_err(|reason| {
            BindError::ValueConversion {
                argument: argument.display_name(),
                value: raw.clone(),
                reason,
            }
        })?;
        typed.push(value);
    }

    let value = match argument.shape {
        Shape::Collection => TypedValue::List(typed),
        _ => typed.into_iter().next().unwrap_or(TypedValue::None),
    };

    Ok(BoundValue {
        name: argument.name.clone(),
        kind: argument.kind,
        source,
        value,
    })
}

/// Walks the precedence chain, returning the first hit.
fn resolve_raw(
    argument: &Argument,
    inputs: &[InputValue],
    providers: &[Rc<dyn DefaultValueProvider>],
) -> Option<(Vec<String>, ValueSource)> {
    for source in [ValueSource::Argv, ValueSource::Prompt] {
        let values: Vec<String> = inputs
            .iter()
            .filter(|i| i.source == source)
            .flat_map(|i| i.values.iter().cloned())
            .collect();
        if inputs.iter().any(|i| i.source == source) && !values.is_empty() {
            return Some((values, source));
        }
    }

    if let Some(key) = &argument.default_key {
        for provider in providers {
            if let Some(value) = provider.lookup(key) {
                return Some((vec![value], provider.source()));
            }
        }
    }

    for provider in providers {
        if !provider.includes_naming_conventions() {
            continue;
        }
        for key in argument.convention_keys() {
            if let Some(value) = provider.lookup(&key) {
                return Some((vec![value], provider.source()));
            }
        }
    }

    argument
        .default
        .as_ref()
        .map(|default| (vec![default.clone()], ValueSource::DeclaredDefault))
}

fn split_csv(raws: Vec<String>) -> Vec<String> {
    raws.into_iter()
        .flat_map(|raw| {
            raw.split(',')
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}
