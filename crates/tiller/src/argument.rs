//! The argument and arity model.
//!
//! Arguments come in two kinds: operands (positional) and options (named).
//! Each carries a semantic type (a scalar kind plus a shape) from which its
//! arity is derived deterministically at tree-build time and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};

/// Positional vs named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentKind {
    Operand,
    Option,
}

/// The underlying (non-nullable) value kind. Conversion from raw strings is
/// keyed by this closed set; see
/// [`TypeDescriptorRegistry`](crate::TypeDescriptorRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
}

/// How many values of the scalar kind the argument holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// Exactly one value.
    Scalar,
    /// Zero or one value.
    Optional,
    /// Zero or more values.
    Collection,
    /// A boolean option whose mere presence means true. Options only.
    Flag,
}

/// Whether a boolean option needs an explicit `true`/`false` value token or
/// is inferred from presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanMode {
    Implicit,
    Explicit,
}

/// Minimum and maximum count of values an argument accepts. `maximum: None`
/// means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    pub minimum: u32,
    pub maximum: Option<u32>,
}

impl Arity {
    pub const ZERO: Arity = Arity { minimum: 0, maximum: Some(0) };
    pub const EXACTLY_ONE: Arity = Arity { minimum: 1, maximum: Some(1) };
    pub const ZERO_OR_ONE: Arity = Arity { minimum: 0, maximum: Some(1) };

    /// Derives the arity from the semantic type. This is the only place
    /// arity is computed; it is fixed for the argument's lifetime.
    ///
    /// An implicit boolean flag consumes no value tokens at all, so its
    /// arity is {0,0}. An explicit boolean is an ordinary scalar.
    pub fn derive(shape: Shape, boolean_mode: Option<BooleanMode>, required: bool) -> Arity {
        match shape {
            Shape::Flag => Arity::ZERO,
            Shape::Scalar => match boolean_mode {
                Some(BooleanMode::Implicit) => Arity::ZERO,
                _ => Arity::EXACTLY_ONE,
            },
            Shape::Optional => Arity::ZERO_OR_ONE,
            Shape::Collection => Arity {
                minimum: u32::from(required),
                maximum: None,
            },
        }
    }

    pub fn allows_none(&self) -> bool {
        self.minimum == 0
    }

    pub fn requires_at_least_one(&self) -> bool {
        self.minimum >= 1
    }

    pub fn allows_many(&self) -> bool {
        self.maximum.map(|m| m > 1).unwrap_or(true)
    }

    /// True when a value token may still be consumed after `count` values.
    pub fn accepts_more(&self, count: u32) -> bool {
        self.maximum.map(|m| count < m).unwrap_or(true)
    }
}

/// Where a raw value came from. Recorded on every input value and surfaced
/// on the bound result so collaborators (and the parse directive) can report
/// provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    /// Token values from the argument vector.
    Argv,
    /// Appended later by a prompting collaborator.
    Prompt,
    /// A default-value provider backed by environment variables.
    EnvVar,
    /// A default-value provider backed by an app-settings collection.
    AppSetting,
    /// The argument's own declared default.
    DeclaredDefault,
    /// The semantic type's zero value (arity permitted zero values).
    TypeDefault,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Argv => write!(f, "argv"),
            ValueSource::Prompt => write!(f, "prompt"),
            ValueSource::EnvVar => write!(f, "environment variable"),
            ValueSource::AppSetting => write!(f, "app setting"),
            ValueSource::DeclaredDefault => write!(f, "declared default"),
            ValueSource::TypeDefault => write!(f, "type default"),
        }
    }
}

/// One batch of raw values with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValue {
    pub source: ValueSource,
    pub values: Vec<String>,
}

impl InputValue {
    pub fn new(source: ValueSource, values: Vec<String>) -> Self {
        Self { source, values }
    }

    pub fn single(source: ValueSource, value: impl Into<String>) -> Self {
        Self {
            source,
            values: vec![value.into()],
        }
    }
}

/// A fully-resolved argument as it lives in the command tree.
///
/// Construction happens exclusively through
/// [`CommandTree::build`](crate::CommandTree::build), which derives the arity
/// and validates the declaration; the fields are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub name: String,
    pub description: Option<String>,
    pub kind: ArgumentKind,
    pub scalar: ScalarKind,
    pub shape: Shape,
    /// Options only; `None` for operands and non-boolean options.
    pub boolean_mode: Option<BooleanMode>,
    /// Options only.
    pub short: Option<char>,
    /// Options only. Defaults to the argument name.
    pub long: Option<String>,
    pub arity: Arity,
    /// Declared default, as a raw string run through the same conversion as
    /// user input.
    pub default: Option<String>,
    /// Attribute-scoped key into the default-value providers.
    pub default_key: Option<String>,
    /// Optional closed set of permitted raw values.
    pub allowed_values: Vec<String>,
}

impl Argument {
    /// True for an implicit boolean option.
    pub fn is_flag(&self) -> bool {
        self.shape == Shape::Flag
            || (self.scalar == ScalarKind::Boolean && self.boolean_mode == Some(BooleanMode::Implicit))
    }

    /// Display name used in error messages: `--long` for options, the plain
    /// name for operands.
    pub fn display_name(&self) -> String {
        match self.kind {
            ArgumentKind::Operand => self.name.clone(),
            ArgumentKind::Option => match (&self.long, self.short) {
                (Some(long), _) => format!("--{long}"),
                (None, Some(short)) => format!("-{short}"),
                (None, None) => self.name.clone(),
            },
        }
    }

    /// Candidate keys for naming-convention default lookups: the dashed
    /// option forms, or the operand name.
    pub fn convention_keys(&self) -> Vec<String> {
        match self.kind {
            ArgumentKind::Operand => vec![self.name.clone()],
            ArgumentKind::Option => {
                let mut keys = Vec::new();
                if let Some(long) = &self.long {
                    keys.push(format!("--{long}"));
                }
                if let Some(short) = self.short {
                    keys.push(format!("-{short}"));
                }
                keys
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_derivation_is_deterministic() {
        assert_eq!(Arity::derive(Shape::Flag, Some(BooleanMode::Implicit), false), Arity::ZERO);
        assert_eq!(
            Arity::derive(Shape::Scalar, Some(BooleanMode::Explicit), true),
            Arity::EXACTLY_ONE
        );
        assert_eq!(Arity::derive(Shape::Scalar, None, true), Arity::EXACTLY_ONE);
        assert_eq!(Arity::derive(Shape::Optional, None, false), Arity::ZERO_OR_ONE);
        assert_eq!(
            Arity::derive(Shape::Collection, None, true),
            Arity { minimum: 1, maximum: None }
        );
        assert_eq!(
            Arity::derive(Shape::Collection, None, false),
            Arity { minimum: 0, maximum: None }
        );
    }

    #[test]
    fn implicit_boolean_scalar_consumes_nothing() {
        assert_eq!(Arity::derive(Shape::Scalar, Some(BooleanMode::Implicit), false), Arity::ZERO);
    }

    #[test]
    fn accepts_more_respects_bounds() {
        assert!(!Arity::ZERO.accepts_more(0));
        assert!(Arity::EXACTLY_ONE.accepts_more(0));
        assert!(!Arity::EXACTLY_ONE.accepts_more(1));
        let unbounded = Arity { minimum: 0, maximum: None };
        assert!(unbounded.accepts_more(1000));
    }
}
