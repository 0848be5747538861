//! Typed values and the conversion registry.
//!
//! Conversion from raw strings is keyed by the closed [`ScalarKind`] set, not
//! by runtime type introspection. The registry is populated at startup with
//! the standard conversions and may be replaced per kind before a run; it is
//! never mutated during one.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::argument::ScalarKind;

/// A converted argument value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<TypedValue>),
    /// An optional argument with no value from any source.
    None,
}

impl TypedValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TypedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Float(f) => Some(*f),
            TypedValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            TypedValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TypedValue::None)
    }

    /// The zero value bound when the precedence chain is exhausted and the
    /// arity permits zero values.
    pub fn zero(kind: ScalarKind, collection: bool) -> TypedValue {
        if collection {
            return TypedValue::List(Vec::new());
        }
        match kind {
            ScalarKind::Boolean => TypedValue::Boolean(false),
            _ => TypedValue::None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Text(s) => write!(f, "{s}"),
            TypedValue::Integer(i) => write!(f, "{i}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Boolean(b) => write!(f, "{b}"),
            TypedValue::List(items) => {
                let rendered: Vec<String> = items.iter().map(|i| i.to_string()).collect();
                write!(f, "{}", rendered.join(","))
            }
            TypedValue::None => Ok(()),
        }
    }
}

/// Conversion function for one scalar kind. The error string is the
/// human-readable reason embedded in the resulting conversion error.
pub type ConvertFn = Rc<dyn Fn(&str) -> Result<TypedValue, String>>;

/// Registry mapping each [`ScalarKind`] to its conversion function.
#[derive(Clone)]
pub struct TypeDescriptorRegistry {
    descriptors: HashMap<ScalarKind, ConvertFn>,
}

impl TypeDescriptorRegistry {
    /// Replaces the conversion for a scalar kind.
    pub fn register<F>(&mut self, kind: ScalarKind, convert: F)
    where
        F: Fn(&str) -> Result<TypedValue, String> + 'static,
    {
        self.descriptors.insert(kind, Rc::new(convert));
    }

    /// Converts one raw value.
    pub fn convert(&self, kind: ScalarKind, raw: &str) -> Result<TypedValue, String> {
        let convert = self
            .descriptors
            .get(&kind)
            .expect("registry is constructed with every scalar kind");
        convert(raw)
    }
}

impl Default for TypeDescriptorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            descriptors: HashMap::new(),
        };
        registry.register(ScalarKind::Text, |raw| Ok(TypedValue::Text(raw.to_string())));
        registry.register(ScalarKind::Integer, |raw| {
            raw.parse::<i64>()
                .map(TypedValue::Integer)
                .map_err(|_| "expected an integer".to_string())
        });
        registry.register(ScalarKind::Float, |raw| {
            raw.parse::<f64>()
                .map(TypedValue::Float)
                .map_err(|_| "expected a number".to_string())
        });
        registry.register(ScalarKind::Boolean, |raw| match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(TypedValue::Boolean(true)),
            "false" => Ok(TypedValue::Boolean(false)),
            _ => Err("expected 'true' or 'false'".to_string()),
        });
        registry
    }
}

impl fmt::Debug for TypeDescriptorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptorRegistry")
            .field("kinds", &self.descriptors.keys().collect::<Vec<_>>())
            .finish()
    }
}
