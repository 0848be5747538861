//! Default-value providers.
//!
//! A provider is a key→string lookup consulted by the binder when an
//! argument received no input. Two kinds of keys exist:
//!
//! - **attribute-scoped keys**, declared on the argument itself via
//!   [`default_key`](crate::ArgumentDefinition::default_key); every provider
//!   serves these;
//! - **naming-convention keys**, derived from the argument's own names
//!   (`--long`, `-s`, or the operand name); only providers registered with
//!   naming conventions enabled serve these.
//!
//! Attribute-scoped hits always win over convention hits, regardless of
//! provider registration order.

use std::collections::HashMap;

use crate::argument::ValueSource;

/// An external key→string lookup.
pub trait DefaultValueProvider {
    /// Provenance tag recorded on values this provider supplies.
    fn source(&self) -> ValueSource;

    fn lookup(&self, key: &str) -> Option<String>;

    /// Whether this provider also serves naming-convention keys.
    fn includes_naming_conventions(&self) -> bool {
        false
    }
}

/// Environment-variable-backed provider.
///
/// Holds a snapshot taken at construction, so lookups during a run are pure
/// and testable; build one from a plain map in tests.
pub struct EnvVarProvider {
    vars: HashMap<String, String>,
}

impl EnvVarProvider {
    /// Snapshot the current process environment.
    pub fn from_process_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_map(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl DefaultValueProvider for EnvVarProvider {
    fn source(&self) -> ValueSource {
        ValueSource::EnvVar
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Settings-collection-backed provider.
pub struct AppSettingsProvider {
    settings: HashMap<String, String>,
    naming_conventions: bool,
}

impl AppSettingsProvider {
    pub fn from_map(settings: HashMap<String, String>) -> Self {
        Self {
            settings,
            naming_conventions: false,
        }
    }

    /// Also serve naming-convention keys (`--long`, `-s`, operand names).
    pub fn with_naming_conventions(mut self) -> Self {
        self.naming_conventions = true;
        self
    }
}

impl DefaultValueProvider for AppSettingsProvider {
    fn source(&self) -> ValueSource {
        ValueSource::AppSetting
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn includes_naming_conventions(&self) -> bool {
        self.naming_conventions
    }
}
