//! Variable store.
//!
//! An owned name → value table that answers identifier lookups during
//! evaluation. Filled from definitions files and `-D` options.

use std::collections::HashMap;

use crate::expr::{Lookup, Value};

/// An owned variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum VarValue {
    Num(f64),
    Str(String),
}

impl VarValue {
    /// Borrowed view for evaluation.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            VarValue::Num(n) => Value::Num(*n),
            VarValue::Str(s) => Value::Str(s),
        }
    }
}

impl From<f64> for VarValue {
    fn from(n: f64) -> Self {
        VarValue::Num(n)
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::Str(s)
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::Str(s.to_owned())
    }
}

/// Variable table consulted by [`CompiledExpr::evaluate`](crate::CompiledExpr::evaluate).
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    vars: HashMap<String, VarValue>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<VarValue>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn set_num(&mut self, name: impl Into<String>, n: f64) {
        self.set(name, VarValue::Num(n));
    }

    pub fn get(&self, name: &str) -> Option<&VarValue> {
        self.vars.get(name)
    }

    /// Remove a variable.  Returns `true` if it existed.
    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    /// Returns `true` if the variable is set.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Copy every variable of `other` in, overwriting on conflict.
    pub fn merge(&mut self, other: VarStore) {
        self.vars.extend(other.vars);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Lookup for VarStore {
    fn lookup(&mut self, name: &str) -> Value<'_> {
        self.get(name).map_or(Value::None, VarValue::as_value)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
