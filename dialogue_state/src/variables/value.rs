//! Typed variable values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three kinds a dialogue variable can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Bool,
    Int,
    String,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableKind::Bool => "bool",
            VariableKind::Int => "int",
            VariableKind::String => "string",
        };
        f.write_str(name)
    }
}

/// The current value of a variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl VariableValue {
    /// The zero value for a kind: `false`, `0` or the empty string.
    pub fn default_for(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Bool => VariableValue::Bool(false),
            VariableKind::Int => VariableValue::Int(0),
            VariableKind::String => VariableValue::String(String::new()),
        }
    }

    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValue::Bool(_) => VariableKind::Bool,
            VariableValue::Int(_) => VariableKind::Int,
            VariableValue::String(_) => VariableKind::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            VariableValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            VariableValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Bool(value) => write!(f, "{}", value),
            VariableValue::Int(value) => write!(f, "{}", value),
            VariableValue::String(value) => write!(f, "\"{}\"", value),
        }
    }
}

impl From<bool> for VariableValue {
    fn from(value: bool) -> Self {
        VariableValue::Bool(value)
    }
}

impl From<i64> for VariableValue {
    fn from(value: i64) -> Self {
        VariableValue::Int(value)
    }
}

impl From<i32> for VariableValue {
    fn from(value: i32) -> Self {
        VariableValue::Int(value.into())
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::String(value)
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::String(value.to_string())
    }
}

/// Rust types that can be read back out of a [`VariableValue`].
///
/// `Default` supplies the value handed out for unknown or mistyped names.
pub trait VariableType: Sized + Default + Into<VariableValue> {
    const KIND: VariableKind;

    fn from_value(value: &VariableValue) -> Option<Self>;
}

impl VariableType for bool {
    const KIND: VariableKind = VariableKind::Bool;

    fn from_value(value: &VariableValue) -> Option<Self> {
        value.as_bool()
    }
}

impl VariableType for i64 {
    const KIND: VariableKind = VariableKind::Int;

    fn from_value(value: &VariableValue) -> Option<Self> {
        value.as_int()
    }
}

impl VariableType for String {
    const KIND: VariableKind = VariableKind::String;

    fn from_value(value: &VariableValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}
