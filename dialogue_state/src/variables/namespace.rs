//! Single variables and the namespaces that group them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{VariableKind, VariableValue};
use crate::error::StateError;

/// A declared variable with its shadow stack.
///
/// The kind is fixed at declaration; every later write must match it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    namespace: String,
    name: String,
    kind: VariableKind,
    value: VariableValue,

    /// Prior values saved by enclosing shadow scopes, innermost last.
    #[serde(skip)]
    shadow_stack: Vec<VariableValue>,
}

impl Variable {
    /// Create a variable whose kind is taken from its initial value.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        initial: impl Into<VariableValue>,
    ) -> Self {
        let value = initial.into();
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind: value.kind(),
            value,
            shadow_stack: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `Namespace.Variable` form used by scripts.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub fn value(&self) -> &VariableValue {
        &self.value
    }

    /// Overwrite the current value. Rejects values of another kind.
    pub fn set(&mut self, value: VariableValue) -> Result<(), StateError> {
        if value.kind() != self.kind {
            return Err(StateError::TypeMismatch {
                name: self.full_name(),
                expected: self.kind,
                found: value.kind(),
            });
        }
        self.value = value;
        Ok(())
    }

    /// Number of snapshots currently held.
    pub fn shadow_depth(&self) -> usize {
        self.shadow_stack.len()
    }

    pub(crate) fn push_shadow(&mut self) {
        self.shadow_stack.push(self.value.clone());
    }

    /// Restore the innermost snapshot. Returns `false` on an empty stack,
    /// leaving the current value untouched.
    pub(crate) fn pop_shadow(&mut self) -> bool {
        match self.shadow_stack.pop() {
            Some(previous) => {
                self.value = previous;
                true
            }
            None => false,
        }
    }
}

/// A named group of variables, e.g. `Game` in `Game.gold`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableNamespace {
    name: String,
    variables: HashMap<String, Variable>,
}

impl VariableNamespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a variable in this namespace.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        initial: impl Into<VariableValue>,
    ) -> Result<&Variable, StateError> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(StateError::DuplicateVariable(format!("{}.{}", self.name, name)));
        }
        let variable = Variable::new(self.name.clone(), name.clone(), initial);
        Ok(&*self.variables.entry(name).or_insert(variable))
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub(crate) fn variables_mut(&mut self) -> impl Iterator<Item = &mut Variable> {
        self.variables.values_mut()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
