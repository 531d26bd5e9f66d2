//! The variable store - every variable a conversation can read or change.
//!
//! Besides plain reads and writes the store supports *shadowing*:
//! [`VariableStore::push_state`] snapshots every variable and
//! [`VariableStore::pop_state`] restores the snapshot. Correctness depends only
//! on pushes and pops being strictly nested; the `level` argument is a sanity
//! counter used to report mismatched or runaway nesting.

mod declarations;
mod shadow;

pub use shadow::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::StateError;
use crate::variables::{Variable, VariableNamespace, VariableType, VariableValue};

/// Namespaced, typed variables with shadow stacks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableStore {
    namespaces: HashMap<String, VariableNamespace>,

    /// Number of currently open shadow snapshots.
    #[serde(skip)]
    shadow_level: u32,
}

/// Split `Namespace.Variable` into its two halves.
pub fn split_full_name(full_name: &str) -> Result<(&str, &str), StateError> {
    match full_name.split_once('.') {
        Some((namespace, name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace, name))
        }
        _ => Err(StateError::InvalidVariableName(full_name.to_string())),
    }
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable; its kind is taken from the initial value.
    ///
    /// Declaring is refused while a shadow scope is open, because the new
    /// variable would have no snapshot for the matching pop.
    pub fn declare(
        &mut self,
        full_name: &str,
        initial: impl Into<VariableValue>,
    ) -> Result<(), StateError> {
        let (namespace, name) = split_full_name(full_name)?;
        if self.is_shadowed() {
            return Err(StateError::DeclareWhileShadowed(full_name.to_string()));
        }

        self.namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| VariableNamespace::new(namespace))
            .declare(name, initial)?;
        Ok(())
    }

    /// Builder-style [`declare`](Self::declare).
    pub fn with_variable(
        mut self,
        full_name: &str,
        initial: impl Into<VariableValue>,
    ) -> Result<Self, StateError> {
        self.declare(full_name, initial)?;
        Ok(self)
    }

    pub fn namespace(&self, name: &str) -> Option<&VariableNamespace> {
        self.namespaces.get(name)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &VariableNamespace> {
        self.namespaces.values()
    }

    /// Iterate over every declared variable.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.namespaces.values().flat_map(|ns| ns.variables())
    }

    pub fn variable_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.len()).sum()
    }

    pub fn variable(&self, full_name: &str) -> Option<&Variable> {
        let (namespace, name) = split_full_name(full_name).ok()?;
        self.namespaces.get(namespace)?.get(name)
    }

    fn variable_mut(&mut self, full_name: &str) -> Result<&mut Variable, StateError> {
        let (namespace, name) = split_full_name(full_name)?;
        self.namespaces
            .get_mut(namespace)
            .and_then(|ns| ns.get_mut(name))
            .ok_or_else(|| StateError::UnknownVariable(full_name.to_string()))
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.variable(full_name).is_some()
    }

    /// The raw current value, if declared.
    pub fn value(&self, full_name: &str) -> Option<&VariableValue> {
        self.variable(full_name).map(|v| v.value())
    }

    /// Read a variable, failing on unknown names or a kind mismatch.
    pub fn try_get<T: VariableType>(&self, full_name: &str) -> Result<T, StateError> {
        let variable = self
            .variable(full_name)
            .ok_or_else(|| StateError::UnknownVariable(full_name.to_string()))?;

        T::from_value(variable.value()).ok_or_else(|| StateError::TypeMismatch {
            name: full_name.to_string(),
            expected: variable.kind(),
            found: T::KIND,
        })
    }

    /// Read a variable. Unknown or mistyped names yield the type default so
    /// that a typo in a script never stalls traversal.
    pub fn get<T: VariableType>(&self, full_name: &str) -> T {
        self.try_get(full_name).unwrap_or_else(|err| {
            tracing::warn!(variable = full_name, error = %err, "using default value");
            T::default()
        })
    }

    pub fn get_bool(&self, full_name: &str) -> bool {
        self.get(full_name)
    }

    pub fn get_int(&self, full_name: &str) -> i64 {
        self.get(full_name)
    }

    pub fn get_string(&self, full_name: &str) -> String {
        self.get(full_name)
    }

    /// Write a declared variable. The value must match the declared kind.
    pub fn set<T: Into<VariableValue>>(&mut self, full_name: &str, value: T) -> Result<(), StateError> {
        self.variable_mut(full_name)?.set(value.into())
    }

    pub fn set_bool(&mut self, full_name: &str, value: bool) -> Result<(), StateError> {
        self.set(full_name, value)
    }

    pub fn set_int(&mut self, full_name: &str, value: i64) -> Result<(), StateError> {
        self.set(full_name, value)
    }

    pub fn set_string(&mut self, full_name: &str, value: impl Into<String>) -> Result<(), StateError> {
        let value: String = value.into();
        self.set(full_name, value)
    }

    /// Add to an integer variable, returning the new value.
    pub fn add(&mut self, full_name: &str, amount: i64) -> Result<i64, StateError> {
        let current: i64 = self.try_get(full_name)?;
        let updated = current.saturating_add(amount);
        self.set(full_name, updated)?;
        Ok(updated)
    }

    /// Subtract from an integer variable, returning the new value.
    pub fn subtract(&mut self, full_name: &str, amount: i64) -> Result<i64, StateError> {
        self.add(full_name, amount.saturating_neg())
    }

    // ==================== SHADOW STATE ====================

    /// Snapshot every variable onto its shadow stack.
    ///
    /// `level` is the nesting level being entered and should be one past the
    /// current [`shadow_level`](Self::shadow_level).
    pub fn push_state(&mut self, level: u32) {
        let expected = self.shadow_level + 1;
        if level != expected {
            tracing::error!(level, expected, "shadow push out of sequence");
        }

        for namespace in self.namespaces.values_mut() {
            for variable in namespace.variables_mut() {
                variable.push_shadow();
            }
        }
        self.shadow_level = expected;
        tracing::trace!(level = self.shadow_level, "pushed variable state");
    }

    /// Restore every variable from its shadow stack.
    ///
    /// A variable whose stack is empty keeps its current value and the
    /// underflow is logged; no other variable is affected.
    pub fn pop_state(&mut self, level: u32) {
        if level != self.shadow_level {
            tracing::error!(level, current = self.shadow_level, "shadow pop out of sequence");
        }

        for namespace in self.namespaces.values_mut() {
            for variable in namespace.variables_mut() {
                if !variable.pop_shadow() {
                    tracing::error!(
                        variable = %variable.full_name(),
                        level,
                        "shadow stack underflow, keeping current value"
                    );
                }
            }
        }
        self.shadow_level = self.shadow_level.saturating_sub(1);
        tracing::trace!(level = self.shadow_level, "popped variable state");
    }

    /// Number of currently open snapshots.
    pub fn shadow_level(&self) -> u32 {
        self.shadow_level
    }

    pub fn is_shadowed(&self) -> bool {
        self.shadow_level > 0
    }
}
