//! Scripting capability used for guards, conditions and instructions.
//!
//! The flow player never interprets expressions itself. It hands them to a
//! [`ScriptEngine`] together with the variable store, and treats any failure
//! as "condition false" or "instruction skipped".

mod rhai_engine;

pub use rhai_engine::*;

use dialogue_state::VariableStore;

use crate::error::ScriptError;

/// Evaluates conditions and executes instructions against a variable store.
pub trait ScriptEngine {
    /// Evaluate a boolean expression. Must not modify the store.
    fn evaluate(&self, expression: &str, variables: &VariableStore) -> Result<bool, ScriptError>;

    /// Execute an instruction, applying its writes to the store.
    ///
    /// On error the store must be left as it was.
    fn execute(&self, expression: &str, variables: &mut VariableStore) -> Result<(), ScriptError>;
}

impl<S: ScriptEngine + ?Sized> ScriptEngine for &S {
    fn evaluate(&self, expression: &str, variables: &VariableStore) -> Result<bool, ScriptError> {
        (**self).evaluate(expression, variables)
    }

    fn execute(&self, expression: &str, variables: &mut VariableStore) -> Result<(), ScriptError> {
        (**self).execute(expression, variables)
    }
}

/// Evaluate a guard or condition; errors count as `false`.
pub fn evaluate_or_false<S: ScriptEngine + ?Sized>(
    script: &S,
    expression: &str,
    variables: &VariableStore,
) -> bool {
    match script.evaluate(expression, variables) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(expression, error = %e, "condition treated as false");
            false
        }
    }
}

/// Execute an instruction; errors are logged and the instruction skipped.
///
/// Returns whether the instruction ran.
pub fn execute_or_skip<S: ScriptEngine + ?Sized>(
    script: &S,
    expression: &str,
    variables: &mut VariableStore,
) -> bool {
    match script.execute(expression, variables) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(expression, error = %e, "instruction skipped");
            false
        }
    }
}
