//! Rhai-backed script engine.
//!
//! Each variable namespace is exposed to scripts as an object map, so
//! `Game.gold > 5` reads `Game.gold` and `Game.gold += 1` writes it back.
//! Names that were never declared read as the default of the type they are
//! compared with: `!Quest.done` holds and `Game.tries == 0` holds.

use rhai::{Dynamic, Engine, ImmutableString, Map, Scope, INT};

use dialogue_state::{StateError, VariableKind, VariableStore, VariableValue};

use super::ScriptEngine;
use crate::error::ScriptError;

/// Script engine evaluating expressions with Rhai.
pub struct RhaiScriptEngine {
    engine: Engine,
}

impl RhaiScriptEngine {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        Self::register_defaults(&mut engine);
        Self { engine }
    }

    /// Apply safety limits so a runaway script cannot stall the player.
    fn configure_engine(engine: &mut Engine) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);
    }

    /// Resolve undeclared names to their type defaults.
    ///
    /// An unknown namespace resolves to an empty map, and a key missing from
    /// a map reads as `()`. The operators below treat `()` as `false`, `0` or
    /// `""` depending on the other operand.
    fn register_defaults(engine: &mut Engine) {
        #[allow(deprecated)]
        engine.on_var(|name, _, context| {
            if context.scope().contains(name) {
                Ok(None)
            } else {
                Ok(Some(Dynamic::from_map(Map::new())))
            }
        });

        // The built-in fast path compares `()` with other types as unequal
        // before registered overloads are consulted.
        engine.set_fast_operators(false);

        engine
            .register_fn("!", |_: ()| true)
            .register_fn("==", |_: (), b: bool| !b)
            .register_fn("==", |b: bool, _: ()| !b)
            .register_fn("!=", |_: (), b: bool| b)
            .register_fn("!=", |b: bool, _: ()| b);

        engine
            .register_fn("==", |_: (), i: INT| i == 0)
            .register_fn("==", |i: INT, _: ()| i == 0)
            .register_fn("!=", |_: (), i: INT| i != 0)
            .register_fn("!=", |i: INT, _: ()| i != 0)
            .register_fn("<", |_: (), i: INT| 0 < i)
            .register_fn("<", |i: INT, _: ()| i < 0)
            .register_fn("<=", |_: (), i: INT| 0 <= i)
            .register_fn("<=", |i: INT, _: ()| i <= 0)
            .register_fn(">", |_: (), i: INT| 0 > i)
            .register_fn(">", |i: INT, _: ()| i > 0)
            .register_fn(">=", |_: (), i: INT| 0 >= i)
            .register_fn(">=", |i: INT, _: ()| i >= 0)
            .register_fn("+", |_: (), i: INT| i)
            .register_fn("+", |i: INT, _: ()| i)
            .register_fn("-", |_: (), i: INT| i.wrapping_neg())
            .register_fn("-", |i: INT, _: ()| i);

        engine
            .register_fn("==", |_: (), s: ImmutableString| s.is_empty())
            .register_fn("==", |s: ImmutableString, _: ()| s.is_empty())
            .register_fn("!=", |_: (), s: ImmutableString| !s.is_empty())
            .register_fn("!=", |s: ImmutableString, _: ()| !s.is_empty());
    }

    /// Check an expression for syntax errors without running it.
    pub fn check_syntax(&self, expression: &str) -> Result<(), ScriptError> {
        self.engine
            .compile(expression)
            .map(|_| ())
            .map_err(|e| ScriptError::Evaluation {
                expression: expression.to_string(),
                message: e.to_string(),
            })
    }

    /// Get a reference to the underlying Rhai engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Build a scope holding one object map per namespace.
    fn scope_for(variables: &VariableStore) -> Scope<'static> {
        let mut scope = Scope::new();
        for namespace in variables.namespaces() {
            let mut map = Map::new();
            for variable in namespace.variables() {
                map.insert(variable.name().into(), to_dynamic(variable.value()));
            }
            scope.push(namespace.name().to_string(), map);
        }
        scope
    }

    /// Read back every declared variable from the scope.
    ///
    /// All values are converted before any is written, so a bad write leaves
    /// the store untouched.
    fn write_back(
        expression: &str,
        scope: &Scope,
        variables: &mut VariableStore,
    ) -> Result<(), ScriptError> {
        let mut updates = Vec::new();

        for namespace in variables.namespaces() {
            let Some(map) = scope.get_value::<Map>(namespace.name()) else {
                return Err(ScriptError::Evaluation {
                    expression: expression.to_string(),
                    message: format!("namespace '{}' was replaced by a non-map value", namespace.name()),
                });
            };

            for variable in namespace.variables() {
                let Some(raw) = map.get(variable.name()) else {
                    continue;
                };
                let value = from_dynamic(raw, variable.kind()).ok_or_else(|| ScriptError::WriteBack {
                    expression: expression.to_string(),
                    source: StateError::TypeMismatch {
                        name: variable.full_name(),
                        expected: variable.kind(),
                        found: dynamic_kind(raw),
                    },
                })?;
                if &value != variable.value() {
                    updates.push((variable.full_name(), value));
                }
            }
        }

        for (full_name, value) in updates {
            tracing::trace!(expression, variable = %full_name, %value, "script wrote variable");
            variables
                .set(&full_name, value)
                .map_err(|source| ScriptError::WriteBack {
                    expression: expression.to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl Default for RhaiScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptEngine for RhaiScriptEngine {
    fn evaluate(&self, expression: &str, variables: &VariableStore) -> Result<bool, ScriptError> {
        let mut scope = Self::scope_for(variables);
        let result = self
            .engine
            .eval_with_scope::<Dynamic>(&mut scope, expression)
            .map_err(|e| ScriptError::Evaluation {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;

        // A bare undeclared name.
        if result.is_unit() {
            return Ok(false);
        }
        result.as_bool().map_err(|found| ScriptError::NotBoolean {
            expression: expression.to_string(),
            found: found.to_string(),
        })
    }

    fn execute(&self, expression: &str, variables: &mut VariableStore) -> Result<(), ScriptError> {
        let mut scope = Self::scope_for(variables);
        self.engine
            .run_with_scope(&mut scope, expression)
            .map_err(|e| ScriptError::Evaluation {
                expression: expression.to_string(),
                message: e.to_string(),
            })?;

        Self::write_back(expression, &scope, variables)
    }
}

fn to_dynamic(value: &VariableValue) -> Dynamic {
    match value {
        VariableValue::Bool(b) => Dynamic::from_bool(*b),
        VariableValue::Int(i) => Dynamic::from_int(*i),
        VariableValue::String(s) => Dynamic::from(s.clone()),
    }
}

fn from_dynamic(value: &Dynamic, kind: VariableKind) -> Option<VariableValue> {
    match kind {
        VariableKind::Bool => value.as_bool().ok().map(VariableValue::Bool),
        VariableKind::Int => value.as_int().ok().map(VariableValue::Int),
        VariableKind::String => value.clone().into_string().ok().map(VariableValue::String),
    }
}

/// Closest variable kind for a script value, for error reporting.
fn dynamic_kind(value: &Dynamic) -> VariableKind {
    if value.is_bool() {
        VariableKind::Bool
    } else if value.is_int() {
        VariableKind::Int
    } else {
        VariableKind::String
    }
}
