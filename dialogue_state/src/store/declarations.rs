//! Variable declarations loaded from TOML.
//!
//! Each top-level table is a namespace; each key inside it declares a
//! variable whose default value also fixes its kind:
//!
//! ```toml
//! [Game]
//! gold = 10
//! met_guard = false
//!
//! [Player]
//! name = "Avery"
//! ```

use super::VariableStore;
use crate::error::StateError;
use crate::variables::VariableValue;

impl VariableStore {
    /// Build a store from TOML declarations.
    pub fn from_toml_str(source: &str) -> Result<Self, StateError> {
        let mut store = Self::new();
        store.declare_from_toml_str(source)?;
        Ok(store)
    }

    /// Declare every variable listed in `source` on an existing store.
    pub fn declare_from_toml_str(&mut self, source: &str) -> Result<(), StateError> {
        let table: toml::Table =
            toml::from_str(source).map_err(|e| StateError::ParseDeclarations(e.to_string()))?;

        for (namespace, entries) in table {
            let entries = match entries {
                toml::Value::Table(entries) => entries,
                other => {
                    return Err(StateError::UnsupportedDeclaration {
                        name: namespace,
                        found: format!("{} (expected a namespace table)", other.type_str()),
                    })
                }
            };

            for (name, default) in entries {
                let full_name = format!("{}.{}", namespace, name);
                let initial = match default {
                    toml::Value::Boolean(value) => VariableValue::Bool(value),
                    toml::Value::Integer(value) => VariableValue::Int(value),
                    toml::Value::String(value) => VariableValue::String(value),
                    other => {
                        return Err(StateError::UnsupportedDeclaration {
                            name: full_name,
                            found: other.type_str().to_string(),
                        })
                    }
                };
                self.declare(&full_name, initial)?;
            }
        }

        tracing::debug!(variables = self.variable_count(), "loaded variable declarations");
        Ok(())
    }
}
