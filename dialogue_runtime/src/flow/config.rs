//! Player configuration and its TOML form.

use serde::{Deserialize, Serialize};

use super::PauseMask;
use crate::error::FlowError;
use crate::graph::{NodeId, PausableKind};

/// Configuration for a [`FlowPlayer`](super::FlowPlayer).
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// pause_on = ["line", "hub"]
/// explore_limit = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowPlayerConfig {
    /// Node kinds that halt traversal.
    pub pause_on: PauseMask,

    /// Hide invalid branches from callers.
    pub ignore_invalid_branches: bool,

    /// Maximum number of nodes on one exploration path.
    pub explore_limit: usize,

    /// Maximum number of nested shadow scopes.
    pub shadow_level_limit: u32,

    /// Node the player starts on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_on: Option<NodeId>,
}

impl Default for FlowPlayerConfig {
    fn default() -> Self {
        Self {
            pause_on: PauseMask::from_kinds([PausableKind::Container, PausableKind::Line]),
            ignore_invalid_branches: true,
            explore_limit: 128,
            shadow_level_limit: 10,
            start_on: None,
        }
    }
}

impl FlowPlayerConfig {
    /// Parse and validate a configuration from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, FlowError> {
        let config: Self = toml::from_str(source).map_err(|e| FlowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, FlowError> {
        toml::to_string(self).map_err(|e| FlowError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), FlowError> {
        if self.explore_limit == 0 {
            return Err(FlowError::Config("explore_limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FlowPlayerConfig::default();
        assert_eq!(config.pause_on.kinds(), vec![PausableKind::Container, PausableKind::Line]);
        assert!(config.ignore_invalid_branches);
        assert_eq!(config.explore_limit, 128);
        assert_eq!(config.shadow_level_limit, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = FlowPlayerConfig::from_toml_str(
            r#"
            pause_on = ["hub", "line"]
            explore_limit = 16
            "#,
        )
        .unwrap();

        assert!(config.pause_on.contains(PausableKind::Hub));
        assert!(!config.pause_on.contains(PausableKind::Container));
        assert_eq!(config.explore_limit, 16);
        assert_eq!(config.shadow_level_limit, 10);
        assert_eq!(config.start_on, None);
    }

    #[test]
    fn test_start_node_from_toml() {
        let id = NodeId::new();
        let config = FlowPlayerConfig::from_toml_str(&format!("start_on = \"{}\"", id)).unwrap();
        assert_eq!(config.start_on, Some(id));
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            FlowPlayerConfig::from_toml_str("explore_limit = 0"),
            Err(FlowError::Config(_))
        ));
        assert!(matches!(
            FlowPlayerConfig::from_toml_str("pause_on = [\"sometimes\"]"),
            Err(FlowError::Config(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = FlowPlayerConfig {
            explore_limit: 7,
            ..FlowPlayerConfig::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(FlowPlayerConfig::from_toml_str(&text).unwrap(), config);
    }
}
