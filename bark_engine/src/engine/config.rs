//! Engine configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

fn default_max_chain_depth() -> usize {
    8
}

/// Tunables for a [`RuleEngine`](super::RuleEngine).
///
/// ```toml
/// max_chain_depth = 4
/// rng_seed = 42
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How many rule firings may nest through zero-duration speech.
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: usize,

    /// Seed for probability rolls. `None` seeds from the OS.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_chain_depth: default_max_chain_depth(),
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Use a fixed seed so probability rolls repeat.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Limit on nested firings. Values below 1 are raised to 1.
    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth.max(1);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chain_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_chain_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_chain_depth, 8);

        let config = EngineConfig::from_toml_str("rng_seed = 7").unwrap();
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.max_chain_depth, 8);
    }

    #[test]
    fn test_rejects_zero_depth() {
        assert!(matches!(
            EngineConfig::from_toml_str("max_chain_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_chain_depth = \"deep\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_builder_depth_floor() {
        let config = EngineConfig::default().with_max_chain_depth(0);
        assert_eq!(config.max_chain_depth, 1);
        assert!(config.validate().is_ok());
        assert_eq!(EngineConfig::default().with_max_chain_depth(3).max_chain_depth, 3);
    }
}
