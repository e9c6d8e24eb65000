use crate::error::{CoreError, CoreResult};
use crate::section::locator::{HeaderPattern, SectionLocator};
use serde::{Deserialize, Serialize};

pub const LOCATOR_CONFIG_VERSION: &str = "locator_patterns_v1";

/// Header pattern sets for every named section the engine splits on.
///
/// The thresholds are tuning parameters; `tools/corpus_probe` reports which
/// pattern won on a corpus of recorded outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocatorConfig {
    pub config_version: String,
    pub topology: Vec<HeaderPattern>,
    pub options: Vec<HeaderPattern>,
}

impl LocatorConfig {
    pub fn builtin() -> CoreResult<Self> {
        Self::from_json_str(include_str!("default_patterns.json"))
    }

    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let cfg: LocatorConfig = serde_json::from_str(json)?;
        if cfg.config_version != LOCATOR_CONFIG_VERSION {
            return Err(CoreError::Config(format!(
                "unsupported locator config version {}",
                cfg.config_version
            )));
        }
        Ok(cfg)
    }

    pub fn topology_locator(&self) -> CoreResult<SectionLocator> {
        SectionLocator::new(&self.topology)
    }

    pub fn options_locator(&self) -> CoreResult<SectionLocator> {
        SectionLocator::new(&self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_loads_and_compiles() {
        let cfg = LocatorConfig::builtin().unwrap();
        assert!(!cfg.topology.is_empty());
        assert!(!cfg.options.is_empty());
        cfg.topology_locator().unwrap();
        cfg.options_locator().unwrap();
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{"config_version":"v0","topology":[],"options":[]}"#;
        let err = LocatorConfig::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("unsupported locator config version"));
    }

    #[test]
    fn test_missing_threshold_defaults_to_zero() {
        let json = r#"{"config_version":"locator_patterns_v1","topology":[{"name":"t","pattern":"TOPO"}],"options":[]}"#;
        let cfg = LocatorConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.topology[0].min_position, 0.0);
        assert_eq!(cfg.topology[0].priority, 0);
    }
}
