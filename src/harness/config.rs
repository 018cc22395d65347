use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{HarnessError, read_json};

/// Settings for `verify`, overridable per flag
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Random cases per kernel family and precision
    pub trials: usize,
    pub seed: u64,
    /// Largest row/column count of the random dynamic shapes
    pub max_dim: usize,
    /// Maximum relative error, measured against max(|expected|, 1)
    pub tolerance: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            trials: 64,
            seed: 0x5eed,
            max_dim: 16,
            tolerance: 1e-5,
        }
    }
}

/// Contents of a `--config` file; every section is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub verify: VerifyConfig,
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        read_json(path)
    }

    /// File contents when a path is given, defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, HarnessError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{ "verify": { "trials": 3, "tolerance": 1e-4 } }"#).unwrap();
        assert_eq!(config.verify.trials, 3);
        assert_eq!(config.verify.max_dim, 16);
        assert_eq!(config.verify.tolerance, 1e-4);
        assert_eq!(config.verify.seed, 0x5eed);
    }

    #[test]
    fn test_empty_config() {
        let config: HarnessConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.verify.trials, VerifyConfig::default().trials);
    }

    #[test]
    fn test_missing_file() {
        let err = HarnessConfig::load(Path::new("/nonexistent/simd_calc.json")).unwrap_err();
        assert!(matches!(err, HarnessError::Io { .. }));
    }
}
