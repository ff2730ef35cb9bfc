use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use basket_compute::SweepPlan;
use basket_core::{MetricThreshold, MiningConfig, RuleConfig};

/// CLI configuration loaded from TOML file.
///
/// Every key is optional; keys that are set override the environment
/// (`BASKET_*`), and command-line flags override both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub mining: MiningSection,

    #[serde(default)]
    pub rules: RuleSection,

    /// Grid for `basket sweep`
    #[serde(default)]
    pub sweep: SweepPlan,
}

/// `[mining]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_support: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_candidates: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tree_nodes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
}

/// `[rules]` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_lift: Option<f64>,
    /// Extra `metric >= min` filters, e.g. `{ metric = "leverage", min = 0.0 }`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<MetricThreshold>,
}

impl MiningSection {
    pub fn apply(&self, mut base: MiningConfig) -> MiningConfig {
        if let Some(s) = self.min_support {
            base.min_support = s;
        }
        if self.max_len.is_some() {
            base.max_len = self.max_len;
        }
        if let Some(parallel) = self.parallel {
            base.parallel = parallel;
        }
        if self.max_candidates.is_some() {
            base.limits.max_candidates = self.max_candidates;
        }
        if self.max_tree_nodes.is_some() {
            base.limits.max_tree_nodes = self.max_tree_nodes;
        }
        if self.time_limit_ms.is_some() {
            base.limits.time_limit_ms = self.time_limit_ms;
        }
        base
    }
}

impl RuleSection {
    pub fn apply(&self, mut base: RuleConfig) -> RuleConfig {
        if let Some(c) = self.min_confidence {
            base.min_confidence = c;
        }
        if self.min_lift.is_some() {
            base.min_lift = self.min_lift;
        }
        base.metric_filters.extend(self.filters.iter().copied());
        base
    }
}

impl CliConfig {
    /// Return the default config directory path: ~/.config/basket/
    pub fn default_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("basket");
        Ok(config_dir)
    }

    /// Return the default config file path.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::default_config_dir()?.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    /// Returns default config if the file does not exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            debug!(?config_path, "Loading config");
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read config: {}", config_path.display()))?;
            Self::parse(&content)
                .with_context(|| format!("failed to parse config: {}", config_path.display()))
        } else {
            debug!(?config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Environment, then the `[mining]` table.
    pub fn mining_config(&self) -> MiningConfig {
        self.mining.apply(MiningConfig::from_env())
    }

    /// Environment, then the `[rules]` table.
    pub fn rule_config(&self) -> RuleConfig {
        self.rules.apply(RuleConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_compute::Algorithm;
    use basket_core::RuleMetric;
    use std::io::Write;

    #[test]
    fn parses_all_tables() {
        let config = CliConfig::parse(
            r#"
[mining]
min_support = 0.05
max_len = 3
parallel = false
max_tree_nodes = 10000

[rules]
min_confidence = 0.4
filters = [{ metric = "leverage", min = 0.0 }]

[sweep]
min_supports = [0.1, 0.2]
algorithms = ["fp_growth"]
seed = 7
"#,
        )
        .unwrap();

        assert_eq!(config.mining.min_support, Some(0.05));
        assert_eq!(config.mining.parallel, Some(false));
        assert_eq!(config.rules.filters[0].metric, RuleMetric::Leverage);
        assert_eq!(config.sweep.min_supports, vec![0.1, 0.2]);
        assert_eq!(config.sweep.algorithms, vec![Algorithm::FpGrowth]);
        // Untouched sweep keys keep their defaults.
        assert_eq!(config.sweep.min_confidences, vec![0.2, 0.3, 0.4]);
        assert_eq!(config.sweep.seed, 7);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = CliConfig::parse("").unwrap();
        assert_eq!(config.mining, MiningSection::default());
        assert_eq!(config.sweep, SweepPlan::default());
    }

    #[test]
    fn sections_override_only_what_they_set() {
        let section = MiningSection {
            max_len: Some(2),
            ..MiningSection::default()
        };
        let base = MiningConfig::with_min_support(0.3);
        let merged = section.apply(base);
        assert_eq!(merged.min_support, 0.3);
        assert_eq!(merged.max_len, Some(2));
        assert!(merged.parallel);

        let rules = RuleSection {
            min_confidence: Some(0.9),
            ..RuleSection::default()
        }
        .apply(RuleConfig::default());
        assert_eq!(rules.min_confidence, 0.9);
        assert!(rules.min_lift.is_none());
    }

    #[test]
    fn load_reads_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rules]\nmin_lift = 1.5").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.rules.min_lift, Some(1.5));
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = CliConfig::load(path.to_str()).unwrap();
        assert!(config.mining.min_support.is_none());
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mining\nmin_support = ").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let err = CliConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }
}
