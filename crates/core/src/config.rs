use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{check_unit_threshold, MiningError, Result};
use crate::rule::RuleMetric;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str) -> Option<T> {
    profiled_env_opt(profile, key).and_then(|v| v.parse().ok())
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

/// Active profile from `BASKET_PROFILE` (empty = default).
pub fn active_profile() -> String {
    env_opt("BASKET_PROFILE").unwrap_or_default().to_uppercase()
}

// ── Resource limits ───────────────────────────────────────────

/// Caller-imposed ceilings for one mining call. `None` means unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Max candidates generated for any single Apriori level.
    #[serde(default)]
    pub max_candidates: Option<u64>,
    /// Max nodes in any single FP-tree (initial or conditional).
    #[serde(default)]
    pub max_tree_nodes: Option<u64>,
    /// Wall-clock ceiling for the whole call, in milliseconds.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl ResourceLimits {
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_candidates: profiled_env_parse(p, "BASKET_MAX_CANDIDATES"),
            max_tree_nodes: profiled_env_parse(p, "BASKET_MAX_TREE_NODES"),
            time_limit_ms: profiled_env_parse::<u64>(p, "BASKET_TIME_LIMIT_SECS")
                .map(|secs| secs.saturating_mul(1000)),
        }
    }
}

// ── Itemset mining ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Minimum support ratio in `(0, 1]`.
    #[serde(default = "default_min_support")]
    pub min_support: f64,
    /// Largest itemset size to emit. `None` = unbounded.
    #[serde(default)]
    pub max_len: Option<usize>,
    /// Shard counting / conditional mining across the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub limits: ResourceLimits,
}

fn default_min_support() -> f64 {
    0.01
}

fn default_parallel() -> bool {
    true
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: default_min_support(),
            max_len: None,
            parallel: default_parallel(),
            limits: ResourceLimits::default(),
        }
    }
}

impl MiningConfig {
    pub fn with_min_support(min_support: f64) -> Self {
        Self {
            min_support,
            ..Self::default()
        }
    }

    /// Build from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::for_profile(&active_profile())
    }

    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            min_support: profiled_env_parse(p, "BASKET_MIN_SUPPORT")
                .unwrap_or_else(default_min_support),
            max_len: profiled_env_parse(p, "BASKET_MAX_LEN"),
            parallel: profiled_env_bool(p, "BASKET_PARALLEL", default_parallel()),
            limits: ResourceLimits::from_env_profiled(p),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_threshold("min_support", self.min_support)?;
        if self.max_len == Some(0) {
            return Err(MiningError::InvalidParameter(
                "max_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Rule generation ───────────────────────────────────────────

/// Extra `metric >= threshold` filter applied after the confidence/lift gates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub metric: RuleMetric,
    pub min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Minimum confidence in `(0, 1]`.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default)]
    pub min_lift: Option<f64>,
    #[serde(default)]
    pub metric_filters: Vec<MetricThreshold>,
}

fn default_min_confidence() -> f64 {
    0.2
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_lift: None,
            metric_filters: Vec::new(),
        }
    }
}

impl RuleConfig {
    pub fn with_min_confidence(min_confidence: f64) -> Self {
        Self {
            min_confidence,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::for_profile(&active_profile())
    }

    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            min_confidence: profiled_env_parse(p, "BASKET_MIN_CONFIDENCE")
                .unwrap_or_else(default_min_confidence),
            min_lift: profiled_env_parse(p, "BASKET_MIN_LIFT"),
            metric_filters: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_threshold("min_confidence", self.min_confidence)?;
        if let Some(lift) = self.min_lift {
            if !lift.is_finite() || lift < 0.0 {
                return Err(MiningError::InvalidParameter(format!(
                    "min_lift must be a finite non-negative number, got {lift}"
                )));
            }
        }
        for filter in &self.metric_filters {
            if filter.min.is_nan() {
                return Err(MiningError::InvalidParameter(format!(
                    "threshold for {} is NaN",
                    filter.metric
                )));
            }
        }
        Ok(())
    }
}
