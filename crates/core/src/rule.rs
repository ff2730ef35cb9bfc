use serde::{Deserialize, Serialize};

use crate::error::{MiningError, Result};
use crate::item::{ItemId, ItemUniverse};

/// Directional association rule `antecedent -> consequent`.
///
/// Both sides are disjoint, non-empty, and in canonical order; their union
/// is a frequent itemset. Supports are ratios over all transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub antecedent: Vec<ItemId>,
    pub consequent: Vec<ItemId>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of `antecedent ∪ consequent`.
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `+inf` when confidence is 1.
    #[serde(with = "inf_as_string")]
    pub conviction: f64,
    pub zhangs_metric: f64,
}

impl Rule {
    pub fn metric(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction,
            RuleMetric::ZhangsMetric => self.zhangs_metric,
        }
    }

    /// Number of items in the underlying frequent itemset.
    pub fn len(&self) -> usize {
        self.antecedent.len() + self.consequent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Union of both sides in canonical order.
    pub fn itemset(&self) -> Vec<ItemId> {
        let mut items: Vec<ItemId> = self
            .antecedent
            .iter()
            .chain(self.consequent.iter())
            .copied()
            .collect();
        items.sort_unstable();
        items
    }

    pub fn to_row(&self, universe: &ItemUniverse) -> RuleRow {
        RuleRow {
            antecedent: universe.labels_of(&self.antecedent),
            consequent: universe.labels_of(&self.consequent),
            antecedent_support: self.antecedent_support,
            consequent_support: self.consequent_support,
            support: self.support,
            confidence: self.confidence,
            lift: self.lift,
            leverage: self.leverage,
            conviction: self.conviction,
            zhangs_metric: self.zhangs_metric,
        }
    }
}

/// Labelled row of the rule output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRow {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    #[serde(with = "inf_as_string")]
    pub conviction: f64,
    pub zhangs_metric: f64,
}

/// Score a rule can be thresholded or ranked by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMetric {
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
    ZhangsMetric,
}

impl std::fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleMetric::Support => "support",
            RuleMetric::Confidence => "confidence",
            RuleMetric::Lift => "lift",
            RuleMetric::Leverage => "leverage",
            RuleMetric::Conviction => "conviction",
            RuleMetric::ZhangsMetric => "zhangs_metric",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for RuleMetric {
    type Err = MiningError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "support" => Ok(RuleMetric::Support),
            "confidence" => Ok(RuleMetric::Confidence),
            "lift" => Ok(RuleMetric::Lift),
            "leverage" => Ok(RuleMetric::Leverage),
            "conviction" => Ok(RuleMetric::Conviction),
            "zhangs_metric" | "zhang" => Ok(RuleMetric::ZhangsMetric),
            other => Err(MiningError::InvalidParameter(format!(
                "unknown rule metric '{other}'"
            ))),
        }
    }
}

/// JSON has no infinity; conviction of a certain rule is written as `"inf"`.
mod inf_as_string {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        struct ConvictionVisitor;

        impl Visitor<'_> for ConvictionVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a number or \"inf\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                match v {
                    "inf" | "Infinity" => Ok(f64::INFINITY),
                    other => Err(E::custom(format!("unexpected conviction '{other}'"))),
                }
            }
        }

        deserializer.deserialize_any(ConvictionVisitor)
    }
}
