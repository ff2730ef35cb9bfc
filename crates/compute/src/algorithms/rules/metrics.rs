use basket_core::{MiningError, Result};

/// Interestingness scores of one rule `A -> C`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    pub conviction: f64,
    pub zhangs_metric: f64,
}

/// Score a rule from absolute transaction counts.
///
/// Confidence is taken from the counts directly so that a certain rule has a
/// confidence of exactly 1.0 and therefore an infinite conviction. A zero
/// antecedent or consequent count can only come from a broken itemset table
/// and is reported as an invariant violation.
pub fn score(count_union: u64, count_antecedent: u64, count_consequent: u64, total: usize) -> Result<Scores> {
    if count_antecedent == 0 || count_consequent == 0 || total == 0 {
        return Err(MiningError::InternalInvariantViolation(format!(
            "zero support while scoring rule (union={count_union}, antecedent={count_antecedent}, \
             consequent={count_consequent}, total={total})"
        )));
    }
    if count_union > count_antecedent || count_union > count_consequent {
        return Err(MiningError::InternalInvariantViolation(format!(
            "itemset support {count_union} exceeds a subset's support \
             (antecedent={count_antecedent}, consequent={count_consequent})"
        )));
    }

    let n = total as f64;
    let support = count_union as f64 / n;
    let antecedent_support = count_antecedent as f64 / n;
    let consequent_support = count_consequent as f64 / n;

    let confidence = count_union as f64 / count_antecedent as f64;
    let lift = confidence / consequent_support;
    let leverage = support - antecedent_support * consequent_support;

    Ok(Scores {
        antecedent_support,
        consequent_support,
        support,
        confidence,
        lift,
        leverage,
        conviction: conviction(confidence, consequent_support),
        zhangs_metric: zhangs_metric(support, antecedent_support, consequent_support),
    })
}

/// `(1 - support(C)) / (1 - confidence)`, infinite for a certain rule.
pub fn conviction(confidence: f64, consequent_support: f64) -> f64 {
    if confidence >= 1.0 {
        f64::INFINITY
    } else {
        (1.0 - consequent_support) / (1.0 - confidence)
    }
}

/// Zhang's metric in `[-1, 1]`; 0 when both the positive and negative
/// deviations vanish.
pub fn zhangs_metric(support: f64, antecedent_support: f64, consequent_support: f64) -> f64 {
    let numerator = support - antecedent_support * consequent_support;
    let denominator = (support * (1.0 - antecedent_support))
        .max(antecedent_support * (consequent_support - support));
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn grocery_milk_implies_bread() {
        // 4 transactions: {milk,bread} in 2, milk in 3, bread in 3.
        let s = score(2, 3, 3, 4).unwrap();
        assert!((s.support - 0.5).abs() < EPS);
        assert!((s.confidence - 2.0 / 3.0).abs() < EPS);
        assert!((s.lift - (2.0 / 3.0) / 0.75).abs() < EPS);
        assert!((s.leverage - (-0.0625)).abs() < EPS);
        assert!((s.conviction - 0.25 / (1.0 / 3.0)).abs() < EPS);
        assert!(s.zhangs_metric < 0.0);
    }

    #[test]
    fn certain_rule_has_infinite_conviction() {
        let s = score(2, 2, 3, 4).unwrap();
        assert_eq!(s.confidence, 1.0);
        assert!(s.conviction.is_infinite());
        assert!(s.conviction > 0.0);
    }

    #[test]
    fn zero_support_is_an_invariant_violation() {
        assert!(matches!(
            score(0, 0, 3, 4),
            Err(MiningError::InternalInvariantViolation(_))
        ));
        assert!(matches!(
            score(3, 2, 3, 4),
            Err(MiningError::InternalInvariantViolation(_))
        ));
    }

    #[test]
    fn zhang_is_zero_at_degenerate_denominator() {
        // Every transaction holds both sides.
        assert_eq!(zhangs_metric(1.0, 1.0, 1.0), 0.0);
        assert!((zhangs_metric(0.5, 0.5, 0.5) - 1.0).abs() < EPS);
    }
}
