#[cfg(test)]
mod tests {
    use basket_core::{
        FrequentItemsets, ItemId, MetricThreshold, MiningConfig, MiningError, RuleConfig,
        RuleMetric, TransactionStore,
    };

    use crate::algorithms::apriori::apriori;
    use crate::algorithms::rules::{association_rules, pair_cooccurrence, top_rules};

    const EPS: f64 = 1e-9;

    fn grocery() -> TransactionStore {
        TransactionStore::from_baskets(vec![
            vec!["milk", "bread"],
            vec!["milk", "bread", "butter"],
            vec!["bread"],
            vec!["milk"],
        ])
    }

    fn abc_store() -> TransactionStore {
        TransactionStore::from_baskets(vec![
            vec!["a", "b", "c"],
            vec!["a", "b", "c"],
            vec!["a", "b"],
            vec!["a", "c"],
            vec!["b", "c"],
            vec!["a"],
        ])
    }

    fn ids(raw: &[u32]) -> Vec<ItemId> {
        raw.iter().map(|&i| ItemId(i)).collect()
    }

    #[test]
    fn grocery_rules() {
        let store = grocery();
        let itemsets = apriori(&store, &MiningConfig::with_min_support(0.5)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.5)).unwrap();

        let milk = store.universe().id_of("milk").unwrap();
        let bread = store.universe().id_of("bread").unwrap();
        assert_eq!(rules.len(), 2);

        let rule = rules.iter().find(|r| r.antecedent == vec![milk]).unwrap();
        assert_eq!(rule.consequent, vec![bread]);
        assert!((rule.support - 0.5).abs() < EPS);
        assert!((rule.confidence - 2.0 / 3.0).abs() < EPS);
        assert!((rule.lift - 8.0 / 9.0).abs() < EPS);
        assert!((rule.leverage + 0.0625).abs() < EPS);
        assert!((rule.antecedent_support - 0.75).abs() < EPS);
        assert!((rule.consequent_support - 0.75).abs() < EPS);
    }

    #[test]
    fn confidence_threshold_filters() {
        let itemsets = apriori(&grocery(), &MiningConfig::with_min_support(0.5)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.7)).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn lift_threshold_filters() {
        let itemsets = apriori(&grocery(), &MiningConfig::with_min_support(0.5)).unwrap();
        let config = RuleConfig {
            min_confidence: 0.1,
            min_lift: Some(1.0),
            metric_filters: Vec::new(),
        };
        // Both grocery rules have lift 8/9.
        assert!(association_rules(&itemsets, &config).unwrap().is_empty());
    }

    #[test]
    fn metric_filters_apply_after_confidence() {
        let itemsets = apriori(&abc_store(), &MiningConfig::with_min_support(0.3)).unwrap();
        let base = RuleConfig::with_min_confidence(0.1);
        let all = association_rules(&itemsets, &base).unwrap();

        let filtered = association_rules(
            &itemsets,
            &RuleConfig {
                metric_filters: vec![MetricThreshold {
                    metric: RuleMetric::Leverage,
                    min: 0.0,
                }],
                ..base
            },
        )
        .unwrap();
        assert!(filtered.len() < all.len());
        assert!(filtered.iter().all(|r| r.leverage >= 0.0));
    }

    #[test]
    fn enumerates_every_split_of_larger_itemsets() {
        let store = abc_store();
        let itemsets = apriori(&store, &MiningConfig::with_min_support(0.3)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.01)).unwrap();

        // Three pairs give 2 rules each; the triple gives 6.
        assert_eq!(rules.len(), 12);
        let triple_rules = rules.iter().filter(|r| r.len() == 3).count();
        assert_eq!(triple_rules, 6);
    }

    #[test]
    fn output_order_is_size_then_antecedent() {
        let itemsets = apriori(&abc_store(), &MiningConfig::with_min_support(0.3)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.01)).unwrap();

        let keys: Vec<(usize, Vec<ItemId>, Vec<ItemId>)> = rules
            .iter()
            .map(|r| (r.len(), r.antecedent.clone(), r.consequent.clone()))
            .collect();
        assert_eq!(keys[0], (2, ids(&[0]), ids(&[1])));
        assert_eq!(keys[1], (2, ids(&[0]), ids(&[2])));
        assert_eq!(keys[6], (3, ids(&[0]), ids(&[1, 2])));
        assert_eq!(keys[11], (3, ids(&[1, 2]), ids(&[0])));
    }

    #[test]
    fn certain_rules_have_infinite_conviction() {
        let store = TransactionStore::from_baskets(vec![vec!["a", "b"], vec!["a", "b"], vec!["a"]]);
        let itemsets = apriori(&store, &MiningConfig::with_min_support(0.5)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.5)).unwrap();

        let b_to_a = rules.iter().find(|r| r.antecedent == ids(&[1])).unwrap();
        assert_eq!(b_to_a.confidence, 1.0);
        assert!(b_to_a.conviction.is_infinite());
    }

    #[test]
    fn missing_subset_is_an_invariant_violation() {
        let broken = FrequentItemsets::from_counts(4, vec![(ids(&[0]), 3), (ids(&[0, 1]), 2)]);
        let err = association_rules(&broken, &RuleConfig::with_min_confidence(0.1)).unwrap_err();
        assert!(matches!(err, MiningError::InternalInvariantViolation(_)));
    }

    #[test]
    fn superset_above_subset_is_an_invariant_violation() {
        let broken = FrequentItemsets::from_counts(
            4,
            vec![(ids(&[0]), 1), (ids(&[1]), 3), (ids(&[0, 1]), 2)],
        );
        let err = association_rules(&broken, &RuleConfig::with_min_confidence(0.1)).unwrap_err();
        assert!(matches!(err, MiningError::InternalInvariantViolation(_)));
    }

    #[test]
    fn empty_table_yields_no_rules() {
        let rules = association_rules(&FrequentItemsets::empty(0), &RuleConfig::default()).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn invalid_confidence_is_rejected() {
        let err = association_rules(&FrequentItemsets::empty(0), &RuleConfig::with_min_confidence(1.5))
            .unwrap_err();
        assert!(matches!(err, MiningError::InvalidParameter(_)));
    }

    #[test]
    fn top_rules_rank_by_metric() {
        let itemsets = apriori(&abc_store(), &MiningConfig::with_min_support(0.3)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.01)).unwrap();

        let top = top_rules(&rules, RuleMetric::Confidence, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        let best = rules.iter().map(|r| r.confidence).fold(f64::MIN, f64::max);
        assert_eq!(top[0].confidence, best);
    }

    #[test]
    fn cooccurrence_counts_pairs_across_rules() {
        let itemsets = apriori(&grocery(), &MiningConfig::with_min_support(0.5)).unwrap();
        let rules = association_rules(&itemsets, &RuleConfig::with_min_confidence(0.5)).unwrap();
        let pairs = pair_cooccurrence(&rules);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs.values().copied().sum::<usize>(), 2);
    }
}
