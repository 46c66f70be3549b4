mod strategies;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jules::{ConfigError, Engine, EngineConfig, ResultType, Rule, RunError};
use proptest::prelude::*;
use strategies::{arb_cycle, arb_rule_set};

// ---------------------------------------------------------------------------
// Determinism
//
// The same engine and criteria always produce the same results.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn determinism(gen in arb_rule_set(), x in any::<u8>()) {
        let engine = gen.compile(ResultType::ZeroOrMany);
        let first = engine.test(&x).unwrap();
        for _ in 0..5 {
            prop_assert_eq!(&first, &engine.test(&x).unwrap());
        }
    }

    #[test]
    fn determinism_recompile(gen in arb_rule_set(), x in any::<u8>()) {
        let a = gen.compile(ResultType::ZeroOrMany).test(&x).unwrap();
        let b = gen.compile(ResultType::ZeroOrMany).test(&x).unwrap();
        prop_assert_eq!(a, b);
    }
}

// ---------------------------------------------------------------------------
// Match semantics
//
// A plural call returns exactly the matching rules in declaration order.
// Singular calls return the first of them.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn plural_results_follow_declaration_order(gen in arb_rule_set(), x in any::<u8>()) {
        let expected = gen.expected(x);
        prop_assert_eq!(gen.compile(ResultType::ZeroOrMany).test(&x).unwrap(), expected.clone());

        match gen.compile(ResultType::Many).test(&x) {
            Ok(results) => prop_assert_eq!(results, expected),
            Err(err) => prop_assert!(false, "MANY must not fail: {err}"),
        }
    }

    #[test]
    fn zero_or_one_takes_first_match(gen in arb_rule_set(), x in any::<u8>()) {
        let engine = gen.compile(ResultType::ZeroOrOne);
        let expected = gen.expected(x).into_iter().next();
        prop_assert_eq!(engine.run(&x).unwrap(), expected.clone());
        prop_assert_eq!(engine.test(&x).unwrap(), expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn one_requires_a_match(gen in arb_rule_set(), x in any::<u8>()) {
        let engine = gen.compile(ResultType::One);
        match gen.expected(x).into_iter().next() {
            Some(first) => prop_assert_eq!(engine.run(&x).unwrap(), Some(first)),
            None => prop_assert!(
                matches!(engine.run(&x), Err(RunError::NoMatch { result_type: ResultType::One })),
                "expected NoMatch"
            ),
        }
    }

    #[test]
    fn detailed_report_agrees_with_test(gen in arb_rule_set(), x in any::<u8>()) {
        let engine = gen.compile(ResultType::One);
        let report = engine.run_detailed(&x).unwrap();
        prop_assert_eq!(report.matched(), gen.expected(x));
    }
}

// ---------------------------------------------------------------------------
// Evaluation order and memoization
//
// A rule is evaluated at most once per call, and anything it references
// that was evaluated finished before it did.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn each_test_runs_at_most_once_per_call(gen in arb_rule_set(), x in any::<u8>()) {
        let counters: Vec<Arc<AtomicUsize>> =
            (0..gen.rules.len()).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let engine = Engine::from_rules(gen.build_rules(Some(&counters))).unwrap();

        engine.test(&x).unwrap();
        for counter in &counters {
            prop_assert!(counter.load(Ordering::SeqCst) <= 1);
        }

        engine.test(&x).unwrap();
        for counter in &counters {
            prop_assert!(counter.load(Ordering::SeqCst) <= 2);
        }
    }

    #[test]
    fn references_finish_before_their_referrer(gen in arb_rule_set(), x in any::<u8>()) {
        let engine = gen.compile(ResultType::ZeroOrMany);
        let report = engine.run_detailed(&x).unwrap();
        let order = report.evaluation_order();

        let position = |name: &str| order.iter().position(|n| n == name);
        for rule in &gen.rules {
            let Some(at) = position(rule.name.as_str()) else { continue };
            for &j in rule.and.iter().chain(&rule.and_not) {
                if let Some(dep) = position(gen.rules[j].name.as_str()) {
                    prop_assert!(dep < at, "{} evaluated after {}", gen.rules[j].name, rule.name);
                }
            }
        }

        // no rule recorded twice
        let mut sorted = order.to_vec();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), order.len());
    }
}

// ---------------------------------------------------------------------------
// Validation
//
// Cycles and dangling references are rejected at construction.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn rings_are_rejected(edges in arb_cycle()) {
        let n = edges.len();
        let rules: Vec<Rule<u8>> = edges
            .iter()
            .enumerate()
            .map(|(i, &negated)| {
                let next = format!("rule_{}", (i + 1) % n);
                let rule = Rule::new(format!("rule_{i}")).test(|_: &u8, _| true);
                if negated { rule.and_not(next) } else { rule.and(next) }
            })
            .collect();

        match Engine::from_rules(rules) {
            Err(ConfigError::CircularDependency { path }) => {
                prop_assert_eq!(path.len(), n + 1);
                prop_assert_eq!(path.first(), path.last());
                prop_assert_eq!(path[0].as_str(), "rule_0");
            }
            other => prop_assert!(false, "expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn dangling_reference_is_rejected(gen in arb_rule_set(), negated in any::<bool>()) {
        let mut rules = gen.build_rules(None);
        let dangling = Rule::new("dangling").test(|_: &u8, _| true);
        rules.push(if negated { dangling.and_not("missing") } else { dangling.and("missing") });

        let config: EngineConfig<u8> = EngineConfig::new(rules);
        match Engine::from_config(config) {
            Err(ConfigError::UnknownReference { rule, reference }) => {
                prop_assert_eq!(rule, "dangling");
                prop_assert_eq!(reference, "missing");
            }
            other => prop_assert!(false, "expected an unknown reference, got {other:?}"),
        }
    }
}
