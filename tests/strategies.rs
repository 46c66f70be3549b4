use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jules::{Engine, EngineConfig, ResultType, Rule};
use proptest::prelude::*;
use proptest::sample::Index;

// Criteria are plain bytes; every generated test is a pure function of one.

/// A generated rule test.
#[derive(Debug, Clone, Copy)]
pub enum GenTest {
    AtLeast(u8),
    Below(u8),
    DivisibleBy(u8),
}

impl GenTest {
    #[must_use]
    pub fn holds(self, x: u8) -> bool {
        match self {
            GenTest::AtLeast(n) => x >= n,
            GenTest::Below(n) => x < n,
            GenTest::DivisibleBy(n) => x % n == 0,
        }
    }
}

fn arb_test() -> impl Strategy<Value = GenTest> {
    prop_oneof![
        any::<u8>().prop_map(GenTest::AtLeast),
        any::<u8>().prop_map(GenTest::Below),
        (1_u8..=5).prop_map(GenTest::DivisibleBy),
    ]
}

/// A generated rule. `and` and `and_not` hold indices of rules declared
/// after this one, so every generated set is acyclic and most references
/// point forward in declaration order.
#[derive(Debug, Clone)]
pub struct GenRule {
    pub name: String,
    pub test: GenTest,
    pub and: Vec<usize>,
    pub and_not: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct GenRuleSet {
    pub rules: Vec<GenRule>,
}

impl GenRuleSet {
    /// Build the engine rules, optionally counting calls to each test.
    #[must_use]
    pub fn build_rules(&self, counters: Option<&[Arc<AtomicUsize>]>) -> Vec<Rule<u8>> {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, gen)| {
                let test = gen.test;
                let counter = counters.map(|c| Arc::clone(&c[i]));
                let mut rule = Rule::new(gen.name.as_str()).test(move |x: &u8, _| {
                    if let Some(counter) = &counter {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    test.holds(*x)
                });
                for &j in &gen.and {
                    rule = rule.and(self.rules[j].name.as_str());
                }
                for &j in &gen.and_not {
                    rule = rule.and_not(self.rules[j].name.as_str());
                }
                rule
            })
            .collect()
    }

    /// Compile into an actual `Engine`.
    ///
    /// # Panics
    ///
    /// Panics if the generated rules fail to compile (should not happen
    /// with valid generators).
    #[must_use]
    pub fn compile(&self, result_type: ResultType) -> Engine<u8> {
        let config = EngineConfig::new(self.build_rules(None)).with_result_type(result_type);
        Engine::from_config(config).expect("generated rules should compile")
    }

    /// Reference evaluation: which rules match `x`, in declaration order.
    #[must_use]
    pub fn expected(&self, x: u8) -> Vec<String> {
        let n = self.rules.len();
        let mut matched = vec![false; n];
        // references only point forward, so evaluate back to front
        for i in (0..n).rev() {
            let rule = &self.rules[i];
            matched[i] = rule.test.holds(x)
                && rule.and.iter().all(|&j| matched[j])
                && !rule.and_not.iter().any(|&j| matched[j]);
        }
        self.rules
            .iter()
            .zip(matched)
            .filter(|(_, m)| *m)
            .map(|(rule, _)| rule.name.clone())
            .collect()
    }
}

/// Generate 1..=8 rules, each with up to two references to later rules.
pub fn arb_rule_set() -> impl Strategy<Value = GenRuleSet> {
    prop::collection::vec(
        (
            arb_test(),
            prop::collection::vec((any::<Index>(), any::<bool>()), 0..=2),
        ),
        1..=8,
    )
    .prop_map(|raw| {
        let n = raw.len();
        let rules = raw
            .into_iter()
            .enumerate()
            .map(|(i, (test, refs))| {
                let mut rule = GenRule {
                    name: format!("rule_{i}"),
                    test,
                    and: Vec::new(),
                    and_not: Vec::new(),
                };
                let later = n - i - 1;
                if later > 0 {
                    for (target, negated) in refs {
                        let j = i + 1 + target.index(later);
                        if negated {
                            rule.and_not.push(j);
                        } else {
                            rule.and.push(j);
                        }
                    }
                }
                rule
            })
            .collect();
        GenRuleSet { rules }
    })
}

/// Generate a ring of 1..=8 rules where rule `i` references rule `i + 1`
/// (wrapping), each edge either `and` (false) or `and_not` (true).
pub fn arb_cycle() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..=8)
}
