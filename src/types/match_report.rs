use std::fmt;
use std::time::Duration;

/// A rule that matched during a detailed run, with its resolved result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRule<R> {
    /// Rule id, or `#index` for anonymous rules.
    pub rule: String,
    /// Position of the rule in declaration order.
    pub index: usize,
    pub result: R,
}

/// Detailed report returned by
/// [`Engine::run_detailed()`](super::Engine::run_detailed).
///
/// Lists every matching rule in declaration order with no cardinality policy
/// applied, the order in which rules were actually evaluated, the fact values
/// for the run, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct MatchReport<R> {
    matches: Vec<MatchedRule<R>>,
    evaluation_order: Vec<String>,
    facts: Vec<(String, bool)>,
    duration: Duration,
}

impl<R> MatchReport<R> {
    pub(crate) fn new(
        matches: Vec<MatchedRule<R>>,
        evaluation_order: Vec<String>,
        facts: Vec<(String, bool)>,
        duration: Duration,
    ) -> Self {
        Self {
            matches,
            evaluation_order,
            facts,
            duration,
        }
    }

    #[must_use]
    pub fn matches(&self) -> &[MatchedRule<R>] {
        &self.matches
    }

    /// Results of the matching rules, in declaration order.
    pub fn results(&self) -> impl Iterator<Item = &R> {
        self.matches.iter().map(|m| &m.result)
    }

    /// Labels of the matching rules, in declaration order.
    #[must_use]
    pub fn matched(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.rule.as_str()).collect()
    }

    /// Rule labels in the order their match state was computed. A rule
    /// reached through another rule's references appears before the rule
    /// that referenced it.
    #[must_use]
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    #[must_use]
    pub fn facts(&self) -> &[(String, bool)] {
        &self.facts
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Consume the report, keeping only the results.
    #[must_use]
    pub fn into_results(self) -> Vec<R> {
        self.matches.into_iter().map(|m| m.result).collect()
    }
}

impl<R> fmt::Display for MatchReport<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.matches.is_empty() {
            write!(f, "matched: none")?;
        } else {
            write!(f, "matched: [{}]", self.matched().join(", "))?;
        }
        write!(f, ", evaluated: [{}]", self.evaluation_order.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}
