use std::collections::HashMap;
use std::fmt;

use super::error::{BoxError, ConfigError, RunError};
use super::fact::{Fact, FactFn};
use super::match_report::MatchReport;
use super::result_type::ResultType;
use super::rule::{CompiledRef, CompiledRule, Rule};

/// Canonical engine configuration: rules in declaration order, optional
/// facts, and an optional cardinality policy.
pub struct EngineConfig<C, R = String> {
    pub rules: Vec<Rule<C, R>>,
    pub facts: Vec<Fact<C>>,
    pub result_type: Option<ResultType>,
}

impl<C, R> EngineConfig<C, R> {
    #[must_use]
    pub fn new(rules: Vec<Rule<C, R>>) -> Self {
        Self {
            rules,
            facts: Vec::new(),
            result_type: None,
        }
    }

    #[must_use]
    pub fn with_fact(mut self, fact: Fact<C>) -> Self {
        self.facts.push(fact);
        self
    }

    #[must_use]
    pub fn with_result_type(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(result_type);
        self
    }
}

impl<C, R> Default for EngineConfig<C, R> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<C, R: fmt::Debug> fmt::Debug for EngineConfig<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("rules", &self.rules)
            .field("facts", &self.facts)
            .field("result_type", &self.result_type)
            .finish()
    }
}

/// Builder for constructing an [`Engine`].
///
/// Rules are defined via closures and compiled into an immutable, thread-safe
/// engine.
///
/// # Example
///
/// ```
/// use jules::{EngineBuilder, ResultType};
///
/// struct Applicant { age: u32, location: String }
///
/// let engine = EngineBuilder::<Applicant>::new()
///     .fact("IN_US", |a| a.location != "Cabo")
///     .rule("JUNIOR", |r| r.test(|a, _| (21..30).contains(&a.age)).and("IN_US"))
///     .rule("SENIOR", |r| r.test(|a, _| a.age >= 60).and("IN_US"))
///     .expect(ResultType::ZeroOrOne)
///     .build()
///     .unwrap();
///
/// let junior = Applicant { age: 26, location: "PA".into() };
/// assert_eq!(engine.run(&junior).unwrap().as_deref(), Some("JUNIOR"));
/// ```
pub struct EngineBuilder<C, R = String> {
    config: EngineConfig<C, R>,
}

impl<C, R> EngineBuilder<C, R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Define a rule with the given id. The closure must set a test.
    ///
    /// If no test is set, [`build()`](Self::build) fails with
    /// [`ConfigError::MissingTest`].
    #[must_use]
    pub fn rule(mut self, id: &str, f: impl FnOnce(Rule<C, R>) -> Rule<C, R>) -> Self {
        self.config.rules.push(f(Rule::new(id)));
        self
    }

    /// Define a rule without an id. It must set a result.
    #[must_use]
    pub fn anonymous_rule(mut self, f: impl FnOnce(Rule<C, R>) -> Rule<C, R>) -> Self {
        self.config.rules.push(f(Rule::anonymous()));
        self
    }

    #[must_use]
    pub fn add_rule(mut self, rule: Rule<C, R>) -> Self {
        self.config.rules.push(rule);
        self
    }

    #[must_use]
    pub fn fact(mut self, id: &str, test: impl Fn(&C) -> bool + Send + Sync + 'static) -> Self {
        self.config.facts.push(Fact::new(id, test));
        self
    }

    #[must_use]
    pub fn try_fact(
        mut self,
        id: &str,
        test: impl Fn(&C) -> Result<bool, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.config.facts.push(Fact::try_new(id, test));
        self
    }

    /// Set the cardinality policy.
    #[must_use]
    pub fn expect(mut self, result_type: ResultType) -> Self {
        self.config.result_type = Some(result_type);
        self
    }

    /// Validate and compile the rules into an immutable `Engine`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn build(self) -> Result<Engine<C, R>, ConfigError> {
        Engine::from_config(self.config)
    }
}

impl<C, R> Default for EngineBuilder<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A compiled, immutable rule engine. Thread-safe and designed to live behind `Arc`.
///
/// All per-call state (fact values, memoized rule matches) lives on the stack
/// of the call, so `run` and `test` may be issued concurrently.
pub struct Engine<C, R = String> {
    pub(crate) rules: Vec<CompiledRule<C, R>>,
    pub(crate) facts: Vec<FactFn<C>>,
    pub(crate) fact_ids: Vec<String>,
    pub(crate) fact_indices: HashMap<String, usize>,
    pub(crate) rule_indices: HashMap<String, usize>,
    pub(crate) result_type: Option<ResultType>,
}

impl<C, R> Engine<C, R> {
    /// Each predicate becomes a rule whose id is its position (`"0"`, `"1"`, ...).
    ///
    /// # Errors
    ///
    /// Never fails for well-formed input; the signature matches the other
    /// constructors.
    pub fn from_predicates<P>(predicates: impl IntoIterator<Item = P>) -> Result<Self, ConfigError>
    where
        P: Fn(&C) -> bool + Send + Sync + 'static,
    {
        let rules = predicates
            .into_iter()
            .enumerate()
            .map(|(i, p)| Rule::new(i.to_string()).test(move |c, _| p(c)))
            .collect();
        Self::from_config(EngineConfig::new(rules))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn from_rules(rules: impl IntoIterator<Item = Rule<C, R>>) -> Result<Self, ConfigError> {
        Self::from_config(EngineConfig::new(rules.into_iter().collect()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation fails.
    pub fn from_config(config: EngineConfig<C, R>) -> Result<Self, ConfigError> {
        crate::compile::compile(config)
    }

    #[must_use]
    pub fn builder() -> EngineBuilder<C, R> {
        EngineBuilder::new()
    }

    /// Replace the cardinality policy.
    #[must_use]
    pub fn expect(mut self, result_type: ResultType) -> Self {
        self.result_type = Some(result_type);
        self
    }

    /// The declared cardinality policy, if any.
    #[must_use]
    pub fn result_type(&self) -> Option<ResultType> {
        self.result_type
    }

    /// Rule labels in declaration order (`#index` for anonymous rules).
    #[must_use]
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.label.as_str()).collect()
    }

    #[must_use]
    pub fn fact_ids(&self) -> Vec<&str> {
        self.fact_ids.iter().map(String::as_str).collect()
    }

    /// Ids a rule references through `and` and `and_not`, in declaration
    /// order. Inline conditions are not listed.
    ///
    /// Returns `None` if the rule id is not found.
    #[must_use]
    pub fn dependencies_of(&self, rule_id: &str) -> Option<Vec<&str>> {
        let rule = &self.rules[*self.rule_indices.get(rule_id)?];
        Some(
            rule.and
                .iter()
                .chain(rule.and_not.iter())
                .filter_map(|r| match r {
                    CompiledRef::Rule(idx) => Some(self.rules[*idx].label.as_str()),
                    CompiledRef::Fact(idx) => Some(self.fact_ids[*idx].as_str()),
                    CompiledRef::Condition(_) => None,
                })
                .collect(),
        )
    }
}

impl<C, R> Engine<C, R>
where
    R: Clone + From<String>,
{
    /// Single-result entry point.
    ///
    /// Applies `ONE` unless a policy was declared. Under `ONE` zero matches is
    /// [`RunError::NoMatch`]; every other policy yields `Ok(None)`. With more
    /// than one match the first in declaration order wins.
    ///
    /// Every rule is still evaluated, so a failing closure anywhere aborts the
    /// call. Under a plural policy (`MANY`, `ZERO_OR_MANY`) this returns only
    /// the first match; use [`test()`](Self::test) to get all of them.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if a user closure fails or `ONE` finds no match.
    pub fn run(&self, criteria: &C) -> Result<Option<R>, RunError> {
        let policy = self.result_type.unwrap_or(ResultType::One);
        let mut results = crate::evaluate::select(self, criteria, policy, true)?;
        Ok(results.pop())
    }

    /// All-matches entry point.
    ///
    /// Applies `MANY` unless a policy was declared; a singular policy keeps
    /// only the first match in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if a user closure fails or `ONE` finds no match.
    pub fn test(&self, criteria: &C) -> Result<Vec<R>, RunError> {
        let policy = self.result_type.unwrap_or(ResultType::Many);
        crate::evaluate::select(self, criteria, policy, policy.is_singular())
    }

    /// Apply [`test()`](Self::test) to each criteria value independently.
    ///
    /// # Errors
    ///
    /// Returns the first [`RunError`] encountered.
    pub fn test_all<'a>(
        &self,
        criteria: impl IntoIterator<Item = &'a C>,
    ) -> Result<Vec<Vec<R>>, RunError>
    where
        C: 'a,
    {
        criteria.into_iter().map(|c| self.test(c)).collect()
    }

    /// Evaluate every rule and report all matches with diagnostics. No
    /// cardinality policy is applied.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Evaluation`] if a user closure fails.
    pub fn run_detailed(&self, criteria: &C) -> Result<MatchReport<R>, RunError> {
        Ok(crate::evaluate::evaluate_detailed(self, criteria)?)
    }
}

impl<C, R> fmt::Display for Engine<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Engine({} rules, {} facts, result type ",
            self.rules.len(),
            self.facts.len(),
        )?;
        match self.result_type {
            Some(rt) => write!(f, "{rt})"),
            None => write!(f, "default)"),
        }
    }
}

impl<C, R> fmt::Debug for Engine<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rules", &self.rule_ids())
            .field("facts", &self.fact_ids)
            .field("result_type", &self.result_type)
            .finish_non_exhaustive()
    }
}
