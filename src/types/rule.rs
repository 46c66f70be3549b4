use std::fmt;
use std::sync::Arc;

use super::error::BoxError;
use super::fact::FactMap;

pub(crate) type TestFn<C> =
    Arc<dyn Fn(&C, &FactMap<'_>) -> Result<bool, BoxError> + Send + Sync>;
pub(crate) type ConditionFn<C> = Arc<dyn Fn(&C) -> Result<bool, BoxError> + Send + Sync>;
pub(crate) type ResultFn<C, R> = Arc<dyn Fn(&C) -> Result<R, BoxError> + Send + Sync>;

/// Reference used in a rule's `and` / `and_not` lists.
///
/// An `Id` names another rule or a fact and is validated when the engine is
/// built. A `Condition` is an opaque predicate over the criteria.
pub enum RuleRef<C> {
    Id(String),
    Condition(ConditionFn<C>),
}

/// Inline condition for `and` / `and_not`.
pub fn condition<C>(f: impl Fn(&C) -> bool + Send + Sync + 'static) -> RuleRef<C> {
    RuleRef::try_condition(move |c| Ok(f(c)))
}

impl<C> RuleRef<C> {
    /// Fallible inline condition. A failure aborts the run with
    /// [`EvaluationError::Condition`](crate::EvaluationError::Condition).
    pub fn try_condition(
        f: impl Fn(&C) -> Result<bool, BoxError> + Send + Sync + 'static,
    ) -> Self {
        RuleRef::Condition(Arc::new(f))
    }

    #[must_use]
    pub fn as_id(&self) -> Option<&str> {
        match self {
            RuleRef::Id(id) => Some(id),
            RuleRef::Condition(_) => None,
        }
    }
}

impl<C> From<&str> for RuleRef<C> {
    fn from(id: &str) -> Self {
        RuleRef::Id(id.to_owned())
    }
}

impl<C> From<String> for RuleRef<C> {
    fn from(id: String) -> Self {
        RuleRef::Id(id)
    }
}

impl<C> Clone for RuleRef<C> {
    fn clone(&self) -> Self {
        match self {
            RuleRef::Id(id) => RuleRef::Id(id.clone()),
            RuleRef::Condition(f) => RuleRef::Condition(Arc::clone(f)),
        }
    }
}

impl<C> fmt::Debug for RuleRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleRef::Id(id) => f.debug_tuple("Id").field(id).finish(),
            RuleRef::Condition(_) => f.write_str("Condition(..)"),
        }
    }
}

/// What a matched rule produces.
pub enum Outcome<C, R> {
    Static(R),
    Computed(ResultFn<C, R>),
}

impl<C, R: Clone> Clone for Outcome<C, R> {
    fn clone(&self) -> Self {
        match self {
            Outcome::Static(v) => Outcome::Static(v.clone()),
            Outcome::Computed(f) => Outcome::Computed(Arc::clone(f)),
        }
    }
}

impl<C, R: fmt::Debug> fmt::Debug for Outcome<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Outcome::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A rule: a test over criteria and facts, an optional result, and optional
/// references that must (`and`) or must not (`and_not`) hold.
///
/// The test is required; building an engine from a rule without one fails
/// with [`ConfigError::MissingTest`](crate::ConfigError::MissingTest). A rule
/// with no result resolves to its id, so a rule needs at least one of the two.
///
/// ```
/// use jules::{Rule, condition};
///
/// struct Applicant { age: u32, location: String }
///
/// let senior: Rule<Applicant> = Rule::new("SENIOR")
///     .test(|a: &Applicant, _| a.age >= if a.location == "FL" { 55 } else { 60 })
///     .result("Senior Membership")
///     .and("IN_US")
///     .and_not(condition(|a: &Applicant| a.location == "CA"));
/// assert_eq!(senior.id(), Some("SENIOR"));
/// ```
pub struct Rule<C, R = String> {
    pub(crate) id: Option<String>,
    pub(crate) test: Option<TestFn<C>>,
    pub(crate) result: Option<Outcome<C, R>>,
    pub(crate) and: Vec<RuleRef<C>>,
    pub(crate) and_not: Vec<RuleRef<C>>,
}

impl<C, R> Rule<C, R> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::anonymous()
        }
    }

    /// A rule without an id. It cannot be referenced and must declare a result.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: None,
            test: None,
            result: None,
            and: Vec::new(),
            and_not: Vec::new(),
        }
    }

    #[must_use]
    pub fn test(self, f: impl Fn(&C, &FactMap<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.try_test(move |c, facts| Ok(f(c, facts)))
    }

    /// Fallible test. A failure aborts the run with
    /// [`EvaluationError::Rule`](crate::EvaluationError::Rule).
    #[must_use]
    pub fn try_test(
        mut self,
        f: impl Fn(&C, &FactMap<'_>) -> Result<bool, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.test = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn result(mut self, value: impl Into<R>) -> Self {
        self.result = Some(Outcome::Static(value.into()));
        self
    }

    /// Compute the result from the criteria that matched.
    #[must_use]
    pub fn result_with(self, f: impl Fn(&C) -> R + Send + Sync + 'static) -> Self {
        self.try_result_with(move |c| Ok(f(c)))
    }

    #[must_use]
    pub fn try_result_with(
        mut self,
        f: impl Fn(&C) -> Result<R, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.result = Some(Outcome::Computed(Arc::new(f)));
        self
    }

    /// Require a rule, fact, or inline condition to hold.
    #[must_use]
    pub fn and(mut self, reference: impl Into<RuleRef<C>>) -> Self {
        self.and.push(reference.into());
        self
    }

    /// Require a rule, fact, or inline condition not to hold.
    #[must_use]
    pub fn and_not(mut self, reference: impl Into<RuleRef<C>>) -> Self {
        self.and_not.push(reference.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Ids referenced through `and` followed by `and_not`, in declaration order.
    pub(crate) fn referenced_ids(&self) -> impl Iterator<Item = &str> {
        self.and
            .iter()
            .chain(self.and_not.iter())
            .filter_map(RuleRef::as_id)
    }
}

impl<C, R: Clone> Clone for Rule<C, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            test: self.test.clone(),
            result: self.result.clone(),
            and: self.and.clone(),
            and_not: self.and_not.clone(),
        }
    }
}

impl<C, R: fmt::Debug> fmt::Debug for Rule<C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("has_test", &self.test.is_some())
            .field("result", &self.result)
            .field("and", &self.and)
            .field("and_not", &self.and_not)
            .finish()
    }
}

/// A rule whose id references have been resolved to arena indices.
///
/// Produced by the compilation step and stored inside an
/// [`Engine`](super::Engine) in declaration order.
pub(crate) struct CompiledRule<C, R> {
    pub(crate) label: String,
    pub(crate) test: TestFn<C>,
    pub(crate) outcome: Resolution<C, R>,
    pub(crate) and: Vec<CompiledRef<C>>,
    pub(crate) and_not: Vec<CompiledRef<C>>,
}

pub(crate) enum CompiledRef<C> {
    Rule(usize),
    Fact(usize),
    Condition(ConditionFn<C>),
}

/// How a matched rule turns into a result. `Id` is the fallback for rules
/// declared without a result.
pub(crate) enum Resolution<C, R> {
    Outcome(Outcome<C, R>),
    Id(String),
}

/// Positional label for diagnostics: the id, or `#index` for anonymous rules.
pub(crate) fn label(id: Option<&str>, index: usize) -> String {
    id.map_or_else(|| format!("#{index}"), str::to_owned)
}
