use thiserror::Error;

use super::result_type::ResultType;

/// Error type user closures may return from their fallible (`try_*`) forms.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Construction-time validation failure. No engine is produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate id '{id}'")]
    DuplicateId { id: String },

    #[error("unknown reference '{reference}' in rule '{rule}'")]
    UnknownReference { rule: String, reference: String },

    #[error("circular dependency detected: {}", path.join(" -> "))]
    CircularDependency { path: Vec<String> },

    #[error("rule '{rule}' has no test")]
    MissingTest { rule: String },

    #[error("rule at position {index} has neither an id nor a result")]
    MissingIdentity { index: usize },
}

/// A user-supplied closure failed while evaluating one criteria value.
///
/// Carries the id (or positional label) of the offending rule or fact. The
/// engine stays usable for later calls.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("fact '{fact}' failed: {source}")]
    Fact {
        fact: String,
        #[source]
        source: BoxError,
    },

    #[error("test of rule '{rule}' failed: {source}")]
    Rule {
        rule: String,
        #[source]
        source: BoxError,
    },

    #[error("inline condition of rule '{rule}' failed: {source}")]
    Condition {
        rule: String,
        #[source]
        source: BoxError,
    },

    #[error("result of rule '{rule}' failed: {source}")]
    Result {
        rule: String,
        #[source]
        source: BoxError,
    },
}

impl EvaluationError {
    /// Id or label of the rule or fact whose closure failed.
    #[must_use]
    pub fn origin(&self) -> &str {
        match self {
            EvaluationError::Fact { fact, .. } => fact,
            EvaluationError::Rule { rule, .. }
            | EvaluationError::Condition { rule, .. }
            | EvaluationError::Result { rule, .. } => rule,
        }
    }
}

/// Failure of a single `run`/`test` call.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error("no rule matched under result type {result_type}")]
    NoMatch { result_type: ResultType },
}
