use thiserror::Error;

use crate::{ConfigError, EvaluationError, RunError};

/// Unified error type covering construction and evaluation.
///
/// Every entry point returns its narrower error type; this enum lets callers
/// that build and run an engine in one function use `?` on both.
#[derive(Debug, Error)]
pub enum JulesError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Run(#[from] RunError),
}

impl From<EvaluationError> for JulesError {
    fn from(err: EvaluationError) -> Self {
        JulesError::Run(RunError::Evaluation(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResultType;

    #[test]
    fn config_error_is_transparent() {
        let err: JulesError = ConfigError::DuplicateId { id: "A".into() }.into();
        assert_eq!(err.to_string(), "duplicate id 'A'");
    }

    #[test]
    fn run_error_is_transparent() {
        let err: JulesError = RunError::NoMatch {
            result_type: ResultType::One,
        }
        .into();
        assert_eq!(err.to_string(), "no rule matched under result type ONE");
    }

    #[test]
    fn evaluation_error_lifts_into_run() {
        let err: JulesError = EvaluationError::Fact {
            fact: "IN_US".into(),
            source: "lookup failed".into(),
        }
        .into();
        assert!(matches!(
            err,
            JulesError::Run(RunError::Evaluation(EvaluationError::Fact { .. }))
        ));
    }
}
