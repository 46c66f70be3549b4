//! A declarative rule engine.
//!
//! Rules are guarded by a boolean test over caller-supplied criteria and may
//! require (`and`) or forbid (`and_not`) other rules and precomputed facts.
//! References are validated once at construction; evaluation is lock-free and
//! the compiled [`Engine`] can be shared across threads.

mod compile;
mod error;
mod evaluate;
mod types;

pub use error::JulesError;
pub use types::{
    condition, BoxError, ConfigError, Engine, EngineBuilder, EngineConfig, EvaluationError, Fact,
    FactMap, MatchReport, MatchedRule, Outcome, ParseResultTypeError, ResultType, Rule, RuleRef,
    RunError,
};
