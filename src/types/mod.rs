mod engine;
mod error;
mod fact;
mod match_report;
mod result_type;
mod rule;

pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::{BoxError, ConfigError, EvaluationError, RunError};
pub use fact::{Fact, FactMap};
pub use match_report::{MatchReport, MatchedRule};
pub use result_type::{ParseResultTypeError, ResultType};
pub use rule::{condition, Outcome, Rule, RuleRef};

pub(crate) use rule::{label, CompiledRef, CompiledRule, Resolution};
