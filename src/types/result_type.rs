use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Cardinality policy: how many matches a call reports and whether zero
/// matches is an error.
///
/// | policy        | 0 matches   | 1 match   | >1 matches                  |
/// |---------------|-------------|-----------|-----------------------------|
/// | `One`         | `NoMatch`   | the match | first in declaration order  |
/// | `ZeroOrOne`   | none        | the match | first in declaration order  |
/// | `Many`        | empty       | singleton | all, in declaration order   |
/// | `ZeroOrMany`  | empty       | singleton | all, in declaration order   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ResultType {
    ZeroOrOne,
    One,
    ZeroOrMany,
    Many,
}

impl ResultType {
    /// `true` for policies that report at most one match.
    #[must_use]
    pub fn is_singular(self) -> bool {
        matches!(self, ResultType::One | ResultType::ZeroOrOne)
    }

    /// `true` only for `One`, the policy under which zero matches is an error.
    #[must_use]
    pub fn requires_match(self) -> bool {
        self == ResultType::One
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResultType::ZeroOrOne => "ZERO_OR_ONE",
            ResultType::One => "ONE",
            ResultType::ZeroOrMany => "ZERO_OR_MANY",
            ResultType::Many => "MANY",
        }
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown result type '{0}'; expected ONE, ZERO_OR_ONE, MANY or ZERO_OR_MANY")]
pub struct ParseResultTypeError(String);

impl FromStr for ResultType {
    type Err = ParseResultTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ZERO_OR_ONE" => Ok(ResultType::ZeroOrOne),
            "ONE" => Ok(ResultType::One),
            "ZERO_OR_MANY" => Ok(ResultType::ZeroOrMany),
            "MANY" => Ok(ResultType::Many),
            _ => Err(ParseResultTypeError(s.to_owned())),
        }
    }
}
