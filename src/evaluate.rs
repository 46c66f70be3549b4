use std::time::Instant;

use tracing::{debug, trace};

use crate::types::{CompiledRef, CompiledRule, Resolution};
use crate::{
    Engine, EvaluationError, FactMap, MatchReport, MatchedRule, Outcome, ResultType, RunError,
};

/// State for a single call: fact values and memoized rule matches. Never
/// outlives the call that created it.
struct Evaluation<'e, 'c, C, R> {
    engine: &'e Engine<C, R>,
    criteria: &'c C,
    facts: FactMap<'e>,
    memo: Vec<Option<bool>>,
    /// Rule indices in the order their match was settled; detailed runs only.
    order: Option<Vec<usize>>,
}

/// Where a rule's match computation stands.
#[derive(Clone, Copy)]
enum Step {
    Test,
    And(usize),
    AndNot(usize),
}

/// A reference's value, or the rule it waits on.
enum Lookup {
    Known(bool),
    Pending(usize),
}

/// What to do with the rule on top of the work stack.
enum Action {
    Advance(Step),
    Descend(usize),
    Settle(bool),
}

impl<'e, 'c, C, R> Evaluation<'e, 'c, C, R> {
    fn new(
        engine: &'e Engine<C, R>,
        criteria: &'c C,
        record_order: bool,
    ) -> Result<Self, EvaluationError> {
        let facts = evaluate_facts(engine, criteria)?;
        Ok(Self {
            engine,
            criteria,
            facts,
            memo: vec![None; engine.rules.len()],
            order: record_order.then(|| Vec::with_capacity(engine.rules.len())),
        })
    }

    /// Whether the rule at `idx` matches: its own test, then every `and`
    /// reference, then no `and_not` reference. Computed once per call.
    ///
    /// Referenced rules are resolved on an explicit work stack, so chain
    /// depth is bounded by memory rather than the thread's stack.
    fn matches(&mut self, idx: usize) -> Result<bool, EvaluationError> {
        if let Some(matched) = self.memo[idx] {
            return Ok(matched);
        }

        let engine = self.engine;
        let mut stack = vec![(idx, Step::Test)];

        while let Some(&(current, step)) = stack.last() {
            let rule = &engine.rules[current];
            match self.step(rule, step)? {
                Action::Advance(next) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 = next;
                    }
                }
                // Revisits the same step once the referenced rule is settled.
                Action::Descend(dep) => stack.push((dep, Step::Test)),
                Action::Settle(matched) => {
                    trace!(rule = %rule.label, matched, "rule evaluated");
                    self.memo[current] = Some(matched);
                    if let Some(order) = &mut self.order {
                        order.push(current);
                    }
                    stack.pop();
                }
            }
        }

        Ok(self.memo[idx].unwrap_or(false))
    }

    fn step(&self, rule: &CompiledRule<C, R>, step: Step) -> Result<Action, EvaluationError> {
        Ok(match step {
            Step::Test => {
                if self.test(rule)? {
                    Action::Advance(Step::And(0))
                } else {
                    Action::Settle(false)
                }
            }
            Step::And(i) => match rule.and.get(i) {
                None => Action::Advance(Step::AndNot(0)),
                Some(reference) => match self.resolve(rule, reference)? {
                    Lookup::Pending(dep) => Action::Descend(dep),
                    Lookup::Known(true) => Action::Advance(Step::And(i + 1)),
                    Lookup::Known(false) => Action::Settle(false),
                },
            },
            Step::AndNot(i) => match rule.and_not.get(i) {
                None => Action::Settle(true),
                Some(reference) => match self.resolve(rule, reference)? {
                    Lookup::Pending(dep) => Action::Descend(dep),
                    Lookup::Known(true) => Action::Settle(false),
                    Lookup::Known(false) => Action::Advance(Step::AndNot(i + 1)),
                },
            },
        })
    }

    fn test(&self, rule: &CompiledRule<C, R>) -> Result<bool, EvaluationError> {
        (rule.test)(self.criteria, &self.facts).map_err(|source| EvaluationError::Rule {
            rule: rule.label.clone(),
            source,
        })
    }

    fn resolve(
        &self,
        rule: &CompiledRule<C, R>,
        reference: &CompiledRef<C>,
    ) -> Result<Lookup, EvaluationError> {
        match reference {
            CompiledRef::Fact(idx) => Ok(Lookup::Known(self.facts.by_index(*idx))),
            CompiledRef::Rule(idx) => Ok(match self.memo[*idx] {
                Some(matched) => Lookup::Known(matched),
                None => Lookup::Pending(*idx),
            }),
            CompiledRef::Condition(f) => f(self.criteria)
                .map(Lookup::Known)
                .map_err(|source| EvaluationError::Condition {
                    rule: rule.label.clone(),
                    source,
                }),
        }
    }

    /// Matching rule indices in declaration order. Every rule is evaluated,
    /// so a failure anywhere aborts the call regardless of policy.
    fn scan(&mut self) -> Result<Vec<usize>, EvaluationError> {
        let mut matched = Vec::new();
        for idx in 0..self.engine.rules.len() {
            if self.matches(idx)? {
                matched.push(idx);
            }
        }
        Ok(matched)
    }
}

fn evaluate_facts<'e, C, R>(
    engine: &'e Engine<C, R>,
    criteria: &C,
) -> Result<FactMap<'e>, EvaluationError> {
    let values = engine
        .facts
        .iter()
        .zip(&engine.fact_ids)
        .map(|(test, id)| {
            test(criteria).map_err(|source| EvaluationError::Fact {
                fact: id.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FactMap::new(&engine.fact_ids, &engine.fact_indices, values))
}

fn resolve_result<C, R>(rule: &CompiledRule<C, R>, criteria: &C) -> Result<R, EvaluationError>
where
    R: Clone + From<String>,
{
    match &rule.outcome {
        Resolution::Outcome(Outcome::Static(value)) => Ok(value.clone()),
        Resolution::Outcome(Outcome::Computed(f)) => {
            f(criteria).map_err(|source| EvaluationError::Result {
                rule: rule.label.clone(),
                source,
            })
        }
        Resolution::Id(id) => Ok(R::from(id.clone())),
    }
}

/// Evaluate every rule, resolve every match, then apply a cardinality
/// policy. With `single` only the first match in declaration order is kept.
pub(crate) fn select<C, R>(
    engine: &Engine<C, R>,
    criteria: &C,
    policy: ResultType,
    single: bool,
) -> Result<Vec<R>, RunError>
where
    R: Clone + From<String>,
{
    let mut evaluation = Evaluation::new(engine, criteria, false).map_err(log_failure)?;
    let matched = evaluation.scan().map_err(log_failure)?;

    if matched.is_empty() && policy.requires_match() {
        debug!(result_type = %policy, "no rule matched");
        return Err(RunError::NoMatch {
            result_type: policy,
        });
    }

    let mut results = matched
        .into_iter()
        .map(|idx| resolve_result(&engine.rules[idx], criteria))
        .collect::<Result<Vec<_>, _>>()
        .map_err(log_failure)?;
    if single {
        results.truncate(1);
    }
    Ok(results)
}

pub(crate) fn evaluate_detailed<C, R>(
    engine: &Engine<C, R>,
    criteria: &C,
) -> Result<MatchReport<R>, EvaluationError>
where
    R: Clone + From<String>,
{
    let start = Instant::now();

    let mut evaluation = Evaluation::new(engine, criteria, true)?;
    let matched = evaluation.scan()?;

    let matches = matched
        .into_iter()
        .map(|idx| -> Result<MatchedRule<R>, EvaluationError> {
            let rule = &engine.rules[idx];
            Ok(MatchedRule {
                rule: rule.label.clone(),
                index: idx,
                result: resolve_result(rule, criteria)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let evaluation_order = evaluation
        .order
        .iter()
        .flatten()
        .map(|&idx| engine.rules[idx].label.clone())
        .collect();
    let facts = evaluation
        .facts
        .iter()
        .map(|(id, value)| (id.to_owned(), value))
        .collect();

    Ok(MatchReport::new(
        matches,
        evaluation_order,
        facts,
        start.elapsed(),
    ))
}

fn log_failure(err: EvaluationError) -> EvaluationError {
    debug!(origin = err.origin(), error = %err, "evaluation failed");
    err
}
