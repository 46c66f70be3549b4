use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::types::{label, CompiledRef, CompiledRule, Resolution};
use crate::{ConfigError, Engine, EngineConfig, Rule, RuleRef};

pub(crate) fn compile<C, R>(config: EngineConfig<C, R>) -> Result<Engine<C, R>, ConfigError> {
    let EngineConfig {
        rules,
        facts,
        result_type,
    } = config;

    let validated = check_required(&rules)
        .and_then(|()| check_duplicates(&rules, facts.iter().map(|f| f.id.as_str())))
        .and_then(|()| {
            let rule_indices = index_rules(&rules);
            let fact_indices: HashMap<String, usize> = facts
                .iter()
                .enumerate()
                .map(|(i, f)| (f.id.clone(), i))
                .collect();
            check_references(&rules, &rule_indices, &fact_indices)?;
            check_cycles(&rules, &rule_indices)?;
            Ok((rule_indices, fact_indices))
        });

    let (rule_indices, fact_indices) = match validated {
        Ok(indices) => indices,
        Err(err) => {
            debug!(error = %err, "engine configuration rejected");
            return Err(err);
        }
    };

    let compiled_rules = rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| compile_rule(i, rule, &rule_indices, &fact_indices))
        .collect::<Result<Vec<_>, _>>()?;

    let (fact_ids, fact_tests) = facts.into_iter().map(|f| (f.id, f.test)).unzip();

    debug!(
        rules = compiled_rules.len(),
        facts = fact_indices.len(),
        result_type = ?result_type,
        "engine compiled"
    );

    Ok(Engine {
        rules: compiled_rules,
        facts: fact_tests,
        fact_ids,
        fact_indices,
        rule_indices,
        result_type,
    })
}

/// Every rule needs a test, and either an id or a result.
fn check_required<C, R>(rules: &[Rule<C, R>]) -> Result<(), ConfigError> {
    for (i, rule) in rules.iter().enumerate() {
        if rule.test.is_none() {
            return Err(ConfigError::MissingTest {
                rule: label(rule.id.as_deref(), i),
            });
        }
        if rule.id.is_none() && rule.result.is_none() {
            return Err(ConfigError::MissingIdentity { index: i });
        }
    }
    Ok(())
}

/// Rule ids and fact ids share one namespace.
fn check_duplicates<'a, C, R>(
    rules: &'a [Rule<C, R>],
    fact_ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for id in rules.iter().filter_map(|r| r.id.as_deref()).chain(fact_ids) {
        if !seen.insert(id) {
            return Err(ConfigError::DuplicateId { id: id.to_owned() });
        }
    }
    Ok(())
}

fn index_rules<C, R>(rules: &[Rule<C, R>]) -> HashMap<String, usize> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.id.as_ref().map(|id| (id.clone(), i)))
        .collect()
}

fn check_references<C, R>(
    rules: &[Rule<C, R>],
    rule_indices: &HashMap<String, usize>,
    fact_indices: &HashMap<String, usize>,
) -> Result<(), ConfigError> {
    for (i, rule) in rules.iter().enumerate() {
        for reference in rule.referenced_ids() {
            if !rule_indices.contains_key(reference) && !fact_indices.contains_key(reference) {
                return Err(ConfigError::UnknownReference {
                    rule: label(rule.id.as_deref(), i),
                    reference: reference.to_owned(),
                });
            }
        }
    }
    Ok(())
}

fn compile_rule<C, R>(
    index: usize,
    rule: Rule<C, R>,
    rule_indices: &HashMap<String, usize>,
    fact_indices: &HashMap<String, usize>,
) -> Result<CompiledRule<C, R>, ConfigError> {
    let label = label(rule.id.as_deref(), index);
    let test = rule.test.ok_or_else(|| ConfigError::MissingTest {
        rule: label.clone(),
    })?;
    let outcome = match (rule.result, rule.id) {
        (Some(outcome), _) => Resolution::Outcome(outcome),
        (None, Some(id)) => Resolution::Id(id),
        (None, None) => return Err(ConfigError::MissingIdentity { index }),
    };
    let intern = |refs: Vec<RuleRef<C>>| {
        refs.into_iter()
            .map(|r| intern_ref(r, &label, rule_indices, fact_indices))
            .collect::<Result<Vec<_>, _>>()
    };
    let and = intern(rule.and)?;
    let and_not = intern(rule.and_not)?;

    Ok(CompiledRule {
        label,
        test,
        outcome,
        and,
        and_not,
    })
}

fn intern_ref<C>(
    reference: RuleRef<C>,
    rule_label: &str,
    rule_indices: &HashMap<String, usize>,
    fact_indices: &HashMap<String, usize>,
) -> Result<CompiledRef<C>, ConfigError> {
    match reference {
        RuleRef::Id(id) => {
            if let Some(&idx) = rule_indices.get(&id) {
                Ok(CompiledRef::Rule(idx))
            } else if let Some(&idx) = fact_indices.get(&id) {
                Ok(CompiledRef::Fact(idx))
            } else {
                Err(ConfigError::UnknownReference {
                    rule: rule_label.to_owned(),
                    reference: id,
                })
            }
        }
        RuleRef::Condition(f) => Ok(CompiledRef::Condition(f)),
    }
}

/// Kahn's algorithm over rule-to-rule edges. If some rules never reach
/// in-degree zero, a depth-first search reports one cycle among them.
fn check_cycles<C, R>(
    rules: &[Rule<C, R>],
    rule_indices: &HashMap<String, usize>,
) -> Result<(), ConfigError> {
    // Facts have no outgoing edges, so only rule-to-rule edges matter.
    let adj: Vec<Vec<usize>> = rules
        .iter()
        .map(|rule| {
            rule.referenced_ids()
                .filter_map(|id| rule_indices.get(id).copied())
                .collect()
        })
        .collect();

    if topological_len(&adj) == rules.len() {
        return Ok(());
    }

    let cycle = find_cycle(&adj).unwrap_or_default();
    Err(ConfigError::CircularDependency {
        path: cycle
            .into_iter()
            .map(|idx| label(rules[idx].id.as_deref(), idx))
            .collect(),
    })
}

/// Number of rules Kahn's algorithm can order. Equals the rule count iff the
/// graph is acyclic.
fn topological_len(adj: &[Vec<usize>]) -> usize {
    // dependents[x] = rules that reference x
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); adj.len()];
    let mut in_degree = vec![0_usize; adj.len()];
    for (node, deps) in adj.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(node);
            in_degree[node] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..adj.len()).filter(|&n| in_degree[n] == 0).collect();
    let mut sorted = 0;
    while let Some(node) = queue.pop_front() {
        for &dependent in &dependents[node] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
        sorted += 1;
    }
    sorted
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// Depth-first search from every rule in declaration order; the first
/// back-edge found is returned as a path that repeats its first node at the
/// end. Uses an explicit stack of `(node, next edge)` pairs.
fn find_cycle(adj: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut state = vec![DfsState::Unvisited; adj.len()];

    for start in 0..adj.len() {
        if state[start] != DfsState::Unvisited {
            continue;
        }
        state[start] = DfsState::InStack;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(&neighbor) = adj[node].get(top.1) else {
                state[node] = DfsState::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;

            match state[neighbor] {
                DfsState::InStack => {
                    let pos = stack.iter().position(|&(n, _)| n == neighbor).unwrap_or(0);
                    let mut cycle: Vec<usize> = stack[pos..].iter().map(|&(n, _)| n).collect();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                DfsState::Unvisited => {
                    state[neighbor] = DfsState::InStack;
                    stack.push((neighbor, 0));
                }
                DfsState::Done => {}
            }
        }
    }
    None
}
