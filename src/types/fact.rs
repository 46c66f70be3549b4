use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::BoxError;

pub(crate) type FactFn<C> = Arc<dyn Fn(&C) -> Result<bool, BoxError> + Send + Sync>;

/// A named boolean derived from criteria, computed once per run before any
/// rule is tested.
///
/// Facts see only the criteria: they cannot reference rules or other facts,
/// and the order in which facts are evaluated is unspecified. Fact tests are
/// expected to be pure.
pub struct Fact<C> {
    pub(crate) id: String,
    pub(crate) test: FactFn<C>,
}

impl<C> Fact<C> {
    pub fn new(id: impl Into<String>, test: impl Fn(&C) -> bool + Send + Sync + 'static) -> Self {
        Self::try_new(id, move |c| Ok(test(c)))
    }

    /// Like [`new`](Self::new), but the test may fail. A failure aborts the
    /// run with [`EvaluationError::Fact`](crate::EvaluationError::Fact).
    pub fn try_new(
        id: impl Into<String>,
        test: impl Fn(&C) -> Result<bool, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            test: Arc::new(test),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<C> Clone for Fact<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            test: Arc::clone(&self.test),
        }
    }
}

impl<C> fmt::Debug for Fact<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fact").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Fact values for a single run, handed to every rule test.
#[derive(Debug, Clone)]
pub struct FactMap<'a> {
    ids: &'a [String],
    indices: &'a HashMap<String, usize>,
    values: Vec<bool>,
}

impl<'a> FactMap<'a> {
    pub(crate) fn new(
        ids: &'a [String],
        indices: &'a HashMap<String, usize>,
        values: Vec<bool>,
    ) -> Self {
        Self {
            ids,
            indices,
            values,
        }
    }

    /// Value of the fact with the given id, or `None` if no such fact exists.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<bool> {
        self.indices.get(id).map(|&idx| self.values[idx])
    }

    /// Value of the fact with the given id; unknown ids read as `false`.
    #[must_use]
    pub fn is(&self, id: &str) -> bool {
        self.get(id).unwrap_or(false)
    }

    pub(crate) fn by_index(&self, idx: usize) -> bool {
        self.values[idx]
    }

    /// Fact ids and values in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, bool)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
