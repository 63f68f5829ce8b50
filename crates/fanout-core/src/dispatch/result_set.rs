use fanout_model::{FailureKind, Outcome, TaskIndex};
use serde::Serialize;

/// Index-aligned outcomes of one dispatch.
///
/// Position `i` always holds the outcome of task `i`, whatever order the tasks settled in.
/// A result set is only produced once every task has settled and cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultSet<V> {
    outcomes: Vec<Outcome<V>>,
}

/// Outcome counts of a [`ResultSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub total: usize,
    pub fulfilled: usize,
    pub throttled: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl DispatchSummary {
    pub(crate) fn count<'a, V: 'a>(outcomes: impl IntoIterator<Item = &'a Outcome<V>>) -> Self {
        let mut summary = DispatchSummary::default();
        for outcome in outcomes {
            summary.total += 1;
            match outcome.failure() {
                None => summary.fulfilled += 1,
                Some(FailureKind::Throttled) => summary.throttled += 1,
                Some(FailureKind::Generic) => summary.failed += 1,
                Some(FailureKind::Cancelled) => summary.cancelled += 1,
            }
        }
        summary
    }
}

impl<V> ResultSet<V> {
    /// Build from outcomes that are already sorted by task index.
    pub(crate) fn from_settled(outcomes: Vec<Outcome<V>>) -> Self {
        debug_assert!(
            outcomes
                .iter()
                .enumerate()
                .all(|(i, o)| o.index().get() == i),
            "outcomes must be index-aligned"
        );
        Self { outcomes }
    }

    /// Swap in a newer outcome for the same task.
    pub(crate) fn replace(&mut self, outcome: Outcome<V>) {
        let slot = outcome.index().get();
        if let Some(current) = self.outcomes.get_mut(slot) {
            *current = outcome;
        }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn get(&self, index: TaskIndex) -> Option<&Outcome<V>> {
        self.outcomes.get(index.get())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Outcome<V>> {
        self.outcomes.iter()
    }

    pub fn as_slice(&self) -> &[Outcome<V>] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome<V>> {
        self.outcomes
    }

    /// Values of fulfilled tasks, in index order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.outcomes.iter().filter_map(Outcome::value)
    }

    pub fn throttled_indices(&self) -> Vec<TaskIndex> {
        self.indices_where(|o| o.is_throttled())
    }

    pub fn rejected_indices(&self) -> Vec<TaskIndex> {
        self.indices_where(|o| o.is_rejected())
    }

    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary::count(&self.outcomes)
    }

    fn indices_where(&self, pred: impl Fn(&Outcome<V>) -> bool) -> Vec<TaskIndex> {
        self.outcomes
            .iter()
            .filter(|o| pred(o))
            .map(Outcome::index)
            .collect()
    }
}

impl<V> IntoIterator for ResultSet<V> {
    type Item = Outcome<V>;
    type IntoIter = std::vec::IntoIter<Outcome<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}

impl<'a, V> IntoIterator for &'a ResultSet<V> {
    type Item = &'a Outcome<V>;
    type IntoIter = std::slice::Iter<'a, Outcome<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.iter()
    }
}
