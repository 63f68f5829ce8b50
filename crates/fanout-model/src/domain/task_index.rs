use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of a task inside a dispatch batch.
///
/// The index is the task's only identity: outcomes are matched back to their task
/// (and to their slot in the result set) through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskIndex(usize);

impl TaskIndex {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Iterate over every index of a batch of `count` tasks, in submission order.
    pub fn range(count: usize) -> impl Iterator<Item = TaskIndex> {
        (0..count).map(TaskIndex)
    }
}

impl From<usize> for TaskIndex {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl From<TaskIndex> for usize {
    fn from(value: TaskIndex) -> Self {
        value.0
    }
}

impl fmt::Display for TaskIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_yields_submission_order() {
        let indices: Vec<usize> = TaskIndex::range(4).map(TaskIndex::get).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn display_is_prefixed() {
        assert_eq!(TaskIndex::new(7).to_string(), "#7");
    }

    #[test]
    fn serializes_as_plain_number() {
        let json = serde_json::to_string(&TaskIndex::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
