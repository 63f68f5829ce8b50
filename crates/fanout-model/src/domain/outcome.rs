use serde::{Deserialize, Serialize};

use crate::TaskIndex;

/// Why a task ended up rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The backend's admission window was over quota (HTTP 429 analogue).
    Throttled,
    /// Any other backend failure.
    Generic,
    /// The dispatch was cancelled before the task reached the backend.
    Cancelled,
}

impl FailureKind {
    /// Short symbolic identifier, intended for logs and rendering.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Throttled => "throttled",
            FailureKind::Generic => "generic",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

/// Settled result of one task.
///
/// Exactly one outcome exists per dispatched task. Consumers pick their rendering from the
/// variant and, for rejections, from [`Outcome::is_throttled`] only; `message` is display text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome<V> {
    Fulfilled {
        index: TaskIndex,
        value: V,
    },
    Rejected {
        index: TaskIndex,
        kind: FailureKind,
        message: String,
    },
}

impl<V> Outcome<V> {
    pub fn index(&self) -> TaskIndex {
        match self {
            Outcome::Fulfilled { index, .. } | Outcome::Rejected { index, .. } => *index,
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Outcome::Fulfilled { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Outcome::Rejected { .. })
    }

    /// `true` only for rejections caused by the admission quota.
    pub fn is_throttled(&self) -> bool {
        matches!(
            self,
            Outcome::Rejected {
                kind: FailureKind::Throttled,
                ..
            }
        )
    }

    /// Failure kind for rejected outcomes, `None` when fulfilled.
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            Outcome::Fulfilled { .. } => None,
            Outcome::Rejected { kind, .. } => Some(*kind),
        }
    }

    pub fn value(&self) -> Option<&V> {
        match self {
            Outcome::Fulfilled { value, .. } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }

    pub fn into_value(self) -> Option<V> {
        match self {
            Outcome::Fulfilled { value, .. } => Some(value),
            Outcome::Rejected { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(kind: FailureKind) -> Outcome<u32> {
        Outcome::Rejected {
            index: TaskIndex::new(1),
            kind,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn throttled_is_discriminated_by_kind() {
        assert!(rejected(FailureKind::Throttled).is_throttled());
        assert!(!rejected(FailureKind::Generic).is_throttled());
        assert!(!rejected(FailureKind::Cancelled).is_throttled());
    }

    #[test]
    fn fulfilled_accessors() {
        let outcome = Outcome::Fulfilled {
            index: TaskIndex::new(4),
            value: 42u32,
        };
        assert!(outcome.is_fulfilled());
        assert_eq!(outcome.index(), TaskIndex::new(4));
        assert_eq!(outcome.value(), Some(&42));
        assert_eq!(outcome.failure(), None);
        assert_eq!(outcome.into_value(), Some(42));
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(rejected(FailureKind::Throttled)).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["kind"], "throttled");
        assert_eq!(json["index"], 1);
    }
}
