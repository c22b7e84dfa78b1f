//! Tri-state verdict for tolerance checks

use serde::{Deserialize, Serialize};

/// Outcome of checking a value against a tolerance.
///
/// `Indeterminate` means the inputs were insufficient to decide; it never
/// stands in for a pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd, Eq, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass = 0,
    Indeterminate = 1,
    Fail = 2,
}

impl Verdict {
    pub fn from_bool(passed: bool) -> Self {
        if passed { Verdict::Pass } else { Verdict::Fail }
    }

    /// Map a fallible computation onto the tri-state
    pub fn of<T, E>(result: &Result<T, E>, passes: impl Fn(&T) -> bool) -> Self {
        match result {
            Ok(value) => Self::from_bool(passes(value)),
            Err(_) => Verdict::Indeterminate,
        }
    }

    /// Join-semilattice aggregation (worst wins)
    pub fn join(self, other: Self) -> Self {
        if self > other { self } else { other }
    }

    /// The value persisted in `isOk` columns
    pub fn as_is_ok(self) -> Option<bool> {
        match self {
            Verdict::Pass => Some(true),
            Verdict::Fail => Some(false),
            Verdict::Indeterminate => None,
        }
    }

    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}
