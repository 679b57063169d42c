//! Tagged stage results.
//!
//! Every stage that has a best-effort fallback reports which path produced
//! its value, so the orchestrator can decide on retries by matching instead
//! of probing for empty buffers.

use serde::Serialize;

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T, R> {
    /// Primary path succeeded.
    Success(T),
    /// A usable value was produced by a fallback path.
    Fallback(T, R),
    /// No usable value.
    Failure(R),
}

impl<T, R> Outcome<T, R> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(v) | Outcome::Fallback(v, _) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Success(v) | Outcome::Fallback(v, _) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&R> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Fallback(_, r) | Outcome::Failure(r) => Some(r),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Success(_) => OutcomeKind::Success,
            Outcome::Fallback(..) => OutcomeKind::Fallback,
            Outcome::Failure(_) => OutcomeKind::Failure,
        }
    }
}

/// Variant tag without payload, used in diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Fallback,
    Failure,
}
