use serde::Serialize;

/// Boolean outcome of a decision query, carrying the reason it came out negative.
///
/// `reason` is only populated when a rule fired; a positive answer never has one.
/// Serializes as `result` plus `reason` when present, which is the shape the
/// status file shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultReason<T> {
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<T>,
}

impl<T> ResultReason<T> {
    /// A positive outcome with no reason attached.
    pub fn yes() -> Self {
        Self { result: true, reason: None }
    }

    /// A negative outcome explained by `reason`.
    pub fn no(reason: T) -> Self {
        Self { result: false, reason: Some(reason) }
    }

    /// A negative outcome where no rule fired.
    pub fn no_reason() -> Self {
        Self { result: false, reason: None }
    }
}
