//! Failure categories recorded in a run summary

/// The category of a unit of work that failed during a run.
///
/// Every kind is recoverable: the unit produces nothing and the run continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Page unreachable, timed out or empty
    Fetch,
    /// Non-success status or transport error from the completion endpoint
    Provider,
    /// Model output that could not be decoded into listings
    MalformedResponse,
    /// Writing a domain's dataset failed
    Persistence,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Fetch => "fetch",
            FailureKind::Provider => "provider",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Persistence => "persistence",
        };
        f.write_str(name)
    }
}
