//! Error classification and recovery hints.

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Storage backend missing or unsupported in the host.
    Storage,
    /// Token issued by an environment the application does not trust.
    Trust,
    /// Authority metadata could not be discovered.
    Discovery,
    /// Malformed token material (ID token, client info).
    Decode,
    Network,
    Configuration,
    Serialization,
    Io,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    RetryWithBackoff,
    CheckConfiguration,
    /// Discard the token; do not retry with the same response.
    RejectToken,
    /// Re-run the interactive flow to obtain fresh tokens.
    Reauthenticate,
    ContactSupport,
}
