use std::time::Duration;
use thiserror::Error;

/// Boxed cause carried by a predicate fault
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by a wait call
#[derive(Debug, Error)]
pub enum WaitError {
    /// The predicate never returned `true` before the deadline.
    #[error("Timed out waiting for {label} after {elapsed:?} ({attempts} attempts, max wait {max_wait:?})")]
    Timeout {
        label: String,
        elapsed: Duration,
        max_wait: Duration,
        attempts: u64,
    },

    /// The predicate itself failed. Never retried.
    #[error("Condition check for {label} failed: {source}")]
    Predicate {
        label: String,
        #[source]
        source: BoxError,
    },

    /// A shutdown signal arrived between attempts.
    #[error("Wait for {label} cancelled after {elapsed:?}")]
    Cancelled { label: String, elapsed: Duration },
}

impl WaitError {
    pub fn label(&self) -> &str {
        match self {
            WaitError::Timeout { label, .. }
            | WaitError::Predicate { label, .. }
            | WaitError::Cancelled { label, .. } => label,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_predicate_fault(&self) -> bool {
        matches!(self, WaitError::Predicate { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }
}

/// Faults raised by the bundled probes
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}
