use std::fmt;

/// Error type for per-subject lock operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    /// The underlying primitive was poisoned (a thread panicked while holding it).
    Poisoned(String),
    /// Releasing a lock failed.
    ReleaseFailed(String),
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockError::Poisoned(msg) => write!(f, "lock poisoned: {}", msg),
            LockError::ReleaseFailed(msg) => write!(f, "lock release failed: {}", msg),
        }
    }
}

impl std::error::Error for LockError {}
