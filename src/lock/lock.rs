use super::LockError;

/// A non-blocking in-flight marker for one subject.
///
/// Vote mutations never wait on each other: a click that finds the subject
/// locked is rejected instead of queued, so only `try_lock` is offered.
pub trait Lock: Send + Sync {
    /// Returns `Ok(true)` if acquired, `Ok(false)` if already held.
    fn try_lock(&self) -> Result<bool, LockError>;

    fn unlock(&self) -> Result<(), LockError>;

    fn is_locked(&self) -> Result<bool, LockError>;
}
