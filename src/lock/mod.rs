//! Per-subject in-flight locks that serialize vote mutations.

mod error;
mod guard;
mod in_memory;
mod lock;
mod lock_manager;

pub use error::LockError;
pub use guard::SubjectGuard;
pub use in_memory::{InMemoryLock, InMemoryLockManager};
pub use lock::Lock;
pub use lock_manager::LockManager;
