//! Vote reconciliation: the pure transition table and the coordinator that
//! drives it against the remote vote service.

mod coordinator;
pub mod machine;

pub use coordinator::VoteSyncCoordinator;
pub use machine::{transition, RemoteOp, Transition};
