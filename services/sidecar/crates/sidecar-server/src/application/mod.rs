//! Application layer — use-case services behind injected port traits.
//!
//! Imports only from `crate::domain` and `nexus_common`; all I/O is routed
//! through the traits in [`ports`].

pub mod dispatcher;
pub mod executor;
pub mod ports;
pub mod store;

pub use dispatcher::ExecutionDispatcher;
pub use executor::{
    DenialClassifier, ExecOutcome, ExecutorChain, ExecutorConfig, POLICY_DENIAL_PATTERN,
    is_policy_denial,
};
pub use ports::{CommandRunner, OverlayNetwork};
pub use store::ExecutionStore;
