//! Execution Module
//!
//! Expands menu nodes into resolved actions and runs them:
//!
//! - `resolver`: `ref` lookup against the command table
//! - `normalizer`: node → ordered actions + policy, terminal dispatch batches
//! - `executor`: the ordered, cancellable multi-action run
//!
//! Dangling references pass schema validation and are reported here, at
//! resolution time, as [`ResolveError::UnknownReference`].

pub mod cancellation;
pub mod executor;
pub mod normalizer;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancellation::CancellationFlag;
pub use executor::{
    execute_multiple, ActionError, ExecuteOptions, ExecutionEngine, MultipleActionResult,
    ProgressCallback,
};
pub use normalizer::{dispatch_batches, normalize, DispatchBatch, ExecutionMode, NormalizedActions};
pub use resolver::{resolve, resolve_inline, resolve_reference, ResolveError, ResolvedAction};
