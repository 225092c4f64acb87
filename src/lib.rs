//! Declarative action menus.
//!
//! A menu document (YAML) describes a tree of labelled actions: shell
//! commands sent to named terminals, editor commands, tasks, and groups of
//! them run in sequence or side by side. This crate validates such documents
//! and runs the selected entries:
//!
//! ```rust,ignore
//! use action_menu::{parse_config, ExecuteOptions, ExecutionEngine, ProcessRunner, TerminalRegistry};
//! use std::sync::Arc;
//!
//! let config = parse_config(&text)?;
//! let engine = ExecutionEngine::new(Arc::new(ProcessRunner::new(TerminalRegistry::new())));
//! let node = config.find(&["Checks", "Build and test"]).unwrap();
//! let result = engine.run_node(node, &config.commands, ExecuteOptions::new()).await?;
//! println!("{}", result.summary());
//! ```

pub mod config;
pub mod execution;
pub mod runner;

pub use config::{
    load_config, parse_config, to_yaml, validate, ActionKind, ActionRef, ActionSpec,
    CommandDefinition, ConfigError, ConfigWatcher, MenuConfiguration, MenuNode, NodeKind,
    ValidationError, ValidationResult,
};
pub use execution::{
    execute_multiple, normalize, resolve, CancellationFlag, ExecuteOptions, ExecutionEngine,
    ExecutionMode, MultipleActionResult, ResolveError, ResolvedAction,
};
pub use runner::{ActionRunner, HostDispatcher, ProcessRunner, RunnerError, TerminalRegistry};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`.
///
/// Default: warn for most crates, info for this one (run summaries visible).
/// Use RUST_LOG=debug for per-action logs. Does nothing if the host already
/// installed a global subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,action_menu=info")),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing installed");
    }
}
