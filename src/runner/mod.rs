//! Action runners.
//!
//! An [`ActionRunner`] performs the side effect of one resolved action. The
//! executor drives runners strictly one action at a time; a runner may still
//! use the dispatch batches it is given up front (for example to open every
//! named terminal of a parallel group before the first command is sent).

pub mod process;
pub mod terminal;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ActionKind;
use crate::execution::{DispatchBatch, ExecutionMode, ResolvedAction};

pub use process::ProcessRunner;
pub use terminal::{TerminalRegistry, TerminalSession};

/// Failure reported by a runner for one action
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Unknown editor command: {0}")]
    UnknownEditorCommand(String),
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("No handler for '{0}' actions")]
    Unsupported(ActionKind),
    #[error("Command '{command}' exited with {}", describe_code(.code))]
    CommandFailed { command: String, code: Option<i32> },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task failed: {0}")]
    Join(String),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Performs the real-world effect of a resolved action
#[async_trait]
pub trait ActionRunner: Send + Sync {
    /// Run one action to completion
    async fn run(&self, action: &ResolvedAction) -> Result<(), RunnerError>;

    /// Called once per execution request before the first action runs
    async fn prepare(&self, _mode: ExecutionMode, _batches: &[DispatchBatch<'_>]) {}
}

/// Host-side handler for kinds that are not plain terminal commands
/// (editor commands, tasks, remote/container opens)
#[async_trait]
pub trait HostDispatcher: Send + Sync {
    async fn dispatch(&self, action: &ResolvedAction) -> Result<(), RunnerError>;
}
