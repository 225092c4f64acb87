//! Process-backed runner.
//!
//! Terminal actions run as shell commands through `duct` on the blocking
//! pool. When an action names a terminal, the command goes through the
//! shared [`TerminalRegistry`] session for that name and holds its lock
//! for the whole run. Every other kind is forwarded to a [`HostDispatcher`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::terminal::TerminalRegistry;
use super::{ActionRunner, HostDispatcher, RunnerError};
use crate::config::ActionKind;
use crate::execution::{DispatchBatch, ExecutionMode, ResolvedAction};

/// Maximum characters of command output kept in logs
const MAX_LOG_OUTPUT_CHARS: usize = 2_000;

/// Runs terminal actions as local processes
#[derive(Clone)]
pub struct ProcessRunner {
    registry: TerminalRegistry,
    host: Option<Arc<dyn HostDispatcher>>,
}

impl ProcessRunner {
    pub fn new(registry: TerminalRegistry) -> Self {
        Self {
            registry,
            host: None,
        }
    }

    /// Route non-terminal kinds to `host`
    pub fn with_host(mut self, host: Arc<dyn HostDispatcher>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn registry(&self) -> &TerminalRegistry {
        &self.registry
    }

    async fn run_terminal(&self, action: &ResolvedAction) -> Result<(), RunnerError> {
        let requested_dir = action.working_directory.as_deref().map(PathBuf::from);

        let Some(name) = action.terminal_name.as_deref() else {
            return run_shell(action.command.clone(), requested_dir).await;
        };

        let session = self.registry.acquire(name, requested_dir.as_deref());
        let mut session = session.lock().await;
        let dir = requested_dir.or_else(|| session.working_directory.clone());

        tracing::debug!(terminal = name, command = %action.command, "Submitting to terminal");
        session.record(&action.command);
        run_shell(action.command.clone(), dir).await
    }
}

#[async_trait]
impl ActionRunner for ProcessRunner {
    async fn run(&self, action: &ResolvedAction) -> Result<(), RunnerError> {
        match action.kind {
            ActionKind::Terminal => self.run_terminal(action).await,
            kind => match &self.host {
                Some(host) => host.dispatch(action).await,
                None => Err(RunnerError::Unsupported(kind)),
            },
        }
    }

    async fn prepare(&self, mode: ExecutionMode, batches: &[DispatchBatch<'_>]) {
        for batch in batches {
            if let Some(name) = batch.terminal_name {
                let dir = batch
                    .actions
                    .first()
                    .and_then(|a| a.working_directory.as_deref())
                    .map(Path::new);
                self.registry.acquire(name, dir);
            }
        }
        tracing::debug!(?mode, batches = batches.len(), "Prepared terminals");
    }
}

/// Run a command line in the platform shell, failing on non-zero exit
async fn run_shell(command: String, dir: Option<PathBuf>) -> Result<(), RunnerError> {
    tokio::task::spawn_blocking(move || -> Result<(), RunnerError> {
        let expression = if cfg!(windows) {
            duct::cmd!("cmd", "/C", command.as_str())
        } else {
            duct::cmd!("sh", "-c", command.as_str())
        };
        let expression = match &dir {
            Some(dir) => expression.dir(dir),
            None => expression,
        };

        let output = expression
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::debug!(
            command = %command,
            status = ?output.status.code(),
            output = %truncate_for_log(&stdout, MAX_LOG_OUTPUT_CHARS),
            "Command finished"
        );

        if output.status.success() {
            Ok(())
        } else {
            Err(RunnerError::CommandFailed {
                command,
                code: output.status.code(),
            })
        }
    })
    .await
    .map_err(|e| RunnerError::Join(e.to_string()))?
}

fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.trim_end().to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}
