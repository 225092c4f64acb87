//! Execution Engine
//!
//! Runs an ordered list of resolved actions against an [`ActionRunner`].
//! Actions run strictly one after another, in the order given, whatever the
//! node's mode; "parallel" only tells the runner how to lay a batch out.
//!
//! A run ends in one of three ways:
//! - every action was attempted (`success` is true when none failed)
//! - an action failed and `continue_on_error` is off: the run stops there
//! - the cancellation flag was seen before the next action was started

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::cancellation::CancellationFlag;
use super::normalizer::{dispatch_batches, normalize, ExecutionMode};
use super::resolver::{ResolveError, ResolvedAction};
use crate::config::{CommandDefinition, MenuNode};
use crate::runner::ActionRunner;

/// Progress callback: (completed count, total, action just completed)
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &ResolvedAction) + Send + Sync>;

/// Options for one multi-action run
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Keep going after a failed action instead of stopping
    pub continue_on_error: bool,
    /// Checked before each action is started
    pub cancellation: Option<CancellationFlag>,
    /// Called after each successful action
    pub on_progress: Option<ProgressCallback>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize, &ResolvedAction) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationFlag::is_cancelled)
    }
}

impl std::fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteOptions")
            .field("continue_on_error", &self.continue_on_error)
            .field("cancellation", &self.cancellation)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A failed action recorded while continuing past errors
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionError {
    /// Position of the action in the run
    pub index: usize,
    pub action: ResolvedAction,
    pub error: String,
}

/// Aggregated outcome of a multi-action run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleActionResult {
    pub success: bool,
    /// Actions that succeeded; on cancellation, the index the run stopped at
    pub completed_count: usize,
    pub total_count: usize,
    /// Run was stopped by the cancellation flag
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    /// Failure that stopped the run (stop-on-error mode)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Index of the action that stopped the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_index: Option<usize>,
    /// Every failure, in order (continue-on-error mode, finished or cancelled)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ActionError>>,
}

impl MultipleActionResult {
    /// Every action succeeded
    pub fn success(total: usize) -> Self {
        Self {
            success: true,
            completed_count: total,
            total_count: total,
            cancelled: false,
            error: None,
            failed_index: None,
            errors: None,
        }
    }

    /// Cancellation was observed before action `index` was started
    pub fn cancelled(index: usize, total: usize) -> Self {
        Self {
            success: false,
            completed_count: index,
            total_count: total,
            cancelled: true,
            error: None,
            failed_index: None,
            errors: None,
        }
    }

    /// Attach failures collected before the run ended; empty lists are dropped
    pub fn with_errors(mut self, errors: Vec<ActionError>) -> Self {
        self.errors = (!errors.is_empty()).then_some(errors);
        self
    }

    /// The action at `failed_index` failed and the run stopped
    pub fn stopped(completed: usize, total: usize, failed_index: usize, error: String) -> Self {
        Self {
            success: false,
            completed_count: completed,
            total_count: total,
            cancelled: false,
            error: Some(error),
            failed_index: Some(failed_index),
            errors: None,
        }
    }

    /// Every action was attempted; `errors` lists the ones that failed
    pub fn finished(completed: usize, total: usize, errors: Vec<ActionError>) -> Self {
        if errors.is_empty() {
            return Self::success(total);
        }
        Self {
            success: false,
            completed_count: completed,
            total_count: total,
            cancelled: false,
            error: None,
            failed_index: None,
            errors: Some(errors),
        }
    }

    /// One-line summary naming the failed action and its position
    pub fn summary(&self) -> String {
        if self.cancelled {
            return format!(
                "Cancelled after {} of {} actions",
                self.completed_count, self.total_count
            );
        }
        if let (Some(index), Some(error)) = (self.failed_index, &self.error) {
            return format!(
                "Action {} of {} failed: {}",
                index + 1,
                self.total_count,
                error
            );
        }
        match self.errors.as_deref() {
            Some(errors @ [first, ..]) => format!(
                "{} of {} actions failed (first at position {}: {})",
                errors.len(),
                self.total_count,
                first.index + 1,
                first.error
            ),
            _ => format!("Completed {} actions", self.total_count),
        }
    }
}

/// Run `actions` in order against `runner`
pub async fn execute_multiple<R>(
    runner: &R,
    actions: &[ResolvedAction],
    options: &ExecuteOptions,
) -> MultipleActionResult
where
    R: ActionRunner + ?Sized,
{
    let total = actions.len();
    if total == 0 {
        return MultipleActionResult::success(0);
    }

    let span = tracing::info_span!("execute_multiple", run_id = %Uuid::new_v4(), total);
    run_actions(runner, actions, options).instrument(span).await
}

async fn run_actions<R>(
    runner: &R,
    actions: &[ResolvedAction],
    options: &ExecuteOptions,
) -> MultipleActionResult
where
    R: ActionRunner + ?Sized,
{
    let total = actions.len();
    let mut completed = 0;
    let mut errors: Vec<ActionError> = Vec::new();

    tracing::info!(
        continue_on_error = options.continue_on_error,
        "Starting actions"
    );

    for (index, action) in actions.iter().enumerate() {
        if options.is_cancelled() {
            tracing::warn!(index, completed, failed = errors.len(), "Run cancelled before next action");
            return MultipleActionResult::cancelled(index, total).with_errors(errors);
        }

        tracing::debug!(index, action = %action.description(), "Running action");

        match runner.run(action).await {
            Ok(()) => {
                completed += 1;
                if let Some(ref callback) = options.on_progress {
                    callback(completed, total, action);
                }
            }
            Err(err) => {
                let error = err.to_string();
                tracing::warn!(index, action = %action.description(), error = %error, "Action failed");

                if !options.continue_on_error {
                    return MultipleActionResult::stopped(completed, total, index, error);
                }
                errors.push(ActionError {
                    index,
                    action: action.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(completed, failed = errors.len(), "Finished actions");
    MultipleActionResult::finished(completed, total, errors)
}

/// Executes menu nodes against a runner
pub struct ExecutionEngine<R: ActionRunner + ?Sized> {
    runner: Arc<R>,
}

impl<R: ActionRunner + ?Sized> ExecutionEngine<R> {
    pub fn new(runner: Arc<R>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Arc<R> {
        &self.runner
    }

    /// Run an already-resolved action list
    pub async fn execute(
        &self,
        actions: &[ResolvedAction],
        options: &ExecuteOptions,
    ) -> MultipleActionResult {
        execute_multiple(self.runner.as_ref(), actions, options).await
    }

    /// Resolve an executable node and run its actions.
    ///
    /// A sequential node's own `continueOnError` turns continuing on even if
    /// the options leave it off. Resolution failures (dangling `ref`,
    /// category node) are returned before anything runs.
    pub async fn run_node(
        &self,
        node: &MenuNode,
        commands: &BTreeMap<String, CommandDefinition>,
        options: ExecuteOptions,
    ) -> Result<MultipleActionResult, ResolveError> {
        let normalized = normalize(node, commands)?;
        let options = ExecuteOptions {
            continue_on_error: options.continue_on_error || normalized.continue_on_error,
            ..options
        };

        tracing::debug!(
            label = %node.label,
            mode = ?normalized.mode,
            actions = normalized.actions.len(),
            "Running menu item"
        );

        if normalized.mode != ExecutionMode::Single || normalized.actions.len() > 1 {
            let batches = dispatch_batches(&normalized.actions);
            self.runner.prepare(normalized.mode, &batches).await;
        }

        Ok(self.execute(&normalized.actions, &options).await)
    }
}

impl<R: ActionRunner + ?Sized> Clone for ExecutionEngine<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
        }
    }
}
