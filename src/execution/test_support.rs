//! Scripted runner for executor tests

use async_trait::async_trait;
use std::sync::Mutex;

use super::{CancellationFlag, DispatchBatch, ExecutionMode, ResolvedAction};
use crate::runner::{ActionRunner, RunnerError};

/// Records every action it is asked to run; fails or cancels on chosen calls
#[derive(Default)]
pub struct ScriptedRunner {
    fail_at: Vec<usize>,
    cancel_during: Option<(usize, CancellationFlag)>,
    commands: Mutex<Vec<String>>,
    prepared: Mutex<Vec<(ExecutionMode, Vec<(usize, usize)>)>>,
}

impl ScriptedRunner {
    pub fn failing_at(indices: &[usize]) -> Self {
        Self {
            fail_at: indices.to_vec(),
            ..Self::default()
        }
    }

    pub fn cancelling_during(index: usize, flag: CancellationFlag) -> Self {
        Self {
            cancel_during: Some((index, flag)),
            ..Self::default()
        }
    }

    /// Indices of the calls made so far
    pub fn started(&self) -> Vec<usize> {
        (0..self.commands.lock().unwrap().len()).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// (mode, [(batch start, batch len)]) for every prepare call
    pub fn prepared(&self) -> Vec<(ExecutionMode, Vec<(usize, usize)>)> {
        self.prepared.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionRunner for ScriptedRunner {
    async fn run(&self, action: &ResolvedAction) -> Result<(), RunnerError> {
        let index = {
            let mut commands = self.commands.lock().unwrap();
            commands.push(action.command.clone());
            commands.len() - 1
        };

        if let Some((at, flag)) = &self.cancel_during {
            if *at == index {
                flag.cancel();
            }
        }

        if self.fail_at.contains(&index) {
            return Err(RunnerError::TaskNotFound(action.command.clone()));
        }
        Ok(())
    }

    async fn prepare(&self, mode: ExecutionMode, batches: &[DispatchBatch<'_>]) {
        let shape: Vec<(usize, usize)> = batches.iter().map(|b| (b.start, b.actions.len())).collect();
        self.prepared.lock().unwrap().push((mode, shape));
    }
}
