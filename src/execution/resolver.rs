//! Reference resolution.
//!
//! Turns an [`ActionRef`] into a [`ResolvedAction`] by looking `ref` names up
//! in the `commands` table. The validator only checks that a `ref` is a
//! string, so a dangling name is first detected here.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::{ActionKind, ActionRef, ActionSpec, CommandDefinition};

/// Fully dereferenced action, ready for a runner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
}

impl ResolvedAction {
    fn from_spec(spec: &ActionSpec) -> Self {
        Self {
            kind: spec.kind,
            command: spec.command.clone(),
            terminal_name: spec.terminal_name.clone(),
            arguments: spec.arguments.clone(),
            working_directory: spec.working_directory.clone(),
        }
    }

    /// Short human-readable form for logs and error messages
    pub fn description(&self) -> String {
        match &self.terminal_name {
            Some(terminal) => format!("{} '{}' in terminal '{}'", self.kind, self.command, terminal),
            None => format!("{} '{}'", self.kind, self.command),
        }
    }
}

/// Failure to turn a menu node or action ref into runnable actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// `ref` names a command missing from the `commands` table
    #[error("Unknown command reference '{name}'")]
    UnknownReference { name: String },
    /// Category nodes are navigated into, not executed
    #[error("Menu item '{label}' is a category and cannot be executed")]
    NotExecutable { label: String },
}

/// Look a named command up in the command table
pub fn resolve_reference(
    name: &str,
    commands: &BTreeMap<String, CommandDefinition>,
) -> Result<ResolvedAction, ResolveError> {
    commands
        .get(name)
        .map(|definition| ResolvedAction::from_spec(&definition.action))
        .ok_or_else(|| ResolveError::UnknownReference {
            name: name.to_string(),
        })
}

/// Resolve an inline action (copied verbatim)
pub fn resolve_inline(spec: &ActionSpec) -> ResolvedAction {
    ResolvedAction::from_spec(spec)
}

/// Resolve one entry of an `actions` or `parallel` list
pub fn resolve(
    action: &ActionRef,
    commands: &BTreeMap<String, CommandDefinition>,
) -> Result<ResolvedAction, ResolveError> {
    match action {
        ActionRef::Reference { name } => resolve_reference(name, commands),
        ActionRef::Inline(spec) => Ok(resolve_inline(spec)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> BTreeMap<String, CommandDefinition> {
        let mut action = ActionSpec::new(ActionKind::Terminal, "cargo build");
        action.terminal_name = Some("Build".to_string());
        action.working_directory = Some("./app".to_string());

        let mut commands = BTreeMap::new();
        commands.insert(
            "build".to_string(),
            CommandDefinition {
                action,
                description: Some("Compile".to_string()),
            },
        );
        commands
    }

    #[test]
    fn test_resolve_reference() {
        let resolved = resolve(
            &ActionRef::Reference {
                name: "build".to_string(),
            },
            &table(),
        )
        .unwrap();

        assert_eq!(resolved.kind, ActionKind::Terminal);
        assert_eq!(resolved.command, "cargo build");
        assert_eq!(resolved.terminal_name.as_deref(), Some("Build"));
        assert_eq!(resolved.working_directory.as_deref(), Some("./app"));
    }

    #[test]
    fn test_dangling_reference() {
        let err = resolve(
            &ActionRef::Reference {
                name: "deploy".to_string(),
            },
            &table(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ResolveError::UnknownReference {
                name: "deploy".to_string()
            }
        );
        assert_eq!(err.to_string(), "Unknown command reference 'deploy'");
    }

    #[test]
    fn test_inline_copied_verbatim() {
        let mut spec = ActionSpec::new(ActionKind::EditorCommand, "editor.action.rename");
        spec.arguments = Some(vec![json!("a"), json!({ "b": 1 })]);

        let resolved = resolve(&ActionRef::Inline(spec.clone()), &BTreeMap::new()).unwrap();
        assert_eq!(resolved.kind, spec.kind);
        assert_eq!(resolved.command, spec.command);
        assert_eq!(resolved.arguments, spec.arguments);
        assert!(resolved.terminal_name.is_none());
    }

    #[test]
    fn test_description() {
        let resolved = resolve_reference("build", &table()).unwrap();
        assert_eq!(resolved.description(), "terminal 'cargo build' in terminal 'Build'");
    }
}
