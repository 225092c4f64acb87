//! Action normalization.
//!
//! Every executable node becomes a uniform ordered list of resolved actions
//! plus the policy to run them with. Categories are navigation-only and are
//! rejected here; the menu layer descends into their children instead.

use serde::Serialize;
use std::collections::BTreeMap;

use super::resolver::{resolve, resolve_inline, resolve_reference, ResolveError, ResolvedAction};
use crate::config::{ActionKind, ActionRef, CommandDefinition, MenuNode, NodeKind};

/// How a node's actions are meant to be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Single,
    Sequential,
    Parallel,
}

/// Resolved actions of one node with their execution policy
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedActions {
    pub actions: Vec<ResolvedAction>,
    pub continue_on_error: bool,
    pub mode: ExecutionMode,
}

/// Resolve an executable node into its ordered action list
pub fn normalize(
    node: &MenuNode,
    commands: &BTreeMap<String, CommandDefinition>,
) -> Result<NormalizedActions, ResolveError> {
    match &node.kind {
        NodeKind::Category { .. } => Err(ResolveError::NotExecutable {
            label: node.label.clone(),
        }),
        NodeKind::Reference { name } => Ok(NormalizedActions {
            actions: vec![resolve_reference(name, commands)?],
            continue_on_error: false,
            mode: ExecutionMode::Single,
        }),
        NodeKind::Inline(spec) => Ok(NormalizedActions {
            actions: vec![resolve_inline(spec)],
            continue_on_error: false,
            mode: ExecutionMode::Single,
        }),
        NodeKind::Sequential {
            actions,
            continue_on_error,
        } => Ok(NormalizedActions {
            actions: resolve_all(actions, commands)?,
            continue_on_error: *continue_on_error,
            mode: ExecutionMode::Sequential,
        }),
        NodeKind::Parallel { parallel } => Ok(NormalizedActions {
            actions: resolve_all(parallel, commands)?,
            continue_on_error: false,
            mode: ExecutionMode::Parallel,
        }),
    }
}

fn resolve_all(
    refs: &[ActionRef],
    commands: &BTreeMap<String, CommandDefinition>,
) -> Result<Vec<ResolvedAction>, ResolveError> {
    refs.iter().map(|r| resolve(r, commands)).collect()
}

/// Run of adjacent actions a runner may dispatch together
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchBatch<'a> {
    /// Index of the first action of the batch in the full list
    pub start: usize,
    /// Shared terminal for grouped terminal actions
    pub terminal_name: Option<&'a str>,
    pub actions: &'a [ResolvedAction],
}

/// Group adjacent terminal actions that target the same named terminal.
///
/// A new batch starts whenever the kind is not terminal or the terminal name
/// differs from the previous action's. Unnamed terminal actions and other
/// kinds always form batches of one.
pub fn dispatch_batches(actions: &[ResolvedAction]) -> Vec<DispatchBatch<'_>> {
    let mut batches = Vec::new();
    let mut start = 0;

    for index in 1..=actions.len() {
        let joins_previous = index < actions.len()
            && shared_terminal(&actions[index - 1])
                .is_some_and(|name| shared_terminal(&actions[index]) == Some(name));
        if !joins_previous {
            batches.push(DispatchBatch {
                start,
                terminal_name: shared_terminal(&actions[start]),
                actions: &actions[start..index],
            });
            start = index;
        }
    }

    batches
}

fn shared_terminal(action: &ResolvedAction) -> Option<&str> {
    match action.kind {
        ActionKind::Terminal => action.terminal_name.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionSpec;

    fn terminal(command: &str, name: Option<&str>) -> ActionSpec {
        let mut spec = ActionSpec::new(ActionKind::Terminal, command);
        spec.terminal_name = name.map(str::to_string);
        spec
    }

    fn node(kind: NodeKind) -> MenuNode {
        MenuNode {
            label: "Node".to_string(),
            icon: None,
            description: None,
            kind,
        }
    }

    fn commands() -> BTreeMap<String, CommandDefinition> {
        let mut commands = BTreeMap::new();
        commands.insert(
            "test".to_string(),
            CommandDefinition {
                action: terminal("cargo test", Some("Test")),
                description: None,
            },
        );
        commands
    }

    fn resolved(specs: Vec<ActionSpec>) -> Vec<ResolvedAction> {
        specs.iter().map(resolve_inline).collect()
    }

    #[test]
    fn test_single_nodes() {
        let by_ref = normalize(
            &node(NodeKind::Reference {
                name: "test".to_string(),
            }),
            &commands(),
        )
        .unwrap();
        assert_eq!(by_ref.mode, ExecutionMode::Single);
        assert_eq!(by_ref.actions.len(), 1);
        assert_eq!(by_ref.actions[0].command, "cargo test");

        let inline = normalize(&node(NodeKind::Inline(terminal("ls", None))), &commands()).unwrap();
        assert_eq!(inline.mode, ExecutionMode::Single);
        assert!(!inline.continue_on_error);
    }

    #[test]
    fn test_sequential_keeps_order_and_policy() {
        let normalized = normalize(
            &node(NodeKind::Sequential {
                actions: vec![
                    ActionRef::Inline(terminal("first", None)),
                    ActionRef::Reference {
                        name: "test".to_string(),
                    },
                    ActionRef::Inline(terminal("last", None)),
                ],
                continue_on_error: true,
            }),
            &commands(),
        )
        .unwrap();

        assert_eq!(normalized.mode, ExecutionMode::Sequential);
        assert!(normalized.continue_on_error);
        let order: Vec<&str> = normalized.actions.iter().map(|a| a.command.as_str()).collect();
        assert_eq!(order, vec!["first", "cargo test", "last"]);
    }

    #[test]
    fn test_parallel_mode() {
        let normalized = normalize(
            &node(NodeKind::Parallel {
                parallel: vec![
                    ActionRef::Inline(terminal("a", Some("A"))),
                    ActionRef::Inline(terminal("b", Some("B"))),
                ],
            }),
            &commands(),
        )
        .unwrap();

        assert_eq!(normalized.mode, ExecutionMode::Parallel);
        assert!(!normalized.continue_on_error);
        assert_eq!(normalized.actions.len(), 2);
    }

    #[test]
    fn test_category_not_executable() {
        let err = normalize(&node(NodeKind::Category { children: vec![] }), &commands()).unwrap_err();
        assert!(matches!(err, ResolveError::NotExecutable { label } if label == "Node"));
    }

    #[test]
    fn test_dangling_ref_in_group_fails() {
        let err = normalize(
            &node(NodeKind::Parallel {
                parallel: vec![
                    ActionRef::Inline(terminal("a", None)),
                    ActionRef::Reference {
                        name: "missing".to_string(),
                    },
                ],
            }),
            &commands(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownReference { name } if name == "missing"));
    }

    #[test]
    fn test_dispatch_batches_group_same_terminal() {
        let actions = resolved(vec![
            terminal("a1", Some("A")),
            terminal("a2", Some("A")),
            terminal("b1", Some("B")),
            ActionSpec::new(ActionKind::Task, "build"),
            terminal("b2", Some("B")),
            terminal("x", None),
            terminal("y", None),
        ]);

        let batches = dispatch_batches(&actions);
        let shape: Vec<(usize, usize, Option<&str>)> = batches
            .iter()
            .map(|b| (b.start, b.actions.len(), b.terminal_name))
            .collect();

        assert_eq!(
            shape,
            vec![
                (0, 2, Some("A")),
                (2, 1, Some("B")),
                (3, 1, None),
                (4, 1, Some("B")),
                (5, 1, None),
                (6, 1, None),
            ]
        );
    }

    #[test]
    fn test_dispatch_batches_empty() {
        assert!(dispatch_batches(&[]).is_empty());
    }
}
