//! Typed menu configuration.
//!
//! These types are only ever produced by the validator, so every value here
//! has already passed the schema checks. Node shapes are decided once during
//! validation and carried as a tagged union ([`NodeKind`]); downstream code
//! matches on the variant instead of re-inspecting optional fields.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Kind of side effect an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Send a shell command to a (possibly named) terminal
    Terminal,
    /// Invoke an editor command by id
    EditorCommand,
    /// Start a named task
    Task,
    /// Reopen the workspace inside a container
    OpenInContainer,
    /// Open a remote host over SSH
    OpenRemoteSsh,
    /// Open a remote tunnel
    OpenRemoteTunnel,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Terminal,
        ActionKind::EditorCommand,
        ActionKind::Task,
        ActionKind::OpenInContainer,
        ActionKind::OpenRemoteSsh,
        ActionKind::OpenRemoteTunnel,
    ];

    /// Name used in configuration documents
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Terminal => "terminal",
            ActionKind::EditorCommand => "editor-command",
            ActionKind::Task => "task",
            ActionKind::OpenInContainer => "open-in-container",
            ActionKind::OpenRemoteSsh => "open-remote-ssh",
            ActionKind::OpenRemoteTunnel => "open-remote-tunnel",
        }
    }

    /// Parse a configuration name, returning None for unknown kinds
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.as_str() == name)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline action shape shared by command definitions, nodes and action refs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSpec {
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

impl ActionSpec {
    pub fn new(kind: ActionKind, command: impl Into<String>) -> Self {
        Self {
            kind,
            command: command.into(),
            terminal_name: None,
            arguments: None,
            working_directory: None,
        }
    }
}

/// Reusable named command from the `commands` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDefinition {
    #[serde(flatten)]
    pub action: ActionSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Entry of an `actions` or `parallel` list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionRef {
    /// Points at an entry of the `commands` table
    Reference {
        #[serde(rename = "ref")]
        name: String,
    },
    /// Carries its own action definition
    Inline(ActionSpec),
}

/// The single shape a menu node takes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeKind {
    /// Navigation-only node grouping child nodes
    Category { children: Vec<MenuNode> },
    /// Single action taken from the `commands` table
    Reference {
        #[serde(rename = "ref")]
        name: String,
    },
    /// Single action defined on the node itself
    Inline(ActionSpec),
    /// Actions run one after another
    Sequential {
        actions: Vec<ActionRef>,
        #[serde(
            rename = "continueOnError",
            skip_serializing_if = "std::ops::Not::not"
        )]
        continue_on_error: bool,
    },
    /// Actions dispatched side by side by the runner
    Parallel { parallel: Vec<ActionRef> },
}

/// One entry in the recursive menu tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuNode {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl MenuNode {
    /// Whether selecting this node runs something (as opposed to descending)
    pub fn is_executable(&self) -> bool {
        !matches!(self.kind, NodeKind::Category { .. })
    }

    /// Child nodes, empty for actionable leaves
    pub fn children(&self) -> &[MenuNode] {
        match &self.kind {
            NodeKind::Category { children } => children,
            _ => &[],
        }
    }
}

/// Validated menu document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuConfiguration {
    pub version: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub commands: BTreeMap<String, CommandDefinition>,
    pub menu: Vec<MenuNode>,
}

impl MenuConfiguration {
    /// Find a node by following labels from the top level down
    pub fn find<S: AsRef<str>>(&self, labels: &[S]) -> Option<&MenuNode> {
        let (first, rest) = labels.split_first()?;
        let mut node = self.menu.iter().find(|n| n.label == first.as_ref())?;
        for label in rest {
            node = node
                .children()
                .iter()
                .find(|n| n.label == label.as_ref())?;
        }
        Some(node)
    }

    /// Total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[MenuNode]) -> usize {
            nodes.iter().map(|n| 1 + count(n.children())).sum()
        }
        count(&self.menu)
    }
}
