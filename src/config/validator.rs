//! Structural validation of decoded menu documents.
//!
//! Walks the untyped [`RawValue`] tree and checks it against the menu schema.
//! Validation never stops at the first problem: every error in the document
//! is collected, each with a path such as `menu[0].children[1].label`, so a
//! user can fix everything in one pass. When no error is found the typed
//! [`MenuConfiguration`] is returned alongside the result.
//!
//! References (`ref`) are only checked for shape here. Whether a name exists
//! in the `commands` table is decided at resolution time.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::model::{
    ActionKind, ActionRef, ActionSpec, CommandDefinition, MenuConfiguration, MenuNode, NodeKind,
};

/// Untyped document tree produced by the decoder
pub type RawValue = Value;

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: Option<String>) -> Self {
        Self {
            message: message.into(),
            path,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Every error found in one validation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for error in &self.0 {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Outcome of validating a document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True exactly when `errors` is empty
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Typed configuration, present only when valid
    #[serde(skip)]
    pub config: Option<MenuConfiguration>,
}

impl ValidationResult {
    fn from_parts(config: Option<MenuConfiguration>, errors: Vec<ValidationError>) -> Self {
        let valid = errors.is_empty();
        Self {
            valid,
            config: if valid { config } else { None },
            errors,
        }
    }

    /// Hand out the typed configuration, or every collected error
    pub fn into_config(self) -> Result<MenuConfiguration, ValidationErrors> {
        match self.config {
            Some(config) if self.valid => Ok(config),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}

/// Validate a decoded document against the menu schema
pub fn validate(raw: &RawValue) -> ValidationResult {
    let mut validator = Validator::default();
    let config = validator.validate_root(raw);
    ValidationResult::from_parts(config, validator.errors)
}

const ACTION_FIELDS: &str = "children, ref, type and command, actions, or parallel";

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Field is present with a non-null value
fn present(map: &Map<String, Value>, key: &str) -> bool {
    map.get(key).is_some_and(|v| !v.is_null())
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn error(&mut self, path: String, message: impl Into<String>) {
        self.errors.push(ValidationError::new(message, Some(path)));
    }

    fn validate_root(&mut self, raw: &RawValue) -> Option<MenuConfiguration> {
        let Some(map) = raw.as_object() else {
            self.errors.push(ValidationError::new(
                "Configuration must be a mapping with 'version' and 'menu'",
                None,
            ));
            return None;
        };

        let version = self.required_string(map, "version", "");

        let commands = match map.get("commands") {
            None | Some(Value::Null) => Some(BTreeMap::new()),
            Some(Value::Object(entries)) => self.validate_commands(entries),
            Some(_) => {
                self.error("commands".to_string(), "'commands' must be a mapping");
                None
            }
        };

        let menu = match map.get("menu") {
            None | Some(Value::Null) => {
                self.error("menu".to_string(), "Missing required field 'menu'");
                None
            }
            Some(Value::Array(items)) => self.validate_nodes(items, "menu"),
            Some(_) => {
                self.error("menu".to_string(), "'menu' must be a list");
                None
            }
        };

        Some(MenuConfiguration {
            version: version?,
            commands: commands?,
            menu: menu?,
        })
    }

    fn validate_commands(
        &mut self,
        entries: &Map<String, Value>,
    ) -> Option<BTreeMap<String, CommandDefinition>> {
        let mut commands = BTreeMap::new();
        let mut complete = true;

        for (name, value) in entries {
            let path = child_path("commands", name);
            let Some(map) = value.as_object() else {
                self.error(path, "Command definition must be a mapping");
                complete = false;
                continue;
            };

            let action = self.validate_action_spec(map, &path);
            let description = self.optional_string(map, "description", &path);
            match action {
                Some(action) => {
                    commands.insert(name.clone(), CommandDefinition { action, description });
                }
                None => complete = false,
            }
        }

        complete.then_some(commands)
    }

    fn validate_nodes(&mut self, items: &[Value], path: &str) -> Option<Vec<MenuNode>> {
        // Collect eagerly so every sibling is checked even after a failure.
        let nodes: Vec<Option<MenuNode>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.validate_node(item, &index_path(path, i)))
            .collect();
        nodes.into_iter().collect()
    }

    fn validate_node(&mut self, value: &Value, path: &str) -> Option<MenuNode> {
        let Some(map) = value.as_object() else {
            self.error(path.to_string(), "Menu item must be a mapping");
            return None;
        };

        let label = self.required_string(map, "label", path);
        let icon = self.optional_string(map, "icon", path);
        let description = self.optional_string(map, "description", path);
        let kind = self.validate_node_kind(map, path);

        Some(MenuNode {
            label: label?,
            icon,
            description,
            kind: kind?,
        })
    }

    fn validate_node_kind(&mut self, map: &Map<String, Value>, path: &str) -> Option<NodeKind> {
        // Categories ignore any action-defining fields.
        if present(map, "children") {
            return match map.get("children") {
                Some(Value::Array(items)) => {
                    let children = self.validate_nodes(items, &child_path(path, "children"));
                    children.map(|children| NodeKind::Category { children })
                }
                _ => {
                    self.error(child_path(path, "children"), "'children' must be a list");
                    None
                }
            };
        }

        let has_ref = present(map, "ref");
        let has_inline = present(map, "type") || present(map, "command");
        let has_actions = present(map, "actions");
        let has_parallel = present(map, "parallel");

        let branches = [has_ref, has_inline, has_actions, has_parallel]
            .iter()
            .filter(|b| **b)
            .count();

        if branches == 0 {
            self.error(
                path.to_string(),
                format!("Missing type or ref: menu item must define {}", ACTION_FIELDS),
            );
            return None;
        }
        if branches > 1 {
            self.error(
                path.to_string(),
                "Menu item must define only one of ref, type and command, actions, or parallel",
            );
            return None;
        }

        if has_ref {
            let name = self.reference(map, path)?;
            return Some(NodeKind::Reference { name });
        }
        if has_inline {
            return self.validate_action_spec(map, path).map(NodeKind::Inline);
        }
        if has_actions {
            let continue_on_error = self.optional_bool(map, "continueOnError", path);
            let actions = self.validate_action_list(map, "actions", path)?;
            return Some(NodeKind::Sequential {
                actions,
                continue_on_error: continue_on_error.unwrap_or(false),
            });
        }

        let parallel = self.validate_action_list(map, "parallel", path)?;
        Some(NodeKind::Parallel { parallel })
    }

    fn validate_action_list(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<Vec<ActionRef>> {
        let list_path = child_path(path, key);
        let Some(items) = map.get(key).and_then(Value::as_array) else {
            self.error(list_path, format!("'{}' must be a list", key));
            return None;
        };

        let refs: Vec<Option<ActionRef>> = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.validate_action_ref(item, &index_path(&list_path, i)))
            .collect();
        refs.into_iter().collect()
    }

    fn validate_action_ref(&mut self, value: &Value, path: &str) -> Option<ActionRef> {
        let Some(map) = value.as_object() else {
            self.error(path.to_string(), "Action must be a mapping");
            return None;
        };

        let has_ref = present(map, "ref");
        let has_inline = present(map, "type") || present(map, "command");

        if has_ref && has_inline {
            self.error(
                path.to_string(),
                "Action must define only one of ref, or type and command",
            );
            return None;
        }
        if has_ref {
            let name = self.reference(map, path)?;
            return Some(ActionRef::Reference { name });
        }
        if has_inline {
            return self.validate_action_spec(map, path).map(ActionRef::Inline);
        }

        self.error(
            path.to_string(),
            "Missing type or ref: action must define ref, or type and command",
        );
        None
    }

    /// Checks `type`, `command` and the optional execution fields
    fn validate_action_spec(&mut self, map: &Map<String, Value>, path: &str) -> Option<ActionSpec> {
        let kind = self.action_kind(map, path);
        let command = self.required_string(map, "command", path);
        let terminal_name = self.optional_string(map, "terminalName", path);
        let working_directory = self.optional_string(map, "workingDirectory", path);

        let arguments = match map.get("arguments") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items.clone()),
            Some(_) => {
                self.error(child_path(path, "arguments"), "'arguments' must be a list");
                None
            }
        };

        Some(ActionSpec {
            kind: kind?,
            command: command?,
            terminal_name,
            arguments,
            working_directory,
        })
    }

    fn action_kind(&mut self, map: &Map<String, Value>, path: &str) -> Option<ActionKind> {
        let field = child_path(path, "type");
        match map.get("type") {
            None | Some(Value::Null) => {
                self.error(field, "Missing required field 'type'");
                None
            }
            Some(Value::String(name)) => {
                let kind = ActionKind::parse(name);
                if kind.is_none() {
                    let expected: Vec<&str> = ActionKind::ALL.iter().map(|k| k.as_str()).collect();
                    self.error(
                        field,
                        format!(
                            "Invalid type '{}', expected one of: {}",
                            name,
                            expected.join(", ")
                        ),
                    );
                }
                kind
            }
            Some(_) => {
                self.error(field, "'type' must be a string");
                None
            }
        }
    }

    fn reference(&mut self, map: &Map<String, Value>, path: &str) -> Option<String> {
        match map.get("ref") {
            Some(Value::String(name)) => Some(name.clone()),
            _ => {
                self.error(child_path(path, "ref"), "'ref' must be a string");
                None
            }
        }
    }

    fn required_string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        let field = child_path(path, key);
        match map.get(key) {
            None | Some(Value::Null) => {
                self.error(field, format!("Missing required field '{}'", key));
                None
            }
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(_) => {
                self.error(field, format!("'{}' must be a non-empty string", key));
                None
            }
        }
    }

    fn optional_string(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<String> {
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.error(child_path(path, key), format!("'{}' must be a string", key));
                None
            }
        }
    }

    fn optional_bool(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.error(child_path(path, key), format!("'{}' must be a boolean", key));
                None
            }
        }
    }
}
