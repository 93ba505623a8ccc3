//! Resolution context: every action a workflow may call, keyed by its
//! fully-qualified name, plus the import records of the root document.
//!
//! The context is assembled upstream (imports resolved, namespaces applied)
//! and is read-only while a translation runs. Actions imported under a
//! namespace are keyed `ns.name`; actions reachable from an imported
//! workflow are keyed with the whole namespace chain, `ns1.ns2.name`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::SyntaxNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Task,
    Workflow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDef {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// The `Task` or `Workflow` syntax node defining the action.
    pub ast: SyntaxNode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imports {
    #[serde(default)]
    pub imports: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionContext {
    #[serde(default)]
    pub action_map: HashMap<String, ActionDef>,
    #[serde(default)]
    pub imports: Option<Imports>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action(mut self, name: &str, kind: ActionKind, ast: SyntaxNode) -> Self {
        self.action_map.insert(name.to_string(), ActionDef { kind, ast });
        self
    }

    pub fn action(&self, qualified_name: &str) -> Option<&ActionDef> {
        self.action_map.get(qualified_name)
    }

    /// Import records to carry onto the root workflow, if there are any.
    pub fn import_records(&self) -> Option<&[serde_json::Value]> {
        self.imports
            .as_ref()
            .map(|i| i.imports.as_slice())
            .filter(|records| !records.is_empty())
    }
}
