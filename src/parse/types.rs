//! Rust types mirroring the syntax tree handed over by the WDL grammar engine.
//!
//! The tree is generic: an AST node has a kind name and named attributes, a
//! list wraps an ordered sequence of nodes and a terminal holds raw source
//! text. Kind names are compared case-insensitively.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

// =============================================================================
// SYNTAX NODE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SyntaxNode {
    Ast(AstNode),
    List(ListNode),
    Terminal(Terminal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AstNode {
    pub name: String,
    /// `None` marks an attribute the grammar left empty (e.g. a declaration
    /// without an expression).
    pub attributes: IndexMap<String, Option<SyntaxNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListNode {
    pub list: Vec<SyntaxNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    /// Terminal kind as named by the grammar: `identifier`, `integer`, `string`...
    #[serde(rename = "str")]
    pub kind: String,
    pub source_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u32>,
}

impl SyntaxNode {
    pub fn ast<'a>(
        name: &str,
        attributes: impl IntoIterator<Item = (&'a str, Option<SyntaxNode>)>,
    ) -> Self {
        SyntaxNode::Ast(AstNode {
            name: name.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        })
    }

    pub fn list(items: Vec<SyntaxNode>) -> Self {
        SyntaxNode::List(ListNode { list: items })
    }

    pub fn terminal(kind: &str, source: &str) -> Self {
        SyntaxNode::Terminal(Terminal {
            kind: kind.to_string(),
            source_string: source.to_string(),
            line: None,
            col: None,
        })
    }

    pub fn identifier(source: &str) -> Self {
        SyntaxNode::terminal("identifier", source)
    }

    /// Lower-cased kind name of an AST node.
    pub fn kind_name(&self) -> Option<String> {
        match self {
            SyntaxNode::Ast(node) => Some(node.name.to_lowercase()),
            _ => None,
        }
    }

    pub fn as_ast(&self) -> Option<&AstNode> {
        match self {
            SyntaxNode::Ast(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_terminal(&self) -> Option<&Terminal> {
        match self {
            SyntaxNode::Terminal(t) => Some(t),
            _ => None,
        }
    }

    /// Items of a list node; an AST or terminal yields nothing.
    pub fn items(&self) -> &[SyntaxNode] {
        match self {
            SyntaxNode::List(l) => &l.list,
            _ => &[],
        }
    }

    /// Attribute lookup on an AST node; absent and empty attributes both yield `None`.
    pub fn attr(&self, key: &str) -> Option<&SyntaxNode> {
        self.as_ast()
            .and_then(|node| node.attributes.get(key))
            .and_then(|v| v.as_ref())
    }

    pub fn attr_mut(&mut self, key: &str) -> Option<&mut SyntaxNode> {
        match self {
            SyntaxNode::Ast(node) => node.attributes.get_mut(key).and_then(|v| v.as_mut()),
            _ => None,
        }
    }

    pub fn require_attr(&self, key: &str) -> Result<&SyntaxNode, CompilerError> {
        self.attr(key).ok_or_else(|| {
            CompilerError::malformed(self.kind_name().as_deref().unwrap_or("?"), key)
        })
    }

    /// Source text of a terminal attribute, e.g. a call's `task` or a declaration's `name`.
    pub fn attr_source(&self, key: &str) -> Option<&str> {
        self.attr(key)
            .and_then(SyntaxNode::as_terminal)
            .map(|t| t.source_string.as_str())
    }

    pub fn require_source(&self, key: &str) -> Result<&str, CompilerError> {
        self.attr_source(key).ok_or_else(|| {
            CompilerError::malformed(self.kind_name().as_deref().unwrap_or("?"), key)
        })
    }

    /// Items of a list-valued attribute; missing attributes yield nothing.
    pub fn attr_items(&self, key: &str) -> &[SyntaxNode] {
        self.attr(key).map(SyntaxNode::items).unwrap_or(&[])
    }
}

// =============================================================================
// BODY ELEMENT KINDS
// =============================================================================

/// Closed set of workflow body elements the translator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Declaration,
    Meta,
    ParameterMeta,
    Call,
    Scatter,
    If,
    WhileLoop,
    WorkflowOutputs,
}

impl BodyKind {
    /// Kinds that may only appear directly in a workflow body.
    pub const NESTED_DISALLOWED: [BodyKind; 3] =
        [BodyKind::WorkflowOutputs, BodyKind::Meta, BodyKind::ParameterMeta];

    /// Classify a body element; unknown kinds yield `None` and are skipped by callers.
    pub fn of(node: &SyntaxNode) -> Option<Self> {
        match node.kind_name()?.as_str() {
            "declaration" => Some(BodyKind::Declaration),
            "meta" => Some(BodyKind::Meta),
            "parametermeta" => Some(BodyKind::ParameterMeta),
            "call" => Some(BodyKind::Call),
            "scatter" => Some(BodyKind::Scatter),
            "if" => Some(BodyKind::If),
            "whileloop" => Some(BodyKind::WhileLoop),
            "workflowoutputs" => Some(BodyKind::WorkflowOutputs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyKind::Declaration => "declaration",
            BodyKind::Meta => "meta",
            BodyKind::ParameterMeta => "parametermeta",
            BodyKind::Call => "call",
            BodyKind::Scatter => "scatter",
            BodyKind::If => "if",
            BodyKind::WhileLoop => "whileloop",
            BodyKind::WorkflowOutputs => "workflowoutputs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_all_three_shapes() {
        let json = r#"{
            "name": "Declaration",
            "attributes": {
                "type": {"str": "type", "source_string": "Int", "line": 2, "col": 3},
                "name": {"str": "identifier", "source_string": "x"},
                "expression": null
            }
        }"#;
        let node: SyntaxNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind_name().as_deref(), Some("declaration"));
        assert_eq!(node.attr_source("name"), Some("x"));
        assert!(node.attr("expression").is_none());

        let list: SyntaxNode = serde_json::from_str(r#"{"list": []}"#).unwrap();
        assert!(matches!(list, SyntaxNode::List(_)));
    }

    #[test]
    fn body_kind_is_case_insensitive() {
        let node = SyntaxNode::ast("WhileLoop", []);
        assert_eq!(BodyKind::of(&node), Some(BodyKind::WhileLoop));
        let unknown = SyntaxNode::ast("RawCommand", []);
        assert_eq!(BodyKind::of(&unknown), None);
    }
}
