//! Expression, type and meta extraction from syntax nodes.
//!
//! An expression is reduced to `{kind, text, accesses}`: its top-level kind,
//! a rendering of its source text, and every reference it makes to another
//! value (`step.output` or a bare name) in document order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::SyntaxNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Compound {
    ArrayOrMapLookup,
    MemberAccess,
    FunctionCall,
    ArrayLiteral,
    ObjectLiteral,
    MapLiteral,
    TupleLiteral,
    LogicalNot,
    UnaryPlus,
    UnaryNegation,
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LogicalOr,
    LogicalAnd,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    TernaryIf,
    MapLiteralKv,
    ObjectKV,
}

impl Compound {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "ArrayOrMapLookup" => Compound::ArrayOrMapLookup,
            "MemberAccess" => Compound::MemberAccess,
            "FunctionCall" => Compound::FunctionCall,
            "ArrayLiteral" => Compound::ArrayLiteral,
            "ObjectLiteral" => Compound::ObjectLiteral,
            "MapLiteral" => Compound::MapLiteral,
            "TupleLiteral" => Compound::TupleLiteral,
            "LogicalNot" => Compound::LogicalNot,
            "UnaryPlus" => Compound::UnaryPlus,
            "UnaryNegation" => Compound::UnaryNegation,
            "Add" => Compound::Add,
            "Subtract" => Compound::Subtract,
            "Multiply" => Compound::Multiply,
            "Divide" => Compound::Divide,
            "Remainder" => Compound::Remainder,
            "LogicalOr" => Compound::LogicalOr,
            "LogicalAnd" => Compound::LogicalAnd,
            "Equals" => Compound::Equals,
            "NotEquals" => Compound::NotEquals,
            "LessThan" => Compound::LessThan,
            "LessThanOrEqual" => Compound::LessThanOrEqual,
            "GreaterThan" => Compound::GreaterThan,
            "GreaterThanOrEqual" => Compound::GreaterThanOrEqual,
            "TernaryIf" => Compound::TernaryIf,
            "MapLiteralKv" => Compound::MapLiteralKv,
            "ObjectKV" => Compound::ObjectKV,
            _ => return None,
        };
        Some(kind)
    }

    fn binary_symbol(&self) -> Option<&'static str> {
        match self {
            Compound::Add => Some("+"),
            Compound::Subtract => Some("-"),
            Compound::Multiply => Some("*"),
            Compound::Divide => Some("/"),
            Compound::Remainder => Some("%"),
            Compound::LogicalOr => Some("||"),
            Compound::LogicalAnd => Some("&&"),
            Compound::Equals => Some("=="),
            Compound::NotEquals => Some("!="),
            Compound::LessThan => Some("<"),
            Compound::LessThanOrEqual => Some("<="),
            Compound::GreaterThan => Some(">"),
            Compound::GreaterThanOrEqual => Some(">="),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    Identifier,
    /// A terminal other than an identifier: number, string, boolean.
    Literal,
    Compound(Compound),
    /// An AST node outside the compound set.
    Other(String),
}

/// One reference made by an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    /// `lhs.rhs`, usually `call.output`.
    Qualified { lhs: String, rhs: String },
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExprKind,
    pub text: String,
    pub accesses: Vec<Access>,
}

impl Expression {
    pub fn literal(text: impl Into<String>) -> Self {
        Expression {
            kind: ExprKind::Literal,
            text: text.into(),
            accesses: vec![],
        }
    }

    /// Identifiers and member accesses forward a value unchanged.
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Identifier | ExprKind::Compound(Compound::MemberAccess)
        )
    }

    pub fn is_member_access(&self) -> bool {
        self.kind == ExprKind::Compound(Compound::MemberAccess)
    }
}

pub fn extract_expression(node: &SyntaxNode) -> Expression {
    let kind = match node {
        SyntaxNode::Terminal(t) if t.kind == "identifier" => ExprKind::Identifier,
        SyntaxNode::Terminal(_) | SyntaxNode::List(_) => ExprKind::Literal,
        SyntaxNode::Ast(ast) => match Compound::from_name(&ast.name) {
            Some(c) => ExprKind::Compound(c),
            None => ExprKind::Other(ast.name.clone()),
        },
    };

    let mut accesses = Vec::new();
    if matches!(kind, ExprKind::Compound(_)) {
        collect_accesses(node, &mut accesses);
    }

    Expression {
        kind,
        text: render(node),
        accesses,
    }
}

fn collect_accesses(node: &SyntaxNode, out: &mut Vec<Access>) {
    match node {
        SyntaxNode::Terminal(t) => {
            if t.kind == "identifier" {
                out.push(Access::Name(t.source_string.clone()));
            }
        }
        SyntaxNode::List(l) => {
            for item in &l.list {
                collect_accesses(item, out);
            }
        }
        SyntaxNode::Ast(ast) => match Compound::from_name(&ast.name) {
            Some(Compound::MemberAccess) => {
                let lhs = node.attr("lhs").and_then(SyntaxNode::as_terminal);
                let rhs = node.attr("rhs").and_then(SyntaxNode::as_terminal);
                match (lhs, rhs) {
                    (Some(l), Some(r)) if l.kind == "identifier" => out.push(Access::Qualified {
                        lhs: l.source_string.clone(),
                        rhs: r.source_string.clone(),
                    }),
                    _ => {
                        // `a.b.c`: only the innermost prefix names a value
                        if let Some(lhs) = node.attr("lhs") {
                            collect_accesses(lhs, out);
                        }
                    }
                }
            }
            Some(Compound::FunctionCall) => {
                if let Some(params) = node.attr("params") {
                    collect_accesses(params, out);
                }
            }
            Some(Compound::ObjectKV) => {
                if let Some(value) = node.attr("value") {
                    collect_accesses(value, out);
                }
            }
            Some(Compound::ObjectLiteral) => {
                if let Some(map) = node.attr("map") {
                    collect_accesses(map, out);
                }
            }
            _ => {
                for value in ast.attributes.values().flatten() {
                    collect_accesses(value, out);
                }
            }
        },
    }
}

/// Render an expression node back to WDL-like source text.
pub fn render(node: &SyntaxNode) -> String {
    match node {
        SyntaxNode::Terminal(t) if t.kind == "string" => format!("\"{}\"", t.source_string),
        SyntaxNode::Terminal(t) => t.source_string.clone(),
        SyntaxNode::List(l) => join(&l.list),
        SyntaxNode::Ast(ast) => {
            let attr = |key: &str| node.attr(key).map(render).unwrap_or_default();
            let Some(kind) = Compound::from_name(&ast.name) else {
                return ast.name.clone();
            };
            if let Some(symbol) = kind.binary_symbol() {
                return format!("{} {} {}", operand(node, "lhs"), symbol, operand(node, "rhs"));
            }
            match kind {
                Compound::MemberAccess => format!("{}.{}", attr("lhs"), attr("rhs")),
                Compound::ArrayOrMapLookup => format!("{}[{}]", attr("lhs"), attr("rhs")),
                Compound::FunctionCall => format!("{}({})", attr("name"), attr("params")),
                Compound::ArrayLiteral => format!("[{}]", attr("values")),
                Compound::TupleLiteral => format!("({})", attr("values")),
                Compound::MapLiteral => format!("{{{}}}", attr("map")),
                Compound::ObjectLiteral => format!("object {{{}}}", attr("map")),
                Compound::MapLiteralKv | Compound::ObjectKV => {
                    format!("{}: {}", attr("key"), attr("value"))
                }
                Compound::LogicalNot => format!("!{}", operand(node, "expression")),
                Compound::UnaryPlus => format!("+{}", operand(node, "expression")),
                Compound::UnaryNegation => format!("-{}", operand(node, "expression")),
                Compound::TernaryIf => format!(
                    "if {} then {} else {}",
                    attr("cond"),
                    attr("iftrue"),
                    attr("iffalse")
                ),
                _ => ast.name.clone(),
            }
        }
    }
}

fn join(items: &[SyntaxNode]) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(", ")
}

/// Binary operands are parenthesized so the rendering keeps its grouping.
fn operand(node: &SyntaxNode, key: &str) -> String {
    let Some(child) = node.attr(key) else {
        return String::new();
    };
    let nested_binary = child
        .as_ast()
        .and_then(|a| Compound::from_name(&a.name))
        .is_some_and(|c| c.binary_symbol().is_some());
    if nested_binary {
        format!("({})", render(child))
    } else {
        render(child)
    }
}

/// Render a type node: `Int`, `Array[File]`, `Map[String, Int]`, `File?`, `Array[Int]+`.
pub fn extract_type(node: &SyntaxNode) -> String {
    match node {
        SyntaxNode::Terminal(t) => t.source_string.clone(),
        SyntaxNode::List(l) => l.list.iter().map(extract_type).collect::<Vec<_>>().join(", "),
        SyntaxNode::Ast(ast) => match ast.name.as_str() {
            "OptionalType" => format!("{}?", node.attr("innerType").map(extract_type).unwrap_or_default()),
            "NonEmptyType" => format!("{}+", node.attr("innerType").map(extract_type).unwrap_or_default()),
            _ => {
                let name = node.attr("name").map(extract_type).unwrap_or_else(|| ast.name.clone());
                let sub = node.attr_items("subtype");
                if sub.is_empty() {
                    name
                } else {
                    let inner: Vec<String> = sub.iter().map(extract_type).collect();
                    format!("{}[{}]", name, inner.join(", "))
                }
            }
        },
    }
}

/// Key/value pairs of a `meta` or `parameter_meta` block, in source order.
pub fn extract_meta(pairs: &[SyntaxNode]) -> IndexMap<String, String> {
    pairs
        .iter()
        .filter_map(|pair| {
            let key = pair.attr_source("key")?;
            let value = pair
                .attr("value")
                .map(|v| match v.as_terminal() {
                    Some(t) => t.source_string.clone(),
                    None => render(v),
                })
                .unwrap_or_default();
            Some((key.to_string(), value))
        })
        .collect()
}
