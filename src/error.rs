//! Unified compiler error type used across all phases.

use serde::Serialize;

use crate::ir::validate::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phase {
    Parse,
    Translate,
    Validate,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Translate => write!(f, "Translate"),
            Phase::Validate => write!(f, "Validate"),
        }
    }
}

#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("[{phase}:{code}] {message}{}", node_suffix(.node))]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    /// Name of the offending step, group or workflow, when one is known.
    pub node: Option<String>,
}

fn node_suffix(node: &Option<String>) -> String {
    match node {
        Some(name) => format!(" (node '{}')", name),
        None => String::new(),
    }
}

impl From<ValidationError> for CompilerError {
    fn from(e: ValidationError) -> Self {
        CompilerError {
            code: e.code.to_string(),
            phase: Phase::Validate,
            message: e.message,
            node: e.node,
        }
    }
}

impl CompilerError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            node: None,
        }
    }

    pub fn translate(code: &str, message: impl Into<String>, node: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Translate,
            message: message.into(),
            node,
        }
    }

    /// A syntax node lacks an attribute the translator cannot do without.
    pub fn malformed(kind: &str, attribute: &str) -> Self {
        CompilerError::translate(
            "T007",
            format!("Malformed '{}' node: missing attribute '{}'", kind, attribute),
            None,
        )
    }
}
