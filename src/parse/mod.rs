//! Parse phase: JSON → syntax tree and resolution context.

pub mod context;
pub mod expression;
pub mod types;

pub use context::*;
pub use types::*;

use crate::error::CompilerError;

/// Deserialize a `Workflow` syntax node from the grammar engine's JSON.
pub fn parse(json: &str) -> Result<SyntaxNode, CompilerError> {
    serde_json::from_str::<SyntaxNode>(json).map_err(|e| {
        CompilerError::parse("P001", format!("Failed to parse syntax tree JSON: {}", e))
    })
}

/// Deserialize the resolution context (action map + imports).
pub fn parse_context(json: &str) -> Result<ResolutionContext, CompilerError> {
    serde_json::from_str::<ResolutionContext>(json).map_err(|e| {
        CompilerError::parse("P001", format!("Failed to parse resolution context JSON: {}", e))
    })
}
