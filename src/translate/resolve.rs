//! Resolve an expression to the sources it reads from.

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::expression::{Access, ExprKind, Expression};

/// Produce the ordered sources of `expr` as referenced from `scope`.
///
/// Qualified accesses (`call.output`) are looked up anywhere below
/// `workflow`; bare names are looked up from `scope` outwards. An expression
/// with no references resolves to its own text. `output_block` names the
/// workflow whose output block is being resolved, for error messages.
pub fn resolve_expression(
    graph: &WorkflowGraph,
    workflow: NodeId,
    scope: NodeId,
    expr: &Expression,
    output_block: Option<&str>,
) -> Result<Vec<Source>, CompilerError> {
    let location = match output_block {
        Some(name) => format!("in {} output block ", name),
        None => String::new(),
    };

    match &expr.kind {
        ExprKind::Compound(_) if !expr.accesses.is_empty() => expr
            .accesses
            .iter()
            .map(|access| match access {
                Access::Qualified { lhs, rhs } => {
                    resolve_qualified(graph, workflow, lhs, rhs, &location)
                }
                Access::Name(name) => graph
                    .resolve_in_scope(scope, name)
                    .ok_or_else(|| undeclared_variable(&location, &expr.text)),
            })
            .collect(),
        ExprKind::Identifier => graph
            .resolve_in_scope(scope, &expr.text)
            .map(|source| vec![source])
            .ok_or_else(|| undeclared_variable(&location, &expr.text)),
        _ if expr.text.is_empty() => Ok(vec![]),
        _ => Ok(vec![Source::Literal(expr.text.clone())]),
    }
}

fn resolve_qualified(
    graph: &WorkflowGraph,
    workflow: NodeId,
    lhs: &str,
    rhs: &str,
    location: &str,
) -> Result<Source, CompilerError> {
    match graph.find_in_structure(workflow, lhs) {
        Some(Found::Node(id)) => graph
            .node(id)
            .outputs
            .get(rhs)
            .map(|port| Source::Port(*port))
            .ok_or_else(|| undeclared_variable(location, &format!("{}.{}", lhs, rhs))),
        // a member of a port: the whole value is the source
        Some(Found::Port(port)) => Ok(Source::Port(port)),
        // only calls and ports can be qualified
        Some(Found::Declaration(_)) | None => Err(undeclared_call(location, lhs)),
    }
}

fn undeclared_call(location: &str, lhs: &str) -> CompilerError {
    CompilerError::translate(
        "T004",
        format!("Undeclared call {}is referenced: '{}'", location, lhs),
        None,
    )
}

fn undeclared_variable(location: &str, text: &str) -> CompilerError {
    CompilerError::translate(
        "T003",
        format!("Undeclared variable {}is referenced: '{}'", location, text),
        None,
    )
}
