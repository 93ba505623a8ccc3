use wdl_graph::ir::*;
use wdl_graph::parse::{ActionKind, ResolutionContext, SyntaxNode};

// =============================================================================
// Terminals and expressions
// =============================================================================

pub fn ident(name: &str) -> SyntaxNode {
    SyntaxNode::identifier(name)
}

pub fn int(value: &str) -> SyntaxNode {
    SyntaxNode::terminal("integer", value)
}

pub fn ty(name: &str) -> SyntaxNode {
    SyntaxNode::terminal("type", name)
}

pub fn array_of(inner: &str) -> SyntaxNode {
    SyntaxNode::ast(
        "Type",
        [
            ("name", Some(ty("Array"))),
            ("subtype", Some(SyntaxNode::list(vec![ty(inner)]))),
        ],
    )
}

pub fn member(lhs: &str, rhs: &str) -> SyntaxNode {
    SyntaxNode::ast("MemberAccess", [("lhs", Some(ident(lhs))), ("rhs", Some(ident(rhs)))])
}

pub fn binary(op: &str, lhs: SyntaxNode, rhs: SyntaxNode) -> SyntaxNode {
    SyntaxNode::ast(op, [("lhs", Some(lhs)), ("rhs", Some(rhs))])
}

pub fn function(name: &str, params: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "FunctionCall",
        [("name", Some(ident(name))), ("params", Some(SyntaxNode::list(params)))],
    )
}

// =============================================================================
// Body elements
// =============================================================================

pub fn declaration(ty_node: SyntaxNode, name: &str, expression: Option<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "Declaration",
        [
            ("type", Some(ty_node)),
            ("name", Some(ident(name))),
            ("expression", expression),
        ],
    )
}

pub fn input(type_name: &str, name: &str) -> SyntaxNode {
    declaration(ty(type_name), name, None)
}

pub fn call(task: &str, alias: Option<&str>, inputs: Vec<(&str, SyntaxNode)>) -> SyntaxNode {
    let body = if inputs.is_empty() {
        None
    } else {
        let mappings = inputs
            .into_iter()
            .map(|(key, value)| {
                SyntaxNode::ast("IOMapping", [("key", Some(ident(key))), ("value", Some(value))])
            })
            .collect();
        Some(SyntaxNode::ast(
            "CallBody",
            [
                ("declarations", Some(SyntaxNode::list(vec![]))),
                (
                    "io",
                    Some(SyntaxNode::list(vec![SyntaxNode::ast(
                        "Inputs",
                        [("map", Some(SyntaxNode::list(mappings)))],
                    )])),
                ),
            ],
        ))
    };
    SyntaxNode::ast(
        "Call",
        [
            ("task", Some(ident(task))),
            ("alias", alias.map(ident)),
            ("body", body),
        ],
    )
}

pub fn scatter(item: &str, collection: SyntaxNode, body: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "Scatter",
        [
            ("item", Some(ident(item))),
            ("collection", Some(collection)),
            ("body", Some(SyntaxNode::list(body))),
        ],
    )
}

pub fn if_block(condition: SyntaxNode, body: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "If",
        [("expression", Some(condition)), ("body", Some(SyntaxNode::list(body)))],
    )
}

pub fn while_loop(condition: SyntaxNode, body: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "WhileLoop",
        [("expression", Some(condition)), ("body", Some(SyntaxNode::list(body)))],
    )
}

pub fn meta(kind: &str, pairs: &[(&str, &str)]) -> SyntaxNode {
    let pairs = pairs
        .iter()
        .map(|(k, v)| {
            SyntaxNode::ast(
                "MetaKvPair",
                [("key", Some(ident(k))), ("value", Some(SyntaxNode::terminal("string", v)))],
            )
        })
        .collect();
    SyntaxNode::ast(kind, [("map", Some(SyntaxNode::list(pairs)))])
}

/// `Type name = expression` output item.
pub fn output(ty_node: SyntaxNode, name: &str, expression: SyntaxNode) -> SyntaxNode {
    SyntaxNode::ast(
        "WorkflowOutputDeclaration",
        [
            ("type", Some(ty_node)),
            ("name", Some(ident(name))),
            ("expression", Some(expression)),
        ],
    )
}

/// Legacy `call.output` or `call.*` output item.
pub fn legacy_output(fqn: &str, wildcard: Option<&str>) -> SyntaxNode {
    SyntaxNode::ast(
        "WorkflowOutputWildcard",
        [
            ("fqn", Some(SyntaxNode::terminal("fqn", fqn))),
            ("wildcard", wildcard.map(|w| SyntaxNode::terminal("asterisk", w))),
        ],
    )
}

pub fn outputs(items: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast("WorkflowOutputs", [("outputs", Some(SyntaxNode::list(items)))])
}

pub fn workflow(name: &str, body: Vec<SyntaxNode>) -> SyntaxNode {
    SyntaxNode::ast(
        "Workflow",
        [("name", Some(ident(name))), ("body", Some(SyntaxNode::list(body)))],
    )
}

// =============================================================================
// Actions and context
// =============================================================================

/// Task with the given `(type, name)` inputs and outputs.
pub fn task(name: &str, inputs: &[(&str, &str)], outputs: &[(&str, &str)]) -> SyntaxNode {
    let declarations = inputs.iter().map(|(t, n)| input(t, n)).collect();
    let outputs = outputs
        .iter()
        .map(|(t, n)| {
            SyntaxNode::ast(
                "Output",
                [
                    ("type", Some(ty(t))),
                    ("name", Some(ident(n))),
                ],
            )
        })
        .collect();
    SyntaxNode::ast(
        "Task",
        [
            ("name", Some(ident(name))),
            ("declarations", Some(SyntaxNode::list(declarations))),
            (
                "sections",
                Some(SyntaxNode::list(vec![SyntaxNode::ast(
                    "Outputs",
                    [("attributes", Some(SyntaxNode::list(outputs)))],
                )])),
            ),
        ],
    )
}

pub fn context_with_tasks(tasks: &[(&str, SyntaxNode)]) -> ResolutionContext {
    tasks.iter().fold(ResolutionContext::new(), |ctx, (name, ast)| {
        ctx.with_action(name, ActionKind::Task, ast.clone())
    })
}

// =============================================================================
// Graph queries
// =============================================================================

pub fn node_named<'a>(graph: &'a WorkflowGraph, name: &str) -> (NodeId, &'a Node) {
    let (i, node) = graph
        .nodes
        .iter()
        .enumerate()
        .find(|(_, n)| n.name == name)
        .unwrap_or_else(|| panic!("no node named '{}'", name));
    (NodeId(i), node)
}

pub fn input_of(graph: &WorkflowGraph, node: &str, port: &str) -> PortId {
    node_named(graph, node)
        .1
        .input_port(port)
        .unwrap_or_else(|| panic!("'{}' has no input '{}'", node, port))
}

pub fn output_of(graph: &WorkflowGraph, node: &str, port: &str) -> PortId {
    *node_named(graph, node)
        .1
        .outputs
        .get(port)
        .unwrap_or_else(|| panic!("'{}' has no output '{}'", node, port))
}

/// Source labels of a port, e.g. `["call1.out", "'5'"]`.
pub fn source_labels(graph: &WorkflowGraph, port: PortId) -> Vec<String> {
    graph
        .port(port)
        .sources
        .iter()
        .map(|s| graph.source_label(s))
        .collect()
}
