//! Invariant checks over a translated `WorkflowGraph`.
//!
//! Translation already upholds these; the checks exist for graphs that were
//! deserialized or edited after the fact, and are run by `compile` on request.

use petgraph::algo::is_cyclic_directed;

use super::graph::ownership_graph;
use super::types::*;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    /// Name of the node where the error was found, if applicable.
    pub node: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node {
            Some(name) => write!(f, "[{}] {} (at node '{}')", self.code, self.message, name),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Validate a WorkflowGraph against all invariants. Returns all errors found.
pub fn validate_graph(graph: &WorkflowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_ownership_tree(graph, &mut errors);
    validate_slot_kinds(graph, &mut errors);
    validate_edge_indices(graph, &mut errors);
    if errors.iter().any(|e| e.code == "V002" || e.code == "V004") {
        // the remaining checks index the arena through edges
        return errors;
    }
    validate_no_dead_declarations(graph, &mut errors);
    validate_scatter_items(graph, &mut errors);

    errors
}

// ---------------------------------------------------------------------------
// V001: ownership is a tree rooted at `root`
// ---------------------------------------------------------------------------

fn validate_ownership_tree(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let Some(root) = graph.nodes.get(graph.root.0) else {
        let message = if graph.nodes.is_empty() {
            "Graph has no root workflow".to_string()
        } else {
            format!("Root {} points outside the graph", graph.root.0)
        };
        errors.push(ValidationError {
            code: "V001",
            message,
            node: None,
        });
        return;
    };

    if root.parent.is_some() || !root.is_workflow() {
        errors.push(ValidationError {
            code: "V001",
            message: "Root must be a workflow without a parent".into(),
            node: Some(root.name.clone()),
        });
    }

    for (i, node) in graph.nodes.iter().enumerate() {
        for (name, child) in &node.children {
            let Some(child_node) = graph.nodes.get(child.0) else {
                errors.push(ValidationError {
                    code: "V001",
                    message: format!("Child '{}' points outside the graph", name),
                    node: Some(node.name.clone()),
                });
                continue;
            };
            if child_node.parent != Some(NodeId(i)) {
                errors.push(ValidationError {
                    code: "V001",
                    message: format!("Child '{}' does not point back at its owner", name),
                    node: Some(node.name.clone()),
                });
            }
        }
    }

    if is_cyclic_directed(&ownership_graph(graph)) {
        errors.push(ValidationError {
            code: "V001",
            message: "Ownership contains a cycle".into(),
            node: None,
        });
    }
}

// ---------------------------------------------------------------------------
// V002: a slot name refers to a declaration or a port of the same name
// ---------------------------------------------------------------------------

fn validate_slot_kinds(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    for node in &graph.nodes {
        for (name, slot) in &node.inputs {
            let slot_name = match slot {
                Slot::Port(p) => graph.ports.get(p.0).map(|p| &p.name),
                Slot::Declaration(d) => graph.declarations.get(d.0).map(|d| &d.name),
            };
            if slot_name != Some(name) {
                errors.push(ValidationError {
                    code: "V002",
                    message: format!("Slot '{}' is bound to a different or missing entry", name),
                    node: Some(node.name.clone()),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// V004: every bind edge refers to an existing entry
// ---------------------------------------------------------------------------

fn validate_edge_indices(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let in_range = |s: &Source| match s {
        Source::Port(p) => p.0 < graph.ports.len(),
        Source::Declaration(d) => d.0 < graph.declarations.len(),
        Source::Literal(_) => true,
    };

    for port in &graph.ports {
        if port.owner.0 >= graph.nodes.len() {
            errors.push(ValidationError {
                code: "V004",
                message: format!("Port '{}' belongs to a missing node", port.name),
                node: None,
            });
        }
        if port.sources.iter().any(|s| !in_range(s)) {
            errors.push(ValidationError {
                code: "V004",
                message: format!("Port '{}' is bound to a missing source", port.name),
                node: graph.nodes.get(port.owner.0).map(|n| n.name.clone()),
            });
        }
    }
    for decl in &graph.declarations {
        if decl.owner.0 >= graph.nodes.len() {
            errors.push(ValidationError {
                code: "V004",
                message: format!("Declaration '{}' belongs to a missing node", decl.name),
                node: None,
            });
        }
        if decl.sources.iter().any(|s| !in_range(s)) {
            errors.push(ValidationError {
                code: "V004",
                message: format!("Declaration '{}' is bound to a missing source", decl.name),
                node: graph.nodes.get(decl.owner.0).map(|n| n.name.clone()),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// V003: nothing reads from a promoted declaration
// ---------------------------------------------------------------------------

fn validate_no_dead_declarations(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    let is_dead = |s: &Source| match s {
        Source::Declaration(d) => graph.declaration(*d).promoted_to.is_some(),
        _ => false,
    };

    for port in &graph.ports {
        if let Some(Source::Declaration(d)) = port.sources.iter().find(|s| is_dead(*s)) {
            errors.push(ValidationError {
                code: "V003",
                message: format!(
                    "Port '{}' still reads from promoted declaration '{}'",
                    port.name,
                    graph.declaration(*d).name
                ),
                node: graph.nodes.get(port.owner.0).map(|n| n.name.clone()),
            });
        }
    }
    for decl in graph.declarations.iter().filter(|d| d.promoted_to.is_none()) {
        if let Some(Source::Declaration(d)) = decl.sources.iter().find(|s| is_dead(*s)) {
            errors.push(ValidationError {
                code: "V003",
                message: format!(
                    "Declaration '{}' still reads from promoted declaration '{}'",
                    decl.name,
                    graph.declaration(*d).name
                ),
                node: graph.nodes.get(decl.owner.0).map(|n| n.name.clone()),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// V005: a scatter has exactly one ScatterItem input
// ---------------------------------------------------------------------------

fn validate_scatter_items(graph: &WorkflowGraph, errors: &mut Vec<ValidationError>) {
    for node in &graph.nodes {
        if node.group_kind() != Some(GroupKind::Scatter) {
            continue;
        }
        let items: Vec<PortId> = node
            .input_ports()
            .map(|(_, p)| p)
            .filter(|p| graph.port(*p).ty.as_deref() == Some("ScatterItem"))
            .collect();
        if items.len() != 1 {
            errors.push(ValidationError {
                code: "V005",
                message: format!("Scatter must have exactly one ScatterItem input, found {}", items.len()),
                node: Some(node.name.clone()),
            });
        }
    }
}
