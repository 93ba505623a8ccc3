//! Deterministic text dump of a translated workflow.
//!
//! One line per node, port and declaration, indented by ownership depth:
//!
//! ```text
//! workflow wf
//!   in x: Int
//!   call foo (foo)
//!     in a: Int <- wf.x
//!     out out: File
//!   out result: File <- foo.out
//! ```

use std::fmt::Write;

use super::types::*;

pub fn outline(graph: &WorkflowGraph) -> String {
    let mut out = String::new();
    if !graph.nodes.is_empty() {
        write_node(graph, graph.root, 0, &mut out);
    }
    out
}

fn write_node(graph: &WorkflowGraph, id: NodeId, depth: usize, out: &mut String) {
    let node = graph.node(id);
    let pad = "  ".repeat(depth);

    let header = match &node.kind {
        NodeKind::Workflow(info) => {
            let mut flags = Vec::new();
            if info.sub_workflow {
                flags.push("sub".to_string());
            }
            if info.imported {
                flags.push("imported".to_string());
            }
            if let Some(ns) = &info.namespace {
                flags.push(format!("ns={}", ns));
            }
            if flags.is_empty() {
                format!("workflow {}", node.name)
            } else {
                format!("workflow {} [{}]", node.name, flags.join(" "))
            }
        }
        NodeKind::Step { action } => format!("call {} ({})", node.name, action),
        NodeKind::Group { group, condition } => match condition {
            Some(cond) => format!("{} {} ({})", group.as_str(), node.name, cond),
            None => format!("{} {}", group.as_str(), node.name),
        },
    };
    let _ = writeln!(out, "{}{}", pad, header);

    let inner = "  ".repeat(depth + 1);
    for slot in node.inputs.values() {
        match slot {
            Slot::Port(p) => {
                let _ = writeln!(out, "{}in {}", inner, port_line(graph, *p));
            }
            Slot::Declaration(d) => {
                let decl = graph.declaration(*d);
                let _ = writeln!(
                    out,
                    "{}decl {}: {} = {}{}",
                    inner,
                    decl.name,
                    decl.ty,
                    decl.expression.text,
                    sources_suffix(graph, &decl.sources)
                );
            }
        }
    }
    for child in node.children.values() {
        write_node(graph, *child, depth + 1, out);
    }
    for port in node.outputs.values() {
        let _ = writeln!(out, "{}out {}", inner, port_line(graph, *port));
    }
}

fn port_line(graph: &WorkflowGraph, id: PortId) -> String {
    let port = graph.port(id);
    let mut line = port.name.clone();
    if let Some(ty) = &port.ty {
        line.push_str(&format!(": {}", ty));
    }
    if let Some(expr) = &port.expression {
        line.push_str(&format!(" = {}", expr));
    }
    line.push_str(&sources_suffix(graph, &port.sources));
    line
}

fn sources_suffix(graph: &WorkflowGraph, sources: &[Source]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let labels: Vec<String> = sources.iter().map(|s| graph.source_label(s)).collect();
    format!(" <- {}", labels.join(", "))
}
