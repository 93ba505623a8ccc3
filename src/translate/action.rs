//! Port shape of a task action, read from its `Task` syntax node.

use crate::parse::expression::{extract_type, render};
use crate::parse::types::SyntaxNode;

#[derive(Debug, Clone, PartialEq)]
pub struct PortSpec {
    pub name: String,
    pub ty: Option<String>,
    /// Default or computed expression text.
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionShape {
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
}

/// Inputs are the task's declarations (top-level or in an `input` section),
/// outputs the entries of its `output` section. Other sections are ignored.
pub fn task_shape(task: &SyntaxNode) -> ActionShape {
    let mut shape = ActionShape::default();

    shape
        .inputs
        .extend(task.attr_items("declarations").iter().filter_map(port_spec));

    for section in task.attr_items("sections") {
        match section.kind_name().as_deref() {
            Some("inputs") => shape
                .inputs
                .extend(section.attr_items("inputs").iter().filter_map(port_spec)),
            Some("outputs") => {
                let items = match section.attr("attributes") {
                    Some(list) => list.items(),
                    None => section.attr_items("outputs"),
                };
                shape.outputs.extend(items.iter().filter_map(port_spec));
            }
            _ => {}
        }
    }

    shape
}

fn port_spec(decl: &SyntaxNode) -> Option<PortSpec> {
    Some(PortSpec {
        name: decl.attr_source("name")?.to_string(),
        ty: decl.attr("type").map(extract_type),
        expression: decl.attr("expression").map(render),
    })
}
