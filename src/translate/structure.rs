//! Structural pass: instantiate steps, groups, declarations and input ports
//! for one body list without resolving any reference.

use tracing::debug;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::context::ActionKind;
use crate::parse::expression::{extract_expression, extract_meta, extract_type};
use crate::parse::types::{BodyKind, SyntaxNode};

use super::action::task_shape;
use super::{Translator, classify, default_alias};

impl Translator<'_, '_> {
    pub(crate) fn build_body(
        &mut self,
        body: &[SyntaxNode],
        scope: &str,
        parent: NodeId,
        disallowed: &[BodyKind],
    ) -> Result<(), CompilerError> {
        for item in body {
            let Some(kind) = classify(item, scope, disallowed)? else {
                continue;
            };
            match kind {
                BodyKind::Declaration => self.build_declaration(item, parent)?,
                BodyKind::Meta | BodyKind::ParameterMeta => self.build_meta(item, kind),
                BodyKind::Call => self.build_call(item, parent)?,
                BodyKind::Scatter => self.build_scatter(item, parent)?,
                BodyKind::If => self.build_conditional(item, parent, GroupKind::If)?,
                BodyKind::WhileLoop => self.build_conditional(item, parent, GroupKind::WhileLoop)?,
                BodyKind::WorkflowOutputs => {}
            }
        }
        Ok(())
    }

    /// A declaration without an expression is an input of its scope; one
    /// with an expression is a local variable of its group.
    fn build_declaration(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        let name = item.require_source("name")?;
        let ty = extract_type(item.require_attr("type")?);

        match item.attr("expression") {
            None => {
                self.graph.add_input_port(parent, name, Some(ty), None);
            }
            Some(expr) if self.graph.node(parent).is_group() => {
                self.graph
                    .add_declaration(parent, name, ty, extract_expression(expr));
            }
            Some(_) => {}
        }
        Ok(())
    }

    fn build_meta(&mut self, item: &SyntaxNode, kind: BodyKind) {
        let pairs = extract_meta(item.attr_items("map"));
        let root = self.graph.node_mut(self.root);
        let target = if kind == BodyKind::Meta {
            &mut root.meta
        } else {
            &mut root.parameter_meta
        };
        target.extend(pairs);
    }

    fn build_scatter(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        let item_name = item.require_source("item")?;
        let name = self.built.next_name(&self.name, GroupKind::Scatter);

        let scatter = self.graph.add_node(
            &name,
            NodeKind::Group {
                group: GroupKind::Scatter,
                condition: None,
            },
        );
        self.graph
            .add_input_port(scatter, item_name, Some("ScatterItem".into()), None);
        self.graph.add_child(parent, scatter)?;

        self.build_body(
            item.attr_items("body"),
            "scatter",
            scatter,
            &BodyKind::NESTED_DISALLOWED,
        )
    }

    fn build_conditional(
        &mut self,
        item: &SyntaxNode,
        parent: NodeId,
        kind: GroupKind,
    ) -> Result<(), CompilerError> {
        let condition = extract_expression(item.require_attr("expression")?).text;
        let name = self.built.next_name(&self.name, kind);

        let group = self.graph.add_node(
            &name,
            NodeKind::Group {
                group: kind,
                condition: Some(condition),
            },
        );
        self.graph.add_child(parent, group)?;

        self.build_body(
            item.attr_items("body"),
            kind.as_str(),
            group,
            &BodyKind::NESTED_DISALLOWED,
        )
    }

    fn build_call(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        let task = item.require_source("task")?;
        let alias = item.attr_source("alias").unwrap_or_else(|| default_alias(task));
        let action_name = self.qualified_action_name(task);

        let context = self.context;
        let Some(action) = context.action(&action_name) else {
            let message = if self.origin.sub_workflow {
                format!("Undeclared task call: '{}' in imported workflow ({}).", task, self.name)
            } else {
                format!("Undeclared task call: '{}'.", task)
            };
            return Err(CompilerError::translate("T001", message, Some(self.name.clone())));
        };

        let child = match action.kind {
            ActionKind::Workflow => self.inline_workflow(action, &action_name, task, alias)?,
            ActionKind::Task => {
                let shape = task_shape(&action.ast);
                let step = self.graph.add_node(
                    alias,
                    NodeKind::Step {
                        action: task.to_string(),
                    },
                );
                for spec in shape.inputs {
                    self.graph
                        .add_input_port(step, &spec.name, spec.ty, spec.expression);
                }
                for spec in shape.outputs {
                    self.graph
                        .add_output_port(step, &spec.name, spec.ty, spec.expression);
                }
                debug!(step = %alias, action = %action_name, "created step");
                step
            }
        };

        self.graph.add_child(parent, child)
    }
}
