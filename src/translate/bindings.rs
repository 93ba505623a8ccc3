//! Binding pass: re-walk a body list once its whole structure exists and
//! wire every expression to the ports and declarations it reads.

use tracing::debug;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::expression::{Expression, extract_expression, extract_type};
use crate::parse::types::{BodyKind, SyntaxNode};

use super::resolve::resolve_expression;
use super::{Translator, classify, default_alias};

impl Translator<'_, '_> {
    pub(crate) fn bind_body(
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
                BodyKind::Declaration => self.bind_declaration(item, parent)?,
                BodyKind::Call => self.bind_call(item, parent)?,
                BodyKind::Scatter => self.bind_scatter(item, parent)?,
                BodyKind::If => self.bind_conditional(item, parent, GroupKind::If)?,
                BodyKind::WhileLoop => self.bind_conditional(item, parent, GroupKind::WhileLoop)?,
                BodyKind::WorkflowOutputs => self.bind_outputs(item)?,
                BodyKind::Meta | BodyKind::ParameterMeta => {}
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        scope: NodeId,
        expr: &Expression,
        output_block: bool,
    ) -> Result<Vec<Source>, CompilerError> {
        let block = output_block.then_some(self.name.as_str());
        resolve_expression(&*self.graph, self.root, scope, expr, block)
    }

    /// The group created by the structural pass for this element.
    fn built_group(&mut self, parent: NodeId, kind: GroupKind) -> Result<NodeId, CompilerError> {
        let name = self.bound.next_name(&self.name, kind);
        self.graph.child(parent, &name).ok_or_else(|| {
            CompilerError::translate(
                "T004",
                format!("Undeclared {} is referenced: '{}'", kind.as_str(), name),
                Some(self.name.clone()),
            )
        })
    }

    fn bind_declaration(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        if item.attr("expression").is_none() || !self.graph.node(parent).is_group() {
            return Ok(());
        }
        let name = item.require_source("name")?;

        let decl = match self.graph.node(parent).declaration(name) {
            Some(d) => d,
            None => match self.graph.find_in_structure(self.root, name) {
                Some(Found::Declaration(d)) => d,
                _ => return Ok(()),
            },
        };

        let owner = self.graph.declaration(decl).owner;
        let expression = self.graph.declaration(decl).expression.clone();
        for source in self.resolve(owner, &expression, false)? {
            self.graph.bind_declaration(decl, source);
        }
        Ok(())
    }

    fn bind_scatter(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        let item_name = item.require_source("item")?;
        let collection = extract_expression(item.require_attr("collection")?);
        let scatter = self.built_group(parent, GroupKind::Scatter)?;

        let port = self.graph.node(scatter).input_port(item_name).ok_or_else(|| {
            CompilerError::malformed("scatter", "item")
        })?;
        for source in self.resolve(parent, &collection, false)? {
            self.graph.bind_port(port, source);
        }
        if !collection.is_pass_through() && !collection.text.is_empty() {
            self.graph.port_mut(port).expression = Some(collection.text);
        }

        self.bind_body(
            item.attr_items("body"),
            "scatter",
            scatter,
            &BodyKind::NESTED_DISALLOWED,
        )
    }

    fn bind_conditional(
        &mut self,
        item: &SyntaxNode,
        parent: NodeId,
        kind: GroupKind,
    ) -> Result<(), CompilerError> {
        let group = self.built_group(parent, kind)?;
        self.bind_body(
            item.attr_items("body"),
            kind.as_str(),
            group,
            &BodyKind::NESTED_DISALLOWED,
        )
    }

    fn bind_call(&mut self, item: &SyntaxNode, parent: NodeId) -> Result<(), CompilerError> {
        let task = item.require_source("task")?;
        let alias = item.attr_source("alias").unwrap_or_else(|| default_alias(task));
        let step = self.graph.child(parent, alias).ok_or_else(|| {
            CompilerError::translate(
                "T004",
                format!("Undeclared call is referenced: '{}'", alias),
                Some(self.name.clone()),
            )
        })?;

        let Some(body) = item.attr("body") else {
            return Ok(());
        };
        for io in body.attr_items("io") {
            for mapping in io.attr_items("map") {
                self.bind_call_input(mapping, step, parent)?;
            }
        }
        Ok(())
    }

    /// Bind one `key = expression` pair of a call's input block.
    ///
    /// A key naming a still-unbound declaration of an inlined workflow
    /// promotes that declaration to an input port first.
    fn bind_call_input(
        &mut self,
        mapping: &SyntaxNode,
        step: NodeId,
        parent: NodeId,
    ) -> Result<(), CompilerError> {
        let key = mapping.require_source("key")?;
        let expression = extract_expression(mapping.require_attr("value")?);
        let computed = (!expression.is_pass_through() && !expression.text.is_empty())
            .then(|| expression.text.clone());

        let node = self.graph.node(step);
        if node.input_port(key).is_none() && node.is_workflow() && node.declaration(key).is_some() {
            debug!(call = %node.name, input = %key, "promoting declaration to input");
            self.graph.promote(step, key);
        }

        let Some(port) = self.graph.node(step).input_port(key) else {
            return Err(CompilerError::translate(
                "T005",
                format!(
                    "Undeclared variable trying to be assigned: call '{}' --> '{}'",
                    self.graph.node(step).name,
                    key
                ),
                Some(self.name.clone()),
            ));
        };

        for source in self.resolve(parent, &expression, false)? {
            self.graph.bind_port(port, source);
        }
        if computed.is_some() {
            self.graph.port_mut(port).expression = computed;
        }
        Ok(())
    }

    /// Workflow outputs: legacy `call.output` / `call.*` items first, then
    /// `Type name = expression` items.
    fn bind_outputs(&mut self, item: &SyntaxNode) -> Result<(), CompilerError> {
        let outputs = item.attr_items("outputs");
        for output in outputs.iter().filter(|o| o.attr("fqn").is_some()) {
            self.bind_legacy_output(output)?;
        }
        for output in outputs {
            self.bind_expression_output(output)?;
        }
        Ok(())
    }

    fn bind_expression_output(&mut self, output: &SyntaxNode) -> Result<(), CompilerError> {
        let name = output.attr_source("name");
        let ty = output.attr("type");
        let expr = output.attr("expression");
        if name.is_none() && ty.is_none() && expr.is_none() {
            return Ok(());
        }
        let name = name.ok_or_else(|| CompilerError::malformed("workflowoutput", "name"))?;
        let expression =
            extract_expression(expr.ok_or_else(|| CompilerError::malformed("workflowoutput", "expression"))?);

        let text = (!expression.is_member_access()).then(|| expression.text.clone());
        let port = self
            .graph
            .add_output_port(self.root, name, ty.map(extract_type), text);

        for source in self.resolve(self.root, &expression, true)? {
            self.graph.bind_port(port, source);
        }
        Ok(())
    }

    fn bind_legacy_output(&mut self, output: &SyntaxNode) -> Result<(), CompilerError> {
        let fqn = output.require_source("fqn")?;
        let wildcard = output.attr_source("wildcard");
        let res = match wildcard {
            Some(w) => format!("{}.{}", fqn, w),
            None => fqn.to_string(),
        };
        let res = res.trim();

        let port = self
            .graph
            .add_output_port(self.root, res, None, Some(res.to_string()));

        let (call_name, output_name) = match wildcard {
            Some(_) => (fqn, None),
            None => {
                // `call.output`; segments past the second are ignored
                let mut segments = fqn.split('.');
                let call = segments.next().unwrap_or(fqn);
                (call, Some(segments.next().unwrap_or("")))
            }
        };

        let sources = match self.graph.find_in_structure(self.root, call_name) {
            Some(Found::Node(id)) => {
                let step = self.graph.node(id);
                match output_name {
                    Some(out) => match step.outputs.get(out) {
                        Some(p) => vec![*p],
                        None => {
                            return Err(self.output_error(
                                "T003",
                                format!("undeclared variable is referenced: '{}.{}'", call_name, out),
                            ));
                        }
                    },
                    None if step.outputs.is_empty() => {
                        return Err(self.output_error(
                            "T006",
                            format!(
                                "undeclared variable is referenced: '{}.* ({} doesn't have any outputs)'",
                                call_name, call_name
                            ),
                        ));
                    }
                    None => step.outputs.values().copied().collect(),
                }
            }
            Some(Found::Port(p)) => vec![p],
            _ => {
                return Err(self.output_error(
                    "T004",
                    format!("undeclared call is referenced: '{}'", call_name),
                ));
            }
        };

        for source in sources {
            self.graph.bind_port(port, Source::Port(source));
        }
        Ok(())
    }

    fn output_error(&self, code: &str, detail: String) -> CompilerError {
        CompilerError::translate(
            code,
            format!("In '{}' output block {}", self.name, detail),
            Some(self.name.clone()),
        )
    }
}
