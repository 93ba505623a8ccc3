//! Sub-workflow inlining: a call whose target is a workflow is translated
//! in full, with its own counters, and attached as an ordinary child step.

use tracing::debug;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::context::ActionDef;
use crate::parse::types::SyntaxNode;

use super::{Translator, WorkflowOrigin};

impl Translator<'_, '_> {
    /// Translate the workflow behind `action` under the call's alias.
    ///
    /// `action_name` is the qualified key the action was found under; `task`
    /// the name as written in the call. Returns the unattached workflow node.
    pub(crate) fn inline_workflow(
        &mut self,
        action: &ActionDef,
        action_name: &str,
        task: &str,
        alias: &str,
    ) -> Result<NodeId, CompilerError> {
        if self.origin.ancestry.iter().any(|a| a == action_name) {
            return Err(CompilerError::translate(
                "T009",
                format!("Recursive workflow call: '{}' calls itself", action_name),
                Some(self.name.clone()),
            ));
        }

        let workflow = renamed(&action.ast, alias)?;

        let mut ancestry = self.origin.ancestry.clone();
        ancestry.push(action_name.to_string());
        let origin = WorkflowOrigin {
            initial_name: Some(task.to_string()),
            sub_workflow: true,
            parent_namespace: self.namespace_chain(),
            ancestry,
        };

        debug!(
            workflow = %alias,
            action = %action_name,
            parent_namespace = ?origin.parent_namespace,
            "inlining sub-workflow"
        );

        let child = Translator::run(&mut *self.graph, &workflow, self.context, origin)?;
        if let NodeKind::Workflow(info) = &mut self.graph.node_mut(child).kind {
            info.imported = true;
        }
        Ok(child)
    }
}

/// Clone a workflow node with its name replaced, so synthetic child names
/// (`<alias>_scatter_0`, ...) follow the call alias.
fn renamed(workflow: &SyntaxNode, alias: &str) -> Result<SyntaxNode, CompilerError> {
    let mut clone = workflow.clone();
    match clone.attr_mut("name") {
        Some(SyntaxNode::Terminal(name)) => name.source_string = alias.to_string(),
        _ => return Err(CompilerError::malformed("workflow", "name")),
    }
    Ok(clone)
}
