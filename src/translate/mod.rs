//! Translation phase: workflow syntax tree → `WorkflowGraph`.
//!
//! Each workflow body is walked twice. The structural pass creates steps,
//! groups, declarations and input ports; the binding pass then wires every
//! expression to the ports and declarations it reads. A scope's structural
//! pass always finishes before its binding pass starts, so bindings may
//! refer forward and into sibling scopes.

pub mod action;
pub mod bindings;
pub mod inline;
pub mod resolve;
pub mod structure;

use tracing::debug;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::ir::validate::validate_graph;
use crate::parse::context::ResolutionContext;
use crate::parse::types::{BodyKind, SyntaxNode};

#[derive(Debug, Clone, Copy, Default)]
pub struct TranslateOptions {
    /// Run the graph invariant checks after translation.
    pub validate: bool,
}

/// Translate a `Workflow` syntax node into a fully bound graph.
pub fn translate(
    workflow: &SyntaxNode,
    context: &ResolutionContext,
) -> Result<WorkflowGraph, CompilerError> {
    let mut graph = WorkflowGraph::default();
    let root = Translator::run(&mut graph, workflow, context, WorkflowOrigin::root())?;
    graph.root = root;
    Ok(graph)
}

/// Full pipeline: translate, then optionally check graph invariants.
pub fn compile(
    workflow: &SyntaxNode,
    context: &ResolutionContext,
    options: TranslateOptions,
) -> Result<WorkflowGraph, Vec<CompilerError>> {
    let graph = translate(workflow, context).map_err(|e| vec![e])?;

    if options.validate {
        let errors = validate_graph(&graph);
        if !errors.is_empty() {
            return Err(errors.into_iter().map(CompilerError::from).collect());
        }
    }

    Ok(graph)
}

/// How the workflow being translated was reached.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOrigin {
    /// Task name of the call that inlined this workflow.
    pub initial_name: Option<String>,
    pub sub_workflow: bool,
    /// Namespace chain of the calling workflow.
    pub parent_namespace: Option<String>,
    /// Qualified action names of the workflows currently being inlined.
    pub ancestry: Vec<String>,
}

impl WorkflowOrigin {
    pub fn root() -> Self {
        Self::default()
    }
}

/// Synthetic name counters, one set per translated workflow.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct GroupCounters {
    scatter: usize,
    if_: usize,
    while_loop: usize,
}

impl GroupCounters {
    /// `<workflow>_<kind>_<n>` where `n` counts groups of that kind so far.
    pub(crate) fn next_name(&mut self, workflow: &str, kind: GroupKind) -> String {
        let counter = match kind {
            GroupKind::Scatter => &mut self.scatter,
            GroupKind::If => &mut self.if_,
            GroupKind::WhileLoop => &mut self.while_loop,
        };
        let name = format!("{}_{}_{}", workflow, kind.as_str(), counter);
        *counter += 1;
        name
    }
}

/// State of one workflow translation. Inlined sub-workflows get their own.
pub(crate) struct Translator<'g, 'c> {
    pub(crate) graph: &'g mut WorkflowGraph,
    pub(crate) context: &'c ResolutionContext,
    pub(crate) name: String,
    pub(crate) root: NodeId,
    pub(crate) origin: WorkflowOrigin,
    pub(crate) namespace: Option<String>,
    pub(crate) built: GroupCounters,
    pub(crate) bound: GroupCounters,
}

impl<'g, 'c> Translator<'g, 'c> {
    /// Translate one workflow into `graph` and return its (unattached) node.
    pub(crate) fn run(
        graph: &'g mut WorkflowGraph,
        workflow: &SyntaxNode,
        context: &'c ResolutionContext,
        origin: WorkflowOrigin,
    ) -> Result<NodeId, CompilerError> {
        let name = workflow.require_source("name")?.to_string();
        let body = workflow.require_attr("body")?.items();

        let namespace = origin.initial_name.as_deref().and_then(namespace_of);
        let imports = if origin.sub_workflow {
            None
        } else {
            context.import_records().map(<[_]>::to_vec)
        };
        let info = WorkflowInfo {
            initial_name: origin.initial_name.clone(),
            sub_workflow: origin.sub_workflow,
            imported: false,
            namespace: namespace.clone(),
            parent_namespace: origin.parent_namespace.clone(),
            imports,
        };
        let root = graph.add_node(&name, NodeKind::Workflow(info));

        debug!(
            workflow = %name,
            sub_workflow = origin.sub_workflow,
            namespace = ?namespace,
            "translating workflow"
        );

        let mut translator = Translator {
            graph,
            context,
            name,
            root,
            origin,
            namespace,
            built: GroupCounters::default(),
            bound: GroupCounters::default(),
        };
        translator.build_body(body, "workflow", root, &[])?;
        translator.bind_body(body, "workflow", root, &[])?;

        debug!(
            workflow = %translator.name,
            nodes = translator.graph.nodes.len(),
            ports = translator.graph.ports.len(),
            "translated workflow"
        );
        Ok(root)
    }

    /// Namespace chain of this workflow: parent chain then own namespace, dot-joined.
    pub(crate) fn namespace_chain(&self) -> Option<String> {
        let parts: Vec<&str> = [self.origin.parent_namespace.as_deref(), self.namespace.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("."))
        }
    }

    /// Key under which a call target is registered in the resolution context.
    ///
    /// Calls inside an inlined workflow are qualified with its namespace
    /// chain; the context is expected to hold them as `ns1.ns2.task`.
    pub(crate) fn qualified_action_name(&self, task: &str) -> String {
        match self.namespace_chain() {
            Some(chain) if self.origin.sub_workflow => format!("{}.{}", chain, task),
            _ => task.to_string(),
        }
    }
}

/// Classify one body element for a walk over `scope`.
///
/// Unknown kinds are skipped; kinds listed in `disallowed` are an error.
pub(crate) fn classify(
    item: &SyntaxNode,
    scope: &str,
    disallowed: &[BodyKind],
) -> Result<Option<BodyKind>, CompilerError> {
    let Some(kind) = BodyKind::of(item) else {
        return Ok(None);
    };
    if disallowed.contains(&kind) {
        let keys: Vec<&str> = disallowed.iter().map(BodyKind::as_str).collect();
        return Err(CompilerError::translate(
            "T002",
            format!("In {} body keys [{}] are not allowed", scope, keys.join(",")),
            None,
        ));
    }
    Ok(Some(kind))
}

/// Default call alias: the last segment of a possibly namespaced task name.
pub(crate) fn default_alias(task: &str) -> &str {
    task.rsplit('.').next().unwrap_or(task)
}

/// Namespace of an imported name: everything before the last `.`.
fn namespace_of(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(ns, _)| ns.to_string())
}
