//! Graph entities produced by translation: workflows, steps, groups,
//! declarations and ports.
//!
//! Everything lives in one arena owned by `WorkflowGraph` and is referenced
//! by index. Ownership is a strict tree (`children` keyed by name, `parent`
//! as a back-reference); bind edges are a separate overlay stored as
//! `sources` lists on the consuming port or declaration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CompilerError;
use crate::parse::expression::Expression;

// =============================================================================
// INDICES
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub usize);

// =============================================================================
// PORTS, DECLARATIONS, BIND EDGES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "i")]
    In,
    #[serde(rename = "o")]
    Out,
}

/// Where a bound value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Port(PortId),
    Declaration(DeclId),
    /// Expression with no references; the text is the value.
    Literal(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub owner: NodeId,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    /// Literal or computed expression text, absent for pure pass-throughs.
    pub expression: Option<String>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub owner: NodeId,
    #[serde(rename = "type")]
    pub ty: String,
    pub expression: Expression,
    pub sources: Vec<Source>,
    /// Set once the declaration has been turned into an input port.
    pub promoted_to: Option<PortId>,
}

/// A named input slot of a scope: still a local variable, or already a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Declaration(DeclId),
    Port(PortId),
}

impl From<Slot> for Source {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Declaration(d) => Source::Declaration(d),
            Slot::Port(p) => Source::Port(p),
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Scatter,
    If,
    WhileLoop,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Scatter => "scatter",
            GroupKind::If => "if",
            GroupKind::WhileLoop => "whileloop",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowInfo {
    /// Task name the workflow was called with, when inlined.
    pub initial_name: Option<String>,
    pub sub_workflow: bool,
    pub imported: bool,
    pub namespace: Option<String>,
    pub parent_namespace: Option<String>,
    pub imports: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Workflow(WorkflowInfo),
    /// A call bound to a task action.
    Step { action: String },
    Group {
        group: GroupKind,
        /// Condition text of `if`/`whileloop`, kept for documentation only.
        condition: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: IndexMap<String, NodeId>,
    /// Input ports and not-yet-promoted declarations, one slot per name.
    pub inputs: IndexMap<String, Slot>,
    pub outputs: IndexMap<String, PortId>,
    pub meta: IndexMap<String, String>,
    pub parameter_meta: IndexMap<String, String>,
}

impl Node {
    fn new(name: &str, kind: NodeKind) -> Self {
        Node {
            name: name.to_string(),
            kind,
            parent: None,
            children: IndexMap::new(),
            inputs: IndexMap::new(),
            outputs: IndexMap::new(),
            meta: IndexMap::new(),
            parameter_meta: IndexMap::new(),
        }
    }

    pub fn is_workflow(&self) -> bool {
        matches!(self.kind, NodeKind::Workflow(_))
    }

    /// Workflows and scatter/if/whileloop groups can own children and declarations.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Workflow(_) | NodeKind::Group { .. })
    }

    pub fn group_kind(&self) -> Option<GroupKind> {
        match self.kind {
            NodeKind::Group { group, .. } => Some(group),
            _ => None,
        }
    }

    pub fn workflow_info(&self) -> Option<&WorkflowInfo> {
        match &self.kind {
            NodeKind::Workflow(info) => Some(info),
            _ => None,
        }
    }

    pub fn input_port(&self, name: &str) -> Option<PortId> {
        match self.inputs.get(name) {
            Some(Slot::Port(p)) => Some(*p),
            _ => None,
        }
    }

    pub fn declaration(&self, name: &str) -> Option<DeclId> {
        match self.inputs.get(name) {
            Some(Slot::Declaration(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn input_ports(&self) -> impl Iterator<Item = (&String, PortId)> {
        self.inputs.iter().filter_map(|(name, slot)| match slot {
            Slot::Port(p) => Some((name, *p)),
            Slot::Declaration(_) => None,
        })
    }

    pub fn declarations(&self) -> impl Iterator<Item = (&String, DeclId)> {
        self.inputs.iter().filter_map(|(name, slot)| match slot {
            Slot::Declaration(d) => Some((name, *d)),
            Slot::Port(_) => None,
        })
    }
}

/// Result of a structural lookup by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Node(NodeId),
    Port(PortId),
    Declaration(DeclId),
}

// =============================================================================
// WORKFLOW GRAPH
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub root: NodeId,
    pub nodes: Vec<Node>,
    pub ports: Vec<Port>,
    pub declarations: Vec<Declaration>,
}

impl WorkflowGraph {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.0]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut Port {
        &mut self.ports[id.0]
    }

    pub fn declaration(&self, id: DeclId) -> &Declaration {
        &self.declarations[id.0]
    }

    pub fn root_node(&self) -> &Node {
        self.node(self.root)
    }

    pub fn add_node(&mut self, name: &str, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, kind));
        id
    }

    /// Attach `child` under `parent`, keyed by the child's name.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), CompilerError> {
        let name = self.node(child).name.clone();
        if self.node(parent).children.contains_key(&name) {
            return Err(CompilerError::translate(
                "T008",
                format!("Duplicate name '{}' in '{}'", name, self.node(parent).name),
                Some(self.node(parent).name.clone()),
            ));
        }
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(name, child);
        Ok(())
    }

    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).children.get(name).copied()
    }

    fn push_port(
        &mut self,
        owner: NodeId,
        name: &str,
        direction: Direction,
        ty: Option<String>,
        expression: Option<String>,
    ) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(Port {
            name: name.to_string(),
            owner,
            direction,
            ty,
            expression,
            sources: vec![],
        });
        id
    }

    pub fn add_input_port(
        &mut self,
        owner: NodeId,
        name: &str,
        ty: Option<String>,
        expression: Option<String>,
    ) -> PortId {
        let id = self.push_port(owner, name, Direction::In, ty, expression);
        self.node_mut(owner).inputs.insert(name.to_string(), Slot::Port(id));
        id
    }

    pub fn add_output_port(
        &mut self,
        owner: NodeId,
        name: &str,
        ty: Option<String>,
        expression: Option<String>,
    ) -> PortId {
        let id = self.push_port(owner, name, Direction::Out, ty, expression);
        self.node_mut(owner).outputs.insert(name.to_string(), id);
        id
    }

    pub fn add_declaration(
        &mut self,
        owner: NodeId,
        name: &str,
        ty: String,
        expression: Expression,
    ) -> DeclId {
        let id = DeclId(self.declarations.len());
        self.declarations.push(Declaration {
            name: name.to_string(),
            owner,
            ty,
            expression,
            sources: vec![],
            promoted_to: None,
        });
        self.node_mut(owner)
            .inputs
            .insert(name.to_string(), Slot::Declaration(id));
        id
    }

    /// Record an edge `source → port`. Repeated edges are kept once.
    pub fn bind_port(&mut self, port: PortId, source: Source) {
        trace!(port = %self.port_label(port), source = %self.source_label(&source), "bind");
        let sources = &mut self.port_mut(port).sources;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    pub fn bind_declaration(&mut self, decl: DeclId, source: Source) {
        trace!(declaration = %self.declaration(decl).name, source = %self.source_label(&source), "bind");
        let sources = &mut self.declarations[decl.0].sources;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }

    /// Turn the declaration `name` owned by `owner` into an input port.
    ///
    /// The port keeps the declaration's expression text unless it was a
    /// plain reference. Every edge that read from the declaration now reads
    /// from the port. Returns `None` when `owner` has no declaration of that
    /// name, which is also the case once it has been promoted.
    pub fn promote(&mut self, owner: NodeId, name: &str) -> Option<PortId> {
        let decl = self.node(owner).declaration(name)?;
        let declaration = self.declaration(decl);
        let ty = declaration.ty.clone();
        let expression = (!declaration.expression.is_pass_through())
            .then(|| declaration.expression.text.clone());
        let port = self.push_port(owner, name, Direction::In, Some(ty), expression);
        // same key, so the slot keeps its position
        self.node_mut(owner)
            .inputs
            .insert(name.to_string(), Slot::Port(port));
        self.declarations[decl.0].promoted_to = Some(port);

        let old = Source::Declaration(decl);
        let new = Source::Port(port);
        let consumers = self
            .ports
            .iter_mut()
            .map(|p| &mut p.sources)
            .chain(self.declarations.iter_mut().map(|d| &mut d.sources));
        for sources in consumers {
            for source in sources.iter_mut() {
                if *source == old {
                    *source = new.clone();
                }
            }
        }
        Some(port)
    }

    /// Nearest enclosing workflow of `id`, `id` itself included.
    pub fn enclosing_workflow(&self, id: NodeId) -> NodeId {
        let mut current = id;
        loop {
            let node = self.node(current);
            match node.parent {
                Some(parent) if !node.is_workflow() => current = parent,
                _ => return current,
            }
        }
    }

    /// Depth-first search of the ownership tree below `start`.
    ///
    /// At each node: its declarations, then (groups only) its input ports,
    /// then its children in insertion order, each child checked by name
    /// before descending into it. First match wins.
    pub fn find_in_structure(&self, start: NodeId, name: &str) -> Option<Found> {
        let node = self.node(start);
        match node.inputs.get(name) {
            Some(Slot::Declaration(d)) => return Some(Found::Declaration(*d)),
            Some(Slot::Port(p)) if node.is_group() => return Some(Found::Port(*p)),
            _ => {}
        }
        for (key, child) in &node.children {
            if key == name {
                return Some(Found::Node(*child));
            }
            if let Some(found) = self.find_in_structure(*child, name) {
                return Some(found);
            }
        }
        None
    }

    /// Resolve a bare name from `scope` outwards.
    ///
    /// Each scope on the way to the top checks its own inputs (ports and
    /// declarations), then its outputs, then the declarations of its
    /// enclosing workflow, before moving to its parent.
    pub fn resolve_in_scope(&self, scope: NodeId, name: &str) -> Option<Source> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let node = self.node(id);
            if let Some(slot) = node.inputs.get(name) {
                return Some((*slot).into());
            }
            if let Some(port) = node.outputs.get(name) {
                return Some(Source::Port(*port));
            }
            let workflow = self.enclosing_workflow(id);
            if let Some(decl) = self.node(workflow).declaration(name) {
                return Some(Source::Declaration(decl));
            }
            current = node.parent;
        }
        None
    }

    pub fn port_label(&self, id: PortId) -> String {
        let port = self.port(id);
        format!("{}.{}", self.node(port.owner).name, port.name)
    }

    pub fn source_label(&self, source: &Source) -> String {
        match source {
            Source::Port(p) => self.port_label(*p),
            Source::Declaration(d) => {
                let decl = self.declaration(*d);
                format!("{}.{}", self.node(decl.owner).name, decl.name)
            }
            Source::Literal(text) => format!("'{}'", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow(graph: &mut WorkflowGraph, name: &str) -> NodeId {
        graph.add_node(name, NodeKind::Workflow(WorkflowInfo::default()))
    }

    fn scatter(graph: &mut WorkflowGraph, parent: NodeId, name: &str) -> NodeId {
        let id = graph.add_node(
            name,
            NodeKind::Group { group: GroupKind::Scatter, condition: None },
        );
        graph.add_child(parent, id).unwrap();
        id
    }

    #[test]
    fn resolve_walks_up_to_workflow_inputs() {
        let mut g = WorkflowGraph::default();
        let wf = workflow(&mut g, "wf");
        let x = g.add_input_port(wf, "x", Some("Int".into()), None);
        let outer = scatter(&mut g, wf, "wf_scatter_0");
        let inner = scatter(&mut g, outer, "wf_scatter_1");

        assert_eq!(g.resolve_in_scope(inner, "x"), Some(Source::Port(x)));
        assert_eq!(g.resolve_in_scope(inner, "missing"), None);
    }

    #[test]
    fn resolve_prefers_nearest_scope() {
        let mut g = WorkflowGraph::default();
        let wf = workflow(&mut g, "wf");
        g.add_input_port(wf, "item", Some("Int".into()), None);
        let sc = scatter(&mut g, wf, "wf_scatter_0");
        let item = g.add_input_port(sc, "item", Some("ScatterItem".into()), None);

        assert_eq!(g.resolve_in_scope(sc, "item"), Some(Source::Port(item)));
    }

    #[test]
    fn find_descends_children_in_order() {
        let mut g = WorkflowGraph::default();
        let wf = workflow(&mut g, "wf");
        let sc = scatter(&mut g, wf, "wf_scatter_0");
        let step = g.add_node("foo", NodeKind::Step { action: "foo".into() });
        g.add_child(sc, step).unwrap();
        // plain steps do not expose their inputs to structural lookup
        g.add_input_port(step, "a", None, None);

        assert_eq!(g.find_in_structure(wf, "foo"), Some(Found::Node(step)));
        assert_eq!(g.find_in_structure(wf, "a"), None);
    }

    #[test]
    fn duplicate_child_is_rejected() {
        let mut g = WorkflowGraph::default();
        let wf = workflow(&mut g, "wf");
        let a = g.add_node("foo", NodeKind::Step { action: "foo".into() });
        let b = g.add_node("foo", NodeKind::Step { action: "foo".into() });
        g.add_child(wf, a).unwrap();
        let err = g.add_child(wf, b).unwrap_err();
        assert_eq!(err.code, "T008");
    }

    #[test]
    fn promote_rebinds_consumers_once() {
        let mut g = WorkflowGraph::default();
        let wf = workflow(&mut g, "sub");
        let y = g.add_declaration(wf, "y", "Int".into(), Expression::literal("5"));
        let step = g.add_node("t", NodeKind::Step { action: "t".into() });
        g.add_child(wf, step).unwrap();
        let a = g.add_input_port(step, "a", Some("Int".into()), None);
        g.bind_port(a, Source::Declaration(y));

        let port = g.promote(wf, "y").expect("declaration should promote");
        assert_eq!(g.port(a).sources, vec![Source::Port(port)]);
        assert_eq!(g.port(port).expression.as_deref(), Some("5"));
        assert_eq!(g.node(wf).input_port("y"), Some(port));
        assert_eq!(g.declaration(y).promoted_to, Some(port));
        assert_eq!(g.promote(wf, "y"), None);
        assert_eq!(g.node(wf).inputs.len(), 1);
    }
}
