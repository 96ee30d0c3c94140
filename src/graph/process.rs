use crate::dom::resolve_selectors;
use crate::error::{CaptureError, Result};
use crate::graph::edge::{Edge, EdgeKind};
use crate::graph::metadata::{GraphMetadata, SessionState};
use crate::graph::node::{Branch, CapturedElement, Node, NodeSpec, NodeState, NodeType};
use crate::graph::patch::NodePatch;
use crate::segment::SubStep;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena of nodes and edges describing one captured process
///
/// Nodes are keyed by id and keep insertion order; edges keep creation order. Every
/// mutation validates first and then applies, so a failed call leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGraph {
    #[serde(default)]
    metadata: GraphMetadata,

    #[serde(default)]
    nodes: IndexMap<String, Node>,

    #[serde(default)]
    edges: Vec<Edge>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_node_id: Option<String>,
}

impl Default for ProcessGraph {
    fn default() -> Self {
        Self::new("Untitled process")
    }
}

impl ProcessGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: GraphMetadata::new(name),
            nodes: IndexMap::new(),
            edges: Vec::new(),
            current_node_id: None,
        }
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn current_node_id(&self) -> Option<&str> {
        self.current_node_id.as_deref()
    }

    pub fn current_node(&self) -> Option<&Node> {
        self.current_node_id.as_deref().and_then(|id| self.nodes.get(id))
    }

    /// Position of a node in insertion order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.get_index_of(id)
    }

    pub fn node_at(&self, position: usize) -> Option<&Node> {
        self.nodes.get_index(position).map(|(_, node)| node)
    }

    /// Edges leaving `id`, in creation order
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// Edges entering `id`, in creation order
    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to == id)
    }

    pub fn session_state(&self) -> Option<&SessionState> {
        self.metadata.session_state.as_ref()
    }

    pub fn set_session_state(&mut self, state: Option<SessionState>) {
        self.metadata.session_state = state;
        self.metadata.touch();
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.metadata.name = name.into();
        self.metadata.touch();
    }

    fn require(&self, id: &str) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| CaptureError::NodeNotFound(id.to_string()))
    }

    fn require_unlocked(&self, id: &str) -> Result<&Node> {
        let node = self.require(id)?;
        if node.locked {
            return Err(CaptureError::NodeLocked(id.to_string()));
        }
        Ok(node)
    }

    /// Add a node built from `spec` and make it current
    ///
    /// Branch targets must already exist (or be the node itself); one `Branch` edge is
    /// created per targeted branch.
    pub fn create_node(&mut self, spec: NodeSpec) -> Result<&Node> {
        let id = spec
            .id
            .clone()
            .unwrap_or_else(|| format!("node-{}", uuid::Uuid::new_v4()));
        if self.nodes.contains_key(&id) {
            return Err(CaptureError::DuplicateNode(id));
        }
        if !spec.branches.is_empty() && spec.node_type != NodeType::Decision {
            return Err(CaptureError::InvalidOperation(format!(
                "only decision nodes carry branches, got {}",
                spec.node_type
            )));
        }
        for target in spec.branches.iter().filter_map(|b| b.next_node_id.as_deref()) {
            if target != id && !self.nodes.contains_key(target) {
                return Err(CaptureError::DanglingReference(format!("branch of {} -> {}", id, target)));
            }
        }

        let branch_edges: Vec<Edge> = spec
            .branches
            .iter()
            .filter_map(|b| {
                b.next_node_id.as_ref().map(|target| {
                    Edge::new(id.clone(), target.clone(), EdgeKind::Branch).with_condition(Some(b.condition.clone()))
                })
            })
            .collect();

        let node = Node {
            id: id.clone(),
            node_type: spec.node_type,
            step: self.nodes.len() as u32 + 1,
            action: spec.action,
            element: spec.element,
            context: spec.context,
            branches: spec.branches,
            sub_steps: spec.sub_steps,
            raw_events: spec.raw_events,
            important: spec.node_type == NodeType::MarkedAction,
            session_setup: spec.session_setup,
            locked: false,
            state: NodeState::Recording,
            intent: spec.intent,
        };

        log::debug!("Created {} node {} (step {})", node.node_type, id, node.step);
        self.nodes.insert(id.clone(), node);
        self.edges.extend(branch_edges);
        self.current_node_id = Some(id.clone());
        self.metadata.touch();
        Ok(&self.nodes[&id])
    }

    /// Connect two existing nodes
    ///
    /// An edge leaving a Decision is bound to the first open branch with the same
    /// condition (any open branch when `condition` is `None`); without one, a new branch is
    /// appended.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind, condition: Option<String>) -> Result<&Edge> {
        if !self.nodes.contains_key(from) || !self.nodes.contains_key(to) {
            let missing = if self.nodes.contains_key(from) { to } else { from };
            return Err(CaptureError::DanglingReference(format!("edge {} -> {}: {} does not exist", from, to, missing)));
        }

        let mut edge = Edge::new(from, to, kind).with_condition(condition.clone());

        let source = &mut self.nodes[from];
        if source.node_type == NodeType::Decision {
            let open = source
                .branches
                .iter()
                .position(|b| b.is_open() && condition.as_deref().is_none_or(|c| c == b.condition));
            match open {
                Some(index) => {
                    let branch = &mut source.branches[index];
                    branch.next_node_id = Some(to.to_string());
                    edge.condition = Some(branch.condition.clone());
                }
                None => {
                    let label = condition.clone().unwrap_or_else(|| format!("Option {}", source.branches.len() + 1));
                    let branch = Branch::new(label.clone(), label.clone()).to(to);
                    edge.condition = Some(branch.condition.clone());
                    source.branches.push(branch);
                }
            }
            if edge.kind == EdgeKind::Normal {
                edge.kind = EdgeKind::Branch;
            }
        }

        log::debug!("Added {:?} edge {} -> {}", edge.kind, from, to);
        let index = self.edges.len();
        self.edges.push(edge);
        self.metadata.touch();
        Ok(&self.edges[index])
    }

    /// Append a branch to a Decision node, optionally linking it
    pub fn add_branch(
        &mut self,
        decision_id: &str,
        condition: impl Into<String>,
        label: impl Into<String>,
        next: Option<&str>,
    ) -> Result<&Branch> {
        let node = self.require_unlocked(decision_id)?;
        if node.node_type != NodeType::Decision {
            return Err(CaptureError::InvalidOperation(format!("{} is not a decision node", decision_id)));
        }
        if let Some(target) = next {
            if !self.nodes.contains_key(target) {
                return Err(CaptureError::DanglingReference(format!("branch of {} -> {}", decision_id, target)));
            }
        }

        let mut branch = Branch::new(condition, label);
        if let Some(target) = next {
            branch = branch.to(target);
            self.edges.push(
                Edge::new(decision_id, target, EdgeKind::Branch).with_condition(Some(branch.condition.clone())),
            );
        }

        let node = &mut self.nodes[decision_id];
        let index = node.branches.len();
        node.branches.push(branch);
        self.metadata.touch();
        Ok(&self.nodes[decision_id].branches[index])
    }

    /// Deep-merge `patch` into a node
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<&Node> {
        let existing = self.require_unlocked(id)?;
        let mut updated = existing.clone();
        let was_decision = existing.is_decision();

        let (element, branches) = patch.merge_scalars(&mut updated);
        let is_decision = updated.is_decision();

        if was_decision != is_decision {
            let has_links = !updated.branches.is_empty() || self.outgoing(id).next().is_some();
            if has_links || branches.as_ref().is_some_and(|b| !b.is_empty()) {
                return Err(CaptureError::InvalidOperation(format!(
                    "cannot change {} between decision and {} while it has outgoing links",
                    id, updated.node_type
                )));
            }
        }

        if let Some(snapshot) = element {
            let selectors = resolve_selectors(&snapshot);
            updated.element = Some(CapturedElement { snapshot, selectors });
        }

        let mut edges = self.edges.clone();
        if let Some(branches) = branches {
            if !is_decision && !branches.is_empty() {
                return Err(CaptureError::InvalidOperation(format!("{} is not a decision node", id)));
            }
            for target in branches.iter().filter_map(|b| b.next_node_id.as_deref()) {
                if target != id && !self.nodes.contains_key(target) {
                    return Err(CaptureError::DanglingReference(format!("branch of {} -> {}", id, target)));
                }
            }
            edges = reconcile_branch_edges(edges, id, &branches);
            updated.branches = branches;
        }

        self.nodes[id] = updated;
        self.edges = edges;
        self.metadata.touch();
        Ok(&self.nodes[id])
    }

    /// Remove a node, its incident edges, and any branch pointing at it
    pub fn delete_node(&mut self, id: &str) -> Result<Node> {
        self.require(id)?;
        let node = self
            .nodes
            .shift_remove(id)
            .ok_or_else(|| CaptureError::NodeNotFound(id.to_string()))?;

        self.edges.retain(|e| !e.is_incident(id));
        for other in self.nodes.values_mut() {
            for branch in other.branches.iter_mut() {
                if branch.next_node_id.as_deref() == Some(id) {
                    branch.next_node_id = None;
                }
            }
        }
        if self.current_node_id.as_deref() == Some(id) {
            self.current_node_id = self.nodes.keys().last().cloned();
        }

        log::debug!("Deleted node {}", id);
        self.metadata.touch();
        Ok(node)
    }

    pub fn set_current(&mut self, id: Option<&str>) -> Result<()> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.current_node_id = id.map(String::from);
        Ok(())
    }

    /// Flag a node as important; Action and MarkedAction switch type accordingly
    pub fn mark_important(&mut self, id: &str, important: bool) -> Result<&Node> {
        self.require_unlocked(id)?;
        self.nodes[id].set_important(important);
        self.metadata.touch();
        Ok(&self.nodes[id])
    }

    pub fn lock_node(&mut self, id: &str) -> Result<&Node> {
        self.require(id)?;
        let node = &mut self.nodes[id];
        node.locked = true;
        Ok(node)
    }

    /// Finalize a recording node with its sub-steps
    pub fn close_node(&mut self, id: &str, sub_steps: Vec<SubStep>) -> Result<&Node> {
        let node = self.require_unlocked(id)?;
        if node.state != NodeState::Recording {
            return Err(CaptureError::InvalidOperation(format!("{} is not recording", id)));
        }
        let node = &mut self.nodes[id];
        node.sub_steps = sub_steps;
        node.state = NodeState::Closed;
        self.metadata.touch();
        Ok(&self.nodes[id])
    }

    /// Record that these nodes were referenced by a generated artifact
    pub fn mark_exported<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id) {
                node.state = NodeState::Exported;
            }
        }
    }

    /// Drop every node and edge; name and session state survive
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.current_node_id = None;
        self.metadata.touch();
    }

    /// Check the structural invariants of a graph that did not come from mutations
    pub fn validate(&self) -> Result<()> {
        for (key, node) in &self.nodes {
            if key != &node.id {
                return Err(CaptureError::InvalidGraph(format!("node stored under '{}' has id '{}'", key, node.id)));
            }
            if node.step == 0 {
                return Err(CaptureError::InvalidGraph(format!("node {} has step 0", key)));
            }
            if !node.branches.is_empty() && !node.is_decision() {
                return Err(CaptureError::InvalidGraph(format!("non-decision node {} has branches", key)));
            }
            for target in node.branches.iter().filter_map(|b| b.next_node_id.as_deref()) {
                if !self.nodes.contains_key(target) {
                    return Err(CaptureError::InvalidGraph(format!("branch of {} points at missing {}", key, target)));
                }
            }
        }

        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.from) || !self.nodes.contains_key(&edge.to) {
                return Err(CaptureError::InvalidGraph(format!("edge {} dangles", edge.id)));
            }
        }

        for node in self.nodes.values().filter(|n| n.is_decision()) {
            let mut edge_targets: Vec<&str> = self.outgoing(&node.id).map(|e| e.to.as_str()).collect();
            let mut branch_targets: Vec<&str> =
                node.branches.iter().filter_map(|b| b.next_node_id.as_deref()).collect();
            edge_targets.sort_unstable();
            branch_targets.sort_unstable();
            if edge_targets != branch_targets {
                return Err(CaptureError::InvalidGraph(format!(
                    "decision {} edges do not match its branches",
                    node.id
                )));
            }
        }

        if let Some(current) = &self.current_node_id {
            if !self.nodes.contains_key(current) {
                return Err(CaptureError::InvalidGraph(format!("current node {} does not exist", current)));
            }
        }
        Ok(())
    }

    /// Persisted JSON document
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a persisted document
    pub fn from_json(json: &str) -> Result<Self> {
        let graph: Self = serde_json::from_str(json)?;
        graph.validate()?;
        Ok(graph)
    }
}

/// Keep one Branch edge per targeted branch, reusing existing edges to the same target
fn reconcile_branch_edges(edges: Vec<Edge>, decision_id: &str, branches: &[Branch]) -> Vec<Edge> {
    let (mut outgoing, mut result): (Vec<Edge>, Vec<Edge>) = edges.into_iter().partition(|e| e.from == decision_id);

    let mut by_target: HashMap<String, Vec<Edge>> = HashMap::new();
    for edge in outgoing.drain(..) {
        by_target.entry(edge.to.clone()).or_default().push(edge);
    }

    for branch in branches {
        let Some(target) = branch.next_node_id.as_deref() else {
            continue;
        };
        let reused = by_target.get_mut(target).and_then(|list| {
            if list.is_empty() { None } else { Some(list.remove(0)) }
        });
        let edge = match reused {
            Some(mut edge) => {
                edge.condition = Some(branch.condition.clone());
                edge
            }
            None => Edge::new(decision_id, target, EdgeKind::Branch).with_condition(Some(branch.condition.clone())),
        };
        result.push(edge);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSnapshot;
    use crate::graph::node::ActionKind;

    fn action(id: &str) -> NodeSpec {
        NodeSpec::action(ActionKind::Click, format!("Click {}", id)).with_id(id)
    }

    fn chain(ids: &[&str]) -> ProcessGraph {
        let mut graph = ProcessGraph::default();
        for id in ids {
            graph.create_node(action(id)).unwrap();
        }
        for pair in ids.windows(2) {
            graph.add_edge(pair[0], pair[1], EdgeKind::Normal, None).unwrap();
        }
        graph
    }

    #[test]
    fn test_create_node_assigns_step_and_current() {
        let mut graph = ProcessGraph::default();
        let first = graph.create_node(NodeSpec::action(ActionKind::Navigate, "Open app")).unwrap().clone();
        assert_eq!(first.step, 1);
        assert!(first.id.starts_with("node-"));
        assert_eq!(first.state, NodeState::Recording);

        let second = graph.create_node(action("b")).unwrap();
        assert_eq!(second.step, 2);
        assert_eq!(graph.current_node_id(), Some("b"));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut graph = chain(&["a"]);
        assert!(matches!(graph.create_node(action("a")), Err(CaptureError::DuplicateNode(_))));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_dangling_edge_leaves_graph_unchanged() {
        let mut graph = chain(&["a", "b"]);
        let before = graph.clone();
        let err = graph.add_edge("a", "missing", EdgeKind::Normal, None).unwrap_err();
        assert!(matches!(err, CaptureError::DanglingReference(_)));
        let err = graph.add_edge("ghost", "a", EdgeKind::Normal, None).unwrap_err();
        assert!(matches!(err, CaptureError::DanglingReference(_)));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_update_missing_node_fails() {
        let mut graph = chain(&["a"]);
        let before = graph.clone();
        let err = graph.update_node("nope", NodePatch::default().describe("x")).unwrap_err();
        assert!(matches!(err, CaptureError::NodeNotFound(_)));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_update_deep_merges_action_and_context() {
        let mut graph = chain(&["a"]);
        graph
            .update_node("a", NodePatch::default().url("https://example.com"))
            .unwrap();
        let node = graph.update_node("a", NodePatch::default().value("42")).unwrap();

        assert_eq!(node.action.description, "Click a");
        assert_eq!(node.action.value.as_deref(), Some("42"));
        assert_eq!(node.context.url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_update_element_resolves_selectors() {
        let mut graph = chain(&["a"]);
        let patch = NodePatch {
            element: Some(ElementSnapshot::new("button").with_attribute("data-testid", "pay")),
            ..Default::default()
        };
        let node = graph.update_node("a", patch).unwrap();
        assert_eq!(node.selectors().unwrap().best().value, "pay");
    }

    #[test]
    fn test_locked_node_rejects_updates() {
        let mut graph = chain(&["a"]);
        graph.lock_node("a").unwrap();
        let err = graph.update_node("a", NodePatch::default().describe("x")).unwrap_err();
        assert!(matches!(err, CaptureError::NodeLocked(_)));
        assert!(matches!(graph.mark_important("a", true), Err(CaptureError::NodeLocked(_))));
    }

    #[test]
    fn test_delete_node_removes_incident_edges_and_branch_targets() {
        let mut graph = chain(&["a", "b", "c"]);
        graph.create_node(NodeSpec::decision("Approved?").with_id("d")).unwrap();
        graph.add_branch("d", "yes", "Approved", Some("b")).unwrap();

        let removed = graph.delete_node("b").unwrap();
        assert_eq!(removed.id, "b");
        assert!(graph.edges().iter().all(|e| !e.is_incident("b")));
        assert!(graph.node("d").unwrap().branches[0].is_open());
        assert_eq!(graph.current_node_id(), Some("d"));
        graph.validate().unwrap();
    }

    #[test]
    fn test_decision_edges_bind_to_branches() {
        let mut graph = chain(&["a", "e", "f"]);
        graph
            .create_node(
                NodeSpec::decision("Stock available?")
                    .with_id("d")
                    .with_branch(Branch::new("in_stock", "In stock")),
            )
            .unwrap();

        let edge = graph.add_edge("d", "e", EdgeKind::Normal, None).unwrap().clone();
        assert_eq!(edge.kind, EdgeKind::Branch);
        assert_eq!(edge.condition.as_deref(), Some("in_stock"));

        graph.add_edge("d", "f", EdgeKind::Normal, Some("out_of_stock".to_string())).unwrap();
        let decision = graph.node("d").unwrap();
        assert_eq!(decision.branches.len(), 2);
        assert_eq!(decision.branch_to("f").unwrap().condition, "out_of_stock");
        graph.validate().unwrap();
    }

    #[test]
    fn test_add_branch_requires_decision() {
        let mut graph = chain(&["a", "b"]);
        assert!(matches!(
            graph.add_branch("a", "x", "x", None),
            Err(CaptureError::InvalidOperation(_))
        ));
        graph.create_node(NodeSpec::decision("?").with_id("d")).unwrap();
        assert!(matches!(
            graph.add_branch("d", "x", "x", Some("zzz")),
            Err(CaptureError::DanglingReference(_))
        ));
        let branch = graph.add_branch("d", "x", "Go to b", Some("b")).unwrap().clone();
        assert_eq!(branch.next_node_id.as_deref(), Some("b"));
        assert_eq!(graph.outgoing("d").count(), 1);
    }

    #[test]
    fn test_replacing_branches_reconciles_edges() {
        let mut graph = chain(&["a", "b", "c"]);
        graph.create_node(NodeSpec::decision("?").with_id("d")).unwrap();
        graph.add_branch("d", "one", "One", Some("a")).unwrap();
        graph.add_branch("d", "two", "Two", Some("b")).unwrap();
        let kept_edge = graph.outgoing("d").next().unwrap().id.clone();

        let branches = vec![Branch::new("uno", "Uno").to("a"), Branch::new("tres", "Tres").to("c")];
        graph.update_node("d", NodePatch::default().branches(branches)).unwrap();

        let outgoing: Vec<&Edge> = graph.outgoing("d").collect();
        assert_eq!(outgoing.len(), 2);
        assert_eq!(outgoing[0].id, kept_edge);
        assert_eq!(outgoing[0].condition.as_deref(), Some("uno"));
        assert_eq!(outgoing[1].to, "c");
        graph.validate().unwrap();
    }

    #[test]
    fn test_type_change_guard() {
        let mut graph = chain(&["a", "b"]);
        let patch = NodePatch {
            node_type: Some(NodeType::Decision),
            ..Default::default()
        };
        assert!(matches!(graph.update_node("a", patch.clone()), Err(CaptureError::InvalidOperation(_))));
        let node = graph.update_node("b", patch).unwrap();
        assert!(node.is_decision());
    }

    #[test]
    fn test_mark_important_toggles_type() {
        let mut graph = chain(&["a"]);
        assert_eq!(graph.mark_important("a", true).unwrap().node_type, NodeType::MarkedAction);
        assert_eq!(graph.mark_important("a", false).unwrap().node_type, NodeType::Action);
    }

    #[test]
    fn test_update_important_toggles_type() {
        let mut graph = chain(&["a"]);
        let patch = NodePatch { important: Some(true), ..Default::default() };
        let node = graph.update_node("a", patch).unwrap();
        assert!(node.important);
        assert_eq!(node.node_type, NodeType::MarkedAction);

        let patch = NodePatch { important: Some(false), ..Default::default() };
        assert_eq!(graph.update_node("a", patch).unwrap().node_type, NodeType::Action);

        graph.create_node(NodeSpec::decision("Paid?").with_id("d")).unwrap();
        let patch = NodePatch { important: Some(true), ..Default::default() };
        let node = graph.update_node("d", patch).unwrap();
        assert!(node.important);
        assert_eq!(node.node_type, NodeType::Decision);
    }

    #[test]
    fn test_close_node_once() {
        let mut graph = chain(&["a"]);
        assert_eq!(graph.close_node("a", Vec::new()).unwrap().state, NodeState::Closed);
        assert!(matches!(graph.close_node("a", Vec::new()), Err(CaptureError::InvalidOperation(_))));
        graph.mark_exported(["a"]);
        assert_eq!(graph.node("a").unwrap().state, NodeState::Exported);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut graph = chain(&["a", "b"]);
        graph.create_node(NodeSpec::decision("?").with_id("d")).unwrap();
        graph.add_branch("d", "retry", "Retry", Some("a")).unwrap();
        graph.add_branch("d", "later", "Later", None).unwrap();
        graph.set_session_state(Some(SessionState::default()));

        let json = graph.to_json().unwrap();
        let back = ProcessGraph::from_json(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_from_json_rejects_broken_documents() {
        let graph = chain(&["a", "b"]);
        let mut doc: serde_json::Value = serde_json::from_str(&graph.to_json().unwrap()).unwrap();
        doc["edges"][0]["to"] = serde_json::json!("ghost");
        let err = ProcessGraph::from_json(&doc.to_string()).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidGraph(_)));
    }

    #[test]
    fn test_clear_keeps_metadata() {
        let mut graph = chain(&["a", "b"]);
        graph.rename("Invoice approval");
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.edges().is_empty());
        assert_eq!(graph.metadata().name, "Invoice approval");
    }
}
