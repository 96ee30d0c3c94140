//! Format-independent synthesis plan
//!
//! The graph is linearized once: topological order, decision inlining, selector choice
//! and fallbacks all happen here, so every emitter renders the same steps in the same
//! order. Planning only reads the graph.

use crate::dom::{resolve_selectors, SelectorSet, SelectorStrategy};
use crate::error::CaptureError;
use crate::event::{clipboard, correlate, ClipboardDataType, DataFlow, Event, EventContext, EventPayload, FileOpKind};
use crate::graph::{topological_order, ActionKind, Node, NodeType, ProcessGraph, SessionState};
use crate::segment::naming;
use crate::synth::SynthesisOptions;
use std::collections::HashSet;

/// Locator picked from a [`SelectorSet`] for one statement
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    pub strategy: SelectorStrategy,
    pub selector: String,
    pub value: String,
    pub tag: String,

    /// Best CSS-only selector, for targets that can only query shadow roots with CSS
    pub css: Option<String>,

    /// Shadow hosts to cross, outermost first; empty when no piercing is needed
    pub shadow_hosts: Vec<String>,

    /// Captured screen position of the element's center
    pub point: Option<(i64, i64)>,
}

impl Locator {
    /// `None` when coordinates are the best the set can offer
    pub fn from_selectors(selectors: &SelectorSet, tag: &str) -> Option<Self> {
        let best = selectors.best();
        if best.strategy == SelectorStrategy::Coordinates {
            return None;
        }
        let css = selectors
            .iter()
            .find(|c| is_css(c.strategy))
            .map(|c| c.selector.clone());
        let shadow_hosts = if selectors.requires_shadow_piercing() {
            selectors.shadow_hosts().to_vec()
        } else {
            Vec::new()
        };

        Some(Self {
            strategy: best.strategy,
            selector: best.selector.clone(),
            value: best.value.clone(),
            tag: tag.to_string(),
            css,
            shadow_hosts,
            point: captured_point(selectors),
        })
    }

    pub fn is_stable(&self) -> bool {
        self.strategy.is_stable()
    }

    pub fn requires_shadow_piercing(&self) -> bool {
        !self.shadow_hosts.is_empty()
    }

    /// CSS selector for the element itself, falling back to its tag
    pub fn css_or_tag(&self) -> &str {
        self.css.as_deref().unwrap_or(&self.tag)
    }
}

fn is_css(strategy: SelectorStrategy) -> bool {
    matches!(
        strategy,
        SelectorStrategy::DataAttr | SelectorStrategy::StableId | SelectorStrategy::Aria | SelectorStrategy::StableClass
    )
}

/// Text typed by a statement
#[derive(Debug, Clone, PartialEq)]
pub enum TextValue {
    Literal(String),

    /// Password input; generated code reads it from this environment variable
    Secret { env: String },
}

/// Key press with modifier names (`ctrl`, `meta`, `alt`, `shift`)
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    pub key: String,
    pub modifiers: Vec<String>,
}

impl KeyPress {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Vec::new(),
        }
    }

    /// Parse `ctrl+shift+s` style combinations
    pub fn parse(combo: &str) -> Self {
        let mut parts: Vec<&str> = combo.split('+').map(str::trim).filter(|p| !p.is_empty()).collect();
        let key = parts.pop().unwrap_or("Enter").to_string();
        let modifiers = parts.into_iter().map(|m| m.to_lowercase()).collect();
        Self { key, modifiers }
    }

    pub fn combo(&self) -> String {
        let mut parts: Vec<&str> = self.modifiers.iter().map(String::as_str).collect();
        parts.push(&self.key);
        parts.join("+")
    }
}

/// One target-independent action
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Navigate { url: String },
    WaitFor { locator: Locator },
    Click { locator: Locator },
    ClickAt { x: i64, y: i64 },
    Fill { locator: Locator, value: TextValue },
    TypeText { value: TextValue },
    PressKey { locator: Option<Locator>, key: KeyPress },
    Assert { locator: Locator, text: Option<String> },
    Wait { ms: u64 },
    CopyData { preview: String, data_type: ClipboardDataType },
    FileOperation { op: FileOpKind, path: String, dest: Option<String> },
    Comment(String),

    /// Rendered as a comment; also collected in [`Plan::warnings`]
    Warning(String),
}

/// Statements of one non-decision node
#[derive(Debug, Clone, PartialEq)]
pub struct StepPlan {
    pub node_id: String,
    pub step: u32,
    pub node_type: NodeType,
    pub description: String,
    pub context: EventContext,
    pub selectors: Option<SelectorSet>,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchPlan {
    pub condition: String,
    pub label: String,
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPlan {
    pub node_id: String,
    pub step: u32,
    pub description: String,
    pub branches: Vec<BranchPlan>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanItem {
    Step(StepPlan),
    Decision(DecisionPlan),

    /// Node left out of the generated code, with the reason
    Skipped {
        node_id: String,
        step: u32,
        description: String,
        reason: String,
    },

    /// Jump to a node that was already emitted ("continues at step N")
    Reference { step: u32, description: String },
}

/// Linearized graph shared by all emitters
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub title: String,
    pub items: Vec<PlanItem>,
    pub warnings: Vec<String>,
    pub session_state: Option<SessionState>,
    pub data_flows: Vec<DataFlow>,

    /// Every node rendered or skipped, in plan order
    pub node_ids: Vec<String>,
}

impl Plan {
    /// Number of rendered (non-skipped) step and decision items, nested ones included
    pub fn step_count(&self) -> usize {
        fn count(items: &[PlanItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    PlanItem::Step(_) => 1,
                    PlanItem::Decision(d) => 1 + d.branches.iter().map(|b| count(&b.items)).sum::<usize>(),
                    _ => 0,
                })
                .sum()
        }
        count(&self.items)
    }
}

/// Build the plan for `graph`
pub fn build(graph: &ProcessGraph, options: &SynthesisOptions) -> Plan {
    let session_state = options
        .session_state
        .clone()
        .or_else(|| graph.session_state().cloned());

    let mut planner = Planner {
        graph,
        restore_session: session_state.is_some(),
        emitted: HashSet::new(),
        node_ids: Vec::new(),
        warnings: Vec::new(),
    };

    let mut items = Vec::new();
    for id in topological_order(graph) {
        if planner.emitted.contains(&id) {
            continue;
        }
        planner.plan_node(&id, &mut items);
    }

    let mut events: Vec<Event> = planner
        .node_ids
        .iter()
        .filter_map(|id| graph.node(id))
        .flat_map(|node| node.raw_events.iter().cloned())
        .collect();
    events.sort_by_key(Event::timestamp);

    Plan {
        title: options
            .title
            .clone()
            .unwrap_or_else(|| graph.metadata().name.clone()),
        items,
        warnings: planner.warnings,
        session_state,
        data_flows: correlate::data_flows(&events),
        node_ids: planner.node_ids,
    }
}

struct Planner<'a> {
    graph: &'a ProcessGraph,
    restore_session: bool,
    emitted: HashSet<String>,
    node_ids: Vec<String>,
    warnings: Vec<String>,
}

impl<'a> Planner<'a> {
    fn plan_node(&mut self, id: &str, out: &mut Vec<PlanItem>) {
        let graph = self.graph;
        let Some(node) = graph.node(id) else {
            return;
        };
        if !self.emitted.insert(node.id.clone()) {
            return;
        }
        self.node_ids.push(node.id.clone());

        if node.session_setup && self.restore_session {
            log::debug!("Skipping session setup node {} (step {})", node.id, node.step);
            out.push(PlanItem::Skipped {
                node_id: node.id.clone(),
                step: node.step,
                description: node.action.description.clone(),
                reason: "session state restored from capture".to_string(),
            });
        } else if node.is_decision() {
            let decision = self.plan_decision(node);
            out.push(PlanItem::Decision(decision));
            return;
        } else if node.node_type == NodeType::MarkedAction && !node.raw_events.is_empty() {
            out.push(PlanItem::Step(self.replay(node)));
        } else {
            out.push(PlanItem::Step(self.derive(node)));
        }

        for edge in graph.outgoing(id) {
            if !self.emitted.contains(&edge.to) {
                continue;
            }
            if let Some(target) = graph.node(&edge.to) {
                out.push(reference(target));
            }
        }
    }

    fn plan_decision(&mut self, node: &Node) -> DecisionPlan {
        let mut branches = Vec::with_capacity(node.branches.len());
        for branch in &node.branches {
            let mut items = Vec::new();
            if let Some(target) = branch.next_node_id.as_deref() {
                if self.emitted.contains(target) {
                    if let Some(target) = self.graph.node(target) {
                        items.push(reference(target));
                    }
                } else {
                    let mut members = HashSet::new();
                    self.plan_branch(target, &mut members, &mut items);
                }
            }
            branches.push(BranchPlan {
                condition: branch.condition.clone(),
                label: branch.label.clone(),
                items,
            });
        }

        DecisionPlan {
            node_id: node.id.clone(),
            step: node.step,
            description: node.action.description.clone(),
            branches,
        }
    }

    /// Inline `id` and every successor reachable only from inside the branch
    fn plan_branch(&mut self, id: &str, members: &mut HashSet<String>, out: &mut Vec<PlanItem>) {
        members.insert(id.to_string());
        self.plan_node(id, out);

        let graph = self.graph;
        if graph.node(id).is_some_and(Node::is_decision) {
            return;
        }
        let successors: Vec<&str> = graph.outgoing(id).map(|e| e.to.as_str()).collect();
        for next in successors {
            if self.emitted.contains(next) {
                continue;
            }
            if graph.incoming(next).all(|e| members.contains(&e.from)) {
                self.plan_branch(next, members, out);
            }
        }
    }

    /// Statements from the node's action and element
    fn derive(&mut self, node: &Node) -> StepPlan {
        let mut statements = Vec::new();
        let locator = self.node_locator(node, &mut statements);

        match node.action.kind {
            ActionKind::Click => match locator {
                Some(locator) => {
                    statements.push(Statement::WaitFor { locator: locator.clone() });
                    statements.push(Statement::Click { locator });
                }
                None => self.fallback_click(node, &mut statements),
            },
            ActionKind::Fill => {
                let value = self.fill_value(node);
                match &locator {
                    Some(locator) => {
                        statements.push(Statement::WaitFor { locator: locator.clone() });
                        statements.push(Statement::Fill {
                            locator: locator.clone(),
                            value,
                        });
                    }
                    None => {
                        if let Some((x, y)) = fallback_point(node) {
                            statements.push(Statement::ClickAt { x, y });
                        }
                        statements.push(Statement::TypeText { value });
                    }
                }
                if node.action.submit {
                    statements.push(Statement::PressKey {
                        locator,
                        key: KeyPress::new("Enter"),
                    });
                }
            }
            ActionKind::PressKey => {
                let key = node
                    .action
                    .value
                    .as_deref()
                    .map(KeyPress::parse)
                    .or_else(|| last_keystroke(node))
                    .unwrap_or_else(|| KeyPress::new("Enter"));
                statements.push(Statement::PressKey { locator, key });
            }
            ActionKind::Navigate => {
                let url = node
                    .action
                    .value
                    .clone()
                    .or_else(|| node.raw_events.iter().find_map(|e| e.page_url().map(String::from)))
                    .or_else(|| node.context.url.clone());
                match url {
                    Some(url) => statements.push(Statement::Navigate { url }),
                    None => self.placeholder(node, "navigation target unknown", &mut statements),
                }
            }
            ActionKind::Assert => match locator {
                Some(locator) => {
                    statements.push(Statement::WaitFor { locator: locator.clone() });
                    statements.push(Statement::Assert {
                        locator,
                        text: node.action.value.clone(),
                    });
                }
                None => self.placeholder(node, "no element to assert on", &mut statements),
            },
            ActionKind::Wait => {
                let ms = node
                    .action
                    .value
                    .as_deref()
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(1000);
                statements.push(Statement::Wait { ms });
            }
            ActionKind::CopyData => {
                let copy = node.raw_events.iter().find_map(|e| match e.payload() {
                    EventPayload::ClipboardCopy(p) => Some(p),
                    _ => None,
                });
                let (preview, data_type) = match copy {
                    Some(p) => (clipboard::label(p), p.data_type),
                    None => (node.action.value.clone().unwrap_or_default(), ClipboardDataType::Text),
                };
                statements.push(Statement::CopyData { preview, data_type });
            }
            ActionKind::FileOperation => {
                let file_op = node.raw_events.iter().find_map(|e| match e.payload() {
                    EventPayload::FileOp(p) => Some(p),
                    _ => None,
                });
                match file_op {
                    Some(p) => statements.push(Statement::FileOperation {
                        op: p.op,
                        path: p.path.clone(),
                        dest: p.dest_path.clone(),
                    }),
                    None => self.placeholder(node, "no captured file operation", &mut statements),
                }
            }
        }

        self.step(node, statements)
    }

    /// Replay each sub-step's captured events in order
    fn replay(&mut self, node: &Node) -> StepPlan {
        let mut statements = Vec::new();
        let groups: Vec<(String, Vec<&Event>)> = if node.sub_steps.is_empty() {
            vec![(node.action.description.clone(), node.raw_events.iter().collect())]
        } else {
            node.sub_steps
                .iter()
                .map(|s| (s.name.clone(), s.events(&node.raw_events).collect()))
                .collect()
        };

        for (name, events) in groups {
            statements.push(Statement::Comment(name));
            for event in events {
                self.event_statements(node, event, &mut statements);
            }
        }

        self.step(node, statements)
    }

    fn event_statements(&mut self, node: &Node, event: &Event, out: &mut Vec<Statement>) {
        let locator = event.element().and_then(|element| {
            let selectors = resolve_selectors(element);
            if !selectors.is_stable() {
                self.warn(
                    out,
                    CaptureError::NoStableSelector(format!("step {}: {}", node.step, element.describe())),
                );
            }
            Locator::from_selectors(&selectors, &element.tag)
        });

        match event.payload() {
            EventPayload::Click(p) => match locator {
                Some(locator) => {
                    out.push(Statement::WaitFor { locator: locator.clone() });
                    out.push(Statement::Click { locator });
                }
                None => out.push(Statement::ClickAt {
                    x: p.x.round() as i64,
                    y: p.y.round() as i64,
                }),
            },
            EventPayload::TypedText(p) => {
                let value = if naming::is_secret(event) {
                    TextValue::Secret { env: secret_env(node) }
                } else {
                    TextValue::Literal(p.text.clone())
                };
                match locator {
                    Some(locator) => out.push(Statement::Fill { locator, value }),
                    None => out.push(Statement::TypeText { value }),
                }
            }
            EventPayload::Keystroke(p) => out.push(Statement::PressKey {
                locator: None,
                key: KeyPress {
                    key: p.key.clone(),
                    modifiers: p.modifiers.names().into_iter().map(String::from).collect(),
                },
            }),
            EventPayload::Navigation(p) => out.push(Statement::Navigate { url: p.url.clone() }),
            EventPayload::ClipboardCopy(p) => out.push(Statement::CopyData {
                preview: clipboard::label(p),
                data_type: p.data_type,
            }),
            EventPayload::FileOp(p) => out.push(Statement::FileOperation {
                op: p.op,
                path: p.path.clone(),
                dest: p.dest_path.clone(),
            }),
        }
    }

    /// Locator for the node's element, with a warning when it is structural only
    fn node_locator(&mut self, node: &Node, out: &mut Vec<Statement>) -> Option<Locator> {
        let element = node.element.as_ref()?;
        let locator = Locator::from_selectors(&element.selectors, &element.snapshot.tag);
        if let Some(locator) = &locator {
            if !locator.is_stable() {
                self.warn(
                    out,
                    CaptureError::NoStableSelector(format!(
                        "step {}: falling back to {} selector {}",
                        node.step, locator.strategy, locator.selector
                    )),
                );
            }
        }
        locator
    }

    fn fill_value(&self, node: &Node) -> TextValue {
        let typed = node.raw_events.iter().rev().find(|e| matches!(e.payload(), EventPayload::TypedText(_)));
        let secret = typed.is_some_and(naming::is_secret)
            || node.element.as_ref().is_some_and(|e| e.snapshot.is_password());
        if secret {
            return TextValue::Secret { env: secret_env(node) };
        }
        let text = node.action.value.clone().or_else(|| {
            typed.and_then(|e| match e.payload() {
                EventPayload::TypedText(p) => Some(p.text.clone()),
                _ => None,
            })
        });
        TextValue::Literal(text.unwrap_or_default())
    }

    fn fallback_click(&mut self, node: &Node, out: &mut Vec<Statement>) {
        match fallback_point(node) {
            Some((x, y)) => {
                self.warn(
                    out,
                    CaptureError::NoStableSelector(format!("step {}: clicking at ({}, {})", node.step, x, y)),
                );
                out.push(Statement::ClickAt { x, y });
            }
            None => self.placeholder(node, "no selector or coordinates", out),
        }
    }

    fn placeholder(&mut self, node: &Node, reason: &str, out: &mut Vec<Statement>) {
        let err = CaptureError::SynthesisPartialFailure {
            node: node.id.clone(),
            reason: reason.to_string(),
        };
        self.warn(out, err);
        out.push(Statement::Comment(format!(
            "Manual step {}: {}",
            node.step, node.action.description
        )));
    }

    fn warn(&mut self, out: &mut Vec<Statement>, err: CaptureError) {
        let message = err.to_string();
        log::warn!("{}", message);
        self.warnings.push(message.clone());
        out.push(Statement::Warning(message));
    }

    fn step(&self, node: &Node, statements: Vec<Statement>) -> StepPlan {
        StepPlan {
            node_id: node.id.clone(),
            step: node.step,
            node_type: node.node_type,
            description: node.action.description.clone(),
            context: node.context.clone(),
            selectors: node.selectors().cloned(),
            statements,
        }
    }
}

fn reference(target: &Node) -> PlanItem {
    PlanItem::Reference {
        step: target.step,
        description: target.action.description.clone(),
    }
}

/// Coordinates from the element's fallback candidate or the first captured click
fn fallback_point(node: &Node) -> Option<(i64, i64)> {
    node.selectors()
        .and_then(captured_point)
        .or_else(|| {
            node.raw_events.iter().find_map(|e| match e.payload() {
                EventPayload::Click(p) => Some((p.x.round() as i64, p.y.round() as i64)),
                _ => None,
            })
        })
}

/// Center of the captured bounding box; a box at the origin means no layout was captured
fn captured_point(selectors: &SelectorSet) -> Option<(i64, i64)> {
    selectors
        .coordinates()
        .and_then(|c| c.point())
        .filter(|&point| point != (0, 0))
}

fn last_keystroke(node: &Node) -> Option<KeyPress> {
    node.raw_events.iter().rev().find_map(|e| match e.payload() {
        EventPayload::Keystroke(p) => Some(KeyPress {
            key: p.key.clone(),
            modifiers: p.modifiers.names().into_iter().map(String::from).collect(),
        }),
        _ => None,
    })
}

/// Environment variable holding a masked value for `node`
pub fn secret_env(node: &Node) -> String {
    format!("CAPTURE_SECRET_STEP_{}", node.step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSnapshot;
    use crate::graph::{Branch, EdgeKind, NodeAction, NodeSpec};

    fn button(id: &str) -> ElementSnapshot {
        ElementSnapshot::new("button")
            .with_attribute("data-testid", id)
            .with_text(id)
            .with_bounding_box(10.0, 20.0, 100.0, 40.0)
            .clickable(true)
    }

    fn click_node(graph: &mut ProcessGraph, id: &str) {
        let element = button(id);
        let selectors = resolve_selectors(&element);
        graph
            .create_node(
                NodeSpec::action(ActionKind::Click, format!("Click {}", id))
                    .with_id(id)
                    .with_element(element, selectors),
            )
            .unwrap();
    }

    fn step_ids(items: &[PlanItem]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Step(s) => Some(s.node_id.clone()),
                PlanItem::Decision(d) => Some(d.node_id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_decision_branches_are_nested() {
        let mut graph = ProcessGraph::new("Orders");
        for id in ["a", "b", "c"] {
            click_node(&mut graph, id);
        }
        graph.add_edge("a", "b", EdgeKind::Normal, None).unwrap();
        graph.add_edge("b", "c", EdgeKind::Normal, None).unwrap();
        click_node(&mut graph, "e");
        click_node(&mut graph, "f");
        graph
            .create_node(
                NodeSpec::decision("In stock?")
                    .with_id("d")
                    .with_branch(Branch::new("yes", "In stock").to("e"))
                    .with_branch(Branch::new("no", "Out of stock").to("f")),
            )
            .unwrap();
        graph.add_edge("c", "d", EdgeKind::Normal, None).unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        assert_eq!(step_ids(&plan.items), vec!["a", "b", "c", "d"]);

        let PlanItem::Decision(decision) = &plan.items[3] else {
            panic!("expected a decision");
        };
        assert_eq!(decision.branches.len(), 2);
        assert_eq!(step_ids(&decision.branches[0].items), vec!["e"]);
        assert_eq!(step_ids(&decision.branches[1].items), vec!["f"]);
        assert_eq!(plan.step_count(), 6);
        assert_eq!(plan.node_ids.len(), 6);
    }

    #[test]
    fn test_branch_chain_and_merge_point() {
        let mut graph = ProcessGraph::default();
        for id in ["e", "e2", "f", "merge"] {
            click_node(&mut graph, id);
        }
        graph
            .create_node(
                NodeSpec::decision("Choice")
                    .with_id("d")
                    .with_branch(Branch::new("left", "Left").to("e"))
                    .with_branch(Branch::new("right", "Right").to("f")),
            )
            .unwrap();
        graph.add_edge("e", "e2", EdgeKind::Normal, None).unwrap();
        graph.add_edge("e2", "merge", EdgeKind::Normal, None).unwrap();
        graph.add_edge("f", "merge", EdgeKind::Normal, None).unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        let ids = step_ids(&plan.items);
        assert_eq!(ids, vec!["d", "merge"]);

        let PlanItem::Decision(decision) = &plan.items[0] else {
            panic!("expected a decision");
        };
        assert_eq!(step_ids(&decision.branches[0].items), vec!["e", "e2"]);
        assert_eq!(step_ids(&decision.branches[1].items), vec!["f"]);
    }

    #[test]
    fn test_loop_becomes_reference() {
        let mut graph = ProcessGraph::default();
        click_node(&mut graph, "fill");
        graph
            .create_node(
                NodeSpec::decision("Valid?")
                    .with_id("check")
                    .with_branch(Branch::new("retry", "Retry").to("fill")),
            )
            .unwrap();
        graph.add_edge("fill", "check", EdgeKind::Normal, None).unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        let PlanItem::Decision(decision) = &plan.items[1] else {
            panic!("expected a decision");
        };
        assert_eq!(
            decision.branches[0].items,
            vec![PlanItem::Reference {
                step: 1,
                description: "Click fill".to_string()
            }]
        );
    }

    #[test]
    fn test_session_setup_skipped_only_with_state() {
        let mut graph = ProcessGraph::default();
        graph
            .create_node(NodeSpec::action(ActionKind::Navigate, "Log in").with_id("login").session_setup(true))
            .unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        assert!(matches!(plan.items[0], PlanItem::Step(_)));

        graph.set_session_state(Some(SessionState::default()));
        let plan = build(&graph, &SynthesisOptions::default());
        assert!(matches!(&plan.items[0], PlanItem::Skipped { node_id, .. } if node_id == "login"));
    }

    #[test]
    fn test_missing_selector_falls_back_to_coordinates() {
        let mut graph = ProcessGraph::default();
        graph
            .create_node(
                NodeSpec::action(ActionKind::Click, "Click canvas")
                    .with_id("n")
                    .with_raw_events(vec![Event::click(1, 301.6, 99.2, None)]),
            )
            .unwrap();
        graph
            .create_node(NodeSpec::action(ActionKind::Click, "Click nowhere").with_id("m"))
            .unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        let PlanItem::Step(step) = &plan.items[0] else {
            panic!("expected a step");
        };
        assert!(step.statements.contains(&Statement::ClickAt { x: 302, y: 99 }));
        assert!(matches!(step.statements[0], Statement::Warning(_)));

        let PlanItem::Step(manual) = &plan.items[1] else {
            panic!("expected a step");
        };
        assert!(matches!(&manual.statements[1], Statement::Comment(c) if c.starts_with("Manual step 2")));
        assert_eq!(plan.warnings.len(), 2);
    }

    #[test]
    fn test_fill_with_submit_and_secret() {
        let mut graph = ProcessGraph::default();
        let field = ElementSnapshot::new("input").with_id("company").input(true);
        let selectors = resolve_selectors(&field);
        graph
            .create_node(
                NodeSpec::action(ActionKind::Fill, "Type company")
                    .with_element(field, selectors)
                    .with_action(
                        NodeAction::new(ActionKind::Fill, "Type company")
                            .with_value("Acme Corp")
                            .submitted(true),
                    ),
            )
            .unwrap();

        let password = ElementSnapshot::new("input")
            .with_id("password")
            .with_attribute("type", "password")
            .input(true);
        let selectors = resolve_selectors(&password);
        graph
            .create_node(
                NodeSpec::action(ActionKind::Fill, "Type password")
                    .with_raw_events(vec![Event::typed_text(5, "hunter2", Some(password.clone()))])
                    .with_element(password, selectors),
            )
            .unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        let PlanItem::Step(first) = &plan.items[0] else {
            panic!("expected a step");
        };
        assert!(matches!(
            &first.statements[1],
            Statement::Fill { value: TextValue::Literal(v), .. } if v == "Acme Corp"
        ));
        assert!(matches!(&first.statements[2], Statement::PressKey { key, .. } if key.key == "Enter"));

        let PlanItem::Step(second) = &plan.items[1] else {
            panic!("expected a step");
        };
        assert!(matches!(
            &second.statements[1],
            Statement::Fill { value: TextValue::Secret { env }, .. } if env == "CAPTURE_SECRET_STEP_2"
        ));
    }

    #[test]
    fn test_marked_action_replays_sub_steps() {
        let mut graph = ProcessGraph::default();
        let events = vec![
            Event::navigation(1, "https://crm.example.com"),
            Event::click(2, 5.0, 5.0, Some(button("save"))),
        ];
        let node_id = graph
            .create_node(NodeSpec::action(ActionKind::Click, "Save record").with_raw_events(events.clone()))
            .unwrap()
            .id
            .clone();
        let sub_steps = crate::segment::Segmenter::default().segment(&events);
        graph.close_node(&node_id, sub_steps).unwrap();
        graph.mark_important(&node_id, true).unwrap();

        let plan = build(&graph, &SynthesisOptions::default());
        let PlanItem::Step(step) = &plan.items[0] else {
            panic!("expected a step");
        };
        assert_eq!(step.node_type, NodeType::MarkedAction);
        assert!(matches!(&step.statements[0], Statement::Comment(_)));
        assert!(step.statements.contains(&Statement::Navigate {
            url: "https://crm.example.com".to_string()
        }));
        assert!(step.statements.iter().any(|s| matches!(s, Statement::Click { .. })));
    }

    #[test]
    fn test_key_press_parse() {
        let key = KeyPress::parse("ctrl+shift+s");
        assert_eq!(key.key, "s");
        assert_eq!(key.modifiers, vec!["ctrl", "shift"]);
        assert_eq!(key.combo(), "ctrl+shift+s");
        assert_eq!(KeyPress::parse("Tab").modifiers.len(), 0);
    }

    #[test]
    fn test_planning_does_not_mutate() {
        let mut graph = ProcessGraph::default();
        click_node(&mut graph, "a");
        let before = graph.to_json().unwrap();
        let _ = build(&graph, &SynthesisOptions::default());
        assert_eq!(graph.to_json().unwrap(), before);
    }
}
