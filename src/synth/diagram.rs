use crate::graph::{EdgeKind, Node, NodeType};
use crate::synth::emitter::{EmitContext, Emitter};
use crate::synth::plan::PlanItem;
use crate::synth::writer::CodeWriter;
use crate::synth::TargetFormat;
use indexmap::IndexMap;
use std::collections::HashSet;

/// `diagram` emitter: Mermaid flowchart of every node and edge
#[derive(Debug, Default, Clone, Copy)]
pub struct DiagramEmitter;

impl Emitter for DiagramEmitter {
    fn format(&self) -> TargetFormat {
        TargetFormat::Diagram
    }

    fn description(&self) -> &str {
        "Mermaid flowchart"
    }

    fn emit(&self, context: EmitContext<'_>) -> String {
        let graph = context.graph;
        let mut w = CodeWriter::spaces();

        w.line("---");
        w.line(format!("title: {}", escape(&context.plan.title)));
        w.line("---");
        w.line("flowchart TD");
        w.indent();

        if graph.is_empty() {
            w.line("empty([\"No steps captured\"])");
        }

        let order = declaration_order(&context);
        for (position, node) in order.values().enumerate() {
            w.line(format!("{}{}", node_key(position), shape(node)));
        }

        for edge in graph.edges() {
            let (Some(from), Some(to)) = (order.get_index_of(edge.from.as_str()), order.get_index_of(edge.to.as_str()))
            else {
                continue;
            };
            let label = graph
                .node(&edge.from)
                .and_then(|n| n.branch_to(&edge.to))
                .map(|b| if b.label.is_empty() { b.condition.clone() } else { b.label.clone() })
                .or_else(|| edge.condition.clone());
            let arrow = match (edge.kind, label) {
                (EdgeKind::Normal | EdgeKind::Branch, None) => "-->".to_string(),
                (EdgeKind::Normal | EdgeKind::Branch, Some(label)) => format!("-->|{}|", escape(&label)),
                (EdgeKind::Loop, label) => format!("-.->|{}|", escape(label.as_deref().unwrap_or("loop"))),
                (EdgeKind::Error, label) => format!("-.->|{}|", escape(label.as_deref().unwrap_or("error"))),
            };
            w.line(format!("{} {} {}", node_key(from), arrow, node_key(to)));
        }

        let skipped = skipped_nodes(&context.plan.items);
        let mut important = Vec::new();
        let mut setup = Vec::new();
        for (position, node) in order.values().enumerate() {
            if node.important {
                important.push(node_key(position));
            }
            if skipped.contains(node.id.as_str()) {
                setup.push(node_key(position));
            }
        }
        if !important.is_empty() {
            w.line("classDef important stroke-width:3px");
            w.line(format!("class {} important", important.join(",")));
        }
        if !setup.is_empty() {
            w.line("classDef skipped stroke-dasharray: 5 5");
            w.line(format!("class {} skipped", setup.join(",")));
        }

        w.finish()
    }
}

/// Nodes in plan order, then any the plan never reached in insertion order
fn declaration_order<'a>(context: &EmitContext<'a>) -> IndexMap<&'a str, &'a Node> {
    let graph = context.graph;
    let mut order: IndexMap<&'a str, &'a Node> = context
        .plan
        .node_ids
        .iter()
        .filter_map(|id| graph.node(id))
        .map(|node| (node.id.as_str(), node))
        .collect();
    for node in graph.nodes() {
        order.entry(node.id.as_str()).or_insert(node);
    }
    order
}

fn node_key(position: usize) -> String {
    format!("n{}", position + 1)
}

fn shape(node: &Node) -> String {
    let label = format!("\"{}. {}\"", node.step, escape(&node.action.description));
    match node.node_type {
        NodeType::Action => format!("[{}]", label),
        NodeType::Decision => format!("{{{}}}", label),
        NodeType::Preparation => format!("[/{}/]", label),
        NodeType::MarkedAction => format!("[[{}]]", label),
    }
}

/// Mermaid entity codes for characters that end a label
fn escape(text: &str) -> String {
    text.replace('"', "#quot;")
        .replace('|', "#124;")
        .replace('\n', " ")
}

fn skipped_nodes(items: &[PlanItem]) -> HashSet<&str> {
    let mut skipped = HashSet::new();
    for item in items {
        match item {
            PlanItem::Skipped { node_id, .. } => {
                skipped.insert(node_id.as_str());
            }
            PlanItem::Decision(decision) => {
                for branch in &decision.branches {
                    skipped.extend(skipped_nodes(&branch.items));
                }
            }
            _ => {}
        }
    }
    skipped
}
