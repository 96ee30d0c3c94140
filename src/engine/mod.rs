//! Capture engine
//!
//! [`CaptureEngine`] is the single mutator of a [`ProcessGraph`]. It owns the open
//! recording window, turns finalized windows into nodes and serves the commands of the
//! surrounding application. [`intake`] wraps it in a message loop fed by concurrent
//! event sources.

pub mod intake;

pub use intake::{EngineHandle, EventSource, JsonLinesSource};

use crate::config::CaptureConfig;
use crate::dom::resolve_selectors;
use crate::error::{CaptureError, Result};
use crate::event::{AppIdentity, DropReason, Event, EventBuffer, EventContext, EventPayload, Normalized, Normalizer};
use crate::graph::{
    ActionKind, Branch, Edge, EdgeKind, Node, NodeAction, NodePatch, NodeSpec, NodeType, ProcessGraph, SessionState,
};
use crate::segment::naming::{clipboard_preview, is_secret, key_combo};
use crate::segment::{Segmenter, SubStep};
use crate::synth::{Artifact, SynthesisOptions, Synthesizer, TargetFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How to close the open recording window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeMode {
    /// Segment the buffered events into a new node
    Quick,
    /// Keep recording; the soft timeout restarts from the latest event
    Extend,
    /// Return the proposed sub-steps and keep the window open
    Review,
}

/// Events buffered between `begin_recording_window` and finalization
#[derive(Debug, Clone)]
pub struct RecordingWindow {
    intent: Option<String>,
    events: EventBuffer,
    deadline: Option<u64>,
}

impl RecordingWindow {
    fn new(intent: Option<String>) -> Self {
        Self {
            intent,
            events: EventBuffer::unbounded(),
            deadline: None,
        }
    }

    pub fn intent(&self) -> Option<&str> {
        self.intent.as_deref()
    }

    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    /// Soft timeout; unset until the first event arrives
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    fn is_expired_at(&self, now_ms: u64) -> bool {
        self.deadline.is_some_and(|deadline| now_ms > deadline)
    }

    fn push(&mut self, event: Event, duration_ms: u64) {
        if self.deadline.is_none() {
            self.deadline = Some(event.timestamp().saturating_add(duration_ms));
        }
        self.events.push(event);
    }
}

/// What happened to one ingested event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// Added to the open window
    #[serde(rename_all = "camelCase")]
    Buffered {
        window_events: usize,
        /// Node created because the event arrived past the soft timeout
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finalized_node: Option<String>,
    },
    /// No window is open; kept in the session buffer only
    #[serde(rename_all = "camelCase")]
    Recorded {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finalized_node: Option<String>,
    },
    Dropped { reason: DropReason },
    Rejected { message: String },
}

/// Result of `finalize_recording_window`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FinalizeOutcome {
    Created { node: Box<Node> },
    Extended { deadline: Option<u64> },
    #[serde(rename_all = "camelCase")]
    Review { sub_steps: Vec<SubStep> },
    /// The window closed without events; the graph is unchanged
    Empty,
}

impl FinalizeOutcome {
    /// Id of the node this outcome created
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Created { node } => Some(node.id.as_str()),
            _ => None,
        }
    }
}

/// Single-threaded owner of the graph and the capture state
#[derive(Debug)]
pub struct CaptureEngine {
    config: CaptureConfig,
    normalizer: Normalizer,
    segmenter: Segmenter,
    synthesizer: Synthesizer,
    graph: ProcessGraph,
    window: Option<RecordingWindow>,
    session: EventBuffer,
}

impl Default for CaptureEngine {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

impl CaptureEngine {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            normalizer: Normalizer::new(&config),
            segmenter: Segmenter::new(&config),
            synthesizer: Synthesizer::new(),
            graph: ProcessGraph::default(),
            window: None,
            session: EventBuffer::bounded(config.session_buffer_capacity),
            config,
        }
    }

    /// Builder method: continue an existing graph
    pub fn with_graph(mut self, graph: ProcessGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Builder method: replace the own-process predicate
    pub fn with_identity(mut self, identity: impl AppIdentity + 'static) -> Self {
        self.normalizer = self.normalizer.with_identity(identity);
        self
    }

    /// Builder method: replace the synthesizer (and its emitters)
    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    pub fn window(&self) -> Option<&RecordingWindow> {
        self.window.as_ref()
    }

    pub fn is_recording(&self) -> bool {
        self.window.is_some()
    }

    /// Every accepted event of the session, in timestamp order
    pub fn session_events(&self) -> &EventBuffer {
        &self.session
    }

    pub fn begin_recording_window(&mut self, intent: Option<String>) -> Result<()> {
        if let Some(window) = &self.window {
            let name = window.intent.clone().unwrap_or_else(|| "unnamed".to_string());
            return Err(CaptureError::WindowAlreadyOpen(name));
        }
        log::info!("Recording window opened: {}", intent.as_deref().unwrap_or("(no intent)"));
        self.window = Some(RecordingWindow::new(intent));
        Ok(())
    }

    /// Normalize and record one raw intake object
    ///
    /// Malformed events are logged and reported as `Rejected`; only graph errors raised by
    /// a soft-timeout finalization are returned as `Err`.
    pub fn ingest_event(&mut self, raw: &Value) -> Result<IngestOutcome> {
        let normalized = self.normalizer.normalize(raw);
        self.accept(normalized)
    }

    /// Record an event that is already decoded
    pub fn ingest(&mut self, event: Event) -> Result<IngestOutcome> {
        let normalized = self.normalizer.normalize_event(event);
        self.accept(normalized)
    }

    fn accept(&mut self, normalized: Result<Normalized>) -> Result<IngestOutcome> {
        match normalized {
            Ok(Normalized::Event(event)) => self.record(event),
            Ok(Normalized::Dropped(reason)) => {
                log::debug!("Dropped event: {}", reason);
                Ok(IngestOutcome::Dropped { reason })
            }
            Err(err) => {
                log::warn!("Rejected event: {}", err);
                Ok(IngestOutcome::Rejected {
                    message: err.to_string(),
                })
            }
        }
    }

    fn record(&mut self, event: Event) -> Result<IngestOutcome> {
        let expired = self
            .window
            .as_ref()
            .is_some_and(|w| w.is_expired_at(event.timestamp()));
        let finalized_node = if expired {
            self.expire_window()?.and_then(|outcome| outcome.node_id().map(String::from))
        } else {
            None
        };

        self.session.push(event.clone());
        let duration = self.config.window_duration_ms;
        match self.window.as_mut() {
            Some(window) => {
                window.push(event, duration);
                Ok(IngestOutcome::Buffered {
                    window_events: window.events.len(),
                    finalized_node,
                })
            }
            None => Ok(IngestOutcome::Recorded { finalized_node }),
        }
    }

    /// Finalize a window past its soft timeout, reopening it in continuous mode
    fn expire_window(&mut self) -> Result<Option<FinalizeOutcome>> {
        let Some(intent) = self.window.as_ref().map(|w| w.intent.clone()) else {
            return Ok(None);
        };
        log::info!("Recording window timed out");
        let outcome = self.finalize_recording_window(FinalizeMode::Quick)?;
        if self.config.continuous {
            self.window = Some(RecordingWindow::new(intent));
        }
        Ok(Some(outcome))
    }

    /// Apply the soft timeout against a wall clock
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<FinalizeOutcome>> {
        if self.window.as_ref().is_some_and(|w| w.is_expired_at(now_ms)) {
            return self.expire_window();
        }
        Ok(None)
    }

    pub fn finalize_recording_window(&mut self, mode: FinalizeMode) -> Result<FinalizeOutcome> {
        let window = self.window.as_mut().ok_or(CaptureError::NoActiveWindow)?;
        match mode {
            FinalizeMode::Extend => {
                window.deadline = window
                    .events
                    .last_timestamp()
                    .map(|t| t.saturating_add(self.config.window_duration_ms));
                log::info!("Recording window extended to {:?}", window.deadline);
                Ok(FinalizeOutcome::Extended {
                    deadline: window.deadline,
                })
            }
            FinalizeMode::Review => {
                let events = window.events.to_vec();
                Ok(FinalizeOutcome::Review {
                    sub_steps: self.segmenter.segment(&events),
                })
            }
            FinalizeMode::Quick => {
                let Some(window) = self.window.take() else {
                    return Err(CaptureError::NoActiveWindow);
                };
                let RecordingWindow { intent, mut events, .. } = window;
                let events = events.drain();
                if events.is_empty() {
                    log::info!("Recording window closed without events");
                    return Ok(FinalizeOutcome::Empty);
                }
                let node = self.build_node(intent, events)?;
                log::info!("Recording window finalized into step {} ({})", node.step, node.id);
                Ok(FinalizeOutcome::Created { node: Box::new(node) })
            }
        }
    }

    /// Discard the open window; returns how many events were dropped
    pub fn cancel_recording_window(&mut self) -> Result<usize> {
        let window = self.window.take().ok_or(CaptureError::NoActiveWindow)?;
        log::info!("Recording window cancelled, {} event(s) discarded", window.events.len());
        Ok(window.events.len())
    }

    fn build_node(&mut self, intent: Option<String>, events: Vec<Event>) -> Result<Node> {
        let sub_steps = self.segmenter.segment(&events);
        let action = derive_action(&events);

        let description = intent
            .clone()
            .or_else(|| sub_steps.first().map(|s| s.name.clone()))
            .unwrap_or_else(|| "Captured step".to_string());
        let context = window_context(&events);

        let element = action
            .anchor
            .and_then(|i| events[i].element())
            .or_else(|| events.iter().find_map(Event::element))
            .cloned();

        let mut node_action = NodeAction::new(action.kind, description)
            .at(events[0].timestamp())
            .submitted(action.submit);
        node_action.value = action.value;

        let mut spec = NodeSpec::new(NodeType::Action, node_action)
            .with_context(context)
            .with_raw_events(events);
        if let Some(snapshot) = element {
            let selectors = resolve_selectors(&snapshot);
            spec = spec.with_element(snapshot, selectors);
        }
        if let Some(intent) = intent {
            spec = spec.with_intent(intent);
        }

        let id = self.append_node(spec)?;
        Ok(self.graph.close_node(&id, sub_steps)?.clone())
    }

    /// Create a node and link it after the current one
    ///
    /// A current Decision links through its first open branch; with no open branch the
    /// new node stays unlinked.
    fn append_node(&mut self, spec: NodeSpec) -> Result<String> {
        let previous = self.graph.current_node().map(|n| {
            let linkable = !n.is_decision() || n.branches.iter().any(Branch::is_open);
            (n.id.clone(), n.is_decision(), linkable)
        });
        let id = self.graph.create_node(spec)?.id.clone();

        if let Some((from, is_decision, true)) = previous {
            let kind = if is_decision { EdgeKind::Branch } else { EdgeKind::Normal };
            self.graph.add_edge(&from, &id, kind, None)?;
        }
        Ok(id)
    }

    /// Add a node by hand (a decision point, a manual step, a session preparation)
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<Node> {
        let id = self.append_node(spec)?;
        self.graph.node(&id).cloned().ok_or(CaptureError::NodeNotFound(id))
    }

    pub fn mark_node(&mut self, id: &str, important: bool) -> Result<Node> {
        Ok(self.graph.mark_important(id, important)?.clone())
    }

    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<Node> {
        Ok(self.graph.update_node(id, patch)?.clone())
    }

    pub fn add_branch(&mut self, decision_id: &str, condition: &str, label: &str, next: Option<&str>) -> Result<Branch> {
        Ok(self.graph.add_branch(decision_id, condition, label, next)?.clone())
    }

    pub fn connect(&mut self, from: &str, to: &str, kind: EdgeKind, condition: Option<String>) -> Result<Edge> {
        Ok(self.graph.add_edge(from, to, kind, condition)?.clone())
    }

    pub fn delete_node(&mut self, id: &str) -> Result<Node> {
        self.graph.delete_node(id)
    }

    /// Choose the node the next finalized window links from
    pub fn set_current(&mut self, id: Option<&str>) -> Result<()> {
        self.graph.set_current(id)
    }

    pub fn lock_node(&mut self, id: &str) -> Result<Node> {
        Ok(self.graph.lock_node(id)?.clone())
    }

    pub fn set_session_state(&mut self, state: Option<SessionState>) {
        self.graph.set_session_state(state);
    }

    /// Synthesize an artifact, then flag the nodes it references as exported
    pub fn export_graph(&mut self, format: TargetFormat, options: &SynthesisOptions) -> Result<Artifact> {
        let artifact = self.synthesizer.synthesize(&self.graph, format, options)?;
        for warning in &artifact.warnings {
            log::warn!("{}: {}", format, warning);
        }
        self.graph.mark_exported(artifact.node_ids.iter().map(String::as_str));
        log::info!("Exported {} node(s) as {}", artifact.node_ids.len(), format);
        Ok(artifact)
    }

    /// Drop all nodes, edges, buffered events and the open window
    pub fn clear_graph(&mut self) {
        self.graph.clear();
        self.window = None;
        self.session.clear();
        self.normalizer.reset();
        log::info!("Graph cleared");
    }

    /// Persisted graph document
    pub fn save(&self) -> Result<String> {
        self.graph.to_json()
    }

    /// Replace the graph with a persisted document; capture state starts fresh
    pub fn resume(&mut self, json: &str) -> Result<()> {
        let graph = ProcessGraph::from_json(json)?;
        log::info!("Resumed graph '{}' with {} node(s)", graph.metadata().name, graph.len());
        self.graph = graph;
        self.window = None;
        self.session.clear();
        self.normalizer.reset();
        Ok(())
    }

    /// Give the graph back, e.g. after the intake loop stops
    pub fn into_graph(self) -> ProcessGraph {
        self.graph
    }
}

/// Node action derived from a finalized window, with the index of its anchor event
struct DerivedAction {
    kind: ActionKind,
    value: Option<String>,
    submit: bool,
    anchor: Option<usize>,
}

/// Typed text wins over clicks, clicks over navigation, then keys, clipboard and files
fn derive_action(events: &[Event]) -> DerivedAction {
    let last_typed = events
        .iter()
        .rposition(|e| matches!(e.payload(), EventPayload::TypedText(_)));
    if let Some(index) = last_typed {
        let event = &events[index];
        let value = match event.payload() {
            EventPayload::TypedText(p) if !is_secret(event) => Some(p.text.clone()),
            _ => None,
        };
        let submit = events[index + 1..].iter().any(Event::is_submit_key);
        return DerivedAction {
            kind: ActionKind::Fill,
            value,
            submit,
            anchor: Some(index),
        };
    }

    let first = |pred: fn(&EventPayload) -> bool| events.iter().position(|e| pred(e.payload()));

    if let Some(index) = first(|p| matches!(p, EventPayload::Click(_))) {
        return DerivedAction {
            kind: ActionKind::Click,
            value: None,
            submit: false,
            anchor: Some(index),
        };
    }
    if let Some(index) = first(|p| matches!(p, EventPayload::Navigation(_))) {
        let value = match events[index].payload() {
            EventPayload::Navigation(p) => Some(p.url.clone()),
            _ => None,
        };
        return DerivedAction {
            kind: ActionKind::Navigate,
            value,
            submit: false,
            anchor: Some(index),
        };
    }
    if let Some(index) = first(|p| matches!(p, EventPayload::Keystroke(_))) {
        let value = match events[index].payload() {
            EventPayload::Keystroke(p) => Some(key_combo(&p.key, &p.modifiers)),
            _ => None,
        };
        return DerivedAction {
            kind: ActionKind::PressKey,
            value,
            submit: false,
            anchor: Some(index),
        };
    }
    if let Some(index) = first(|p| matches!(p, EventPayload::ClipboardCopy(_))) {
        return DerivedAction {
            kind: ActionKind::CopyData,
            value: clipboard_preview(&events[index]),
            submit: false,
            anchor: Some(index),
        };
    }
    if let Some(index) = first(|p| matches!(p, EventPayload::FileOp(_))) {
        let value = match events[index].payload() {
            EventPayload::FileOp(p) => Some(p.effective_path().to_string()),
            _ => None,
        };
        return DerivedAction {
            kind: ActionKind::FileOperation,
            value,
            submit: false,
            anchor: Some(index),
        };
    }

    DerivedAction {
        kind: ActionKind::Wait,
        value: None,
        submit: false,
        anchor: None,
    }
}

/// Context of the first event that has one
pub fn window_context(events: &[Event]) -> EventContext {
    events
        .iter()
        .map(Event::context)
        .find(|c| !c.is_empty())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementSnapshot;
    use crate::event::Modifiers;
    use crate::graph::NodeState;
    use serde_json::json;

    fn engine() -> CaptureEngine {
        CaptureEngine::new(CaptureConfig::default())
    }

    fn enter(ts: u64) -> Event {
        Event::keystroke(ts, "Enter", Modifiers::default())
    }

    #[test]
    fn test_window_lifecycle() {
        let mut engine = engine();
        assert!(matches!(
            engine.finalize_recording_window(FinalizeMode::Quick),
            Err(CaptureError::NoActiveWindow)
        ));

        engine.begin_recording_window(Some("Create customer".to_string())).unwrap();
        assert!(matches!(
            engine.begin_recording_window(None),
            Err(CaptureError::WindowAlreadyOpen(_))
        ));

        let button = ElementSnapshot::new("input").with_id("ember482");
        engine.ingest(Event::click(1000, 10.0, 10.0, Some(button.clone()))).unwrap();
        engine.ingest(Event::typed_text(1500, "Acme Corp", Some(button))).unwrap();
        let outcome = engine.ingest(enter(1800)).unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Buffered {
                window_events: 3,
                finalized_node: None
            }
        );

        let outcome = engine.finalize_recording_window(FinalizeMode::Quick).unwrap();
        let FinalizeOutcome::Created { node } = outcome else {
            panic!("expected a node");
        };
        assert_eq!(node.step, 1);
        assert_eq!(node.action.kind, ActionKind::Fill);
        assert_eq!(node.action.value.as_deref(), Some("Acme Corp"));
        assert!(node.action.submit);
        assert_eq!(node.action.description, "Create customer");
        assert_eq!(node.sub_steps.len(), 1);
        assert_eq!(node.raw_events.len(), 3);
        assert_eq!(node.state, NodeState::Closed);
        assert!(node.element.is_some());
        assert!(!engine.is_recording());
        assert_eq!(engine.session_events().len(), 3);
    }

    #[test]
    fn test_consecutive_windows_are_linked() {
        let mut engine = engine();
        for (i, url) in ["https://a.example.com", "https://b.example.com"].iter().enumerate() {
            engine.begin_recording_window(None).unwrap();
            engine.ingest(Event::navigation(i as u64 * 1000, *url)).unwrap();
            engine.finalize_recording_window(FinalizeMode::Quick).unwrap();
        }
        let graph = engine.graph();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edges().len(), 1);
        let first = graph.node_at(0).unwrap();
        assert_eq!(first.action.kind, ActionKind::Navigate);
        assert_eq!(first.action.value.as_deref(), Some("https://a.example.com"));
        assert_eq!(first.action.description, "Navigate to https://a.example.com");
        assert_eq!(graph.edges()[0].kind, EdgeKind::Normal);
    }

    #[test]
    fn test_decision_links_through_open_branch() {
        let mut engine = engine();
        let decision = engine
            .add_node(
                NodeSpec::decision("Amount over limit?")
                    .with_branch(Branch::new("yes", "Needs approval"))
                    .with_branch(Branch::new("no", "Auto approve")),
            )
            .unwrap();

        engine.begin_recording_window(None).unwrap();
        engine.ingest(Event::click(10, 1.0, 1.0, None)).unwrap();
        let created = engine.finalize_recording_window(FinalizeMode::Quick).unwrap();
        let node_id = created.node_id().unwrap().to_string();

        let decision = engine.graph().node(&decision.id).unwrap();
        assert_eq!(decision.branches[0].next_node_id.as_deref(), Some(node_id.as_str()));
        assert!(decision.branches[1].is_open());
        assert_eq!(engine.graph().edges()[0].kind, EdgeKind::Branch);
    }

    #[test]
    fn test_empty_and_cancelled_windows_leave_graph_unchanged() {
        let mut engine = engine();
        engine.begin_recording_window(None).unwrap();
        assert_eq!(
            engine.finalize_recording_window(FinalizeMode::Quick).unwrap(),
            FinalizeOutcome::Empty
        );

        engine.begin_recording_window(None).unwrap();
        engine.ingest(Event::click(1, 0.0, 0.0, None)).unwrap();
        engine.ingest(Event::click(2, 0.0, 0.0, None)).unwrap();
        assert_eq!(engine.cancel_recording_window().unwrap(), 2);
        assert!(engine.graph().is_empty());
        assert!(matches!(engine.cancel_recording_window(), Err(CaptureError::NoActiveWindow)));
    }

    #[test]
    fn test_review_and_extend_keep_window_open() {
        let mut engine = engine();
        engine.begin_recording_window(None).unwrap();
        engine.ingest(Event::click(1000, 0.0, 0.0, None)).unwrap();
        assert_eq!(engine.window().unwrap().deadline(), Some(31_000));

        engine.ingest(Event::navigation(20_000, "https://example.com/next")).unwrap();
        let review = engine.finalize_recording_window(FinalizeMode::Review).unwrap();
        let FinalizeOutcome::Review { sub_steps } = review else {
            panic!("expected review");
        };
        assert_eq!(sub_steps.len(), 2);

        let extended = engine.finalize_recording_window(FinalizeMode::Extend).unwrap();
        assert_eq!(extended, FinalizeOutcome::Extended { deadline: Some(50_000) });
        assert!(engine.is_recording());
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn test_soft_timeout_finalizes_before_late_event() {
        let config = CaptureConfig::new().window_duration_ms(1000);
        let mut engine = CaptureEngine::new(config);
        engine.begin_recording_window(Some("Search".to_string())).unwrap();
        engine.ingest(Event::click(0, 0.0, 0.0, None)).unwrap();

        let outcome = engine.ingest(Event::click(5000, 0.0, 0.0, None)).unwrap();
        let IngestOutcome::Recorded { finalized_node: Some(id) } = outcome else {
            panic!("expected timeout finalization, got {:?}", outcome);
        };
        assert_eq!(engine.graph().node(&id).unwrap().raw_events.len(), 1);
        assert!(!engine.is_recording());
        assert_eq!(engine.session_events().len(), 2);
    }

    #[test]
    fn test_continuous_mode_reopens_window() {
        let config = CaptureConfig::new().window_duration_ms(1000).continuous(true);
        let mut engine = CaptureEngine::new(config);
        engine.begin_recording_window(Some("Loop".to_string())).unwrap();
        engine.ingest(Event::click(0, 0.0, 0.0, None)).unwrap();

        assert_eq!(engine.tick(500).unwrap(), None);
        let outcome = engine.tick(2000).unwrap().unwrap();
        assert!(outcome.node_id().is_some());
        assert_eq!(engine.window().unwrap().intent(), Some("Loop"));
        assert!(engine.window().unwrap().events().is_empty());
    }

    #[test]
    fn test_malformed_and_dropped_events() {
        let mut engine = engine();
        let outcome = engine.ingest_event(&json!({"kind": "click", "timestamp": 1})).unwrap();
        assert!(matches!(outcome, IngestOutcome::Rejected { .. }));

        let outcome = engine
            .ingest_event(&json!({
                "kind": "click",
                "timestamp": 1,
                "origin": "system",
                "x": 1.0,
                "y": 2.0,
                "button": "left",
                "context": {"application": "Process Capture"}
            }))
            .unwrap();
        assert_eq!(
            outcome,
            IngestOutcome::Dropped {
                reason: DropReason::OwnProcess
            }
        );
        assert!(engine.session_events().is_empty());
    }

    #[test]
    fn test_secret_value_is_not_stored() {
        let mut engine = engine();
        engine.begin_recording_window(None).unwrap();
        let password = ElementSnapshot::new("input").with_attribute("type", "password");
        engine.ingest(Event::typed_text(1, "hunter2", Some(password))).unwrap();
        let node = engine.finalize_recording_window(FinalizeMode::Quick).unwrap();
        let FinalizeOutcome::Created { node } = node else {
            panic!("expected a node");
        };
        assert_eq!(node.action.kind, ActionKind::Fill);
        assert_eq!(node.action.value, None);
    }

    #[test]
    fn test_export_marks_nodes_and_keeps_graph() {
        let mut engine = engine();
        engine.begin_recording_window(None).unwrap();
        engine.ingest(Event::navigation(1, "https://example.com")).unwrap();
        engine.finalize_recording_window(FinalizeMode::Quick).unwrap();

        let artifact = engine
            .export_graph(TargetFormat::WebAutomation, &SynthesisOptions::default())
            .unwrap();
        assert!(artifact.content.contains("page.goto(\"https://example.com\")"));
        let node = engine.graph().node_at(0).unwrap();
        assert_eq!(node.state, NodeState::Exported);
        let id = node.id.clone();

        let node = engine.update_node(&id, NodePatch::default().describe("Open home")).unwrap();
        assert_eq!(node.action.description, "Open home");
    }

    #[test]
    fn test_save_resume_and_clear() {
        let mut engine = engine();
        engine.begin_recording_window(None).unwrap();
        engine.ingest(Event::click(1, 0.0, 0.0, None)).unwrap();
        engine.finalize_recording_window(FinalizeMode::Quick).unwrap();
        let saved = engine.save().unwrap();

        let mut other = CaptureEngine::default();
        other.resume(&saved).unwrap();
        assert_eq!(other.graph(), engine.graph());

        engine.clear_graph();
        assert!(engine.graph().is_empty());
        assert!(engine.session_events().is_empty());
        assert!(other.resume("not json").is_err());
    }

    #[test]
    fn test_graph_commands_report_missing_nodes() {
        let mut engine = engine();
        assert!(matches!(engine.mark_node("nope", true), Err(CaptureError::NodeNotFound(_))));
        let a = engine.add_node(NodeSpec::action(ActionKind::Wait, "Wait")).unwrap();
        assert!(matches!(
            engine.connect(&a.id, "nope", EdgeKind::Normal, None),
            Err(CaptureError::DanglingReference(_))
        ));
        assert!(engine.graph().edges().is_empty());
    }

    #[test]
    fn test_window_context() {
        let events = vec![
            Event::click(1, 0.0, 0.0, None),
            Event::click(2, 0.0, 0.0, None).with_context(EventContext::new().with_application("Excel")),
        ];
        assert_eq!(window_context(&events).application.as_deref(), Some("Excel"));
    }
}
