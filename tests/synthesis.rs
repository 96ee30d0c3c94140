use process_capture::graph::{ActionKind, Branch, NodeAction, NodeState, SessionMetadata};
use process_capture::{
    CaptureConfig, CaptureEngine, EdgeKind, ElementSnapshot, Event, FinalizeMode, NodeSpec, NodeType, ProcessGraph,
    SessionState, SynthesisOptions, Synthesizer, TargetFormat, WebDialect,
};
use std::io::Write;

fn navigate(id: &str, url: &str) -> NodeSpec {
    NodeSpec::new(
        NodeType::Action,
        NodeAction::new(ActionKind::Navigate, format!("Open {}", id)).with_value(url),
    )
    .with_id(id)
}

/// A -> B -> C -> D, where D branches to E (yes) and F (no)
fn branching_graph() -> ProcessGraph {
    let mut graph = ProcessGraph::new("Refund request");
    for id in ["a", "b", "c"] {
        graph
            .create_node(navigate(id, &format!("https://{}.example.com", id)))
            .expect("Failed to create node");
    }
    graph
        .create_node(
            NodeSpec::decision("Refund approved?")
                .with_id("d")
                .with_branch(Branch::new("yes", "Approved"))
                .with_branch(Branch::new("no", "Rejected")),
        )
        .expect("Failed to create decision");
    for id in ["e", "f"] {
        graph
            .create_node(navigate(id, &format!("https://{}.example.com", id)))
            .expect("Failed to create node");
    }
    graph.add_edge("a", "b", EdgeKind::Normal, None).expect("a -> b");
    graph.add_edge("b", "c", EdgeKind::Normal, None).expect("b -> c");
    graph.add_edge("c", "d", EdgeKind::Normal, None).expect("c -> d");
    graph.add_edge("d", "e", EdgeKind::Branch, Some("yes".to_string())).expect("d -> e");
    graph.add_edge("d", "f", EdgeKind::Branch, Some("no".to_string())).expect("d -> f");
    graph
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing {:?} in:\n{}", needle, haystack))
}

#[test]
fn test_playwright_nests_branches_after_linear_steps() {
    let graph = branching_graph();
    let artifact = Synthesizer::new()
        .synthesize(&graph, TargetFormat::WebAutomation, &SynthesisOptions::default())
        .expect("Failed to synthesize");
    let out = &artifact.content;

    let a = position(out, "page.goto(\"https://a.example.com\")");
    let b = position(out, "page.goto(\"https://b.example.com\")");
    let c = position(out, "page.goto(\"https://c.example.com\")");
    let yes = position(out, "if (branch4 === \"yes\") {");
    let no = position(out, "} else if (branch4 === \"no\") {");
    let e = position(out, "    await page.goto(\"https://e.example.com\");");
    let f = position(out, "    await page.goto(\"https://f.example.com\");");

    assert!(a < b && b < c && c < yes);
    assert!(yes < e && e < no);
    assert!(no < f);
    assert_eq!(out.matches("page.goto(\"https://e.example.com\")").count(), 1);
    assert!(artifact.warnings.is_empty());
}

#[test]
fn test_selenium_nests_branches_after_linear_steps() {
    let graph = branching_graph();
    let options = SynthesisOptions::default().web_dialect(WebDialect::Selenium);
    let out = Synthesizer::new()
        .synthesize(&graph, TargetFormat::WebAutomation, &options)
        .expect("Failed to synthesize")
        .content;

    let c = position(out.as_str(), "driver.get(\"https://c.example.com\")");
    let yes = position(&out, "    if branch_4 == \"yes\":\n");
    let e = position(&out, "        driver.get(\"https://e.example.com\")\n");
    let no = position(&out, "    elif branch_4 == \"no\":\n");
    let f = position(&out, "        driver.get(\"https://f.example.com\")\n");
    assert!(c < yes && yes < e && e < no && no < f);
}

#[test]
fn test_every_format_renders_the_same_graph() {
    let graph = branching_graph();
    let synthesizer = Synthesizer::new();
    for format in TargetFormat::ALL {
        let artifact = synthesizer
            .synthesize(&graph, format, &SynthesisOptions::default())
            .expect("Failed to synthesize");
        assert_eq!(artifact.format, format);
        assert!(!artifact.content.is_empty());
        assert_eq!(artifact.node_ids.len(), 6, "{}", format);
    }

    let diagram = synthesizer
        .synthesize(&graph, TargetFormat::Diagram, &SynthesisOptions::default())
        .expect("Failed to synthesize")
        .content;
    assert!(diagram.contains("n4 -->|Approved| n5"));
    assert!(diagram.contains("n4 -->|Rejected| n6"));
}

#[test]
fn test_cycles_terminate() {
    let mut graph = branching_graph();
    graph.add_edge("e", "a", EdgeKind::Loop, None).expect("loop edge");
    graph.add_edge("f", "f", EdgeKind::Loop, None).expect("self loop");

    let out = Synthesizer::new()
        .synthesize(&graph, TargetFormat::Documentation, &SynthesisOptions::default())
        .expect("Failed to synthesize")
        .content;
    assert!(out.contains("_Continues at step 1: Open a_"));
    assert_eq!(out.matches("### Step 1: Open a").count(), 1);
}

#[test]
fn test_session_state_skips_sign_in() {
    let mut graph = ProcessGraph::new("Check orders");
    graph
        .create_node(navigate("login", "https://shop.example.com/login").session_setup(true))
        .expect("Failed to create node");
    graph
        .create_node(navigate("orders", "https://shop.example.com/orders"))
        .expect("Failed to create node");
    graph.add_edge("login", "orders", EdgeKind::Normal, None).expect("edge");

    let state: SessionState = serde_json::from_value(serde_json::json!({
        "cookies": [{"name": "sid", "value": "abc", "domain": "shop.example.com", "path": "/"}],
        "origins": [],
        "metadata": {"capturedAt": "2026-10-16T09:00:00Z", "domain": "shop.example.com"}
    }))
    .expect("Failed to parse session state");
    assert_eq!(
        state.metadata,
        SessionMetadata {
            captured_at: Some("2026-10-16T09:00:00Z".to_string()),
            url: None,
            domain: Some("shop.example.com".to_string()),
        }
    );
    let options = SynthesisOptions::default().session_state(state);

    let playwright = Synthesizer::new()
        .synthesize(&graph, TargetFormat::WebAutomation, &options)
        .expect("Failed to synthesize")
        .content;
    assert!(playwright.contains("test.use({ storageState:"));
    assert!(!playwright.contains("page.goto(\"https://shop.example.com/login\")"));
    assert!(playwright.contains("page.goto(\"https://shop.example.com/orders\")"));

    let selenium = Synthesizer::new()
        .synthesize(&graph, TargetFormat::WebAutomation, &options.clone().web_dialect(WebDialect::Selenium))
        .expect("Failed to synthesize")
        .content;
    assert!(selenium.contains("def restore_session(driver):"));
    assert!(selenium.contains("SESSION_URL = \"https://shop.example.com\""));
}

#[test]
fn test_weak_selectors_and_missing_targets_only_warn() {
    let mut engine = CaptureEngine::new(CaptureConfig::default());
    engine.begin_recording_window(Some("Click canvas".to_string())).expect("Failed to open window");
    let canvas = ElementSnapshot::new("canvas").with_bounding_box(0.0, 0.0, 400.0, 300.0);
    engine
        .ingest(Event::click(5, 200.0, 150.0, Some(canvas)))
        .expect("Failed to ingest");
    engine
        .finalize_recording_window(FinalizeMode::Quick)
        .expect("Failed to finalize");
    engine
        .add_node(NodeSpec::action(ActionKind::Click, "Press the blue button"))
        .expect("Failed to add node");

    let artifact = engine
        .export_graph(TargetFormat::WebAutomation, &SynthesisOptions::default())
        .expect("Failed to export");
    assert!(artifact.content.contains("// WARNING:"));
    assert!(artifact.warnings[0].contains("xpath"));
    assert!(artifact.content.contains("Manual step 2: Press the blue button"));
    assert_eq!(artifact.warnings.len(), 2);

    // Export still completes and flags every node
    assert!(engine.graph().nodes().all(|n| n.state == NodeState::Exported));
}

#[test]
fn test_config_file_drives_segmentation() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, r#"{{"pauseThresholdMs": 500, "windowDurationMs": 60000}}"#).expect("Failed to write config");

    let config = CaptureConfig::from_file(file.path()).expect("Failed to load config");
    assert_eq!(config.pause_threshold_ms, 500);
    assert_eq!(config.window_duration_ms, 60_000);
    assert_eq!(config.intake_capacity, CaptureConfig::default().intake_capacity);

    let mut engine = CaptureEngine::new(config);
    engine.begin_recording_window(None).expect("Failed to open window");
    engine.ingest(Event::click(0, 1.0, 1.0, None)).expect("Failed to ingest");
    engine.ingest(Event::click(1_000, 1.0, 1.0, None)).expect("Failed to ingest");
    let outcome = engine
        .finalize_recording_window(FinalizeMode::Quick)
        .expect("Failed to finalize");
    let node_id = outcome.node_id().expect("node created").to_string();
    assert_eq!(engine.graph().node(&node_id).expect("node").sub_steps.len(), 2);
}
