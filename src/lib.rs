//! # process-capture
//!
//! A Rust library that turns recorded user interactions into runnable automation code.
//!
//! ## Features
//!
//! - **Event Normalization**: One typed event model for system hooks, browser workers and file/clipboard monitors
//! - **Selector Resolution**: Ranked locators that avoid framework-generated ids and classes, with shadow DOM paths
//! - **Step Segmentation**: Recording windows split into named sub-steps on pauses, navigations and submits
//! - **Process Graph**: Steps, decisions and loops in an id-indexed graph that persists to JSON
//! - **Code Synthesis**: Playwright/Selenium scripts, PyAutoGUI scripts, Markdown and Mermaid from one graph
//! - **MCP Server**: Model Context Protocol tools for driving a capture session
//!
//! ## MCP Server
//!
//! ```bash
//! # stdio transport
//! cargo run --features mcp-server --bin mcp-server
//!
//! # streamable HTTP on port 3000
//! cargo run --features mcp-server --bin mcp-server -- --transport http
//! ```
//!
//! ## Library Usage
//!
//! ```rust
//! use process_capture::{CaptureConfig, CaptureEngine, ElementSnapshot, Event};
//! use process_capture::{FinalizeMode, SynthesisOptions, TargetFormat};
//!
//! # fn main() -> process_capture::Result<()> {
//! let mut engine = CaptureEngine::new(CaptureConfig::default());
//! engine.begin_recording_window(Some("Create customer".to_string()))?;
//!
//! let name = ElementSnapshot::new("input").with_attribute("data-testid", "customer-name");
//! engine.ingest(Event::click(1_000, 120.0, 48.0, Some(name.clone())))?;
//! engine.ingest(Event::typed_text(1_400, "Acme Corp", Some(name)))?;
//! engine.finalize_recording_window(FinalizeMode::Quick)?;
//!
//! let script = engine.export_graph(TargetFormat::WebAutomation, &SynthesisOptions::default())?;
//! assert!(script.content.contains("customer-name"));
//! # Ok(())
//! # }
//! ```
//!
//! ### Concurrent Producers
//!
//! [`engine::intake`] puts a bounded queue in front of the engine. Event sources push
//! through a cloneable [`EngineHandle`]; a single task applies every event and command
//! in arrival order.
//!
//! ## Module Overview
//!
//! - [`event`]: Event model, normalization, chronological buffer, clipboard and file enrichment
//! - [`dom`]: Element snapshots and selector resolution
//! - [`segment`]: Sub-step segmentation and naming
//! - [`graph`]: Process graph, nodes, edges, patches and persistence
//! - [`synth`]: Synthesis planning and the per-format emitters
//! - [`engine`]: Recording windows, commands and the intake queue
//! - [`config`]: Capture configuration
//! - [`error`]: Error types and result aliases
//! - [`mcp`]: **Model Context Protocol server** (requires `mcp-handler` feature)

pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod event;
pub mod graph;
pub mod segment;
pub mod synth;

#[cfg(feature = "mcp-handler")]
pub mod mcp;

pub use config::CaptureConfig;
pub use dom::{resolve_selectors, ElementSnapshot, SelectorCandidate, SelectorResolver, SelectorSet, SelectorStrategy};
pub use engine::{CaptureEngine, EngineHandle, FinalizeMode, FinalizeOutcome, IngestOutcome};
pub use error::{CaptureError, Result};
pub use event::{Event, EventContext, EventPayload, Origin};
pub use graph::{Edge, EdgeKind, Node, NodeSpec, NodeType, ProcessGraph, SessionState};
pub use segment::{Segmenter, SubStep};
pub use synth::{Artifact, SynthesisOptions, Synthesizer, TargetFormat, WebDialect};

#[cfg(feature = "mcp-handler")]
pub use mcp::CaptureServer;
#[cfg(feature = "mcp-handler")]
pub use rmcp::ServiceExt;
