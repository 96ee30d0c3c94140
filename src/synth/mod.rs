//! Code synthesis
//!
//! A [`ProcessGraph`] is planned once ([`plan::build`]) and then rendered by the emitter
//! registered for the requested [`TargetFormat`]:
//! - `generic-web-automation`: Playwright TypeScript, or Selenium Python
//! - `generic-desktop-automation`: PyAutoGUI Python
//! - `documentation`: Markdown
//! - `diagram`: Mermaid flowchart
//!
//! Synthesis is a pure read of the graph. Nodes that cannot be rendered degrade to a
//! coordinate fallback or a placeholder comment and are reported in [`Artifact::warnings`].

pub mod desktop;
pub mod diagram;
pub mod emitter;
pub mod markdown;
pub mod plan;
mod script;
pub mod web;
pub mod writer;

pub use emitter::{EmitContext, Emitter, EmitterRegistry};
pub use plan::{Plan, PlanItem, Statement};

use crate::error::{CaptureError, Result};
use crate::graph::{ProcessGraph, SessionState};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TargetFormat {
    #[serde(rename = "generic-web-automation")]
    WebAutomation,
    #[serde(rename = "generic-desktop-automation")]
    DesktopAutomation,
    #[serde(rename = "documentation")]
    Documentation,
    #[serde(rename = "diagram")]
    Diagram,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 4] = [
        Self::WebAutomation,
        Self::DesktopAutomation,
        Self::Documentation,
        Self::Diagram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebAutomation => "generic-web-automation",
            Self::DesktopAutomation => "generic-desktop-automation",
            Self::Documentation => "documentation",
            Self::Diagram => "diagram",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == tag)
            .ok_or_else(|| CaptureError::UnsupportedFormat(s.to_string()))
    }
}

/// Automation library the web emitter targets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebDialect {
    /// TypeScript test using `@playwright/test`; shadow roots are pierced automatically
    #[default]
    Playwright,

    /// Python script using Selenium WebDriver; shadow roots are crossed explicitly
    Selenium,
}

/// Options for one export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesisOptions {
    pub web_dialect: WebDialect,

    /// Defaults to the graph name
    pub title: Option<String>,

    /// Overrides the session state stored in the graph metadata
    pub session_state: Option<SessionState>,
}

impl SynthesisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn web_dialect(mut self, dialect: WebDialect) -> Self {
        self.web_dialect = dialect;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn session_state(mut self, state: SessionState) -> Self {
        self.session_state = Some(state);
        self
    }
}

/// Generated text plus the warnings raised while producing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub format: TargetFormat,
    pub content: String,

    #[serde(default)]
    pub warnings: Vec<String>,

    /// Ids of the nodes the artifact was generated from
    #[serde(default)]
    pub node_ids: Vec<String>,
}

/// Plans a graph and hands it to the matching emitter
#[derive(Debug, Default)]
pub struct Synthesizer {
    registry: EmitterRegistry,
}

impl Synthesizer {
    pub fn new() -> Self {
        Self {
            registry: EmitterRegistry::with_defaults(),
        }
    }

    pub fn with_registry(registry: EmitterRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &EmitterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EmitterRegistry {
        &mut self.registry
    }

    /// Render `graph` as `format`
    pub fn synthesize(&self, graph: &ProcessGraph, format: TargetFormat, options: &SynthesisOptions) -> Result<Artifact> {
        let emitter = self
            .registry
            .get(format)
            .ok_or_else(|| CaptureError::UnsupportedFormat(format.to_string()))?;

        let plan = plan::build(graph, options);
        log::debug!(
            "Synthesizing {} from {} nodes ({} warnings)",
            format,
            plan.node_ids.len(),
            plan.warnings.len()
        );

        let content = emitter.emit(EmitContext {
            graph,
            plan: &plan,
            options,
        });

        Ok(Artifact {
            format,
            content,
            warnings: plan.warnings,
            node_ids: plan.node_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags() {
        assert_eq!(
            "generic-web-automation".parse::<TargetFormat>().unwrap(),
            TargetFormat::WebAutomation
        );
        assert_eq!(" Diagram ".parse::<TargetFormat>().unwrap(), TargetFormat::Diagram);
        assert!(matches!(
            "pdf".parse::<TargetFormat>(),
            Err(CaptureError::UnsupportedFormat(f)) if f == "pdf"
        ));
        assert_eq!(
            serde_json::to_string(&TargetFormat::DesktopAutomation).unwrap(),
            "\"generic-desktop-automation\""
        );
    }

    #[test]
    fn test_empty_graph_synthesizes() {
        let synthesizer = Synthesizer::new();
        let graph = ProcessGraph::new("Nothing yet");
        for format in TargetFormat::ALL {
            let artifact = synthesizer
                .synthesize(&graph, format, &SynthesisOptions::default())
                .unwrap();
            assert_eq!(artifact.format, format);
            assert!(artifact.warnings.is_empty());
            assert!(!artifact.content.is_empty());
        }
    }

    #[test]
    fn test_missing_emitter_is_unsupported() {
        let synthesizer = Synthesizer::with_registry(EmitterRegistry::new());
        let err = synthesizer
            .synthesize(&ProcessGraph::default(), TargetFormat::Diagram, &SynthesisOptions::default())
            .unwrap_err();
        assert!(matches!(err, CaptureError::UnsupportedFormat(_)));
    }
}
