use crate::config::CaptureConfig;
use crate::engine::CaptureEngine;
use rmcp::{
    handler::server::router::tool::ToolRouter,
    model::{ServerCapabilities, ServerInfo},
    tool_handler, ErrorData as McpError, ServerHandler,
};
use std::sync::{Arc, Mutex, MutexGuard};

/// MCP server wrapping one capture engine
///
/// Clones share the engine, so every connection of a multi-session transport sees the
/// same graph.
#[derive(Clone)]
pub struct CaptureServer {
    engine: Arc<Mutex<CaptureEngine>>,
    tool_router: ToolRouter<Self>,
}

impl Default for CaptureServer {
    fn default() -> Self {
        Self::new(CaptureConfig::default())
    }
}

impl CaptureServer {
    pub fn new(config: CaptureConfig) -> Self {
        Self::with_engine(CaptureEngine::new(config))
    }

    pub fn with_engine(engine: CaptureEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            tool_router: Self::tool_router(),
        }
    }

    /// Lock the engine for one command
    pub(crate) fn engine(&self) -> Result<MutexGuard<'_, CaptureEngine>, McpError> {
        self.engine
            .lock()
            .map_err(|_| McpError::internal_error("Capture engine lock poisoned", None))
    }
}

impl std::fmt::Debug for CaptureServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureServer").finish_non_exhaustive()
    }
}

#[tool_handler]
impl ServerHandler for CaptureServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Records user interactions into a process graph and turns it into automation \
                 scripts, documentation or diagrams. Open a recording window, ingest events, \
                 finalize the window to create a step, then export."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
