use crate::graph::ProcessGraph;
use crate::synth::desktop::DesktopEmitter;
use crate::synth::diagram::DiagramEmitter;
use crate::synth::markdown::MarkdownEmitter;
use crate::synth::plan::Plan;
use crate::synth::web::WebEmitter;
use crate::synth::{SynthesisOptions, TargetFormat};
use indexmap::IndexMap;

/// Inputs shared by every emitter
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub graph: &'a ProcessGraph,
    pub plan: &'a Plan,
    pub options: &'a SynthesisOptions,
}

/// Renders a [`Plan`] into one target format
pub trait Emitter: Send + Sync {
    fn format(&self) -> TargetFormat;

    /// One-line description shown by `formats` listings
    fn description(&self) -> &str;

    fn emit(&self, context: EmitContext<'_>) -> String;
}

/// Emitters keyed by target format
pub struct EmitterRegistry {
    emitters: IndexMap<TargetFormat, Box<dyn Emitter>>,
}

impl EmitterRegistry {
    pub fn new() -> Self {
        Self {
            emitters: IndexMap::new(),
        }
    }

    /// Registry with the web, desktop, documentation and diagram emitters
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(WebEmitter);
        registry.register(DesktopEmitter);
        registry.register(MarkdownEmitter);
        registry.register(DiagramEmitter);
        registry
    }

    /// Register an emitter, replacing any previous one for the same format
    pub fn register<E: Emitter + 'static>(&mut self, emitter: E) {
        self.emitters.insert(emitter.format(), Box::new(emitter));
    }

    pub fn get(&self, format: TargetFormat) -> Option<&dyn Emitter> {
        self.emitters.get(&format).map(|e| e.as_ref())
    }

    pub fn has(&self, format: TargetFormat) -> bool {
        self.emitters.contains_key(&format)
    }

    pub fn formats(&self) -> impl Iterator<Item = TargetFormat> + '_ {
        self.emitters.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }
}

impl Default for EmitterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for EmitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterRegistry")
            .field("formats", &self.emitters.keys().collect::<Vec<_>>())
            .finish()
    }
}
