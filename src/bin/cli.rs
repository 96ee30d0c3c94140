//! Process-capture command line
//!
//! Records newline-delimited JSON events into a persisted process graph, exports graphs
//! as scripts, documentation or diagrams, and ranks selectors for element snapshots.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use process_capture::engine::intake::{pump, spawn_engine};
use process_capture::engine::{FinalizeMode, JsonLinesSource};
use process_capture::event::Origin;
use process_capture::synth::{SynthesisOptions, TargetFormat, WebDialect};
use process_capture::{CaptureConfig, CaptureEngine, ElementSnapshot, ProcessGraph, resolve_selectors};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, BufReader};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceOrigin {
    System,
    Browser,
    Auxiliary,
}

impl From<SourceOrigin> for Origin {
    fn from(origin: SourceOrigin) -> Self {
        match origin {
            SourceOrigin::System => Origin::System,
            SourceOrigin::Browser => Origin::Browser,
            SourceOrigin::Auxiliary => Origin::Auxiliary,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dialect {
    Playwright,
    Selenium,
}

#[derive(Parser)]
#[command(name = "process-capture")]
#[command(version)]
#[command(about = "Turn captured interaction events into automation code", long_about = None)]
struct Cli {
    /// JSON capture configuration (thresholds, filters)
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record a JSON-lines event stream into a process graph
    Record {
        /// Event file, or - for stdin
        #[arg(value_name = "EVENTS")]
        input: PathBuf,

        /// Where to write the graph document
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,

        /// Existing graph to append to
        #[arg(long, value_name = "FILE")]
        graph: Option<PathBuf>,

        /// Description of what the events do
        #[arg(long)]
        intent: Option<String>,

        /// Origin for events that do not name one
        #[arg(long, value_enum, default_value = "browser")]
        origin: SourceOrigin,
    },
    /// Generate an artifact from a graph document
    Export {
        #[arg(value_name = "GRAPH")]
        graph: PathBuf,

        /// generic-web-automation, generic-desktop-automation, documentation or diagram
        #[arg(long, short = 'f')]
        format: String,

        /// Web automation flavour
        #[arg(long, value_enum, default_value = "playwright")]
        dialect: Dialect,

        #[arg(long)]
        title: Option<String>,

        /// Write here instead of stdout
        #[arg(long, short = 'o', value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Print the ranked selectors of an element snapshot
    Resolve {
        /// Snapshot file, or - for stdin
        #[arg(value_name = "ELEMENT")]
        element: PathBuf,
    },
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn load_config(path: Option<&Path>) -> Result<CaptureConfig> {
    match path {
        Some(path) => CaptureConfig::from_file(path).with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CaptureConfig::default()),
    }
}

fn load_graph(path: &Path) -> Result<ProcessGraph> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    ProcessGraph::from_json(&json).with_context(|| format!("Invalid graph document {}", path.display()))
}

/// Pump one event stream through the engine; windows roll over on the soft timeout
async fn record<R>(
    reader: R,
    origin: Origin,
    config: CaptureConfig,
    graph: Option<ProcessGraph>,
    intent: Option<String>,
) -> Result<ProcessGraph>
where
    R: AsyncBufRead + Unpin + Send,
{
    let mut engine = CaptureEngine::new(config.continuous(true));
    if let Some(graph) = graph {
        engine = engine.with_graph(graph);
    }

    let (handle, task) = spawn_engine(engine);
    handle.begin_recording_window(intent).await?;

    let mut source = JsonLinesSource::new(reader, origin);
    let sent = pump(&mut source, &handle).await?;
    handle.finalize_recording_window(FinalizeMode::Quick).await?;
    log::info!("Recorded {} event(s)", sent);

    drop(handle);
    let engine = task.await.context("Engine task failed")?;
    Ok(engine.into_graph())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Record {
            input,
            output,
            graph,
            intent,
            origin,
        } => {
            let existing = graph.as_deref().map(load_graph).transpose()?;
            let graph = if is_stdin(&input) {
                record(BufReader::new(tokio::io::stdin()), origin.into(), config, existing, intent).await?
            } else {
                let file = tokio::fs::File::open(&input)
                    .await
                    .with_context(|| format!("Failed to open {}", input.display()))?;
                record(BufReader::new(file), origin.into(), config, existing, intent).await?
            };

            std::fs::write(&output, graph.to_json()?)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            eprintln!("Wrote {} step(s) to {}", graph.len(), output.display());
        }
        Command::Export {
            graph,
            format,
            dialect,
            title,
            output,
        } => {
            let format: TargetFormat = format.parse()?;
            let mut options = SynthesisOptions::default().web_dialect(match dialect {
                Dialect::Playwright => WebDialect::Playwright,
                Dialect::Selenium => WebDialect::Selenium,
            });
            if let Some(title) = title {
                options = options.title(title);
            }

            let mut engine = CaptureEngine::new(config).with_graph(load_graph(&graph)?);
            let artifact = engine.export_graph(format, &options)?;
            for warning in &artifact.warnings {
                eprintln!("warning: {}", warning);
            }
            match output {
                Some(path) => {
                    std::fs::write(&path, &artifact.content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    eprintln!("Wrote {} to {}", format, path.display());
                }
                None => print!("{}", artifact.content),
            }
        }
        Command::Resolve { element } => {
            let json = if is_stdin(&element) {
                std::io::read_to_string(std::io::stdin())?
            } else {
                std::fs::read_to_string(&element).with_context(|| format!("Failed to read {}", element.display()))?
            };
            let snapshot: ElementSnapshot = serde_json::from_str(&json).context("Invalid element snapshot")?;
            if snapshot.tag.is_empty() {
                bail!("Element snapshot needs a tag");
            }
            println!("{}", serde_json::to_string_pretty(&resolve_selectors(&snapshot))?);
        }
    }

    Ok(())
}
