//! Bounded intake queue in front of the engine
//!
//! Producers never touch the graph. They hold an [`EngineHandle`] and send raw events or
//! commands over one bounded channel; [`run_engine`] consumes it in arrival order on a
//! single task, so every mutation is serialized without locks.

use crate::engine::{CaptureEngine, FinalizeMode, FinalizeOutcome, IngestOutcome};
use crate::error::{CaptureError, Result};
use crate::event::Origin;
use crate::graph::metadata::now_ms;
use crate::graph::{Node, ProcessGraph};
use crate::synth::{Artifact, SynthesisOptions, TargetFormat};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Message consumed by [`run_engine`]
#[derive(Debug)]
pub enum Command {
    /// Raw event; `reply` is `None` for fire-and-forget producers
    Ingest {
        raw: Value,
        reply: Option<Reply<IngestOutcome>>,
    },
    BeginWindow {
        intent: Option<String>,
        reply: Reply<()>,
    },
    FinalizeWindow {
        mode: FinalizeMode,
        reply: Reply<FinalizeOutcome>,
    },
    CancelWindow {
        reply: Reply<usize>,
    },
    Tick {
        now_ms: u64,
        reply: Reply<Option<FinalizeOutcome>>,
    },
    MarkNode {
        id: String,
        important: bool,
        reply: Reply<Node>,
    },
    Export {
        format: TargetFormat,
        options: SynthesisOptions,
        reply: Reply<Artifact>,
    },
    Snapshot {
        reply: oneshot::Sender<ProcessGraph>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable client of a running engine
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Queue a raw event without waiting for its outcome
    ///
    /// Waits for queue capacity when the engine falls behind.
    pub async fn push_event(&self, raw: Value) -> Result<()> {
        self.tx
            .send(Command::Ingest { raw, reply: None })
            .await
            .map_err(|_| CaptureError::ChannelClosed)
    }

    pub async fn ingest(&self, raw: Value) -> Result<IngestOutcome> {
        self.request(|reply| Command::Ingest {
            raw,
            reply: Some(reply),
        })
        .await
    }

    pub async fn begin_recording_window(&self, intent: Option<String>) -> Result<()> {
        self.request(|reply| Command::BeginWindow { intent, reply }).await
    }

    pub async fn finalize_recording_window(&self, mode: FinalizeMode) -> Result<FinalizeOutcome> {
        self.request(|reply| Command::FinalizeWindow { mode, reply }).await
    }

    pub async fn cancel_recording_window(&self) -> Result<usize> {
        self.request(|reply| Command::CancelWindow { reply }).await
    }

    pub async fn tick(&self, now_ms: u64) -> Result<Option<FinalizeOutcome>> {
        self.request(|reply| Command::Tick { now_ms, reply }).await
    }

    pub async fn mark_node(&self, id: impl Into<String>, important: bool) -> Result<Node> {
        let id = id.into();
        self.request(|reply| Command::MarkNode { id, important, reply }).await
    }

    pub async fn export_graph(&self, format: TargetFormat, options: SynthesisOptions) -> Result<Artifact> {
        self.request(|reply| Command::Export { format, options, reply }).await
    }

    /// Copy of the graph as of this call
    pub async fn graph(&self) -> Result<ProcessGraph> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot { reply }).await?;
        rx.await.map_err(|_| CaptureError::ChannelClosed)
    }

    pub async fn clear_graph(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Clear { reply }).await?;
        rx.await.map_err(|_| CaptureError::ChannelClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| CaptureError::ChannelClosed)
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| CaptureError::ChannelClosed)?
    }
}

/// Bounded command channel; a capacity of 0 is raised to 1
pub fn channel(capacity: usize) -> (EngineHandle, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EngineHandle { tx }, rx)
}

/// Consume commands until every handle is dropped, then give the engine back
pub async fn run_engine(mut engine: CaptureEngine, mut rx: mpsc::Receiver<Command>) -> CaptureEngine {
    log::debug!("Engine loop started");
    while let Some(command) = rx.recv().await {
        match command {
            Command::Ingest { raw, reply } => {
                let outcome = engine.ingest_event(&raw);
                match reply {
                    Some(reply) => {
                        let _ = reply.send(outcome);
                    }
                    None => {
                        if let Err(err) = outcome {
                            log::warn!("Failed to record event: {}", err);
                        }
                    }
                }
            }
            Command::BeginWindow { intent, reply } => {
                let _ = reply.send(engine.begin_recording_window(intent));
            }
            Command::FinalizeWindow { mode, reply } => {
                let _ = reply.send(engine.finalize_recording_window(mode));
            }
            Command::CancelWindow { reply } => {
                let _ = reply.send(engine.cancel_recording_window());
            }
            Command::Tick { now_ms, reply } => {
                let _ = reply.send(engine.tick(now_ms));
            }
            Command::MarkNode { id, important, reply } => {
                let _ = reply.send(engine.mark_node(&id, important));
            }
            Command::Export { format, options, reply } => {
                let _ = reply.send(engine.export_graph(format, &options));
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(engine.graph().clone());
            }
            Command::Clear { reply } => {
                engine.clear_graph();
                let _ = reply.send(());
            }
        }
    }
    log::debug!("Engine loop stopped: all handles dropped");
    engine
}

/// Run `engine` on its own task with a queue of `intake_capacity`
pub fn spawn_engine(engine: CaptureEngine) -> (EngineHandle, JoinHandle<CaptureEngine>) {
    let (handle, rx) = channel(engine.config().intake_capacity);
    let task = tokio::spawn(run_engine(engine, rx));
    (handle, task)
}

/// Send wall-clock ticks so open windows time out without further events
///
/// Stops when the engine is gone.
pub fn spawn_ticker(handle: EngineHandle, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match handle.tick(now_ms()).await {
                Ok(Some(outcome)) => log::debug!("Tick finalized window: {:?}", outcome.node_id()),
                Ok(None) => {}
                Err(CaptureError::ChannelClosed) => break,
                Err(err) => log::warn!("Tick failed: {}", err),
            }
        }
    })
}

/// Producer of raw intake objects
#[async_trait]
pub trait EventSource: Send {
    /// Origin stamped on events that do not carry one
    fn origin(&self) -> Origin;

    /// Next raw event; `None` once the source is exhausted
    async fn next_event(&mut self) -> Result<Option<Value>>;
}

/// Set `origin` on a raw event object that lacks one
pub fn stamp_origin(raw: &mut Value, origin: Origin) {
    if let Some(object) = raw.as_object_mut() {
        object
            .entry("origin")
            .or_insert_with(|| Value::String(origin.to_string()));
    }
}

/// Forward every event of `source` to the engine; returns how many were sent
pub async fn pump<S: EventSource + ?Sized>(source: &mut S, handle: &EngineHandle) -> Result<usize> {
    let origin = source.origin();
    let mut sent = 0;
    while let Some(mut raw) = source.next_event().await? {
        stamp_origin(&mut raw, origin);
        handle.push_event(raw).await?;
        sent += 1;
    }
    log::debug!("{} source exhausted after {} event(s)", origin, sent);
    Ok(sent)
}

/// Newline-delimited JSON events, e.g. from a capture helper's stdout or a log file
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    origin: Origin,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R, origin: Origin) -> Self {
        Self {
            lines: reader.lines(),
            origin,
            line_number: 0,
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for JsonLinesSource<R> {
    fn origin(&self) -> Origin {
        self.origin
    }

    /// Blank lines are skipped; lines that are not JSON are logged and skipped
    async fn next_event(&mut self) -> Result<Option<Value>> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => log::warn!("Skipping line {}: {}", self.line_number, err),
            }
        }
        Ok(None)
    }
}
