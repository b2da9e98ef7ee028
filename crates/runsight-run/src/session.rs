// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run session lifecycle
//!
//! A [`RunSession`] owns everything one supervised run needs: the ephemeral
//! TCP listener the producer connects back to, the spawned producer
//! process, and the shared [`RunState`] holding both tree builders and the
//! summary tracker. There is no ambient global state; a session is created
//! for a run and dropped after it.
//!
//! Both transports (socket reads, subprocess stdout reads) forward into a
//! single mpsc feed channel consumed by one processor task, so every
//! mutation of the builders is serialized regardless of how the transports
//! interleave. Each decoded record is processed to completion before the
//! next is taken off the channel.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use runsight_events::framing::{JsonFrameDecoder, LineDecoder, decode_events};
use runsight_events::{MonitorEvent, MonitorLine, RunnerEvent, parse_monitor_line};
use runsight_tree::{BuilderOptions, SummaryTracker, TreeBuilder};

/// Errors from the run-session layer
#[derive(Debug, Error)]
pub enum RunError {
    /// Transport or spawn failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `wait` called with no spawned producer
    #[error("No producer process was spawned for this session")]
    NoProcess,

    /// A second producer spawn on the same session
    #[error("Session already has a producer process")]
    AlreadySpawned,
}

/// Environment variable carrying the event port to the producer
pub const PORT_ENV_VAR: &str = "RUNSIGHT_EVENTS_PORT";

/// Listener for passthrough stdout lines (non-marker producer output)
pub type OutputCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Tunables for one session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Marker prefixing monitor event lines on stdout
    pub marker: String,
    /// Window to wait for the first event before abandoning the run
    pub first_event_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            marker: runsight_events::DEFAULT_MARKER.to_string(),
            first_event_timeout: Duration::from_secs(30),
        }
    }
}

/// Everything the builders accumulate for one run
pub struct RunState {
    /// Execution-tree view (top-level only, no HTTP correlation)
    pub executions: TreeBuilder,
    /// Network-log view (full depth, HTTP correlation)
    pub network: TreeBuilder,
    /// Pass/fail aggregate from the stdout monitor protocol
    pub summary: SummaryTracker,
}

impl RunState {
    fn new() -> Self {
        Self {
            executions: TreeBuilder::new(BuilderOptions::executions()),
            network: TreeBuilder::new(BuilderOptions::network_logs()),
            summary: SummaryTracker::new(),
        }
    }

    /// Discard all accumulated state (explicit external clear)
    pub fn clear(&mut self) {
        self.executions.clear();
        self.network.clear();
        self.summary.clear();
    }
}

/// One decoded record from either transport
enum Feed {
    Runner(RunnerEvent),
    Monitor(MonitorEvent),
    Output(String),
    /// Drain barrier: acknowledged once everything queued before it has
    /// been applied
    Flush(oneshot::Sender<()>),
}

/// One supervised run: listener, producer process and shared state
pub struct RunSession {
    id: Uuid,
    port: u16,
    started_at: DateTime<Utc>,
    state: Arc<Mutex<RunState>>,
    outputs: Arc<Mutex<Vec<OutputCallback>>>,
    feed_tx: mpsc::Sender<Feed>,
    options: SessionOptions,
    child: Option<Child>,
    stdout_task: Option<JoinHandle<()>>,
}

impl RunSession {
    /// Bind the event listener and start the processor task
    ///
    /// The OS assigns the port (bind to port 0, read it back); the producer
    /// is told about it through [`PORT_ENV_VAR`] when spawned.
    ///
    /// # Errors
    ///
    /// Returns `RunError::Io` if the listener cannot be bound.
    pub async fn bind(options: SessionOptions) -> Result<Self, RunError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let id = Uuid::new_v4();

        let state = Arc::new(Mutex::new(RunState::new()));
        let outputs: Arc<Mutex<Vec<OutputCallback>>> = Arc::new(Mutex::new(Vec::new()));
        let (feed_tx, feed_rx) = mpsc::channel::<Feed>(256);

        tokio::spawn(accept_events(listener, feed_tx.clone()));
        tokio::spawn(process_feed(
            feed_rx,
            Arc::clone(&state),
            Arc::clone(&outputs),
            options.first_event_timeout,
        ));

        info!(session = %id, port, "run session bound");
        Ok(Self {
            id,
            port,
            started_at: Utc::now(),
            state,
            outputs,
            feed_tx,
            options,
            child: None,
            stdout_task: None,
        })
    }

    /// Session id
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// OS-assigned event port
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// When this session was bound
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Register a listener for passthrough stdout lines
    pub fn subscribe_output(&self, listener: OutputCallback) {
        lock(&self.outputs).push(listener);
    }

    /// Query the shared run state
    pub fn with_state<R>(&self, f: impl FnOnce(&RunState) -> R) -> R {
        f(&lock(&self.state))
    }

    /// Mutate the shared run state (e.g. to register tree listeners)
    pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut RunState) -> R) -> R {
        f(&mut lock(&self.state))
    }

    /// Discard accumulated state; an explicit external operation, never
    /// inferred from stream end
    pub fn clear(&self) {
        lock(&self.state).clear();
    }

    /// Spawn the producer process and start consuming its stdout
    ///
    /// # Errors
    ///
    /// Returns `RunError::AlreadySpawned` on a second call or
    /// `RunError::Io` if the process cannot be started.
    pub fn spawn(&mut self, program: &str, args: &[String]) -> Result<(), RunError> {
        if self.child.is_some() {
            return Err(RunError::AlreadySpawned);
        }
        let mut child = Command::new(program)
            .args(args)
            .env(PORT_ENV_VAR, self.port.to_string())
            .stdout(std::process::Stdio::piped())
            .spawn()?;

        lock(&self.state).summary.start();

        if let Some(stdout) = child.stdout.take() {
            self.stdout_task = Some(tokio::spawn(read_stdout(
                stdout,
                self.options.marker.clone(),
                self.feed_tx.clone(),
            )));
        }
        info!(session = %self.id, program, "producer spawned");
        self.child = Some(child);
        Ok(())
    }

    /// Wait for the producer to exit and its output to be fully applied
    ///
    /// Child exit alone does not mean the run state is final: buffered
    /// stdout and queued feed records may still be in flight. This waits
    /// for the stdout reader to drain to EOF, then pushes a barrier through
    /// the feed channel and waits for its acknowledgement, so every record
    /// emitted before exit is applied before the state is read.
    ///
    /// A missing terminal event is not an error here: the builders simply
    /// stop receiving and partial state stays queryable.
    ///
    /// # Errors
    ///
    /// Returns `RunError::NoProcess` if nothing was spawned, or
    /// `RunError::Io` if waiting fails.
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus, RunError> {
        let Some(mut child) = self.child.take() else {
            return Err(RunError::NoProcess);
        };
        let status = child.wait().await?;
        if let Some(task) = self.stdout_task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "stdout reader task failed");
            }
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.feed_tx.send(Feed::Flush(ack_tx)).await.is_ok() {
            // Fails only if the processor stopped; nothing left to drain.
            let _ = ack_rx.await;
        }
        debug!(session = %self.id, ?status, "producer exited, feed drained");
        Ok(status)
    }
}

/// Lock a mutex, recovering the data from a poisoned lock
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Accept one producer connection and decode its event stream
async fn accept_events(listener: TcpListener, feed: mpsc::Sender<Feed>) {
    let (mut socket, peer) = match listener.accept().await {
        Ok(accepted) => accepted,
        Err(err) => {
            warn!(error = %err, "event listener accept failed");
            return;
        }
    };
    debug!(%peer, "producer connected to event socket");

    let mut decoder = JsonFrameDecoder::new();
    let mut buf = [0u8; 8192];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for event in decode_events(&decoder.push(&buf[..n])) {
                    if feed.send(Feed::Runner(event)).await.is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                // Surfaced here only; the builders just stop receiving.
                warn!(error = %err, "event socket read failed");
                break;
            }
        }
    }
    debug!("event socket closed");
}

/// Decode subprocess stdout: marker lines become monitor events, the rest
/// passes through verbatim
async fn read_stdout(
    mut stdout: tokio::process::ChildStdout,
    marker: String,
    feed: mpsc::Sender<Feed>,
) {
    let mut decoder = LineDecoder::new();
    let mut buf = [0u8; 8192];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in decoder.push(&buf[..n]) {
                    if forward_line(&line, &marker, &feed).await.is_err() {
                        return;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "producer stdout read failed");
                break;
            }
        }
    }
    if let Some(rest) = decoder.finish() {
        let _ = forward_line(&rest, &marker, &feed).await;
    }
}

async fn forward_line(
    line: &str,
    marker: &str,
    feed: &mpsc::Sender<Feed>,
) -> Result<(), mpsc::error::SendError<Feed>> {
    match parse_monitor_line(line, marker) {
        Ok(MonitorLine::Event(event)) => feed.send(Feed::Monitor(event)).await,
        Ok(MonitorLine::Output(text)) => feed.send(Feed::Output(text)).await,
        Err(err) => {
            // Not a decodable event, so it is output like any other line.
            warn!(error = %err, "marker line did not decode, passing through");
            feed.send(Feed::Output(line.to_string())).await
        }
    }
}

/// Single-writer processor: applies every record to completion before the
/// next, abandoning the run if nothing arrives in the first-event window
async fn process_feed(
    mut feed: mpsc::Receiver<Feed>,
    state: Arc<Mutex<RunState>>,
    outputs: Arc<Mutex<Vec<OutputCallback>>>,
    first_event_timeout: Duration,
) {
    let first = match tokio::time::timeout(first_event_timeout, feed.recv()).await {
        Ok(Some(item)) => item,
        Ok(None) => return,
        Err(_) => {
            warn!("no events within the first-event window, abandoning run");
            lock(&state).clear();
            return;
        }
    };
    apply_feed(first, &state, &outputs);
    while let Some(item) = feed.recv().await {
        apply_feed(item, &state, &outputs);
    }
}

fn apply_feed(item: Feed, state: &Mutex<RunState>, outputs: &Mutex<Vec<OutputCallback>>) {
    match item {
        Feed::Runner(event) => {
            let mut state = lock(state);
            state.executions.apply(&event);
            state.network.apply(&event);
        }
        Feed::Monitor(event) => lock(state).summary.apply(&event),
        Feed::Output(line) => {
            for listener in lock(outputs).iter() {
                listener(&line);
            }
        }
        Feed::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}
