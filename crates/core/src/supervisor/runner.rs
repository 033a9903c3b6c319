//! Spawns and supervises the engine for one conversion at a time.

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Instant as StdInstant, SystemTime};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep_until, timeout, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::handle::ConversionHandle;
use super::progress::ProgressParser;
use super::tail::DiagnosticTail;
use super::types::{ConversionEvent, ConversionProgress, ConversionState, FailureKind, StartError};
use crate::config::EngineConfig;
use crate::metrics;
use crate::transcode::{build_transcode_args, TranscodeSpec};

/// How long to keep reading buffered output after the engine has exited.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs at most one conversion at a time. A start request while a run is
/// active is rejected with [`StartError::Busy`], never queued.
///
/// The slot is the state channel of the latest run: it is free once that run
/// has published a terminal state, so at most one handle is ever non-terminal.
#[derive(Clone)]
pub struct ConversionSupervisor {
    config: Arc<EngineConfig>,
    active: Arc<Mutex<Option<watch::Receiver<ConversionState>>>>,
}

impl ConversionSupervisor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
            active: Arc::new(Mutex::new(None)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<watch::Receiver<ConversionState>>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a run currently holds the active slot.
    pub fn is_busy(&self) -> bool {
        self.slot().as_ref().is_some_and(run_in_flight)
    }

    /// Starts a run with its own cancellation token.
    pub fn start(&self, spec: TranscodeSpec) -> Result<ConversionHandle, StartError> {
        self.start_with_cancel(spec, CancellationToken::new())
    }

    /// Starts a run observing `cancel`. Cancelling the token (or calling
    /// [`ConversionHandle::cancel`]) stops the engine gracefully, then by force.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with_cancel(
        &self,
        spec: TranscodeSpec,
        cancel: CancellationToken,
    ) -> Result<ConversionHandle, StartError> {
        spec.validate()?;
        let args = build_transcode_args(&spec, &self.config)?;

        let mut slot = self.slot();
        if slot.as_ref().is_some_and(run_in_flight) {
            return Err(StartError::Busy);
        }
        let (state_tx, state_rx) = watch::channel(ConversionState::Starting);
        *slot = Some(state_rx.clone());
        drop(slot);
        metrics::CONVERSIONS_ACTIVE.set(1);

        let (progress_tx, progress_rx) = watch::channel(None);
        let (events, _) = broadcast::channel(self.config.event_buffer.max(1));
        let pid = Arc::new(OnceLock::new());

        let handle = ConversionHandle::new(
            spec.clone(),
            Arc::clone(&pid),
            state_rx,
            progress_rx,
            events.clone(),
            cancel.clone(),
        );

        let run = Run {
            id: handle.id().to_string(),
            spec,
            args,
            config: Arc::clone(&self.config),
            state_tx,
            progress_tx,
            events,
            cancel,
            pid,
        };
        tokio::spawn(run.execute());

        Ok(handle)
    }
}

/// A run holds the slot until it publishes a terminal state. A run task that
/// vanished without one (dropped sender) no longer holds it.
fn run_in_flight(state: &watch::Receiver<ConversionState>) -> bool {
    state.has_changed().is_ok() && !state.borrow().is_terminal()
}

/// What was at the output path before the engine started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutputStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl OutputStamp {
    async fn read(path: &Path) -> Option<Self> {
        let meta = tokio::fs::metadata(path).await.ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Everything one run task owns.
struct Run {
    id: String,
    spec: TranscodeSpec,
    args: Vec<OsString>,
    config: Arc<EngineConfig>,
    state_tx: watch::Sender<ConversionState>,
    progress_tx: watch::Sender<Option<ConversionProgress>>,
    events: broadcast::Sender<ConversionEvent>,
    cancel: CancellationToken,
    pid: Arc<OnceLock<u32>>,
}

/// Result of supervising a spawned process.
struct Outcome {
    status: std::io::Result<ExitStatus>,
    cancel_requested: bool,
    timed_out: bool,
}

impl Run {
    #[instrument(skip_all, fields(conversion_id = %self.id))]
    async fn execute(self) {
        let started = StdInstant::now();
        let before = OutputStamp::read(&self.spec.output).await;
        let (terminal, spawned) = self.supervise().await;

        if spawned && !matches!(terminal, ConversionState::Succeeded { .. }) {
            self.cleanup_partial_output(before).await;
        }

        let outcome = terminal.outcome();
        metrics::CONVERSIONS_TOTAL.with_label_values(&[outcome]).inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        info!(
            outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Conversion finished"
        );

        // Publishing the terminal state is what frees the slot.
        metrics::CONVERSIONS_ACTIVE.set(0);
        self.state_tx.send_replace(terminal.clone());
        let _ = self.events.send(ConversionEvent::Finished(terminal));
    }

    /// Returns the terminal state and whether a process was spawned.
    async fn supervise(&self) -> (ConversionState, bool) {
        if self.cancel.is_cancelled() {
            info!("Cancelled before the engine was started");
            return (ConversionState::Cancelled, false);
        }

        debug!(program = %self.config.ffmpeg_path.display(), args = ?self.args, "Spawning engine");
        let mut child = match Command::new(&self.config.ffmpeg_path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(error = %e, "Failed to spawn engine");
                let message = if e.kind() == std::io::ErrorKind::NotFound {
                    format!("FFmpeg not found at path: {}", self.config.ffmpeg_path.display())
                } else {
                    format!("Failed to start ffmpeg: {}", e)
                };
                return (
                    ConversionState::Failed {
                        kind: FailureKind::Spawn,
                        exit_code: None,
                        diagnostic: vec![message.clone()],
                        message,
                    },
                    false,
                );
            }
        };

        let pid = child.id();
        if let Some(pid) = pid {
            let _ = self.pid.set(pid);
        }
        info!(?pid, output = %self.spec.output.display(), "Engine started");
        self.state_tx.send_replace(ConversionState::Running { pid });
        let _ = self.events.send(ConversionEvent::Started { pid });

        let mut sink = LineSink {
            parser: ProgressParser::new(self.spec.clip_secs()),
            tail: DiagnosticTail::new(self.config.diagnostic_tail_lines),
            events: &self.events,
            progress_tx: &self.progress_tx,
        };

        let (line_tx, mut line_rx) = mpsc::channel::<String>(self.config.line_buffer.max(1));
        let reader = match child.stderr.take() {
            Some(stderr) => Some(tokio::spawn(read_lines(stderr, line_tx))),
            None => {
                drop(line_tx);
                None
            }
        };

        let outcome = self.watch_child(&mut child, &mut line_rx, &mut sink).await;

        // The engine has exited; whatever it wrote is still in the pipe.
        let drain = async {
            while let Some(line) = line_rx.recv().await {
                sink.accept(line);
            }
        };
        if timeout(DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("Engine output still open after exit; dropping the rest");
        }
        if let Some(reader) = reader {
            reader.abort();
        }

        (self.terminal_state(outcome, &sink.tail), true)
    }

    /// Pumps output lines until the child exits, handling cancellation and
    /// the run timeout along the way.
    async fn watch_child(
        &self,
        child: &mut Child,
        line_rx: &mut mpsc::Receiver<String>,
        sink: &mut LineSink<'_>,
    ) -> Outcome {
        let mut stdin = child.stdin.take();
        let grace = self.config.cancel_grace();
        let deadline = self.config.run_timeout().map(|t| Instant::now() + t);

        let mut cancel_requested = false;
        let mut timed_out = false;
        let mut kill_at: Option<Instant> = None;
        let mut lines_open = true;

        let status = loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled(), if !cancel_requested => {
                    cancel_requested = true;
                    info!("Cancellation requested");
                    self.state_tx.send_replace(ConversionState::Cancelling);
                    let _ = self.events.send(ConversionEvent::Cancelling);

                    if !grace.is_zero() && request_quit(&mut stdin).await {
                        kill_at = Some(Instant::now() + grace);
                    } else if let Err(e) = child.start_kill() {
                        warn!(error = %e, "Failed to kill engine");
                    }
                }

                _ = sleep_until(kill_at.unwrap_or_else(Instant::now)), if kill_at.is_some() => {
                    warn!(grace_ms = grace.as_millis() as u64, "Engine ignored quit request; killing");
                    kill_at = None;
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "Failed to kill engine");
                    }
                }

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() && !timed_out && !cancel_requested => {
                    timed_out = true;
                    warn!(timeout_secs = self.config.timeout_secs, "Conversion timed out; killing engine");
                    if let Err(e) = child.start_kill() {
                        warn!(error = %e, "Failed to kill engine");
                    }
                }

                line = line_rx.recv(), if lines_open => match line {
                    Some(line) => sink.accept(line),
                    None => lines_open = false,
                },

                status = child.wait() => break status,
            }
        };

        Outcome {
            status,
            cancel_requested,
            timed_out,
        }
    }

    fn terminal_state(&self, outcome: Outcome, tail: &DiagnosticTail) -> ConversionState {
        // A cancel observed before the exit wins over however the engine exited.
        if outcome.cancel_requested {
            return ConversionState::Cancelled;
        }

        let exit_code = outcome.status.as_ref().ok().and_then(|s| s.code());

        if outcome.timed_out {
            return ConversionState::Failed {
                kind: FailureKind::Timeout,
                exit_code,
                message: format!(
                    "Conversion timed out after {} seconds",
                    self.config.timeout_secs
                ),
                diagnostic: tail.to_vec(),
            };
        }

        match outcome.status {
            Ok(status) if status.success() => ConversionState::Succeeded {
                output_path: self.spec.output.clone(),
            },
            Ok(status) => ConversionState::Failed {
                kind: FailureKind::Engine,
                exit_code,
                message: match status.code() {
                    Some(code) => format!("ffmpeg exited with code {}", code),
                    None => "ffmpeg was terminated by a signal".to_string(),
                },
                diagnostic: tail.to_vec(),
            },
            Err(e) => ConversionState::Failed {
                kind: FailureKind::Engine,
                exit_code: None,
                message: format!("Failed to wait for ffmpeg: {}", e),
                diagnostic: tail.to_vec(),
            },
        }
    }

    /// Removes the output only if this run created or rewrote it.
    async fn cleanup_partial_output(&self, before: Option<OutputStamp>) {
        if !self.config.cleanup_partial_output {
            return;
        }
        let output = &self.spec.output;
        if output == &self.spec.input {
            return;
        }
        let after = OutputStamp::read(output).await;
        if after.is_none() {
            return;
        }
        if before.is_some() && before == after {
            debug!(path = %output.display(), "Output untouched by the engine; keeping it");
            return;
        }
        match tokio::fs::remove_file(output).await {
            Ok(()) => info!(path = %output.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %output.display(), error = %e, "Failed to remove partial output")
            }
        }
    }
}

/// Asks ffmpeg to finish by writing `q` to its stdin.
async fn request_quit(stdin: &mut Option<ChildStdin>) -> bool {
    let Some(pipe) = stdin.as_mut() else {
        return false;
    };
    let sent = pipe.write_all(b"q\n").await.is_ok() && pipe.flush().await.is_ok();
    // Closing stdin also ends the interactive read loop.
    *stdin = None;
    sent
}

/// Forwards engine stderr into `tx` one line at a time. Invalid UTF-8 is
/// replaced rather than ending the stream.
async fn read_lines(stderr: tokio::process::ChildStderr, tx: mpsc::Sender<String>) {
    let mut segments = BufReader::new(stderr).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(bytes)) => {
                let line = String::from_utf8_lossy(&bytes);
                let line = line.trim_end_matches('\r');
                if tx.send(line.to_string()).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Engine output closed");
                break;
            }
        }
    }
}

/// Routes each output line to subscribers, the progress parser and the tail.
struct LineSink<'a> {
    parser: ProgressParser,
    tail: DiagnosticTail,
    events: &'a broadcast::Sender<ConversionEvent>,
    progress_tx: &'a watch::Sender<Option<ConversionProgress>>,
}

impl LineSink<'_> {
    fn accept(&mut self, line: String) {
        let progress = self.parser.parse_line(&line);
        let is_progress = progress.is_some() || ProgressParser::is_progress_line(&line);
        if !is_progress && !line.trim().is_empty() {
            self.tail.push(line.clone());
        }

        let _ = self.events.send(ConversionEvent::Output { line });
        if let Some(progress) = progress {
            self.progress_tx.send_replace(Some(progress.clone()));
            let _ = self.events.send(ConversionEvent::Progress(progress));
        }
    }
}
