//! # Device Worker
//!
//! The printer is one exclusive resource. Every operation that touches it
//! goes through a single worker task that owns the [`DeviceOpener`] and
//! drains a bounded request queue, so a print and a status read can never
//! interleave on the channel.
//!
//! ## Architecture
//!
//! ```text
//! Dispatcher ──DeviceRequest──▶ mpsc ──▶ worker task ──spawn_blocking──▶ device
//!     ▲                                      │
//!     └──────────── oneshot reply ◀──────────┘
//! ```
//!
//! Each request carries the device path captured by its caller, opens the
//! channel, does its fixed sequence of writes (and for status, one bounded
//! read) and drops the channel before the reply is sent. The worker awaits
//! each request before taking the next.
//!
//! Callers stop waiting after the handle's reply timeout and get
//! [`AgentError::DeviceTimeout`]. A request whose caller already gave up is
//! skipped when the worker reaches it, so a late print never comes out.
//!
//! ## Example
//!
//! ```
//! use std::time::Duration;
//! use tup900_edge::transport::MemoryOpener;
//! use tup900_edge::worker::DeviceWorker;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tup900_edge::error::AgentError> {
//! let printer = MemoryOpener::healthy();
//! let device = DeviceWorker::spawn(printer.clone(), Duration::from_millis(500));
//!
//! device.print("/dev/usb/lp1", b"hello".to_vec()).await?;
//! assert_eq!(printer.written("/dev/usb/lp1"), b"hello".to_vec());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::protocol::commands::{Command, to_hex};
use crate::protocol::status::ASB_LEN;
use crate::transport::{Access, DeviceChannel, DeviceOpener, ReadOutcome};

/// Requests waiting for the device before callers are back-pressured.
pub const QUEUE_DEPTH: usize = 32;

/// How long a caller waits for its reply, queueing included.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw result of a status request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRead {
    /// Bytes received before EOF, a full ASB, or the deadline (may be empty)
    Bytes(Vec<u8>),
    /// Nothing arrived within `after`
    TimedOut { after: Duration },
}

/// Requests processed by the worker.
#[derive(Debug)]
enum DeviceRequest {
    Print {
        path: String,
        job: Vec<u8>,
        reply: oneshot::Sender<Result<(), AgentError>>,
    },
    Status {
        path: String,
        reply: oneshot::Sender<Result<StatusRead, AgentError>>,
    },
    Recover {
        path: String,
        reply: oneshot::Sender<Result<(), AgentError>>,
    },
}

/// Cloneable handle used to submit requests to the worker.
#[derive(Debug, Clone)]
pub struct DeviceHandle {
    tx: mpsc::Sender<DeviceRequest>,
    reply_timeout: Duration,
}

/// Spawns the worker task.
pub struct DeviceWorker;

impl DeviceWorker {
    /// Start the worker on the current tokio runtime.
    ///
    /// The task ends once every [`DeviceHandle`] has been dropped.
    pub fn spawn<O: DeviceOpener>(opener: O, read_timeout: Duration) -> DeviceHandle {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run_device_worker(Arc::new(opener), read_timeout, rx));
        DeviceHandle {
            tx,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }
}

impl DeviceHandle {
    /// Bound on how long each call waits for the worker.
    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    /// Write a complete print job to `path`.
    pub async fn print(&self, path: &str, job: Vec<u8>) -> Result<(), AgentError> {
        let (reply, rx) = oneshot::channel();
        self.submit(
            DeviceRequest::Print {
                path: path.to_string(),
                job,
                reply,
            },
            rx,
        )
        .await
    }

    /// Enable ASB reporting on `path` and read the status block.
    pub async fn status(&self, path: &str) -> Result<StatusRead, AgentError> {
        let (reply, rx) = oneshot::channel();
        self.submit(
            DeviceRequest::Status {
                path: path.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    /// Force immediate presenter recovery on `path`.
    pub async fn recover(&self, path: &str) -> Result<(), AgentError> {
        let (reply, rx) = oneshot::channel();
        self.submit(
            DeviceRequest::Recover {
                path: path.to_string(),
                reply,
            },
            rx,
        )
        .await
    }

    async fn submit<T>(
        &self,
        request: DeviceRequest,
        rx: oneshot::Receiver<Result<T, AgentError>>,
    ) -> Result<T, AgentError> {
        let wait = async {
            self.tx
                .send(request)
                .await
                .map_err(|_| AgentError::WorkerStopped)?;
            rx.await.map_err(|_| AgentError::WorkerStopped)?
        };

        tokio::time::timeout(self.reply_timeout, wait)
            .await
            .map_err(|_| {
                AgentError::DeviceTimeout(format!(
                    "no reply from device worker within {} ms",
                    self.reply_timeout.as_millis()
                ))
            })?
    }
}

/// Worker loop: one request at a time, in arrival order.
async fn run_device_worker(
    opener: Arc<dyn DeviceOpener>,
    read_timeout: Duration,
    mut rx: mpsc::Receiver<DeviceRequest>,
) {
    debug!("Device worker started");

    while let Some(request) = rx.recv().await {
        if request.abandoned() {
            warn!("Skipping device request abandoned by its caller");
            continue;
        }

        let opener = opener.clone();
        match request {
            DeviceRequest::Print { path, job, reply } => {
                let result = blocking(move || write_job(opener.as_ref(), &path, &job)).await;
                send_reply(reply, result);
            }
            DeviceRequest::Status { path, reply } => {
                let result =
                    blocking(move || read_status(opener.as_ref(), &path, read_timeout)).await;
                send_reply(reply, result);
            }
            DeviceRequest::Recover { path, reply } => {
                let result = blocking(move || {
                    write_job(opener.as_ref(), &path, Command::ExecuteRecovery.bytes())
                })
                .await;
                send_reply(reply, result);
            }
        }
    }

    debug!("Device worker stopped");
}

impl DeviceRequest {
    fn abandoned(&self) -> bool {
        match self {
            DeviceRequest::Print { reply, .. } | DeviceRequest::Recover { reply, .. } => {
                reply.is_closed()
            }
            DeviceRequest::Status { reply, .. } => reply.is_closed(),
        }
    }
}

/// Run blocking device I/O off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, AgentError>
where
    F: FnOnce() -> Result<T, AgentError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgentError::Transport(format!("Task error: {}", e)))?
}

fn send_reply<T>(reply: oneshot::Sender<Result<T, AgentError>>, result: Result<T, AgentError>) {
    if reply.send(result).is_err() {
        warn!("Device request caller went away before the reply");
    }
}

/// Open `path` write-only and write `data`.
///
/// The channel is dropped (closed) when this returns, on success or error.
pub fn write_job(opener: &dyn DeviceOpener, path: &str, data: &[u8]) -> Result<(), AgentError> {
    let mut channel = opener.open(path, Access::WriteOnly)?;
    channel.write_all(data)?;
    debug!(path, bytes = data.len(), "Job written");
    Ok(())
}

/// Open `path` read-write, enable ASB and read it back within `timeout`.
pub fn read_status(
    opener: &dyn DeviceOpener,
    path: &str,
    timeout: Duration,
) -> Result<StatusRead, AgentError> {
    let mut channel = opener.open(path, Access::ReadWrite)?;
    channel.write_all(Command::EnableStatusReporting.bytes())?;

    let read = read_status_block(channel.as_mut(), timeout)?;
    match &read {
        StatusRead::Bytes(raw) => info!(path, len = raw.len(), asb = %to_hex(raw), "Asb status read"),
        StatusRead::TimedOut { after } => info!(path, ?after, "Asb status read timed out"),
    }
    Ok(read)
}

/// Accumulate up to [`ASB_LEN`] bytes until EOF or the deadline.
///
/// Returns [`StatusRead::TimedOut`] (carrying `timeout`) only when the deadline passes with no
/// bytes at all; a partial block is returned as-is for the decoder to judge.
pub fn read_status_block(
    channel: &mut dyn DeviceChannel,
    timeout: Duration,
) -> Result<StatusRead, AgentError> {
    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; ASB_LEN];
    let mut filled = 0;

    while filled < ASB_LEN {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match channel.read_timeout(&mut buf[filled..], remaining)? {
            ReadOutcome::Data(0) | ReadOutcome::Eof => break,
            ReadOutcome::Data(n) => filled += n,
            ReadOutcome::TimedOut if filled == 0 => {
                return Ok(StatusRead::TimedOut { after: timeout });
            }
            ReadOutcome::TimedOut => break,
        }
        if remaining.is_zero() {
            break;
        }
    }

    Ok(StatusRead::Bytes(buf[..filled].to_vec()))
}

// ============================================================================
// TESTS
// ============================================================================
