//! # In-Memory Printer
//!
//! A scriptable stand-in for the TUP900 used by tests and by
//! `serve --simulate` (see [`MemoryOpener::simulated`]). It records the bytes
//! written per path, answers the ASB enable command with a configured reply
//! and tracks how many channels are open at once.
//!
//! ## Example
//!
//! ```
//! use tup900_edge::transport::{Access, DeviceChannel, DeviceOpener, MemoryOpener};
//!
//! let printer = MemoryOpener::healthy();
//! let mut channel = printer.open("/dev/usb/lp1", Access::WriteOnly)?;
//! channel.write_all(b"\x1b\x64\x02")?;
//! drop(channel);
//!
//! assert_eq!(printer.written("/dev/usb/lp1"), vec![0x1B, 0x64, 0x02]);
//! # Ok::<(), tup900_edge::error::AgentError>(())
//! ```

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use super::{Access, DeviceChannel, DeviceOpener, ReadOutcome};
use crate::error::AgentError;
use crate::protocol::commands::Command;
use crate::protocol::status::ASB_LEN;

/// What the simulated printer does once the reply chunks are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyEnd {
    /// Report end of stream
    #[default]
    Eof,
    /// Stay quiet, so reads time out
    Silence,
}

/// Scripted answer to `enableStatusReporting`.
#[derive(Debug, Clone, Default)]
pub struct StatusReply {
    /// Each chunk is returned by one read
    pub chunks: Vec<Vec<u8>>,
    pub end: ReplyEnd,
}

impl StatusReply {
    /// One read returning `bytes`, then EOF.
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            chunks: vec![bytes.into()],
            end: ReplyEnd::Eof,
        }
    }

    /// Never answers.
    pub fn silent() -> Self {
        Self {
            chunks: Vec::new(),
            end: ReplyEnd::Silence,
        }
    }
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub path: String,
    pub data: Vec<u8>,
}

/// Records kept by [`MemoryOpener::simulated`].
pub const SIMULATED_HISTORY: usize = 64;

#[derive(Debug, Default)]
struct MemoryState {
    missing: HashSet<String>,
    reply: StatusReply,
    open_delay: Duration,
    fail_writes: bool,
    /// Oldest records are dropped past this many; unbounded when `None`
    history_limit: Option<usize>,
    writes: VecDeque<WriteRecord>,
    opens: VecDeque<(String, Access)>,
    active: usize,
    max_active: usize,
}

impl MemoryState {
    fn trim(&mut self) {
        if let Some(limit) = self.history_limit {
            while self.writes.len() > limit {
                self.writes.pop_front();
            }
            while self.opens.len() > limit {
                self.opens.pop_front();
            }
        }
    }
}

/// Opens [`MemoryDevice`]s that share one simulated printer.
#[derive(Debug, Clone, Default)]
pub struct MemoryOpener {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryOpener {
    /// A printer that never answers status requests.
    pub fn new() -> Self {
        Self::with_reply(StatusReply::silent())
    }

    /// A printer reporting an all-clear ASB (paper collected, roll present).
    pub fn healthy() -> Self {
        Self::with_reply(StatusReply::bytes(vec![0u8; ASB_LEN]))
    }

    pub fn with_reply(reply: StatusReply) -> Self {
        let opener = Self::default();
        opener.lock().reply = reply;
        opener
    }

    /// A healthy printer for long-running simulation: only the last
    /// [`SIMULATED_HISTORY`] opens and writes are kept.
    pub fn simulated() -> Self {
        let opener = Self::healthy();
        opener.lock().history_limit = Some(SIMULATED_HISTORY);
        opener
    }

    /// Make opening `path` fail as if the device node did not exist.
    pub fn set_missing(&self, path: &str) {
        self.lock().missing.insert(path.to_string());
    }

    /// Hold every open for `delay` before returning the channel.
    pub fn set_open_delay(&self, delay: Duration) {
        self.lock().open_delay = delay;
    }

    /// Make every write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Every byte written to `path`, in order.
    pub fn written(&self, path: &str) -> Vec<u8> {
        self.lock()
            .writes
            .iter()
            .filter(|w| w.path == path)
            .flat_map(|w| w.data.iter().copied())
            .collect()
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.lock().writes.iter().cloned().collect()
    }

    /// Paths and modes of every successful open, in order.
    pub fn opens(&self) -> Vec<(String, Access)> {
        self.lock().opens.iter().cloned().collect()
    }

    /// Highest number of channels that were open at the same time.
    pub fn max_concurrent_opens(&self) -> usize {
        self.lock().max_active
    }

    /// Channels currently open.
    pub fn open_count(&self) -> usize {
        self.lock().active
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panicking test thread must not hide the recorded state
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DeviceOpener for MemoryOpener {
    fn open(&self, path: &str, access: Access) -> Result<Box<dyn DeviceChannel>, AgentError> {
        let delay = {
            let mut state = self.lock();
            if state.missing.contains(path) {
                return Err(AgentError::DeviceUnavailable(format!(
                    "Failed to open {}: No such file or directory (os error 2)",
                    path
                )));
            }
            state.opens.push_back((path.to_string(), access));
            state.trim();
            state.active += 1;
            state.max_active = state.max_active.max(state.active);
            state.open_delay
        };

        let device = MemoryDevice {
            opener: self.clone(),
            path: path.to_string(),
            access,
            enabled: false,
            pending: VecDeque::new(),
        };

        if !delay.is_zero() {
            thread::sleep(delay);
        }

        Ok(Box::new(device))
    }
}

/// A channel to the simulated printer.
pub struct MemoryDevice {
    opener: MemoryOpener,
    path: String,
    access: Access,
    enabled: bool,
    pending: VecDeque<Vec<u8>>,
}

impl DeviceChannel for MemoryDevice {
    fn write_all(&mut self, data: &[u8]) -> Result<(), AgentError> {
        let mut state = self.opener.lock();
        if state.fail_writes {
            return Err(AgentError::Transport(
                "Write failed: Broken pipe (os error 32)".to_string(),
            ));
        }
        state.writes.push_back(WriteRecord {
            path: self.path.clone(),
            data: data.to_vec(),
        });
        state.trim();

        let enable = Command::EnableStatusReporting.bytes();
        if !self.enabled && data.windows(enable.len()).any(|w| w == enable) {
            self.enabled = true;
            self.pending = state.reply.chunks.iter().cloned().collect();
        }
        Ok(())
    }

    fn read_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, AgentError> {
        if self.access != Access::ReadWrite {
            return Err(AgentError::InvalidCommand(
                "channel was opened write-only".to_string(),
            ));
        }

        if let Some(mut chunk) = self.pending.pop_front() {
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.pending.push_front(chunk.split_off(n));
            }
            return Ok(ReadOutcome::Data(n));
        }

        if self.enabled && self.opener.lock().reply.end == ReplyEnd::Eof {
            return Ok(ReadOutcome::Eof);
        }

        // Quiet device: behave like poll(2) running out the clock
        thread::sleep(timeout.min(Duration::from_millis(20)));
        Ok(ReadOutcome::TimedOut)
    }
}

impl Drop for MemoryDevice {
    fn drop(&mut self) {
        let mut state = self.opener.lock();
        state.active = state.active.saturating_sub(1);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/dev/usb/lp1";

    #[test]
    fn test_records_writes_per_path() {
        let printer = MemoryOpener::healthy();
        printer
            .open(PATH, Access::WriteOnly)
            .unwrap()
            .write_all(b"ab")
            .unwrap();
        printer
            .open("/dev/usb/lp0", Access::WriteOnly)
            .unwrap()
            .write_all(b"zz")
            .unwrap();
        printer
            .open(PATH, Access::WriteOnly)
            .unwrap()
            .write_all(b"cd")
            .unwrap();

        assert_eq!(printer.written(PATH), b"abcd".to_vec());
        assert_eq!(printer.written("/dev/usb/lp0"), b"zz".to_vec());
        assert_eq!(printer.opens().len(), 3);
    }

    #[test]
    fn test_missing_path() {
        let printer = MemoryOpener::healthy();
        printer.set_missing(PATH);
        let err = printer.open(PATH, Access::ReadWrite).err().unwrap();
        assert!(matches!(err, AgentError::DeviceUnavailable(_)));
        assert_eq!(printer.open_count(), 0);
    }

    #[test]
    fn test_reply_only_after_enable() {
        let printer = MemoryOpener::healthy();
        let mut channel = printer.open(PATH, Access::ReadWrite).unwrap();
        let mut buf = [0u8; ASB_LEN];

        assert_eq!(
            channel.read_timeout(&mut buf, Duration::from_millis(1)).unwrap(),
            ReadOutcome::TimedOut
        );

        channel
            .write_all(Command::EnableStatusReporting.bytes())
            .unwrap();
        assert_eq!(
            channel.read_timeout(&mut buf, Duration::from_millis(1)).unwrap(),
            ReadOutcome::Data(ASB_LEN)
        );
        assert_eq!(
            channel.read_timeout(&mut buf, Duration::from_millis(1)).unwrap(),
            ReadOutcome::Eof
        );
    }

    #[test]
    fn test_chunk_larger_than_buffer_is_split() {
        let printer = MemoryOpener::with_reply(StatusReply::bytes(vec![1, 2, 3, 4]));
        let mut channel = printer.open(PATH, Access::ReadWrite).unwrap();
        channel
            .write_all(Command::EnableStatusReporting.bytes())
            .unwrap();

        let mut buf = [0u8; 3];
        assert_eq!(
            channel.read_timeout(&mut buf, Duration::ZERO).unwrap(),
            ReadOutcome::Data(3)
        );
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(
            channel.read_timeout(&mut buf, Duration::ZERO).unwrap(),
            ReadOutcome::Data(1)
        );
        assert_eq!(buf[0], 4);
    }

    #[test]
    fn test_open_count_tracks_drops() {
        let printer = MemoryOpener::new();
        let a = printer.open(PATH, Access::WriteOnly).unwrap();
        let b = printer.open(PATH, Access::WriteOnly).unwrap();
        assert_eq!(printer.open_count(), 2);
        drop(a);
        drop(b);
        assert_eq!(printer.open_count(), 0);
        assert_eq!(printer.max_concurrent_opens(), 2);
    }

    #[test]
    fn test_simulated_history_is_bounded() {
        let printer = MemoryOpener::simulated();
        for i in 0..(SIMULATED_HISTORY + 10) {
            printer
                .open(PATH, Access::WriteOnly)
                .unwrap()
                .write_all(&[i as u8])
                .unwrap();
        }

        assert_eq!(printer.opens().len(), SIMULATED_HISTORY);
        let writes = printer.writes();
        assert_eq!(writes.len(), SIMULATED_HISTORY);
        // Oldest dropped first
        assert_eq!(writes[0].data, vec![10u8]);
        assert_eq!(printer.max_concurrent_opens(), 1);
    }

    #[test]
    fn test_fail_writes() {
        let printer = MemoryOpener::new();
        printer.set_fail_writes(true);
        let mut channel = printer.open(PATH, Access::WriteOnly).unwrap();
        assert!(matches!(
            channel.write_all(b"x"),
            Err(AgentError::Transport(_))
        ));
        assert!(printer.writes().is_empty());
    }
}
