//! # Printer Transport Layer
//!
//! The device is a duplex byte channel that is opened for one operation and
//! dropped when the operation ends. Dropping the channel closes it, so every
//! exit path (including errors) releases the device.
//!
//! ## Available Transports
//!
//! - [`device`]: Character device / TTY node (e.g. `/dev/usb/lp1`)
//! - [`memory`]: In-memory printer for tests and `serve --simulate`

pub mod device;
pub mod memory;

use std::time::Duration;

use crate::error::AgentError;

pub use device::FileOpener;
pub use memory::MemoryOpener;

/// How a channel is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Print jobs only write
    WriteOnly,
    /// Status requests write the enable command, then read the ASB
    ReadWrite,
}

/// Outcome of one bounded read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were read into the buffer (`n > 0`)
    Data(usize),
    /// The device signalled end of stream
    Eof,
    /// Nothing arrived before the timeout
    TimedOut,
}

/// An open device channel.
pub trait DeviceChannel: Send {
    /// Write every byte and flush, or fail.
    fn write_all(&mut self, data: &[u8]) -> Result<(), AgentError>;

    /// Read into `buf`, waiting at most `timeout` for data to arrive.
    fn read_timeout(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, AgentError>;
}

/// Opens channels by path.
///
/// Implementations are shared with the device worker and called from a
/// blocking thread.
pub trait DeviceOpener: Send + Sync + 'static {
    fn open(&self, path: &str, access: Access) -> Result<Box<dyn DeviceChannel>, AgentError>;
}
