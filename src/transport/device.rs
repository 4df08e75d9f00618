//! # Character Device Transport
//!
//! Talks to the printer through its device node. On a stock edge host the
//! TUP900 enumerates through `usblp` as `/dev/usb/lpN`; a serial-attached
//! unit shows up as a TTY instead.
//!
//! ## TTY Configuration
//!
//! When the node is a TTY it is switched to raw mode so binary data is
//! transmitted without modification:
//!
//! - **No input processing**: Disable IGNBRK, BRKINT, PARMRK, ISTRIP, etc.
//! - **No output processing**: Disable OPOST (no CR/LF translation)
//! - **8-bit characters**: CS8 (8 data bits, no parity)
//! - **No echo**: Disable ECHO, ECHONL
//! - **Non-canonical mode**: Disable ICANON (no line buffering)
//!
//! `usblp` nodes are not TTYs and are used as-is.
//!
//! ## Bounded I/O
//!
//! The node is opened with `O_NONBLOCK` and every transfer waits on `poll(2)`
//! first:
//!
//! - **open**: a node with nobody on the other end (a FIFO without reader)
//!   fails immediately instead of hanging
//! - **write**: each chunk waits for `POLLOUT` against one deadline for the
//!   whole job, so an offline or paper-out printer yields a transport error
//! - **read**: a printer that never answers produces
//!   [`ReadOutcome::TimedOut`]

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{Access, DeviceChannel, DeviceOpener, ReadOutcome};
use crate::error::AgentError;

/// Default chunk size for writes (bytes)
const CHUNK_SIZE: usize = 4096;

/// How long a whole job may take to drain into the device.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Opens [`FileDevice`]s.
#[derive(Debug, Clone, Copy)]
pub struct FileOpener {
    write_timeout: Duration,
}

impl FileOpener {
    pub fn new(write_timeout: Duration) -> Self {
        Self { write_timeout }
    }
}

impl Default for FileOpener {
    fn default() -> Self {
        Self::new(DEFAULT_WRITE_TIMEOUT)
    }
}

impl DeviceOpener for FileOpener {
    fn open(&self, path: &str, access: Access) -> Result<Box<dyn DeviceChannel>, AgentError> {
        let mut device = FileDevice::open(path, access)?;
        device.write_timeout = self.write_timeout;
        Ok(Box::new(device))
    }
}

/// # Device Node Channel
///
/// ## Example
///
/// ```no_run
/// use tup900_edge::transport::{Access, DeviceChannel, device::FileDevice};
/// use tup900_edge::protocol::commands::Command;
///
/// let mut device = FileDevice::open("/dev/usb/lp1", Access::WriteOnly)?;
/// device.write_all(Command::Cut.bytes())?;
///
/// # Ok::<(), tup900_edge::error::AgentError>(())
/// ```
pub struct FileDevice {
    file: File,
    access: Access,
    write_timeout: Duration,
}

impl FileDevice {
    /// Open the device node.
    ///
    /// ## Errors
    ///
    /// Returns [`AgentError::DeviceUnavailable`] if:
    /// - The device doesn't exist (printer unplugged)
    /// - Permission denied (may need the lp or dialout group)
    /// - Nothing is attached to the other end (`ENXIO`)
    ///
    /// and [`AgentError::Transport`] if TTY configuration fails.
    pub fn open<P: AsRef<Path>>(device: P, access: Access) -> Result<Self, AgentError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(access == Access::ReadWrite)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| {
                AgentError::DeviceUnavailable(format!("Failed to open {}: {}", path.display(), e))
            })?;

        if is_tty(file.as_raw_fd()) {
            debug!(path = %path.display(), "Configuring TTY for raw mode");
            configure_tty_raw(file.as_raw_fd())?;
        }

        Ok(Self {
            file,
            access,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        })
    }

    /// Set the deadline for draining one `write_all` call.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout;
    }
}

impl DeviceChannel for FileDevice {
    fn write_all(&mut self, data: &[u8]) -> Result<(), AgentError> {
        let deadline = Instant::now() + self.write_timeout;
        let fd = self.file.as_raw_fd();
        let mut written = 0;

        while written < data.len() {
            let end = (written + CHUNK_SIZE).min(data.len());
            match self.file.write(&data[written..end]) {
                Ok(0) => {
                    return Err(AgentError::Transport(
                        "Write failed: device accepted no data".to_string(),
                    ));
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() || !wait_ready(fd, libc::POLLOUT, remaining)? {
                        return Err(AgentError::Transport(format!(
                            "Write timed out after {} ms ({} of {} bytes written)",
                            self.write_timeout.as_millis(),
                            written,
                            data.len()
                        )));
                    }
                }
                Err(e) => return Err(AgentError::Transport(format!("Write failed: {}", e))),
            }
        }

        self.file
            .flush()
            .map_err(|e| AgentError::Transport(format!("Flush failed: {}", e)))?;

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
        if buf.is_empty() {
            return Ok(ReadOutcome::Data(0));
        }

        if !wait_ready(self.file.as_raw_fd(), libc::POLLIN, timeout)? {
            return Ok(ReadOutcome::TimedOut);
        }

        loop {
            match self.file.read(buf) {
                Ok(0) => return Ok(ReadOutcome::Eof),
                Ok(n) => return Ok(ReadOutcome::Data(n)),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // Readiness was spurious
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(ReadOutcome::TimedOut),
                Err(e) => return Err(AgentError::Transport(format!("Read failed: {}", e))),
            }
        }
    }
}

/// Whether the file descriptor refers to a terminal.
fn is_tty(fd: i32) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

/// Wait until `fd` is ready for `events` or `timeout` elapses.
///
/// Returns `true` when ready (errors and hangups count as ready so the
/// following read or write reports them).
fn wait_ready(fd: i32, events: libc::c_short, timeout: Duration) -> Result<bool, AgentError> {
    let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };

    loop {
        let result = unsafe { libc::poll(&mut pfd, 1, millis) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(AgentError::Transport(format!("poll failed: {}", err)));
        }
        return Ok(result > 0);
    }
}

/// Configure a file descriptor for raw TTY mode.
///
/// Note: IXON/IXOFF/IXANY disable XON/XOFF software flow control. This is critical
/// because 0x11 (XON/DC1) and 0x13 (XOFF/DC3) can appear in command parameters.
fn configure_tty_raw(fd: i32) -> Result<(), AgentError> {
    use std::mem::MaybeUninit;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(AgentError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(AgentError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "tup900-edge-{}-{}-{}",
            tag,
            std::process::id(),
            uuid::Uuid::new_v4()
        ))
    }

    #[test]
    fn test_missing_device_is_unavailable() {
        let err = FileDevice::open("/nonexistent/usb/lp9", Access::WriteOnly)
            .err()
            .expect("open should fail");
        assert!(matches!(err, AgentError::DeviceUnavailable(_)), "{:?}", err);
        assert!(err.to_string().contains("/nonexistent/usb/lp9"));
    }

    #[test]
    fn test_write_to_regular_file() {
        let path = temp_path("write");
        std::fs::write(&path, b"").unwrap();

        let mut device = FileDevice::open(&path, Access::WriteOnly).unwrap();
        device.write_all(b"\x1b\x64\x02hello").unwrap();
        drop(device);

        assert_eq!(std::fs::read(&path).unwrap(), b"\x1b\x64\x02hello".to_vec());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_read_on_write_only_channel_fails() {
        let path = temp_path("wo");
        std::fs::write(&path, b"").unwrap();

        let mut device = FileDevice::open(&path, Access::WriteOnly).unwrap();
        let mut buf = [0u8; 4];
        assert!(device.read_timeout(&mut buf, Duration::from_millis(10)).is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_regular_file_reads_then_eof() {
        // Regular files always poll readable
        let path = temp_path("rw");
        std::fs::write(&path, [0u8; 10]).unwrap();

        let mut device = FileDevice::open(&path, Access::ReadWrite).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(
            device.read_timeout(&mut buf, Duration::from_millis(50)).unwrap(),
            ReadOutcome::Data(10)
        );
        assert_eq!(
            device.read_timeout(&mut buf, Duration::from_millis(50)).unwrap(),
            ReadOutcome::Eof
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_silent_pipe_times_out() {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);

        let start = Instant::now();
        let ready = wait_ready(fds[0], libc::POLLIN, Duration::from_millis(50)).unwrap();
        assert!(!ready);
        assert!(start.elapsed() >= Duration::from_millis(40));

        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    fn make_fifo(tag: &str) -> std::path::PathBuf {
        let path = temp_path(tag);
        let c_path = std::ffi::CString::new(path.to_str().unwrap()).unwrap();
        assert_eq!(unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) }, 0);
        path
    }

    #[test]
    fn test_fifo_without_reader_fails_fast() {
        let path = make_fifo("noreader");

        let start = Instant::now();
        let err = FileOpener::default()
            .open(path.to_str().unwrap(), Access::WriteOnly)
            .err()
            .expect("open should fail");

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(matches!(err, AgentError::DeviceUnavailable(_)), "{:?}", err);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_times_out_when_device_stops_draining() {
        // Opened read-write, the FIFO has a reader (us) that never reads,
        // so the pipe buffer fills and stays full
        let path = make_fifo("full");
        let mut device = FileDevice::open(&path, Access::ReadWrite).unwrap();
        device.set_write_timeout(Duration::from_millis(100));

        let start = Instant::now();
        let err = device.write_all(&vec![b'x'; 1024 * 1024]).unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(err.to_string().contains("Write timed out after 100 ms"), "{}", err);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_regular_file_is_not_tty() {
        let path = temp_path("tty");
        std::fs::write(&path, b"").unwrap();
        let file = File::open(&path).unwrap();
        assert!(!is_tty(file.as_raw_fd()));
        std::fs::remove_file(&path).ok();
    }
}
