//! Byte-stream transports carrying SBE FIFO frames.
//!
//! This module provides the channel abstraction under the codec. It provides:
//! 1. **Transport:** One blocking request/reply exchange plus a read timeout knob.
//! 2. **FdTransport:** A kernel device node with a driver-enforced read timeout.
//! 3. **CallbackTransport:** A caller-supplied `(request, capacity) -> reply` function.
//! 4. **TimeoutGuard:** Installs a read timeout and restores the previous one on drop.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};
use std::os::fd::AsRawFd;
use std::path::Path;
use std::time::Duration;

use tracing::{trace, warn};

use crate::common::{Error, Result};

/// A channel that carries one request and returns one reply.
///
/// There is no pipelining. Each exchange must read the complete reply before
/// the next request is written.
pub trait Transport {
    /// Sends `request` and returns at most `capacity` reply bytes.
    fn exchange(&mut self, request: &[u8], capacity: usize) -> Result<Vec<u8>>;

    /// Installed read timeout; `None` means the transport's default applies.
    fn read_timeout(&self) -> Option<Duration>;

    /// Replaces the read timeout. `None` puts the default back.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()>;
}

/// `FSI_SBEFIFO_READ_TIMEOUT_SECONDS`: `_IOW('s', 0x00, __u32)`. Zero restores
/// the driver default.
#[cfg(any(target_arch = "powerpc", target_arch = "powerpc64"))]
const FSI_SBEFIFO_READ_TIMEOUT_SECONDS: libc::Ioctl = 0x8004_7300;
#[cfg(not(any(target_arch = "powerpc", target_arch = "powerpc64")))]
const FSI_SBEFIFO_READ_TIMEOUT_SECONDS: libc::Ioctl = 0x4004_7300;

/// Transport over a kernel SBE FIFO device node.
///
/// Read timeouts are handed to the fsi-sbefifo driver. Descriptors that do not
/// understand the request still get a `poll` deadline of the same length.
#[derive(Debug)]
pub struct FdTransport {
    file: File,
    default_timeout: Duration,
    timeout: Option<Duration>,
}

impl FdTransport {
    /// Opens a device node read-write.
    pub fn open(path: impl AsRef<Path>, default_timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::from_file(file, default_timeout))
    }

    /// Wraps an already open file.
    pub const fn from_file(file: File, default_timeout: Duration) -> Self {
        Self {
            file,
            default_timeout,
            timeout: None,
        }
    }

    /// Deadline applied to the next exchange.
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(self.default_timeout)
    }

    fn effective_millis(&self) -> u64 {
        u64::try_from(self.effective_timeout().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns `false` when the descriptor is not an SBE FIFO device.
    fn set_device_timeout(&self, timeout: Option<Duration>) -> Result<bool> {
        let secs: u32 = match timeout {
            None => 0,
            Some(t) => u32::try_from(t.as_millis().div_ceil(1000)).unwrap_or(u32::MAX).max(1),
        };
        // SAFETY: the request takes a pointer to one u32, which outlives the
        // call. The descriptor is owned by self.file.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), FSI_SBEFIFO_READ_TIMEOUT_SECONDS, &raw const secs) };
        if rc == 0 {
            return Ok(true);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ENOTTY) {
            return Ok(false);
        }
        Err(err.into())
    }

    fn wait_readable(&self) -> Result<()> {
        let millis = self.effective_millis();
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let poll_ms = i32::try_from(millis).unwrap_or(i32::MAX);
        // SAFETY: pfd is a valid pollfd for the duration of the call and the
        // count passed is 1. The descriptor is owned by self.file.
        let ready = unsafe { libc::poll(&raw mut pfd, 1, poll_ms) };
        match ready {
            n if n < 0 => Err(io::Error::last_os_error().into()),
            0 => Err(Error::Timeout { millis }),
            _ => Ok(()),
        }
    }
}

impl Transport for FdTransport {
    fn exchange(&mut self, request: &[u8], capacity: usize) -> Result<Vec<u8>> {
        self.file.write_all(request)?;
        self.wait_readable()?;
        let mut buf = vec![0u8; capacity];
        let n = match self.file.read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.raw_os_error() == Some(libc::ETIMEDOUT) => {
                return Err(Error::Timeout {
                    millis: self.effective_millis(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        buf.truncate(n);
        Ok(buf)
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let device = self.set_device_timeout(timeout)?;
        trace!(?timeout, device, "read timeout set");
        self.timeout = timeout;
        Ok(())
    }
}

/// Transport over an injected exchange function.
///
/// The function receives the encoded request and the reply capacity. The
/// stored timeout is only reported back; the function enforces its own.
pub struct CallbackTransport<F> {
    exchange: F,
    timeout: Option<Duration>,
}

impl<F> CallbackTransport<F>
where
    F: FnMut(&[u8], usize) -> io::Result<Vec<u8>>,
{
    /// Wraps an exchange function.
    pub const fn new(exchange: F) -> Self {
        Self {
            exchange,
            timeout: None,
        }
    }
}

impl<F> fmt::Debug for CallbackTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTransport")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<F> Transport for CallbackTransport<F>
where
    F: FnMut(&[u8], usize) -> io::Result<Vec<u8>>,
{
    fn exchange(&mut self, request: &[u8], capacity: usize) -> Result<Vec<u8>> {
        let mut reply = (self.exchange)(request, capacity)?;
        reply.truncate(capacity);
        Ok(reply)
    }

    fn read_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.timeout = timeout;
        Ok(())
    }
}

/// Scoped read timeout.
///
/// Installs `timeout` on creation and restores the previous timeout when
/// dropped, whichever way the scope is left. A previous `None` restores the
/// transport's default rather than lifting the deadline.
pub struct TimeoutGuard<'a> {
    transport: &'a mut dyn Transport,
    previous: Option<Duration>,
}

impl<'a> TimeoutGuard<'a> {
    /// Installs `timeout` on `transport`.
    pub fn install(transport: &'a mut dyn Transport, timeout: Duration) -> Result<Self> {
        let previous = transport.read_timeout();
        transport.set_read_timeout(Some(timeout))?;
        Ok(Self {
            transport,
            previous,
        })
    }

    /// Timeout that will be restored.
    pub const fn previous(&self) -> Option<Duration> {
        self.previous
    }
}

impl<'a> Deref for TimeoutGuard<'a> {
    type Target = dyn Transport + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.transport
    }
}

impl DerefMut for TimeoutGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.transport
    }
}

impl Drop for TimeoutGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.transport.set_read_timeout(self.previous) {
            warn!(error = %e, "failed to restore transport read timeout");
        }
    }
}

impl fmt::Debug for TimeoutGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutGuard")
            .field("installed", &self.transport.read_timeout())
            .field("previous", &self.previous)
            .finish()
    }
}
