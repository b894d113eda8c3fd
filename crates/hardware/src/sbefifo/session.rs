//! SBE FIFO session.
//!
//! A session owns one transport and the FFDC retained from its most recent
//! failed operation. Every operation:
//! 1. **Clears FFDC** so stale diagnostics are never attributed to it.
//! 2. **Frames** the request and sizes the reply buffer for payload plus FFDC.
//! 3. **Exchanges** it, under the long read timeout for long-running commands.
//! 4. **Parses** the reply, keeping FFDC and returning `Error::Sbe` on non-zero status.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, trace};

use crate::common::{Error, Result};
use crate::config::SbefifoConfig;

use super::ffdc::Ffdc;
use super::frame::{Request, TRAILER_BYTES, parse_reply};
use super::transport::{FdTransport, TimeoutGuard, Transport};

/// A connected SBE FIFO channel.
pub struct Session {
    transport: Box<dyn Transport>,
    ffdc: Option<Ffdc>,
    long_timeout: Duration,
    max_ffdc: usize,
    max_reply: usize,
}

impl Session {
    /// Opens the SBE FIFO device node at `path`.
    pub fn connect(path: impl AsRef<Path>, config: &SbefifoConfig) -> Result<Self> {
        let path = path.as_ref();
        let transport = FdTransport::open(path, config.read_timeout())?;
        debug!(device = %path.display(), "connected SBE FIFO");
        Ok(Self::with_transport(Box::new(transport), config))
    }

    /// Wraps an existing transport.
    pub fn with_transport(transport: Box<dyn Transport>, config: &SbefifoConfig) -> Self {
        Self {
            transport,
            ffdc: None,
            long_timeout: config.long_timeout(),
            max_ffdc: config.max_ffdc_bytes,
            max_reply: config.max_reply_bytes,
        }
    }

    /// Closes the channel, dropping any retained FFDC.
    pub fn disconnect(self) {
        debug!(ffdc = self.ffdc.is_some(), "disconnected SBE FIFO");
    }

    /// FFDC from the most recent operation, if it failed with a non-zero status.
    pub const fn ffdc(&self) -> Option<&Ffdc> {
        self.ffdc.as_ref()
    }

    /// Takes the retained FFDC.
    pub fn take_ffdc(&mut self) -> Option<Ffdc> {
        self.ffdc.take()
    }

    /// Read timeout installed around long-running commands.
    pub const fn long_timeout(&self) -> Duration {
        self.long_timeout
    }

    /// Largest reply the session will accept.
    pub const fn max_reply(&self) -> usize {
        self.max_reply
    }

    /// The underlying transport.
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Runs one request and returns the reply payload.
    ///
    /// `expected` is the payload size the caller anticipates; the reply buffer
    /// adds room for the trailer and FFDC, capped at the session maximum.
    pub fn operation(&mut self, request: &Request, expected: usize) -> Result<Vec<u8>> {
        self.ffdc = None;

        let command = request.command();
        let bytes = request.encode()?;
        let capacity = expected
            .saturating_add(TRAILER_BYTES + self.max_ffdc)
            .min(self.max_reply);
        trace!(%command, words = request.word_count(), capacity, "sbefifo request");

        let raw = if command.is_long_running() {
            let mut guard = TimeoutGuard::install(self.transport.as_mut(), self.long_timeout)?;
            guard.exchange(&bytes, capacity)?
        } else {
            self.transport.exchange(&bytes, capacity)?
        };
        trace!(%command, bytes = raw.len(), "sbefifo reply");

        let reply = parse_reply(&raw, command.code())?;
        if !reply.status.is_success() {
            let ffdc_len = reply.ffdc.len();
            debug!(%command, status = %reply.status, ffdc_len, "SBE reported failure");
            self.ffdc = Some(Ffdc {
                status: reply.status,
                data: reply.ffdc,
            });
            return Err(Error::Sbe {
                command: command.code(),
                status: reply.status,
                ffdc_len,
            });
        }
        Ok(reply.payload)
    }

    /// Runs a request whose reply carries no payload.
    pub(crate) fn operation_no_reply(&mut self, request: &Request) -> Result<()> {
        let payload = self.operation(request, 0)?;
        expect_len(&payload, 0)?;
        Ok(())
    }

    /// Checks that a byte count fits the reply limit.
    pub(crate) fn check_reply_size(&self, len: usize) -> Result<()> {
        if len.saturating_add(TRAILER_BYTES) > self.max_reply {
            return Err(Error::invalid(format!(
                "reply of {len} bytes exceeds the {} byte limit",
                self.max_reply
            )));
        }
        Ok(())
    }
}

/// Fails with `ProtocolError::Length` unless `payload` is `expected` bytes.
pub(crate) fn expect_len(payload: &[u8], expected: usize) -> Result<()> {
    if payload.len() == expected {
        Ok(())
    } else {
        Err(crate::common::ProtocolError::Length {
            expected,
            found: payload.len(),
        }
        .into())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("ffdc", &self.ffdc.as_ref().map(Ffdc::len))
            .field("long_timeout", &self.long_timeout)
            .field("max_ffdc", &self.max_ffdc)
            .field("max_reply", &self.max_reply)
            .finish_non_exhaustive()
    }
}
