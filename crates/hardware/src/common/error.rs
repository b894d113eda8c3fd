//! Error taxonomy for topology, dispatch, and SBE FIFO operations.
//!
//! This module defines the crate-wide error type. It provides:
//! 1. **Configuration errors:** Malformed or missing description properties, fatal at load time.
//! 2. **Probe errors:** Absent hardware, escalated only for must-exist targets.
//! 3. **Protocol errors:** Malformed SBE FIFO replies, reported without guessing.
//! 4. **SBE status errors:** Non-zero status words carrying primary/secondary codes.
//! 5. **Transport and retry errors:** I/O failures and exhausted busy-poll loops.

use std::io;

use thiserror::Error;

use crate::sbefifo::ffdc::SbeStatus;
use crate::target::Status;

/// Result type alias for topology and SBE FIFO operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while locating targets or exchanging SBE FIFO frames.
#[derive(Debug, Error)]
pub enum Error {
    /// The topology description or a target property is malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A probe hook reported the unit as absent.
    #[error("target {path} is not present: {reason}")]
    ProbeFailed {
        /// Path of the probed target.
        path: String,
        /// Reason reported by the probe hook.
        reason: String,
    },

    /// A target marked must-exist failed to probe.
    #[error("target {path} must exist but is {status}")]
    MissingTarget {
        /// Path of the target.
        path: String,
        /// Status the probe settled on.
        status: Status,
    },

    /// An SBE FIFO reply could not be parsed.
    #[error("SBE FIFO protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The SBE answered with a non-zero status word.
    #[error("SBE command {command:#06x} failed: {status} ({ffdc_len} bytes of FFDC)")]
    Sbe {
        /// Command word of the failed request.
        command: u32,
        /// Decoded status word.
        status: SbeStatus,
        /// Length of the FFDC blob retained by the session.
        ffdc_len: usize,
    },

    /// The underlying channel failed.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    /// The transport did not deliver a reply within its read timeout.
    #[error("transport timed out after {millis} ms")]
    Timeout {
        /// Timeout that elapsed, in milliseconds.
        millis: u64,
    },

    /// A bounded busy-poll never observed the expected state.
    #[error("{operation} did not complete after {attempts} attempts")]
    RetryExhausted {
        /// Operation that was polled.
        operation: &'static str,
        /// Number of polls made.
        attempts: u32,
    },

    /// An indirect SCOM completed with its error bits set.
    #[error("indirect SCOM {addr:#018x} failed with status {status:#018x}")]
    IndirectScom {
        /// Indirect address that was accessed.
        addr: u64,
        /// Final indirect status word.
        status: u64,
    },

    /// The target that would service an access is not enabled.
    #[error("target {path} is {status}, not enabled")]
    NotEnabled {
        /// Path of the capability-bearing target.
        path: String,
        /// Its current status.
        status: Status,
    },

    /// No ancestor of the start target provides the capability.
    #[error("no {capability} capability at or above {path}")]
    NoCapability {
        /// Path of the start target.
        path: String,
        /// Capability that was requested.
        capability: &'static str,
    },

    /// `find_by_path` found nothing at the path.
    #[error("no target at {0}")]
    PathNotFound(String),

    /// A sibling with the same name and unit address already exists.
    #[error("duplicate target {name} under {parent}")]
    DuplicateTarget {
        /// Path of the parent.
        parent: String,
        /// Display name of the rejected child.
        name: String,
    },

    /// The target's driver is already servicing a call further up the stack.
    #[error("target {0} is busy")]
    TargetBusy(String),

    /// The property store does not accept writes.
    #[error("property {key} on {path} is read-only")]
    ReadOnlyProperty {
        /// Path of the target.
        path: String,
        /// Property name.
        key: String,
    },

    /// A caller-supplied argument is out of range for the operation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Framing faults detected while parsing an SBE FIFO reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Fewer than three words were received.
    #[error("short reply of {len} bytes")]
    Short {
        /// Reply length in bytes.
        len: usize,
    },

    /// The reply length is not a whole number of words.
    #[error("reply length {len} is not word aligned")]
    Unaligned {
        /// Reply length in bytes.
        len: usize,
    },

    /// The trailing offset word points outside the reply.
    #[error("trailer offset {offset} invalid for a {words}-word reply")]
    BadTrailer {
        /// Offset word value.
        offset: u32,
        /// Reply length in words.
        words: usize,
    },

    /// The echoed header does not match the request.
    #[error("expected header {expected:#010x}, found {found:#010x}")]
    HeaderMismatch {
        /// Header derived from the request.
        expected: u32,
        /// Header found in the reply.
        found: u32,
    },

    /// The command-specific payload has the wrong size.
    #[error("expected {expected} payload bytes, found {found}")]
    Length {
        /// Expected payload length.
        expected: usize,
        /// Received payload length.
        found: usize,
    },

    /// A request word stream could not be decoded.
    #[error("malformed request: {0}")]
    Request(&'static str),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Creates an invalid-argument error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Returns `true` when the error only reports an absent unit.
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, Self::ProbeFailed { .. })
    }
}
