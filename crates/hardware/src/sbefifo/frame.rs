//! Request framing and reply parsing.
//!
//! A request is a big-endian word stream `[word_count, command, payload...]`.
//! A reply is `[payload..., header, status, ffdc..., offset]` where the last
//! word `offset` counts words backward from the end to `header`, itself
//! included. `header` echoes the command under `0xC0DE` in the high half.

use crate::common::{ProtocolError, split_u64};

use super::command::Command;
use super::ffdc::SbeStatus;

/// High half of every reply header word.
pub const RESPONSE_MAGIC: u32 = 0xC0DE_0000;

/// Smallest valid reply: header, status, offset.
pub const MIN_REPLY_WORDS: usize = 3;

/// Bytes taken by the header, status and offset words.
pub const TRAILER_BYTES: usize = MIN_REPLY_WORDS * 4;

/// A request under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    command: Command,
    payload: Vec<u32>,
}

impl Request {
    /// Starts a request with an empty payload.
    pub const fn new(command: Command) -> Self {
        Self {
            command,
            payload: Vec::new(),
        }
    }

    /// Appends one payload word.
    #[must_use]
    pub fn word(mut self, word: u32) -> Self {
        self.payload.push(word);
        self
    }

    /// Appends a 64-bit quantity as hi, lo words.
    #[must_use]
    pub fn u64(mut self, value: u64) -> Self {
        let (hi, lo) = split_u64(value);
        self.payload.extend([hi, lo]);
        self
    }

    /// Appends raw bytes, zero-padded to a word boundary.
    #[must_use]
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.payload.extend(data.chunks(4).map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(word)
        }));
        self
    }

    /// Command being framed.
    pub const fn command(&self) -> Command {
        self.command
    }

    /// Payload words after the two header words.
    pub fn payload(&self) -> &[u32] {
        &self.payload
    }

    /// Total words including the count and command words.
    pub fn word_count(&self) -> usize {
        self.payload.len() + 2
    }

    /// Serialises the request to big-endian bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let count =
            u32::try_from(self.word_count()).map_err(|_| ProtocolError::Request("too many words"))?;
        let mut out = Vec::with_capacity(self.word_count() * 4);
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&self.command.code().to_be_bytes());
        for word in &self.payload {
            out.extend_from_slice(&word.to_be_bytes());
        }
        Ok(out)
    }

    /// Decodes a request word stream, the inverse of [`encode`](Self::encode).
    pub fn parse(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let words = be_words(bytes)?;
        let [count, code, payload @ ..] = words.as_slice() else {
            return Err(ProtocolError::Request("fewer than two words"));
        };
        if *count as usize != words.len() {
            return Err(ProtocolError::Request("word count does not match length"));
        }
        let command = Command::from_code(*code).ok_or(ProtocolError::Request("unknown command"))?;
        Ok(Self {
            command,
            payload: payload.to_vec(),
        })
    }
}

/// A parsed reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Bytes before the header word.
    pub payload: Vec<u8>,
    /// Status word.
    pub status: SbeStatus,
    /// Bytes between the status word and the offset word.
    pub ffdc: Vec<u8>,
}

/// Parses a raw reply to `command` (a command word).
///
/// Fails without reading out of bounds on short, unaligned, or inconsistent
/// replies.
pub fn parse_reply(raw: &[u8], command: u32) -> Result<Reply, ProtocolError> {
    let words = be_words(raw)?;
    let n = words.len();
    if n < MIN_REPLY_WORDS {
        return Err(ProtocolError::Short { len: raw.len() });
    }

    let offset = words[n - 1];
    let k = offset as usize;
    if !(MIN_REPLY_WORDS..=n).contains(&k) {
        return Err(ProtocolError::BadTrailer { offset, words: n });
    }

    let header_at = n - k;
    let expected = RESPONSE_MAGIC | (command & 0xFFFF);
    let found = words[header_at];
    if found != expected {
        return Err(ProtocolError::HeaderMismatch { expected, found });
    }

    Ok(Reply {
        payload: raw[..header_at * 4].to_vec(),
        status: SbeStatus(words[header_at + 1]),
        ffdc: raw[(header_at + 2) * 4..(n - 1) * 4].to_vec(),
    })
}

/// Builds a reply buffer; the inverse of [`parse_reply`], used by fakes.
pub fn build_reply(command: u32, payload: &[u8], status: SbeStatus, ffdc: &[u8]) -> Vec<u8> {
    let mut out = payload.to_vec();
    out.extend_from_slice(&(RESPONSE_MAGIC | (command & 0xFFFF)).to_be_bytes());
    out.extend_from_slice(&status.0.to_be_bytes());
    out.extend_from_slice(ffdc);
    let offset = (MIN_REPLY_WORDS + ffdc.len() / 4) as u32;
    out.extend_from_slice(&offset.to_be_bytes());
    out
}

/// Splits bytes into big-endian words.
fn be_words(bytes: &[u8]) -> Result<Vec<u32>, ProtocolError> {
    if bytes.len() % 4 != 0 {
        return Err(ProtocolError::Unaligned { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Reads the big-endian word at `index` of a payload.
pub(crate) fn word_at(payload: &[u8], index: usize) -> Option<u32> {
    payload
        .get(index * 4..index * 4 + 4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
}

/// Splits a `[data..., bit_length]` payload, trimming data to the bit length.
pub(crate) fn split_bit_length(payload: &[u8]) -> Result<(Vec<u8>, u32), ProtocolError> {
    if payload.len() < 4 || payload.len() % 4 != 0 {
        return Err(ProtocolError::Length {
            expected: 4,
            found: payload.len(),
        });
    }
    let data_len = payload.len() - 4;
    let bits = word_at(payload, data_len / 4).unwrap_or_default();
    let needed = (bits as usize).div_ceil(8);
    if needed > data_len {
        return Err(ProtocolError::Length {
            expected: needed,
            found: data_len,
        });
    }
    Ok((payload[..needed].to_vec(), bits))
}
