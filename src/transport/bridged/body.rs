//! Body streams for the two host delivery strategies.

use std::io::{self, Read};

use super::host::{HostStreamReader, ReadChunk, Thenable};
use super::wait_for;
use crate::transport::{BodyStream, reader_closed};

/// Sticky terminal state shared by both body strategies.
#[derive(Debug, Clone)]
enum Finished {
    /// End of stream reached; further reads return `Ok(0)`.
    Eof,
    /// The body was closed; further reads fail.
    Closed,
    /// A read failed; further reads repeat the failure.
    Failed(String),
}

impl Finished {
    fn replay(&self) -> io::Result<usize> {
        match self {
            Self::Eof => Ok(0),
            Self::Closed => Err(reader_closed()),
            Self::Failed(message) => Err(io::Error::other(message.clone())),
        }
    }
}

/// Bytes handed over by the host but not yet read by the caller.
#[derive(Debug, Default)]
struct Pending {
    bytes: Vec<u8>,
    offset: usize,
}

impl Pending {
    fn is_drained(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    fn refill(&mut self, bytes: Vec<u8>) {
        self.bytes = bytes;
        self.offset = 0;
    }

    fn copy_into(&mut self, buf: &mut [u8]) -> usize {
        let rest = self.bytes.get(self.offset..).unwrap_or_default();
        let n = rest.len().min(buf.len());
        if let (Some(dst), Some(src)) = (buf.get_mut(..n), rest.get(..n)) {
            dst.copy_from_slice(src);
        }
        self.offset += n;
        n
    }

    fn clear(&mut self) {
        self.bytes = Vec::new();
        self.offset = 0;
    }
}

/// Body backed by the host's incremental stream reader.
pub(super) struct StreamBody {
    reader: Box<dyn HostStreamReader>,
    pending: Pending,
    finished: Option<Finished>,
}

impl StreamBody {
    pub(super) fn new(reader: Box<dyn HostStreamReader>) -> Self {
        Self {
            reader,
            pending: Pending::default(),
            finished: None,
        }
    }

    /// Wait for the next non-empty chunk, or record why there is none.
    fn fill(&mut self) -> Option<Finished> {
        while self.pending.is_drained() {
            match wait_for(self.reader.read()) {
                Ok(ReadChunk { done: true, .. }) => return Some(Finished::Eof),
                Ok(ReadChunk { value, .. }) => self.pending.refill(value),
                Err(err) => return Some(Finished::Failed(err.message().to_owned())),
            }
        }
        None
    }
}

impl Read for StreamBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(finished) = &self.finished {
            return finished.replay();
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(finished) = self.fill() {
            let outcome = finished.replay();
            self.finished = Some(finished);
            return outcome;
        }
        Ok(self.pending.copy_into(buf))
    }
}

impl BodyStream for StreamBody {
    fn close(&mut self) {
        self.reader.cancel();
        self.pending.clear();
        self.finished = Some(Finished::Closed);
    }
}

/// Body for hosts without streaming support: the whole buffer is requested
/// on the first read and served from memory afterwards.
pub(super) struct ArrayBody {
    buffer: Option<Box<dyn Thenable<Vec<u8>>>>,
    pending: Pending,
    finished: Option<Finished>,
}

impl ArrayBody {
    pub(super) fn new(buffer: Box<dyn Thenable<Vec<u8>>>) -> Self {
        Self {
            buffer: Some(buffer),
            pending: Pending::default(),
            finished: None,
        }
    }
}

impl Read for ArrayBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(finished) = &self.finished {
            return finished.replay();
        }
        if buf.is_empty() {
            return Ok(0);
        }
        if let Some(buffer) = self.buffer.take() {
            match wait_for(buffer) {
                Ok(bytes) => self.pending.refill(bytes),
                Err(err) => {
                    let finished = Finished::Failed(err.message().to_owned());
                    let outcome = finished.replay();
                    self.finished = Some(finished);
                    return outcome;
                }
            }
        }
        if self.pending.is_drained() {
            self.pending.clear();
            self.finished = Some(Finished::Eof);
            return Ok(0);
        }
        Ok(self.pending.copy_into(buf))
    }
}

impl BodyStream for ArrayBody {
    fn close(&mut self) {
        self.buffer = None;
        self.pending.clear();
        self.finished = Some(Finished::Closed);
    }
}
