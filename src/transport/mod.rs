//! HTTP GET transports shared by the release pipeline.
//!
//! A [`Transport`] performs one GET and hands back the status code plus a
//! one-shot body stream. Two implementations exist:
//!
//! - [`native::NativeTransport`] talks to the network directly via `ureq`.
//! - [`bridged::BridgedTransport`] drives a callback/promise-based host
//!   fetch primitive and blocks the caller until the host answers.
//!
//! Both honour the [`RequestContext`] deadline and cancellation signal and
//! report failures through [`FetchError`], so callers cannot tell them apart.

pub mod bridged;
pub mod native;

use std::io::{self, Cursor, Read};

use crate::context::RequestContext;
use crate::error::{FetchError, Result};

/// Performs a single HTTP GET.
///
/// Implementations must not retry, must return non-2xx statuses as ordinary
/// responses, and must return the context's error promptly once the context
/// is cancelled or its deadline passes.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Issue a GET for `url` under `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a network-class [`FetchError`] when the request cannot be
    /// completed, [`FetchError::DeadlineExceeded`] when the deadline elapses,
    /// and [`FetchError::Cancelled`] when the context is cancelled.
    fn fetch(&self, ctx: &RequestContext, url: &str) -> Result<FetchResponse>;
}

/// Status code and body of a completed GET.
#[derive(Debug)]
pub struct FetchResponse {
    /// HTTP status code, for example `200`.
    pub status: u16,
    /// The response body. Released when closed or dropped.
    pub body: ResponseBody,
}

impl FetchResponse {
    /// Bundle a status code with a body.
    #[must_use]
    pub const fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// A readable byte stream that must release its resources when closed.
///
/// `close` is called exactly once by [`ResponseBody`], either explicitly or
/// on drop, and must not block.
pub trait BodyStream: Read + Send {
    /// Release buffers, connections, or host readers held by the stream.
    fn close(&mut self);
}

impl BodyStream for Cursor<Vec<u8>> {
    fn close(&mut self) {
        self.get_mut().clear();
    }
}

/// One-shot, forward-only response body.
///
/// Reading after [`ResponseBody::close`] fails with "reader is closed".
pub struct ResponseBody {
    inner: Option<Box<dyn BodyStream>>,
}

impl ResponseBody {
    /// Wrap a transport-specific stream.
    #[must_use]
    pub fn new(stream: impl BodyStream + 'static) -> Self {
        Self {
            inner: Some(Box::new(stream)),
        }
    }

    /// A body served from an in-memory buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Read;
    /// use forgefetch::transport::ResponseBody;
    ///
    /// let mut body = ResponseBody::from_bytes(b"hello".to_vec());
    /// let mut out = String::new();
    /// body.read_to_string(&mut out).expect("read body");
    /// assert_eq!(out, "hello");
    /// ```
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(Cursor::new(bytes))
    }

    /// Release the body. Safe to call before the stream is exhausted.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.inner.take() {
            stream.close();
        }
    }
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .as_mut()
            .map_or_else(|| Err(reader_closed()), |stream| stream.read(buf))
    }
}

impl Drop for ResponseBody {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody")
            .field("open", &self.inner.is_some())
            .finish()
    }
}

/// The error returned by reads on a closed body.
pub(crate) fn reader_closed() -> io::Error {
    io::Error::other("net/http: reader is closed")
}

/// Read a response body to the end and release it.
///
/// Read failures are reported as the context's error when the context is
/// done, so a timeout mid-body surfaces as [`FetchError::DeadlineExceeded`]
/// rather than a generic I/O failure.
pub(crate) fn read_body(ctx: &RequestContext, url: &str, mut body: ResponseBody) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let outcome = body.read_to_end(&mut buf);
    body.close();
    match outcome {
        Ok(_) => Ok(buf),
        Err(err) => Err(ctx
            .err()
            .unwrap_or_else(|| FetchError::network(url, err))),
    }
}
