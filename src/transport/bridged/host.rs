//! Abstractions over a promise-based host fetch primitive.
//!
//! These traits mirror the handful of host objects the bridged transport
//! touches: the global `fetch` function, the optional abort controller, the
//! response object, its streaming body reader, and the error values used to
//! reject promises. The embedding glue implements them; the transport never
//! sees host values directly.
//!
//! Continuations are fired from the host's event loop, which is a different
//! thread of control from the caller blocked in the transport.

/// A one-shot continuation fired from the host event loop.
pub type Continuation<T> = Box<dyn FnOnce(T) + Send>;

/// A pending host operation that settles exactly once.
///
/// Implementations must invoke at most one of the two continuations, and
/// may drop both without calling either (for example when the host is torn
/// down); the transport treats that as a failure rather than waiting forever.
pub trait Thenable<T>: Send {
    /// Attach the fulfilment and rejection continuations.
    fn then(self: Box<Self>, on_fulfilled: Continuation<T>, on_rejected: Continuation<HostError>);
}

/// A host cancellation controller whose signal is passed to `fetch`.
pub trait AbortController: Send {
    /// The signal type accepted by [`FetchHost::fetch`].
    type Signal;

    /// The signal to pass into the request options.
    fn signal(&self) -> Self::Signal;

    /// Abort every request that was issued with this controller's signal.
    fn abort(&self);
}

/// The host environment's fetch capability.
pub trait FetchHost: Send + Sync {
    /// Signal type produced by the host's abort controller.
    type Signal;
    /// Abort controller type offered by the host.
    type Controller: AbortController<Signal = Self::Signal>;

    /// Construct an abort controller, or `None` when the host lacks one.
    fn new_abort_controller(&self) -> Option<Self::Controller>;

    /// Start a GET request for `url`.
    fn fetch(&self, url: &str, signal: Option<Self::Signal>) -> Box<dyn Thenable<Box<dyn HostResponse>>>;
}

/// A settled host response.
pub trait HostResponse: Send {
    /// The HTTP status code.
    fn status(&self) -> u16;

    /// A streaming reader for the body, or `None` when the host exposes no
    /// readable stream (the body is absent or null).
    fn body_reader(&mut self) -> Option<Box<dyn HostStreamReader>>;

    /// Request the entire body as one buffer.
    fn array_buffer(self: Box<Self>) -> Box<dyn Thenable<Vec<u8>>>;
}

/// A host streaming body reader.
pub trait HostStreamReader: Send {
    /// Request the next chunk.
    fn read(&mut self) -> Box<dyn Thenable<ReadChunk>>;

    /// Cancel the stream. Errors are ignored by the host glue.
    fn cancel(&mut self);
}

/// One result from [`HostStreamReader::read`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadChunk {
    /// True once the stream has been fully consumed.
    pub done: bool,
    /// The delivered bytes; empty when `done` is set.
    pub value: Vec<u8>,
}

impl ReadChunk {
    /// A chunk carrying `value`.
    #[must_use]
    pub const fn bytes(value: Vec<u8>) -> Self {
        Self { done: false, value }
    }

    /// The end-of-stream marker.
    #[must_use]
    pub const fn done() -> Self {
        Self {
            done: true,
            value: Vec::new(),
        }
    }
}

/// An error value used by the host to reject a promise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    message: String,
    cause: Option<HostErrorCause>,
}

/// The optional cause attached to a [`HostError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostErrorCause {
    /// Another error object.
    Error(Box<HostError>),
    /// A bare string.
    Text(String),
    /// A value with no useful string form.
    Opaque,
}

impl HostError {
    /// An error with the given string form and no cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach a cause.
    #[must_use]
    pub fn with_cause(mut self, cause: HostErrorCause) -> Self {
        self.cause = Some(cause);
        self
    }

    /// The error's own string form.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&HostErrorCause> {
        self.cause.as_ref()
    }

    /// Render the error for a failed `fetch`, appending the cause's string
    /// form one level deep. Deeper causes are not traversed.
    ///
    /// # Examples
    ///
    /// ```
    /// use forgefetch::transport::bridged::host::{HostError, HostErrorCause};
    ///
    /// let err = HostError::new("TypeError: Failed to fetch")
    ///     .with_cause(HostErrorCause::Text("blocked by CORS".to_owned()));
    /// assert_eq!(
    ///     err.describe_fetch_failure(),
    ///     "fetch() failed: TypeError: Failed to fetch: blocked by CORS"
    /// );
    /// ```
    #[must_use]
    pub fn describe_fetch_failure(&self) -> String {
        let mut out = format!("fetch() failed: {}", self.message);
        match &self.cause {
            Some(HostErrorCause::Error(cause)) => {
                out.push_str(": ");
                out.push_str(&cause.message);
            }
            Some(HostErrorCause::Text(text)) => {
                out.push_str(": ");
                out.push_str(text);
            }
            Some(HostErrorCause::Opaque) | None => {}
        }
        out
    }
}
