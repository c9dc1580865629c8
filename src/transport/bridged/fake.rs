//! Scripted in-process host for exercising the bridged transport.
//!
//! [`FakeHost`] runs its own event loop thread and settles every promise
//! from that thread, so callers observe the same cross-thread hand-off they
//! would get from a real host. Replies are scripted per URL.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::Sender;

use super::host::{
    AbortController, Continuation, FetchHost, HostError, HostResponse, HostStreamReader, ReadChunk,
    Thenable,
};

type Task = Box<dyn FnOnce() + Send>;

/// How the fake host answers one `fetch` call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Respond with a streaming body delivered in the given chunks,
    /// optionally failing after the last chunk instead of finishing.
    Stream {
        /// HTTP status code.
        status: u16,
        /// Chunks delivered in order by successive reads.
        chunks: Vec<Vec<u8>>,
        /// Rejection delivered after the chunks, in place of `done`.
        error: Option<HostError>,
    },
    /// Respond without a readable stream; the body is only available as a
    /// whole buffer.
    WholeBuffer {
        /// HTTP status code.
        status: u16,
        /// The full body.
        bytes: Vec<u8>,
    },
    /// Reject the fetch promise.
    Reject(HostError),
    /// Never settle unless the request is aborted.
    Hang,
}

impl FakeReply {
    /// A streaming reply split into chunks of at most `chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn streamed(status: u16, bytes: &[u8], chunk_size: usize) -> Self {
        Self::Stream {
            status,
            chunks: bytes.chunks(chunk_size).map(<[u8]>::to_vec).collect(),
            error: None,
        }
    }

    /// A whole-buffer reply.
    #[must_use]
    pub fn buffered(status: u16, bytes: &[u8]) -> Self {
        Self::WholeBuffer {
            status,
            bytes: bytes.to_vec(),
        }
    }
}

/// Counters describing what the fake host observed.
#[derive(Debug, Default)]
pub struct FakeHostLog {
    fetches: AtomicUsize,
    aborts: AtomicUsize,
    reader_cancels: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl FakeHostLog {
    /// Number of `fetch` calls.
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of abort controller invocations.
    #[must_use]
    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }

    /// Number of stream reader cancellations.
    #[must_use]
    pub fn reader_cancels(&self) -> usize {
        self.reader_cancels.load(Ordering::SeqCst)
    }

    /// URLs requested, in call order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An in-process host with a dedicated event loop thread.
pub struct FakeHost {
    events: Sender<Task>,
    replies: Mutex<HashMap<String, VecDeque<FakeReply>>>,
    abort_supported: bool,
    log: Arc<FakeHostLog>,
    parked: Arc<Mutex<Vec<Task>>>,
}

impl FakeHost {
    /// A host that offers an abort controller.
    #[must_use]
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A host without an abort controller.
    #[must_use]
    pub fn without_abort_controller() -> Self {
        Self::build(false)
    }

    fn build(abort_supported: bool) -> Self {
        let (events, queue) = crossbeam_channel::unbounded::<Task>();
        std::thread::spawn(move || {
            for task in queue {
                task();
            }
        });
        Self {
            events,
            replies: Mutex::new(HashMap::new()),
            abort_supported,
            log: Arc::new(FakeHostLog::default()),
            parked: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply for the next request to `url`.
    #[must_use]
    pub fn reply(self, url: impl Into<String>, reply: FakeReply) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(url.into())
            .or_default()
            .push_back(reply);
        self
    }

    /// What the host has observed so far.
    #[must_use]
    pub fn log(&self) -> Arc<FakeHostLog> {
        Arc::clone(&self.log)
    }

    fn next_reply(&self, url: &str) -> FakeReply {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                FakeReply::Reject(HostError::new(format!("TypeError: no reply scripted for {url}")))
            })
    }

    fn promise<T: Send + 'static>(&self, settlement: Settlement<T>) -> Box<dyn Thenable<T>> {
        Box::new(FakePromise {
            events: self.events.clone(),
            settlement,
            parked: Arc::clone(&self.parked),
        })
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchHost for FakeHost {
    type Signal = FakeSignal;
    type Controller = FakeAbortController;

    fn new_abort_controller(&self) -> Option<Self::Controller> {
        self.abort_supported.then(|| FakeAbortController {
            signal: FakeSignal::default(),
            events: self.events.clone(),
            log: Arc::clone(&self.log),
        })
    }

    fn fetch(&self, url: &str, signal: Option<FakeSignal>) -> Box<dyn Thenable<Box<dyn HostResponse>>> {
        self.log.fetches.fetch_add(1, Ordering::SeqCst);
        self.log
            .urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_owned());

        let settlement = match self.next_reply(url) {
            FakeReply::Stream {
                status,
                chunks,
                error,
            } => Settlement::Fulfil(Box::new(FakeResponse {
                status,
                body: FakeBody::Stream { chunks, error },
                events: self.events.clone(),
                parked: Arc::clone(&self.parked),
                log: Arc::clone(&self.log),
            }) as Box<dyn HostResponse>),
            FakeReply::WholeBuffer { status, bytes } => Settlement::Fulfil(Box::new(FakeResponse {
                status,
                body: FakeBody::Buffer(bytes),
                events: self.events.clone(),
                parked: Arc::clone(&self.parked),
                log: Arc::clone(&self.log),
            }) as Box<dyn HostResponse>),
            FakeReply::Reject(err) => Settlement::Reject(err),
            FakeReply::Hang => Settlement::Hang(signal),
        };
        self.promise(settlement)
    }
}

/// Abort signal shared between a controller and the requests it governs.
#[derive(Clone, Default)]
pub struct FakeSignal {
    listeners: Arc<Mutex<Vec<Task>>>,
}

impl FakeSignal {
    fn on_abort(&self, listener: Task) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}

/// Abort controller handed out by [`FakeHost`].
pub struct FakeAbortController {
    signal: FakeSignal,
    events: Sender<Task>,
    log: Arc<FakeHostLog>,
}

impl AbortController for FakeAbortController {
    type Signal = FakeSignal;

    fn signal(&self) -> FakeSignal {
        self.signal.clone()
    }

    fn abort(&self) {
        self.log.aborts.fetch_add(1, Ordering::SeqCst);
        let listeners = std::mem::take(
            &mut *self
                .signal
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for listener in listeners {
            post(&self.events, listener);
        }
    }
}

enum Settlement<T> {
    Fulfil(T),
    Reject(HostError),
    Hang(Option<FakeSignal>),
}

struct FakePromise<T> {
    events: Sender<Task>,
    settlement: Settlement<T>,
    parked: Arc<Mutex<Vec<Task>>>,
}

impl<T: Send + 'static> Thenable<T> for FakePromise<T> {
    fn then(self: Box<Self>, on_fulfilled: Continuation<T>, on_rejected: Continuation<HostError>) {
        let Self {
            events,
            settlement,
            parked,
        } = *self;
        match settlement {
            Settlement::Fulfil(value) => post(&events, Box::new(move || on_fulfilled(value))),
            Settlement::Reject(err) => post(&events, Box::new(move || on_rejected(err))),
            Settlement::Hang(Some(signal)) => signal.on_abort(Box::new(move || {
                on_rejected(HostError::new("AbortError: signal is aborted without reason"));
            })),
            Settlement::Hang(None) => {
                // Keep the continuations alive without ever firing them.
                parked
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Box::new(move || drop((on_fulfilled, on_rejected))));
            }
        }
    }
}

fn post(events: &Sender<Task>, task: Task) {
    if events.send(task).is_err() {
        log::trace!("fake host event loop has stopped");
    }
}

enum FakeBody {
    Stream {
        chunks: Vec<Vec<u8>>,
        error: Option<HostError>,
    },
    Buffer(Vec<u8>),
}

struct FakeResponse {
    status: u16,
    body: FakeBody,
    events: Sender<Task>,
    parked: Arc<Mutex<Vec<Task>>>,
    log: Arc<FakeHostLog>,
}

impl HostResponse for FakeResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn body_reader(&mut self) -> Option<Box<dyn HostStreamReader>> {
        match &mut self.body {
            FakeBody::Stream { chunks, error } => Some(Box::new(FakeStreamReader {
                chunks: std::mem::take(chunks).into(),
                error: error.take(),
                cancelled: false,
                events: self.events.clone(),
                parked: Arc::clone(&self.parked),
                log: Arc::clone(&self.log),
            })),
            FakeBody::Buffer(_) => None,
        }
    }

    fn array_buffer(self: Box<Self>) -> Box<dyn Thenable<Vec<u8>>> {
        let Self {
            body,
            events,
            parked,
            ..
        } = *self;
        let settlement = match body {
            FakeBody::Buffer(bytes) => Settlement::Fulfil(bytes),
            FakeBody::Stream { chunks, .. } => Settlement::Fulfil(chunks.concat()),
        };
        Box::new(FakePromise {
            events,
            settlement,
            parked,
        })
    }
}

struct FakeStreamReader {
    chunks: VecDeque<Vec<u8>>,
    error: Option<HostError>,
    cancelled: bool,
    events: Sender<Task>,
    parked: Arc<Mutex<Vec<Task>>>,
    log: Arc<FakeHostLog>,
}

impl HostStreamReader for FakeStreamReader {
    fn read(&mut self) -> Box<dyn Thenable<ReadChunk>> {
        let settlement = if self.cancelled {
            Settlement::Fulfil(ReadChunk::done())
        } else if let Some(chunk) = self.chunks.pop_front() {
            Settlement::Fulfil(ReadChunk::bytes(chunk))
        } else if let Some(err) = self.error.take() {
            Settlement::Reject(err)
        } else {
            Settlement::Fulfil(ReadChunk::done())
        };
        Box::new(FakePromise {
            events: self.events.clone(),
            settlement,
            parked: Arc::clone(&self.parked),
        })
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.chunks.clear();
        self.log.reader_cancels.fetch_add(1, Ordering::SeqCst);
    }
}
