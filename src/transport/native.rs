//! Native transport backed by a blocking `ureq` agent.
//!
//! The remaining time on the request context becomes the request's global
//! timeout, so an elapsed deadline closes the connection inside `ureq`.
//! The request itself and every body read run on helper threads that hand
//! their results over single-slot channels; the caller waits on those in a
//! `select!` together with the context's cancellation and deadline signals
//! and returns the context's error as soon as either fires. A helper whose
//! caller has gone drops the response or reader it holds, which closes the
//! connection.

use std::io::{self, Cursor, Read};
use std::thread;

use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, trace};

use super::{BodyStream, FetchResponse, ResponseBody, Transport, reader_closed};
use crate::context::RequestContext;
use crate::error::{FetchError, Result};

/// Bytes requested from the connection per body read.
const CHUNK_SIZE: usize = 16 * 1024;

/// Outcome of one `ureq` call, as handed over by the request thread.
type CallOutcome = std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error>;

/// Transport for processes with direct socket access.
///
/// # Examples
///
/// ```no_run
/// use forgefetch::context::RequestContext;
/// use forgefetch::transport::Transport;
/// use forgefetch::transport::native::NativeTransport;
///
/// let transport = NativeTransport::new();
/// let response = transport
///     .fetch(&RequestContext::background(), "https://api.github.com/")
///     .expect("request succeeds");
/// assert!(response.is_success());
/// ```
#[derive(Debug)]
pub struct NativeTransport {
    agent: ureq::Agent,
}

impl NativeTransport {
    /// Construct a transport with an agent that reports every status code
    /// as a response rather than an error.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for NativeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for NativeTransport {
    fn fetch(&self, ctx: &RequestContext, url: &str) -> Result<FetchResponse> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        debug!("GET {url}");
        let slot = spawn_call(self.agent.clone(), url, ctx)?;
        let response = wait_on(ctx, url, &slot)?.map_err(|e| map_ureq_error(ctx, url, &e))?;

        let status = response.status().as_u16();
        debug!("GET {url} -> {status}");
        let body = NativeBody::spawn(response.into_body().into_reader(), url, ctx.clone())?;
        Ok(FetchResponse::new(status, ResponseBody::new(body)))
    }
}

/// Issue the GET on a helper thread and return the slot its outcome lands in.
fn spawn_call(agent: ureq::Agent, url: &str, ctx: &RequestContext) -> Result<Receiver<CallOutcome>> {
    let (outcome_tx, slot) = crossbeam_channel::bounded::<CallOutcome>(1);
    let target = url.to_owned();
    let timeout = ctx.remaining();
    thread::Builder::new()
        .name("forgefetch-get".to_owned())
        .spawn(move || {
            let outcome = agent
                .get(target.as_str())
                .config()
                .timeout_global(timeout)
                .build()
                .call();
            if outcome_tx.send(outcome).is_err() {
                trace!("GET {target} finished after the caller gave up");
            }
        })
        .map_err(|e| FetchError::network(url, e))?;
    Ok(slot)
}

/// Block until `slot` delivers or `ctx` is done, whichever happens first.
fn wait_on<T>(ctx: &RequestContext, url: &str, slot: &Receiver<T>) -> Result<T> {
    let cancelled = ctx.cancel_signal();
    let expired = ctx.deadline_signal();
    select! {
        recv(cancelled) -> _ => Err(FetchError::Cancelled),
        recv(expired) -> _ => Err(FetchError::DeadlineExceeded),
        recv(slot) -> delivered => delivered
            .map_err(|_| FetchError::network(url, "request thread exited without a result")),
    }
}

/// Body stream fed by a reader thread; stops waiting once its context is
/// done.
///
/// The reader thread owns the connection. Dropping the chunk receiver makes
/// its next hand-off fail, after which it drops the reader.
struct NativeBody {
    chunks: Option<Receiver<io::Result<Vec<u8>>>>,
    pending: Cursor<Vec<u8>>,
    ctx: RequestContext,
}

impl NativeBody {
    fn spawn(mut reader: ureq::BodyReader<'static>, url: &str, ctx: RequestContext) -> Result<Self> {
        let (chunk_tx, chunks) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("forgefetch-body".to_owned())
            .spawn(move || pump(&mut reader, &chunk_tx))
            .map_err(|e| FetchError::network(url, e))?;
        Ok(Self {
            chunks: Some(chunks),
            pending: Cursor::new(Vec::new()),
            ctx,
        })
    }

    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let Some(chunks) = self.chunks.as_ref() else {
            return Err(reader_closed());
        };
        let cancelled = self.ctx.cancel_signal();
        let expired = self.ctx.deadline_signal();
        let delivered = select! {
            recv(cancelled) -> _ => Err(FetchError::Cancelled),
            recv(expired) -> _ => Err(FetchError::DeadlineExceeded),
            recv(chunks) -> chunk => Ok(chunk.ok()),
        };
        match delivered {
            Ok(Some(Ok(chunk))) => Ok(Some(chunk)),
            Ok(None) => Ok(None),
            Ok(Some(Err(read_err))) => {
                self.chunks = None;
                Err(read_err)
            }
            Err(ctx_err) => {
                self.chunks = None;
                Err(io::Error::other(ctx_err))
            }
        }
    }
}

impl Read for NativeBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let copied = self.pending.read(buf)?;
            if copied > 0 || buf.is_empty() {
                return Ok(copied);
            }
            // A disconnected channel means the reader thread hit the end of
            // the body.
            let Some(chunk) = self.next_chunk()? else {
                return Ok(0);
            };
            self.pending = Cursor::new(chunk);
        }
    }
}

impl BodyStream for NativeBody {
    fn close(&mut self) {
        self.chunks = None;
        self.pending = Cursor::new(Vec::new());
    }
}

/// Copy the body into `chunks` until the end, an error, or the consumer
/// hanging up.
fn pump(reader: &mut impl Read, chunks: &Sender<io::Result<Vec<u8>>>) {
    loop {
        let mut chunk = vec![0; CHUNK_SIZE];
        let handed_over = match reader.read(&mut chunk) {
            Ok(0) => return,
            Ok(filled) => {
                chunk.truncate(filled);
                chunks.send(Ok(chunk)).is_ok()
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => true,
            Err(e) => {
                if chunks.send(Err(e)).is_err() {
                    trace!("body read failed after the caller gave up");
                }
                return;
            }
        };
        if !handed_over {
            trace!("body abandoned; closing connection");
            return;
        }
    }
}

/// Map a `ureq` failure, preferring the context's own error so that an
/// elapsed deadline reads as a timeout rather than an unreachable host.
fn map_ureq_error(ctx: &RequestContext, url: &str, err: &ureq::Error) -> FetchError {
    if let Some(ctx_err) = ctx.err() {
        return ctx_err;
    }
    match err {
        ureq::Error::Timeout(_) => FetchError::DeadlineExceeded,
        other => FetchError::network(url, other),
    }
}
