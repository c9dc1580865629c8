//! Transport for hosts that only offer a promise-based fetch primitive.
//!
//! The caller's thread blocks while the host's event loop settles the
//! request. Every host operation gets its own single-slot channel: the
//! fulfilment and rejection continuations each hold a sender, at most one
//! of them fires, and the caller waits on the receiver in a `select!`
//! alongside the context's cancellation and deadline signals. Nothing is
//! polled and no response state is shared outside that hand-off.
//!
//! Once the response arrives, the body strategy is chosen by probing the
//! host response: a streaming reader when one is exposed, otherwise a
//! single whole-buffer request. Both are wrapped in [`ResponseBody`] so
//! downstream code reads them the same way.

mod body;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod host;

use crossbeam_channel::{Receiver, select};
use log::{debug, trace};

use self::body::{ArrayBody, StreamBody};
use self::host::{AbortController, FetchHost, HostError, HostResponse, Thenable};
use super::{FetchResponse, ResponseBody, Transport};
use crate::context::RequestContext;
use crate::error::{FetchError, Result};

/// Outcome delivered through a host operation's slot.
type Settled<T> = std::result::Result<T, HostError>;

/// Transport adapting a [`FetchHost`] to the blocking [`Transport`] contract.
pub struct BridgedTransport<H> {
    host: H,
}

impl<H: FetchHost> BridgedTransport<H> {
    /// Wrap a host fetch capability.
    #[must_use]
    pub const fn new(host: H) -> Self {
        Self { host }
    }

    /// The wrapped host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }
}

impl<H> std::fmt::Debug for BridgedTransport<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgedTransport").finish_non_exhaustive()
    }
}

impl<H: FetchHost> Transport for BridgedTransport<H> {
    fn fetch(&self, ctx: &RequestContext, url: &str) -> Result<FetchResponse> {
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let controller = self.host.new_abort_controller();
        if controller.is_none() {
            trace!("host has no abort controller; {url} cannot be aborted");
        }
        let signal = controller.as_ref().map(AbortController::signal);

        debug!("fetch {url}");
        let slot = settle(self.host.fetch(url, signal), into_fetch_response);

        let cancelled = ctx.cancel_signal();
        let expired = ctx.deadline_signal();
        select! {
            recv(cancelled) -> _ => {
                abort(controller.as_ref());
                Err(FetchError::Cancelled)
            }
            recv(expired) -> _ => {
                abort(controller.as_ref());
                Err(FetchError::DeadlineExceeded)
            }
            recv(slot) -> settled => match settled {
                Ok(Ok(response)) => {
                    debug!("fetch {url} -> {}", response.status);
                    Ok(response)
                }
                Ok(Err(host_err)) => Err(FetchError::Host {
                    message: host_err.describe_fetch_failure(),
                }),
                Err(_) => Err(FetchError::network(url, "host dropped the fetch continuations")),
            },
        }
    }
}

fn abort<C: AbortController>(controller: Option<&C>) {
    if let Some(active) = controller {
        active.abort();
    }
}

/// Pick the body strategy for a settled host response.
///
/// Runs inside the fulfilment continuation, on the host's event loop.
fn into_fetch_response(mut response: Box<dyn HostResponse>) -> FetchResponse {
    let status = response.status();
    let body = response.body_reader().map_or_else(
        || ResponseBody::new(ArrayBody::new(response.array_buffer())),
        |reader| ResponseBody::new(StreamBody::new(reader)),
    );
    FetchResponse::new(status, body)
}

/// Attach continuations to `pending` that deliver its outcome, mapped by
/// `map`, into a fresh single-slot channel.
///
/// If the receiver is gone by the time the host settles, the mapped value
/// is dropped on the event loop, releasing whatever it holds.
fn settle<T, U>(
    pending: Box<dyn Thenable<T>>,
    map: impl FnOnce(T) -> U + Send + 'static,
) -> Receiver<Settled<U>>
where
    T: 'static,
    U: Send + 'static,
{
    let (fulfil_tx, slot) = crossbeam_channel::bounded::<Settled<U>>(1);
    let reject_tx = fulfil_tx.clone();
    pending.then(
        Box::new(move |value| {
            if fulfil_tx.send(Ok(map(value))).is_err() {
                trace!("host operation settled after the caller gave up");
            }
        }),
        Box::new(move |err| {
            if reject_tx.send(Err(err)).is_err() {
                trace!("host operation rejected after the caller gave up");
            }
        }),
    );
    slot
}

/// Block until `pending` settles, with no deadline of its own.
///
/// A host that drops both continuations yields a rejection rather than a
/// hang.
fn wait_for<T: Send + 'static>(pending: Box<dyn Thenable<T>>) -> Settled<T> {
    settle(pending, |value| value)
        .recv()
        .unwrap_or_else(|_| Err(HostError::new("host dropped the pending operation")))
}
