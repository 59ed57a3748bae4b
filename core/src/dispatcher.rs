//! Sends requests through a transport, retrying on rate limiting.
//!
//! # Design
//! A call is `Pending` until it resolves. A 429 reply moves it to
//! `RateLimited`: the dispatcher sleeps until the time named by
//! `X-RateLimit-Reset` (or for the policy's default delay) and goes back to
//! `Pending`. Any other reply is `Success`, a transport failure is `Failed`,
//! and running out of retries is `RetryExceeded`.
//!
//! Sleeping blocks the calling thread. `send_async` moves the whole retrying
//! call onto a dedicated thread and hands back a `PendingResponse`. There is
//! no cancellation: once started, a call runs until it resolves. A
//! cancellation token checked before each sleep is where one would go.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::oneshot;

use crate::config::RateLimitPolicy;
use crate::error::{Error, Result, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

pub const TOO_MANY_REQUESTS: u16 = 429;
pub const RATE_LIMIT_RESET_HEADER: &str = "X-RateLimit-Reset";

/// Retry bookkeeping for one `send_with_retry` call.
#[derive(Debug)]
struct RetryState {
    attempt: u32,
    next_retry: SystemTime,
}

/// Owns a transport and the rate-limit policy applied to it.
pub struct Dispatcher<T> {
    transport: Arc<T>,
    policy: RateLimitPolicy,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy,
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, policy: RateLimitPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            policy,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One round trip, no retry.
    pub fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        self.transport.send(request)
    }

    /// Send `request`, sleeping and retrying while the API answers 429.
    ///
    /// Non-429 replies, error statuses included, are returned as they are.
    /// After `max_retries` retries a further 429 fails with
    /// `Error::RateLimitExceeded`.
    pub fn send_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut state = RetryState {
            attempt: 0,
            next_retry: SystemTime::now(),
        };

        loop {
            let response = self.send(request)?;
            if response.status != TOO_MANY_REQUESTS {
                if state.attempt > 0 {
                    tracing::debug!(
                        retries = state.attempt,
                        status = response.status,
                        "request succeeded after rate limiting"
                    );
                }
                return Ok(response);
            }

            if state.attempt >= self.policy.max_retries {
                return Err(Error::RateLimitExceeded {
                    attempts: state.attempt + 1,
                });
            }
            state.attempt += 1;
            state.next_retry = wake_time(&response, self.policy.default_delay);

            let wait = state
                .next_retry
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO);
            tracing::debug!(
                retry = state.attempt,
                max_retries = self.policy.max_retries,
                wait_ms = wait.as_millis() as u64,
                url = %request.base_url,
                "rate limited, waiting before retry"
            );
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
    }
}

impl<T: Transport + 'static> Dispatcher<T> {
    /// Run `send_with_retry` on a new thread.
    ///
    /// Returns immediately. The handle resolves to exactly one result.
    /// Dropping it does not stop the thread.
    pub fn send_async(&self, request: HttpRequest) -> PendingResponse {
        let (tx, rx) = oneshot::channel();
        let dispatcher = self.clone();

        let spawned = std::thread::Builder::new()
            .name("pivot-request".to_string())
            .spawn(move || {
                let result = dispatcher.send_with_retry(&request);
                // The receiver may already be gone.
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            // `tx` went down with the closure, so the handle reports Abandoned.
            tracing::error!(error = %e, "failed to spawn request thread");
        }

        PendingResponse { rx: Some(rx) }
    }
}

/// When to retry after a 429: the `X-RateLimit-Reset` Unix timestamp when it
/// parses, otherwise `default_delay` from now.
fn wake_time(response: &HttpResponse, default_delay: Duration) -> SystemTime {
    let reset = response
        .header(RATE_LIMIT_RESET_HEADER)
        .and_then(|value| value.trim().parse::<i64>().ok());
    match reset {
        Some(secs) if secs > 0 => UNIX_EPOCH + Duration::from_secs(secs as u64),
        Some(_) => UNIX_EPOCH,
        None => SystemTime::now() + default_delay,
    }
}

/// Handle to a request running on a background thread.
///
/// Resolves exactly once, to the response or to the error that ended the
/// call. It can be awaited, waited on, or polled. Once the result has been
/// handed out, further queries report `Error::Abandoned`.
#[derive(Debug)]
pub struct PendingResponse {
    rx: Option<oneshot::Receiver<Result<HttpResponse>>>,
}

impl PendingResponse {
    /// Block until the call resolves.
    ///
    /// Must not be called from inside an async runtime; `.await` the handle
    /// there instead.
    pub fn wait(self) -> Result<HttpResponse> {
        match self.rx {
            Some(rx) => rx.blocking_recv().unwrap_or_else(|_| Err(Error::Abandoned)),
            None => Err(Error::Abandoned),
        }
    }

    /// The result if the call has resolved. Yields `Some` at most once.
    pub fn try_result(&mut self) -> Option<Result<HttpResponse>> {
        let rx = self.rx.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(Error::Abandoned),
        };
        self.rx = None;
        Some(result)
    }
}

impl Future for PendingResponse {
    type Output = Result<HttpResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(Error::Abandoned));
        };
        let received = match Pin::new(rx).poll(cx) {
            Poll::Ready(received) => received,
            Poll::Pending => return Poll::Pending,
        };
        self.rx = None;
        Poll::Ready(received.unwrap_or_else(|_| Err(Error::Abandoned)))
    }
}
