//! One network round trip per call.
//!
//! # Design
//! `Transport` is the seam between the dispatcher and the network: the
//! dispatcher owns retry policy, a transport owns exactly one request and
//! its reply. Tests substitute scripted transports; `UreqTransport` is the
//! blocking HTTP implementation used in production.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Performs a single HTTP round trip.
///
/// HTTP error statuses are successful round trips and must come back as
/// `Ok(HttpResponse)`; only failures to complete the exchange are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// `timeout` bounds each round trip, connect through body read.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        // The API takes every call as POST; other methods are flagged, not honored.
        if request.method != HttpMethod::Post {
            tracing::warn!(
                method = request.method.as_str(),
                url = %request.base_url,
                "request method ignored, sending as POST"
            );
        }

        let url = request.target_url();
        let mut builder = self.agent.post(&url);
        for (name, value) in request.wire_headers() {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let sent = if request.body.is_empty() {
            builder.send_empty()
        } else {
            builder.send(&request.body[..])
        };
        let mut response = sent.map_err(map_ureq_error)?;

        let mut parsed = HttpResponse::new(response.status().as_u16(), String::new());
        for (name, value) in response.headers() {
            parsed.append_header(name.as_str(), String::from_utf8_lossy(value.as_bytes()));
        }
        // The connection goes back to the agent when `response` drops, on
        // the error path as well.
        parsed.body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::debug!(status = parsed.status, %url, "round trip complete");
        Ok(parsed)
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    let message = err.to_string();
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(message),
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::Timeout(message)
        }
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed | ureq::Error::Io(_) => {
            TransportError::Connection(message)
        }
        ureq::Error::Tls(_) => TransportError::Tls(message),
        ureq::Error::BadUri(_) => TransportError::InvalidUrl(message),
        _ => TransportError::Other(message),
    }
}
