//! Client core for the Pivot Security identity-verification API.
//!
//! # Overview
//! Endpoint builders produce `HttpRequest` values, a `Dispatcher` sends them
//! through a `Transport`, and replies come back as `HttpResponse` values.
//! The dispatcher retries on 429 responses, honoring `X-RateLimit-Reset`,
//! and can run a retrying call on a background thread.
//!
//! # Design
//! - Credentials and limits are injected through `ClientConfig`; the core
//!   never reads the environment on its own.
//! - Error statuses other than 429 are returned as responses. Only transport
//!   failures and an exhausted retry budget are errors.
//! - `Transport` is a trait so the retry logic is testable without a network.

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod transport;

pub use auth::{basic_auth, Credentials, KeyKind};
pub use client::{Endpoint, PivotClient};
pub use config::{ClientConfig, RateLimitPolicy};
pub use dispatcher::{Dispatcher, PendingResponse};
pub use error::{Error, Result, TransportError};
pub use http::{add_query_parameters, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, UreqTransport};
