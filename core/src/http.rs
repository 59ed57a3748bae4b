//! HTTP request and response values exchanged with the transport.
//!
//! # Design
//! Requests and responses are plain owned data. Endpoint builders produce an
//! `HttpRequest`, the transport turns it into one wire call, and the reply
//! comes back as an `HttpResponse` the caller owns outright. Nothing here
//! performs I/O, so every rule about headers and URLs is testable without a
//! server.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Error;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP method carried by a request.
///
/// The remote API is invoked with POST for every operation, and the
/// transport does the same whatever this field says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP call described as plain data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub base_url: String,
    pub headers: Vec<(String, String)>,
    pub query_params: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn post(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set a header, replacing any existing header with the same name
    /// regardless of case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Case-insensitive header lookup. With duplicate names the last value
    /// is the one sent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `payload` as the JSON body of this request.
    pub fn with_json_body<B: Serialize + ?Sized>(mut self, payload: &B) -> Result<Self, Error> {
        self.body = serde_json::to_vec(payload)?;
        Ok(self)
    }

    /// URL the request is sent to: the base URL, plus the encoded query
    /// string when query parameters are present.
    pub fn target_url(&self) -> String {
        if self.query_params.is_empty() {
            self.base_url.clone()
        } else {
            add_query_parameters(&self.base_url, &self.query_params)
        }
    }

    /// Headers as they go on the wire, one per name with the last value
    /// winning. A non-empty body without an explicit `Content-Type` is sent
    /// as `application/json`.
    pub fn wire_headers(&self) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = Vec::with_capacity(self.headers.len() + 1);
        for (name, value) in &self.headers {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        if !self.body.is_empty() && self.header(CONTENT_TYPE).is_none() {
            headers.push((CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string()));
        }
        headers
    }
}

/// Append `?` and the form-encoded `params` to `base_url`.
///
/// An empty map still appends the `?`.
pub fn add_query_parameters(base_url: &str, params: &BTreeMap<String, String>) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    format!("{base_url}?{query}")
}

/// An HTTP response described as plain data.
///
/// Header names are stored lower-cased; repeated header fields keep every
/// value in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append_header(name, value);
        self
    }

    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value of the named header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).first().map(String::as_str)
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
