//! Request builders and senders for every Pivot Security operation.
//!
//! # Design
//! Each operation is split the same way as the rest of the crate: a
//! `build_*` method produces an `HttpRequest` without touching the network,
//! and a method of the operation's own name sends that request once through
//! the dispatcher. Callers who want rate-limit tolerance pass a built request
//! to `send_with_retry` or `send_async` instead.
//!
//! Bodies are encoded with `serde_json`, so caller-supplied fields may carry
//! quotes, backslashes, or control characters.

use serde_json::{json, Value};

use crate::auth::{Credentials, KeyKind};
use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, PendingResponse};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

/// The remote operations, with their path under `/api/` and signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Create,
    Info,
    RiskScore,
    UpdateRiskScore,
    QrCode,
    AuthCode,
    Logs,
    Lock,
    Unlock,
    TrainMl,
    TestMl,
    AuthWithMetadata,
    SendAuthWithMetadata,
    VerifyWithMetadata,
    VerifySession,
    CustomerCreate,
    CustomerAuth,
    CustomerVerify,
}

impl Endpoint {
    pub const ALL: [Endpoint; 18] = [
        Endpoint::Create,
        Endpoint::Info,
        Endpoint::RiskScore,
        Endpoint::UpdateRiskScore,
        Endpoint::QrCode,
        Endpoint::AuthCode,
        Endpoint::Logs,
        Endpoint::Lock,
        Endpoint::Unlock,
        Endpoint::TrainMl,
        Endpoint::TestMl,
        Endpoint::AuthWithMetadata,
        Endpoint::SendAuthWithMetadata,
        Endpoint::VerifyWithMetadata,
        Endpoint::VerifySession,
        Endpoint::CustomerCreate,
        Endpoint::CustomerAuth,
        Endpoint::CustomerVerify,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Create => "account/create",
            Endpoint::Info => "account/info",
            Endpoint::RiskScore => "account/riskscore",
            Endpoint::UpdateRiskScore => "account/updateriskscore",
            Endpoint::QrCode => "account/qrcode",
            Endpoint::AuthCode => "account/authcode",
            Endpoint::Logs => "account/logs",
            Endpoint::Lock => "account/lock",
            Endpoint::Unlock => "account/unlock",
            Endpoint::TrainMl => "account/trainml",
            Endpoint::TestMl => "account/testml",
            Endpoint::AuthWithMetadata => "account/authwithmetadata",
            Endpoint::SendAuthWithMetadata => "account/sendauthwithmetadata",
            Endpoint::VerifyWithMetadata => "account/verifywithmetadata",
            Endpoint::VerifySession => "account/verifysession",
            Endpoint::CustomerCreate => "customer/create",
            Endpoint::CustomerAuth => "customer/auth",
            Endpoint::CustomerVerify => "customer/verify",
        }
    }

    /// Account operations are signed with the private key, customer
    /// operations with the public one.
    pub fn key_kind(self) -> KeyKind {
        match self {
            Endpoint::CustomerCreate | Endpoint::CustomerAuth | Endpoint::CustomerVerify => {
                KeyKind::Public
            }
            _ => KeyKind::Private,
        }
    }
}

/// Client for the Pivot Security API.
pub struct PivotClient<T = UreqTransport> {
    dispatcher: Dispatcher<T>,
    api_url: String,
    credentials: Credentials,
    subuser: Option<String>,
    user_agent: String,
}

impl PivotClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::new(config.timeout);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> PivotClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let api_url = config.api_url();
        Self {
            dispatcher: Dispatcher::new(transport, config.rate_limit),
            api_url,
            credentials: config.credentials,
            subuser: config.subuser,
            user_agent: config.user_agent,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    /// A bodiless request for `path` carrying the standard headers.
    ///
    /// `path` is relative to `<host>/api/`, e.g. `account/info`.
    pub fn request(&self, path: &str, key: KeyKind) -> HttpRequest {
        let mut request = HttpRequest::post(format!(
            "{}/{}",
            self.api_url,
            path.trim_start_matches('/')
        ))
        .with_header("Authorization", self.credentials.authorization(key))
        .with_header("User-Agent", self.user_agent.as_str())
        .with_header("Accept", "application/json");
        if let Some(subuser) = &self.subuser {
            request.set_header("On-Behalf-Of", subuser.as_str());
        }
        request
    }

    fn build(&self, endpoint: Endpoint, uid: &str, email: &str, extra: Option<(&str, &str)>) -> HttpRequest {
        let mut body = json!({ "uid": uid, "email": email });
        if let Some((field, value)) = extra {
            body[field] = Value::from(value);
        }
        self.request(endpoint.path(), endpoint.key_kind())
            .with_body(body.to_string())
    }

    /// One round trip, no retry.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        Ok(self.dispatcher.send(request)?)
    }

    pub fn send_with_retry(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.dispatcher.send_with_retry(request)
    }

    pub fn build_create(&self, uid: &str, email: &str, channel: &str) -> HttpRequest {
        self.build(Endpoint::Create, uid, email, Some(("channel", channel)))
    }

    pub fn build_info(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::Info, uid, email, None)
    }

    pub fn build_risk_score(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::RiskScore, uid, email, None)
    }

    pub fn build_update_risk_score(&self, uid: &str, email: &str, riskscore: &str) -> HttpRequest {
        self.build(Endpoint::UpdateRiskScore, uid, email, Some(("riskscore", riskscore)))
    }

    pub fn build_qr_code(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::QrCode, uid, email, None)
    }

    pub fn build_auth_code(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::AuthCode, uid, email, None)
    }

    pub fn build_logs(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::Logs, uid, email, None)
    }

    pub fn build_lock(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::Lock, uid, email, None)
    }

    pub fn build_unlock(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::Unlock, uid, email, None)
    }

    pub fn build_train_ml(&self, uid: &str, email: &str, data: &str) -> HttpRequest {
        self.build(Endpoint::TrainMl, uid, email, Some(("data", data)))
    }

    pub fn build_test_ml(&self, uid: &str, email: &str, data: &str) -> HttpRequest {
        self.build(Endpoint::TestMl, uid, email, Some(("data", data)))
    }

    pub fn build_auth_with_metadata(&self, uid: &str, email: &str, metadata: &str) -> HttpRequest {
        self.build(Endpoint::AuthWithMetadata, uid, email, Some(("metadata", metadata)))
    }

    pub fn build_send_auth_with_metadata(&self, uid: &str, email: &str, metadata: &str) -> HttpRequest {
        self.build(Endpoint::SendAuthWithMetadata, uid, email, Some(("metadata", metadata)))
    }

    pub fn build_verify_with_metadata(&self, uid: &str, email: &str, code: &str) -> HttpRequest {
        self.build(Endpoint::VerifyWithMetadata, uid, email, Some(("code", code)))
    }

    pub fn build_verify_session(&self, uid: &str, email: &str, session_id: &str) -> HttpRequest {
        self.build(Endpoint::VerifySession, uid, email, Some(("sessionid", session_id)))
    }

    pub fn build_customer_create(&self, uid: &str, email: &str, channel: &str) -> HttpRequest {
        self.build(Endpoint::CustomerCreate, uid, email, Some(("channel", channel)))
    }

    pub fn build_customer_auth(&self, uid: &str, email: &str) -> HttpRequest {
        self.build(Endpoint::CustomerAuth, uid, email, None)
    }

    pub fn build_customer_verify(&self, uid: &str, email: &str, code: &str) -> HttpRequest {
        self.build(Endpoint::CustomerVerify, uid, email, Some(("code", code)))
    }

    pub fn create(&self, uid: &str, email: &str, channel: &str) -> Result<HttpResponse> {
        self.send(&self.build_create(uid, email, channel))
    }

    pub fn info(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_info(uid, email))
    }

    pub fn risk_score(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_risk_score(uid, email))
    }

    pub fn update_risk_score(&self, uid: &str, email: &str, riskscore: &str) -> Result<HttpResponse> {
        self.send(&self.build_update_risk_score(uid, email, riskscore))
    }

    pub fn qr_code(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_qr_code(uid, email))
    }

    pub fn auth_code(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_auth_code(uid, email))
    }

    pub fn logs(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_logs(uid, email))
    }

    pub fn lock(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_lock(uid, email))
    }

    pub fn unlock(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_unlock(uid, email))
    }

    pub fn train_ml(&self, uid: &str, email: &str, data: &str) -> Result<HttpResponse> {
        self.send(&self.build_train_ml(uid, email, data))
    }

    pub fn test_ml(&self, uid: &str, email: &str, data: &str) -> Result<HttpResponse> {
        self.send(&self.build_test_ml(uid, email, data))
    }

    pub fn auth_with_metadata(&self, uid: &str, email: &str, metadata: &str) -> Result<HttpResponse> {
        self.send(&self.build_auth_with_metadata(uid, email, metadata))
    }

    pub fn send_auth_with_metadata(&self, uid: &str, email: &str, metadata: &str) -> Result<HttpResponse> {
        self.send(&self.build_send_auth_with_metadata(uid, email, metadata))
    }

    pub fn verify_with_metadata(&self, uid: &str, email: &str, code: &str) -> Result<HttpResponse> {
        self.send(&self.build_verify_with_metadata(uid, email, code))
    }

    pub fn verify_session(&self, uid: &str, email: &str, session_id: &str) -> Result<HttpResponse> {
        self.send(&self.build_verify_session(uid, email, session_id))
    }

    pub fn customer_create(&self, uid: &str, email: &str, channel: &str) -> Result<HttpResponse> {
        self.send(&self.build_customer_create(uid, email, channel))
    }

    pub fn customer_auth(&self, uid: &str, email: &str) -> Result<HttpResponse> {
        self.send(&self.build_customer_auth(uid, email))
    }

    pub fn customer_verify(&self, uid: &str, email: &str, code: &str) -> Result<HttpResponse> {
        self.send(&self.build_customer_verify(uid, email, code))
    }
}

impl<T: Transport + 'static> PivotClient<T> {
    pub fn send_async(&self, request: HttpRequest) -> PendingResponse {
        self.dispatcher.send_async(request)
    }
}
