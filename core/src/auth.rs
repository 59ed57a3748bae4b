//! Basic-Auth credentials for the Pivot Security API.
//!
//! The API authenticates with the key as the user name and an empty
//! password, so the encoded pair always ends in `:`.

use base64::Engine;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

pub const PRIVATE_KEY_VAR: &str = "PRIVATE_API_KEY";
pub const PUBLIC_KEY_VAR: &str = "PUBLIC_API_KEY";

/// `Authorization` header value for `key`: `Basic base64(key + ":")`.
pub fn basic_auth(key: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{key}:"));
    format!("Basic {encoded}")
}

/// Which of the two account keys signs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Account-management operations.
    Private,
    /// Customer-facing operations.
    Public,
}

/// The private and public API keys. `Debug` never prints either secret.
#[derive(Debug, Clone)]
pub struct Credentials {
    private_key: SecretString,
    public_key: SecretString,
}

impl Credentials {
    pub fn new(private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            private_key: SecretString::new(private_key.into().into_boxed_str()),
            public_key: SecretString::new(public_key.into().into_boxed_str()),
        }
    }

    /// Read both keys from `PRIVATE_API_KEY` and `PUBLIC_API_KEY`.
    ///
    /// Call once at startup and pass the result into `ClientConfig`.
    pub fn from_env() -> Result<Self, Error> {
        let read = |var: &str| {
            std::env::var(var).map_err(|_| Error::MissingConfig(format!("{var} is not set")))
        };
        Ok(Self::new(read(PRIVATE_KEY_VAR)?, read(PUBLIC_KEY_VAR)?))
    }

    pub fn authorization(&self, kind: KeyKind) -> String {
        match kind {
            KeyKind::Private => basic_auth(self.private_key.expose_secret()),
            KeyKind::Public => basic_auth(self.public_key.expose_secret()),
        }
    }
}
