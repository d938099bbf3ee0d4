//! Connection Authentication
//!
//! Builds HMAC-SHA256 signed connection URLs. The server verifies the signature
//! against the `host`, `date` and request line, so a URL is only usable for as
//! long as the server tolerates the embedded date.

use crate::error::{ChatError, Result};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Environment variable holding the application id
pub const APP_ID_ENV: &str = "XFCHAT_APP_ID";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "XFCHAT_API_KEY";

/// Environment variable holding the API secret
pub const API_SECRET_ENV: &str = "XFCHAT_API_SECRET";

/// Application credentials issued by the service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Read credentials from the environment, loading a `.env` file first if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| ChatError::Config(format!("{} is not set", name)))
        };

        Ok(Self::new(
            var(APP_ID_ENV)?,
            var(API_KEY_ENV)?,
            var(API_SECRET_ENV)?,
        ))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Produces signed connection URLs from a set of credentials
#[derive(Debug, Clone)]
pub struct Authenticator {
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Sign `base_url` with the current time
    pub fn signed_url(&self, base_url: &str) -> Result<String> {
        self.signed_url_at(base_url, Utc::now())
    }

    /// Sign `base_url` as of `now`
    pub fn signed_url_at(&self, base_url: &str, now: DateTime<Utc>) -> Result<String> {
        let base = Url::parse(base_url)
            .map_err(|e| ChatError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        let host = host_header(&base)?;
        let date = http_date(now);

        let signature = sign(&self.credentials.api_secret, &host, &date, base.path())?;
        let authorization = BASE64_STANDARD.encode(format!(
            "hmac username=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", signature=\"{}\"",
            self.credentials.api_key, signature
        ));

        tracing::debug!(host = %host, date = %date, "signed connection url");

        let url = Url::parse_with_params(
            base_url,
            &[
                ("host", host.as_str()),
                ("date", date.as_str()),
                ("authorization", authorization.as_str()),
            ],
        )
        .map_err(|e| ChatError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        Ok(url.into())
    }
}

/// RFC 1123 date as used in HTTP headers, always in GMT
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// The exact string covered by the signature
pub fn canonical_string(host: &str, date: &str, path: &str) -> String {
    format!("host: {}\ndate: {}\nGET {} HTTP/1.1", host, date, path)
}

/// Base64 HMAC-SHA256 of the canonical string keyed by `secret`
pub fn sign(secret: &str, host: &str, date: &str, path: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ChatError::Config(format!("Invalid API secret: {}", e)))?;
    mac.update(canonical_string(host, date, path).as_bytes());
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Host as sent in the `Host` header: host name plus any non-default port
fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| ChatError::Config(format!("URL '{}' has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
