//! Session Settings
//!
//! Protocol versions and the sampling configuration sent with every question.
//! Setters never fail: out-of-range input is dropped and the previous value kept.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default endpoint (scheme and host) of the chat service
pub const DEFAULT_ENDPOINT: &str = "wss://spark-api.xf-yun.com";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.5;

/// Default maximum answer length in tokens
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Default candidate pool size
pub const DEFAULT_TOP_K: u32 = 4;

/// Static properties of a protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionProfile {
    /// Path segment in the endpoint URL (`/<path>/chat`)
    pub path: &'static str,

    /// Model domain tag sent in the request parameters
    pub domain: &'static str,

    /// Upper bound for `max_tokens`
    pub max_tokens_ceiling: u32,
}

/// Supported protocol versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiVersion {
    #[default]
    #[serde(rename = "v1", alias = "v1.1")]
    V1,

    #[serde(rename = "v2", alias = "v2.1")]
    V2,
}

impl ApiVersion {
    /// Path, domain and token ceiling for this version
    pub const fn profile(self) -> VersionProfile {
        match self {
            ApiVersion::V1 => VersionProfile {
                path: "v1.1",
                domain: "general",
                max_tokens_ceiling: 4096,
            },
            ApiVersion::V2 => VersionProfile {
                path: "v2.1",
                domain: "generalv2",
                max_tokens_ceiling: 8192,
            },
        }
    }

    pub fn domain(self) -> &'static str {
        self.profile().domain
    }

    pub fn max_tokens_ceiling(self) -> u32 {
        self.profile().max_tokens_ceiling
    }
}

/// Sampling and connection settings for a client
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    version: ApiVersion,
    temperature: f64,
    max_tokens: u32,
    top_k: u32,
    endpoint: String,
    read_timeout: Option<Duration>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            version: ApiVersion::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            read_timeout: None,
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Full connection URL without authentication, e.g. `wss://spark-api.xf-yun.com/v1.1/chat`
    pub fn base_url(&self) -> String {
        format!(
            "{}/{}/chat",
            self.endpoint.trim_end_matches('/'),
            self.version.profile().path
        )
    }

    /// Switch protocol version. A `max_tokens` above the new ceiling is clamped to it.
    pub fn set_version(&mut self, version: ApiVersion) {
        self.version = version;
        self.max_tokens = self.max_tokens.min(version.max_tokens_ceiling());
    }

    /// Sampling threshold, accepted in `[0, 1]`
    pub fn set_temperature(&mut self, temperature: f64) {
        if (0.0..=1.0).contains(&temperature) {
            self.temperature = temperature;
        }
    }

    /// Maximum answer length, accepted in `[1, ceiling]` for the current version
    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        if (1..=self.version.max_tokens_ceiling()).contains(&max_tokens) {
            self.max_tokens = max_tokens;
        }
    }

    /// Number of equally likely candidates sampled from, accepted in `[1, 6]`
    pub fn set_top_k(&mut self, top_k: u32) {
        if (1..=6).contains(&top_k) {
            self.top_k = top_k;
        }
    }

    /// Scheme and host to connect to. Only `ws`/`wss` URLs with a host and without
    /// query or fragment are accepted, since the version path is appended to it.
    pub fn set_endpoint(&mut self, endpoint: &str) {
        let Ok(url) = Url::parse(endpoint) else {
            return;
        };
        if matches!(url.scheme(), "ws" | "wss")
            && url.host_str().is_some()
            && url.query().is_none()
            && url.fragment().is_none()
        {
            self.endpoint = endpoint.trim_end_matches('/').to_string();
        }
    }

    /// Per-frame receive timeout. `None` waits indefinitely; a zero duration is ignored.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        match timeout {
            Some(d) if d.is_zero() => {}
            other => self.read_timeout = other,
        }
    }
}

/// Settings as read from a JSON file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ApiVersion>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Signed so that negative values in a file are ignored rather than rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_secs: Option<u64>,
}

impl ChatSettings {
    /// Overlay `other` on top of these settings (fields set in `other` win)
    pub fn merge(&mut self, other: ChatSettings) {
        if other.version.is_some() {
            self.version = other.version;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.top_k.is_some() {
            self.top_k = other.top_k;
        }
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint;
        }
        if other.read_timeout_secs.is_some() {
            self.read_timeout_secs = other.read_timeout_secs;
        }
    }

    /// Apply through the permissive setters. Version goes first so the token ceiling is right.
    pub fn apply_to(&self, config: &mut ChatConfig) {
        if let Some(version) = self.version {
            config.set_version(version);
        }
        if let Some(t) = self.temperature {
            config.set_temperature(t);
        }
        if let Some(max) = self.max_tokens.and_then(|v| u32::try_from(v).ok()) {
            config.set_max_tokens(max);
        }
        if let Some(k) = self.top_k.and_then(|v| u32::try_from(v).ok()) {
            config.set_top_k(k);
        }
        if let Some(endpoint) = &self.endpoint {
            config.set_endpoint(endpoint);
        }
        if let Some(secs) = self.read_timeout_secs {
            config.set_read_timeout(Some(Duration::from_secs(secs)));
        }
    }
}
