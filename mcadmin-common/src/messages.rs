//! Response payloads returned by the HTTP endpoint

use serde::Serialize;

/// Admin actions reachable under `/memcached`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Flush,
    Stats,
    Info,
}

impl AdminAction {
    pub const PREFIX: &'static str = "/memcached";

    /// Match a request path such as `/memcached/stats`
    pub fn from_path(path: &str) -> Option<Self> {
        let action = path.strip_prefix(Self::PREFIX)?.trim_end_matches('/');
        match action {
            "/flush" => Some(AdminAction::Flush),
            "/stats" => Some(AdminAction::Stats),
            "/info" => Some(AdminAction::Info),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AdminAction::Flush => "flush",
            AdminAction::Stats => "stats",
            AdminAction::Info => "info",
        }
    }
}

/// Response body envelope
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    /// Operation succeeded
    Success { url: String, result: T },

    /// Operation failed
    Error { code: u16, message: String },
}

impl<T> Envelope<T> {
    pub fn success(url: impl Into<String>, result: T) -> Self {
        Envelope::Success {
            url: url.into(),
            result,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Envelope::Error {
            code,
            message: message.into(),
        }
    }
}

/// Uptime and hit ratio of the first cache node
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// Seconds since the server started
    pub uptime: u64,

    /// Get hits over all gets, in percent
    pub hit_ratio: f64,
}
