//! Cache client seam and its memcache-backed implementation

use crate::config::MemcachedConfig;
use crate::error::{ClientError, ResultCode};
use memcache::MemcacheError;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Counter name to value, for one server
pub type ServerCounters = HashMap<String, f64>;

/// Per-server counters in the client's enumeration order
pub type RawServerStats = Vec<(String, ServerCounters)>;

/// Operations the admin service needs from a cache client.
///
/// Implementations must be safe to call from several threads at once; the
/// admin service adds no locking of its own.
pub trait CacheClient: Send + Sync {
    /// Invalidate every item on every server.
    fn flush(&self) -> Result<(), ClientError>;

    /// Fetch raw counters from every server.
    fn stats(&self) -> Result<RawServerStats, ClientError>;
}

/// [`CacheClient`] over the `memcache` crate's pooled connections.
///
/// The pool is opened on first use and reopened on the next call after a
/// failed connect, so a cluster that is down at startup is picked up once it
/// comes back.
pub struct MemcacheClient {
    urls: Vec<String>,
    timeout: Option<Duration>,
    inner: Mutex<Option<memcache::Client>>,
}

impl MemcacheClient {
    /// Client for every server listed in the configuration. No I/O happens here.
    pub fn new(config: &MemcachedConfig) -> Result<Self, ClientError> {
        if config.servers.is_empty() {
            return Err(ClientError::new(
                ResultCode::NoServers,
                "No memcached servers configured",
            ));
        }

        let urls = config
            .servers
            .iter()
            .map(|server| format!("memcache://{}", server))
            .collect();
        let timeout = (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms));

        Ok(Self {
            urls,
            timeout,
            inner: Mutex::new(None),
        })
    }

    pub fn servers(&self) -> Vec<String> {
        self.urls.iter().map(|url| server_id(url)).collect()
    }

    fn open(&self) -> Result<memcache::Client, ClientError> {
        let mut builder = memcache::ClientBuilder::new();
        for url in &self.urls {
            builder = builder.add_server(url.clone()).map_err(connect_error)?;
        }
        if let Some(timeout) = self.timeout {
            builder = builder.with_connection_timeout(timeout);
        }

        let client = builder.build().map_err(connect_error)?;
        client.set_read_timeout(self.timeout).map_err(connect_error)?;
        client.set_write_timeout(self.timeout).map_err(connect_error)?;

        info!("Connected to memcached at {}", self.servers().join(", "));
        Ok(client)
    }

    fn with_client<T>(
        &self,
        op: impl FnOnce(&memcache::Client) -> Result<T, MemcacheError>,
    ) -> Result<T, ClientError> {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let client = match slot.take() {
            Some(client) => client,
            None => self.open()?,
        };
        let result = op(&client).map_err(client_error);
        *slot = Some(client);
        result
    }
}

impl CacheClient for MemcacheClient {
    fn flush(&self) -> Result<(), ClientError> {
        self.with_client(|client| client.flush())
    }

    fn stats(&self) -> Result<RawServerStats, ClientError> {
        let stats = self.with_client(|client| client.stats())?;
        debug!("Received stats from {} server(s)", stats.len());

        Ok(stats
            .into_iter()
            .map(|(url, counters)| (server_id(&url), numeric_counters(counters)))
            .collect())
    }
}

/// Reduce a connection URL to `host:port`
fn server_id(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let without_query = without_scheme
        .split_once('?')
        .map_or(without_scheme, |(addr, _)| addr);
    without_query.trim_end_matches('/').to_string()
}

/// Keep counters that parse as numbers; `version` and friends are dropped.
fn numeric_counters(raw: HashMap<String, String>) -> ServerCounters {
    raw.into_iter()
        .filter_map(|(name, value)| value.trim().parse::<f64>().ok().map(|v| (name, v)))
        .collect()
}

fn client_error(err: MemcacheError) -> ClientError {
    let code = match &err {
        MemcacheError::IOError(io) => match io.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => ResultCode::Timeout,
            ErrorKind::UnexpectedEof => ResultCode::ReadFailure,
            ErrorKind::BrokenPipe | ErrorKind::WriteZero => ResultCode::WriteFailure,
            _ => ResultCode::ConnectionFailure,
        },
        MemcacheError::PoolError(_) => ResultCode::ConnectionFailure,
        MemcacheError::ServerError(_) => ResultCode::ServerError,
        MemcacheError::ClientError(_) => ResultCode::ClientError,
        MemcacheError::CommandError(_) => ResultCode::Failure,
        _ => ResultCode::Failure,
    };
    ClientError::new(code, err.to_string())
}

/// A failed connect is always a transport fault, whatever the pool reports.
fn connect_error(err: MemcacheError) -> ClientError {
    let mut err = client_error(err);
    if !err.code.is_transport() {
        err.code = ResultCode::ConnectionFailure;
    }
    warn!("Memcached connect failed: {}", err.message);
    err
}
