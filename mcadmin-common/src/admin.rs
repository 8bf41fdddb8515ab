//! Flush and stats operations over a cache client

use crate::client::{CacheClient, RawServerStats};
use crate::error::{AdminError, ResultCode, Result};
use crate::messages::CacheInfo;
use crate::metric::counter;
use crate::report::{self, StatsReport};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a cache client was supplied
enum Binding {
    Unbound,
    Bound(Arc<dyn CacheClient>),
}

/// Outcome of a flush, as reported by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub code: ResultCode,
    pub message: String,
}

impl Outcome {
    pub fn success() -> Self {
        Self {
            code: ResultCode::Success,
            message: ResultCode::Success.label().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Turn a non-success outcome into [`AdminError::OperationFailed`]
    pub fn into_result(self) -> Result<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(AdminError::OperationFailed {
                code: self.code,
                message: self.message,
            })
        }
    }
}

/// Administrative façade over one cache client.
///
/// The binding is fixed at construction. An unbound service rejects every
/// operation with [`AdminError::ClientNotConfigured`].
pub struct CacheAdmin {
    binding: Binding,
}

impl CacheAdmin {
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self {
            binding: Binding::Bound(client),
        }
    }

    pub fn unbound() -> Self {
        Self {
            binding: Binding::Unbound,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.binding, Binding::Bound(_))
    }

    /// Return the client, or fail if none was supplied
    pub fn assert_client_bound(&self) -> Result<&dyn CacheClient> {
        match &self.binding {
            Binding::Bound(client) => Ok(client.as_ref()),
            Binding::Unbound => Err(AdminError::ClientNotConfigured),
        }
    }

    /// Flush every server and return the client's result code as-is.
    pub fn flush(&self) -> Result<Outcome> {
        let client = self.assert_client_bound()?;

        let outcome = match client.flush() {
            Ok(()) => Outcome::success(),
            Err(err) => Outcome {
                code: err.code,
                message: err.message,
            },
        };

        if outcome.is_success() {
            info!("Memcached flush succeeded");
        } else {
            warn!("Memcached flush failed: {} (code {})", outcome.message, outcome.code.code());
        }

        Ok(outcome)
    }

    /// Build a stats report for every server.
    pub fn stats(&self, verbose: bool) -> Result<StatsReport> {
        let raw = self.raw_stats()?;
        debug!("Building {} report for {} server(s)", mode(verbose), raw.len());
        Ok(report::build_report(&raw, verbose))
    }

    /// Hit ratio of the first server, in percent rounded to 2 places
    pub fn hit_ratio(&self) -> Result<f64> {
        Ok(hit_ratio(&self.raw_stats()?))
    }

    /// Uptime of the first server, in seconds
    pub fn uptime(&self) -> Result<u64> {
        Ok(uptime(&self.raw_stats()?))
    }

    /// Uptime and hit ratio from a single stats round-trip
    pub fn info(&self) -> Result<CacheInfo> {
        let raw = self.raw_stats()?;
        Ok(CacheInfo {
            uptime: uptime(&raw),
            hit_ratio: hit_ratio(&raw),
        })
    }

    fn raw_stats(&self) -> Result<RawServerStats> {
        let client = self.assert_client_bound()?;
        client.stats().map_err(|err| {
            warn!("Memcached stats failed: {} (code {})", err.message, err.code.code());
            AdminError::from(err)
        })
    }
}

fn hit_ratio(raw: &RawServerStats) -> f64 {
    let Some((_, server)) = raw.first() else {
        return 0.0;
    };
    let hits = server.get(counter::GET_HITS).copied().unwrap_or(0.0);
    let misses = server.get(counter::GET_MISSES).copied().unwrap_or(0.0);
    let total = hits + misses;

    if total > 0.0 {
        report::round(hits / total * 100.0, 2)
    } else {
        0.0
    }
}

fn uptime(raw: &RawServerStats) -> u64 {
    raw.first()
        .and_then(|(_, server)| server.get(counter::UPTIME))
        .map_or(0, |uptime| uptime.max(0.0) as u64)
}

fn mode(verbose: bool) -> &'static str {
    if verbose {
        "verbose"
    } else {
        "basic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::testing::StaticClient;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bound(client: StaticClient) -> CacheAdmin {
        CacheAdmin::new(Arc::new(client))
    }

    #[test]
    fn test_unbound_rejects_every_operation() {
        let admin = CacheAdmin::unbound();
        assert!(!admin.is_bound());
        assert_eq!(admin.flush().unwrap_err(), AdminError::ClientNotConfigured);
        assert_eq!(admin.stats(true).unwrap_err(), AdminError::ClientNotConfigured);
        assert_eq!(admin.hit_ratio().unwrap_err(), AdminError::ClientNotConfigured);
        assert_eq!(admin.uptime().unwrap_err(), AdminError::ClientNotConfigured);
        assert_eq!(admin.info().unwrap_err(), AdminError::ClientNotConfigured);
    }

    #[test]
    fn test_flush_success() {
        let client = Arc::new(StaticClient::new());
        let admin = CacheAdmin::new(client.clone());

        let outcome = admin.flush().unwrap();
        assert!(outcome.is_success());
        assert!(outcome.into_result().is_ok());
        assert_eq!(client.flushes(), 1);
    }

    #[test]
    fn test_flush_failure_is_returned_as_is() {
        let admin = bound(
            StaticClient::new()
                .failing_flush(ClientError::new(ResultCode::ServerError, "SERVER ERROR")),
        );

        let outcome = admin.flush().unwrap();
        assert_eq!(outcome.code, ResultCode::ServerError);
        assert_eq!(outcome.message, "SERVER ERROR");
        assert_eq!(
            outcome.into_result().unwrap_err(),
            AdminError::OperationFailed {
                code: ResultCode::ServerError,
                message: "SERVER ERROR".to_string(),
            }
        );
    }

    #[test]
    fn test_stats_delegates_to_report() {
        let admin = bound(
            StaticClient::new()
                .with_server("10.0.0.1:11211", &[("bytes", 1_048_576.0), ("limit_max_bytes", 4_194_304.0)])
                .with_server("10.0.0.2:11211", &[]),
        );

        let report = admin.stats(false).unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].name, "10.0.0.1:11211");
        assert_eq!(report[1].name, "10.0.0.2:11211");
        assert_eq!(report[0].metrics[1].value, 25.0);

        let verbose = admin.stats(true).unwrap();
        assert!(verbose.iter().all(|server| server.metrics.len() == 8));
    }

    #[test]
    fn test_stats_fault_is_not_partial() {
        let admin = bound(
            StaticClient::new()
                .with_server("10.0.0.1:11211", &[])
                .failing_stats(ClientError::new(ResultCode::NoServers, "no servers reachable")),
        );

        assert_eq!(
            admin.stats(false).unwrap_err(),
            AdminError::ClientFault("no servers reachable".to_string())
        );
    }

    #[test]
    fn test_hit_ratio_and_uptime_read_first_server() {
        let admin = bound(
            StaticClient::new()
                .with_server("a:1", &[("get_hits", 3.0), ("get_misses", 1.0), ("uptime", 3600.0)])
                .with_server("b:1", &[("get_hits", 0.0), ("get_misses", 9.0), ("uptime", 5.0)]),
        );
        assert_eq!(admin.hit_ratio().unwrap(), 75.0);
        assert_eq!(admin.uptime().unwrap(), 3600);

        let info = admin.info().unwrap();
        assert_eq!(info.uptime, 3600);
        assert_eq!(info.hit_ratio, 75.0);
    }

    #[test]
    fn test_info_reads_stats_once() {
        let client = Arc::new(CountingClient::default());
        let admin = CacheAdmin::new(client.clone());

        admin.info().unwrap();
        assert_eq!(client.calls.load(Ordering::Relaxed), 1);
    }

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    impl CacheClient for CountingClient {
        fn flush(&self) -> std::result::Result<(), ClientError> {
            Ok(())
        }

        fn stats(&self) -> std::result::Result<RawServerStats, ClientError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(vec![("a:1".to_string(), Default::default())])
        }
    }

    #[test]
    fn test_hit_ratio_without_traffic() {
        let admin = bound(StaticClient::new().with_server("a:1", &[]));
        assert_eq!(admin.hit_ratio().unwrap(), 0.0);
        assert_eq!(admin.uptime().unwrap(), 0);

        let empty = bound(StaticClient::new());
        assert_eq!(empty.hit_ratio().unwrap(), 0.0);
    }
}
