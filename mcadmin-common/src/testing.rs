//! In-memory cache client for tests

use crate::client::{CacheClient, RawServerStats, ServerCounters};
use crate::error::ClientError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// [`CacheClient`] answering from canned data.
#[derive(Debug, Default)]
pub struct StaticClient {
    stats: RawServerStats,
    flush_error: Option<ClientError>,
    stats_error: Option<ClientError>,
    flushes: AtomicUsize,
}

impl StaticClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a server with the given counters
    pub fn with_server(mut self, id: &str, counters: &[(&str, f64)]) -> Self {
        let counters: ServerCounters = counters
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect();
        self.stats.push((id.to_string(), counters));
        self
    }

    pub fn failing_flush(mut self, err: ClientError) -> Self {
        self.flush_error = Some(err);
        self
    }

    pub fn failing_stats(mut self, err: ClientError) -> Self {
        self.stats_error = Some(err);
        self
    }

    /// Number of flush calls received
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }
}

impl CacheClient for StaticClient {
    fn flush(&self) -> Result<(), ClientError> {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        match &self.flush_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn stats(&self) -> Result<RawServerStats, ClientError> {
        match &self.stats_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.stats.clone()),
        }
    }
}
