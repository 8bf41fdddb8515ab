//! Metric records built from raw memcached counters
//!
//! Each constructor produces a [`MetricRecord`] with a fixed name, description
//! and unit. Constructors reading a server's counters default missing
//! counters to 0 so a report always renders, even against a partially
//! instrumented server.

use crate::client::ServerCounters;
use serde::{Serialize, Serializer};

/// Counter names as reported by `stats`
pub mod counter {
    pub const BYTES: &str = "bytes";
    pub const CMD_GET: &str = "cmd_get";
    pub const CMD_SET: &str = "cmd_set";
    pub const CURR_CONNECTIONS: &str = "curr_connections";
    pub const CURR_ITEMS: &str = "curr_items";
    pub const GET_HITS: &str = "get_hits";
    pub const GET_MISSES: &str = "get_misses";
    pub const LIMIT_MAX_BYTES: &str = "limit_max_bytes";
    pub const TOTAL_CONNECTIONS: &str = "total_connections";
    pub const UPTIME: &str = "uptime";
}

/// Unit of a metric, as UN/CEFACT common codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Dimensionless count
    Unit,
    Percent,
    Megabyte,
}

impl Unit {
    pub fn code(self) -> &'static str {
        match self {
            Unit::Unit => "C62",
            Unit::Percent => "P1",
            Unit::Megabyte => "4L",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Unit::Unit => "unit",
            Unit::Percent => "percent",
            Unit::Megabyte => "megabyte",
        }
    }

    /// Display suffix, `None` for plain counts
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Unit::Unit => None,
            Unit::Percent => Some("%"),
            Unit::Megabyte => Some("MB"),
        }
    }
}

/// One derived statistic.
///
/// `value` and `max_value` are expressed in the same `unit`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub name: &'static str,
    pub description: &'static str,
    pub value: f64,
    pub unit: Unit,
    pub max_value: Option<f64>,
}

impl MetricRecord {
    fn new(name: &'static str, description: &'static str, value: f64, unit: Unit) -> Self {
        Self {
            name,
            description,
            value,
            unit,
            max_value: None,
        }
    }

    fn with_max(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }
}

impl Serialize for MetricRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let len = if self.max_value.is_some() { 6 } else { 5 };
        let mut record = serializer.serialize_struct("PropertyValue", len)?;
        record.serialize_field("name", self.name)?;
        record.serialize_field("description", self.description)?;
        record.serialize_field("value", &Number(self.value))?;
        record.serialize_field("unitCode", self.unit.code())?;
        record.serialize_field("unitText", self.unit.text())?;
        if let Some(max) = self.max_value {
            record.serialize_field("maxValue", &Number(max))?;
        }
        record.end()
    }
}

/// Serializes integral floats as JSON integers (`10` rather than `10.0`).
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        if self.0.is_finite() && self.0.fract() == 0.0 && self.0.abs() < MAX_EXACT {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

fn read(server: &ServerCounters, key: &str) -> f64 {
    server.get(key).copied().unwrap_or(0.0)
}

pub fn cache_used_percent(percent: f64) -> MetricRecord {
    MetricRecord::new("Cache used", "Cache used in percentage", percent, Unit::Percent)
}

/// Current cache size in megabytes, carrying the size ceiling as `max_value`.
pub fn current_cache_size_mb(size: f64, max: f64) -> MetricRecord {
    MetricRecord::new(
        "Current cache size",
        "Current size of the cache in megabytes",
        size,
        Unit::Megabyte,
    )
    .with_max(max)
}

pub fn max_cache_size_mb(max: f64) -> MetricRecord {
    MetricRecord::new(
        "Maximum cache size",
        "Maximum size of the cache in megabytes",
        max,
        Unit::Megabyte,
    )
}

pub fn current_connections(server: &ServerCounters) -> MetricRecord {
    MetricRecord::new(
        "Current connections",
        "Number of current connections",
        read(server, counter::CURR_CONNECTIONS),
        Unit::Unit,
    )
}

pub fn total_connections(server: &ServerCounters) -> MetricRecord {
    MetricRecord::new(
        "Total connections",
        "Total number of connections",
        read(server, counter::TOTAL_CONNECTIONS),
        Unit::Unit,
    )
}

pub fn total_gets(server: &ServerCounters) -> MetricRecord {
    MetricRecord::new(
        "Get operations",
        "Total number of get operations",
        read(server, counter::CMD_GET),
        Unit::Unit,
    )
}

pub fn total_items(server: &ServerCounters) -> MetricRecord {
    MetricRecord::new(
        "Total items",
        "Total number of items stored in the cache",
        read(server, counter::CURR_ITEMS),
        Unit::Unit,
    )
}

pub fn total_sets(server: &ServerCounters) -> MetricRecord {
    MetricRecord::new(
        "Set operations",
        "Total number of set operations",
        read(server, counter::CMD_SET),
        Unit::Unit,
    )
}
