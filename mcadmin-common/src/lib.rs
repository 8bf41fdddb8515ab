//! mcadmin Common - Memcached stats reporting and admin operations

pub mod admin;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod metric;
pub mod report;
pub mod testing;

pub use admin::{CacheAdmin, Outcome};
pub use client::{CacheClient, MemcacheClient, RawServerStats, ServerCounters};
pub use config::*;
pub use error::{AdminError, ClientError, ResultCode};
pub use messages::*;
pub use metric::{MetricRecord, Unit};
pub use report::{build_report, ServerReport, StatsReport};
