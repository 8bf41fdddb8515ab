//! Per-server stats reports

use crate::client::{RawServerStats, ServerCounters};
use crate::metric::{self, counter, MetricRecord};
use serde::Serialize;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Metrics for one cache node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    /// Server identifier (`host:port`)
    pub name: String,
    pub metrics: Vec<MetricRecord>,
}

/// One report per server, in the client's enumeration order
pub type StatsReport = Vec<ServerReport>;

/// Build the report for every server in `raw`.
///
/// Basic mode yields the current size and usage percentage. Verbose mode
/// appends max size, items, current connections, total connections, gets and
/// sets, in that order.
pub fn build_report(raw: &RawServerStats, verbose: bool) -> StatsReport {
    raw.iter()
        .map(|(name, server)| ServerReport {
            name: name.clone(),
            metrics: server_metrics(server, verbose),
        })
        .collect()
}

fn server_metrics(server: &ServerCounters, verbose: bool) -> Vec<MetricRecord> {
    let bytes = server.get(counter::BYTES).copied().unwrap_or(0.0);
    let limit = server.get(counter::LIMIT_MAX_BYTES).copied().unwrap_or(0.0);

    let size_mb = bytes / BYTES_PER_MB;
    let max_mb = round(limit / BYTES_PER_MB, 5);
    // An unlimited or unreported ceiling reads as 0% rather than NaN/inf.
    let used = if max_mb > 0.0 {
        round(size_mb / max_mb * 100.0, 5)
    } else {
        0.0
    };

    let mut metrics = vec![
        metric::current_cache_size_mb(size_mb, max_mb),
        metric::cache_used_percent(used),
    ];

    if verbose {
        metrics.extend([
            metric::max_cache_size_mb(max_mb),
            metric::total_items(server),
            metric::current_connections(server),
            metric::total_connections(server),
            metric::total_gets(server),
            metric::total_sets(server),
        ]);
    }

    metrics
}

/// Round half away from zero to `places` decimals
pub fn round(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(pairs: &[(&str, f64)]) -> ServerCounters {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn scenario() -> RawServerStats {
        vec![(
            "127.0.0.1:11211".to_string(),
            server(&[
                ("bytes", 104_857_600.0),
                ("limit_max_bytes", 209_715_200.0),
                ("curr_items", 10.0),
            ]),
        )]
    }

    fn names(report: &ServerReport) -> Vec<&str> {
        report.metrics.iter().map(|m| m.name).collect()
    }

    #[test]
    fn test_basic_report() {
        let report = build_report(&scenario(), false);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "127.0.0.1:11211");
        assert_eq!(names(&report[0]), vec!["Current cache size", "Cache used"]);

        let size = &report[0].metrics[0];
        assert_eq!(size.value, 100.0);
        assert_eq!(size.max_value, Some(200.0));
        assert_eq!(report[0].metrics[1].value, 50.0);
    }

    #[test]
    fn test_verbose_report_order() {
        let report = build_report(&scenario(), true);
        assert_eq!(
            names(&report[0]),
            vec![
                "Current cache size",
                "Cache used",
                "Maximum cache size",
                "Total items",
                "Current connections",
                "Total connections",
                "Get operations",
                "Set operations",
            ]
        );
        assert_eq!(report[0].metrics[2].value, 200.0);
        assert_eq!(report[0].metrics[3].value, 10.0);
        assert_eq!(report[0].metrics[4].value, 0.0);
    }

    #[test]
    fn test_server_order_is_preserved() {
        let raw = vec![
            ("10.0.0.2:11211".to_string(), ServerCounters::new()),
            ("10.0.0.1:11211".to_string(), ServerCounters::new()),
            ("10.0.0.3:11211".to_string(), ServerCounters::new()),
        ];
        let report = build_report(&raw, false);
        let order: Vec<&str> = report.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["10.0.0.2:11211", "10.0.0.1:11211", "10.0.0.3:11211"]);
    }

    #[test]
    fn test_empty_counters_render_zeroes() {
        let raw = vec![("a:1".to_string(), ServerCounters::new())];
        let report = build_report(&raw, true);
        assert_eq!(report[0].metrics.len(), 8);
        assert!(report[0].metrics.iter().all(|m| m.value == 0.0));
    }

    #[test]
    fn test_zero_limit_reports_zero_usage() {
        let raw = vec![(
            "a:1".to_string(),
            server(&[("bytes", 2048.0), ("limit_max_bytes", 0.0)]),
        )];
        let report = build_report(&raw, false);
        let used = &report[0].metrics[1];
        assert_eq!(used.value, 0.0);
        assert!(used.value.is_finite());
    }

    #[test]
    fn test_usage_is_rounded_to_five_places() {
        let raw = vec![(
            "a:1".to_string(),
            server(&[("bytes", 1_000_000.0), ("limit_max_bytes", 67_108_864.0)]),
        )];
        let report = build_report(&raw, false);
        // 0.95367431640625 MB of 64 MB
        assert_eq!(report[0].metrics[1].value, 1.49012);
        assert_eq!(report[0].metrics[0].value, 1_000_000.0 / BYTES_PER_MB);
    }

    #[test]
    fn test_round() {
        assert_eq!(round(1.234567, 5), 1.23457);
        assert_eq!(round(-2.5, 0), -3.0);
        assert_eq!(round(0.0, 5), 0.0);
    }
}
