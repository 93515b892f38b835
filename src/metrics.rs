//! Pool-level counters and their export

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a pool's counters
///
/// # Examples
///
/// ```
/// use holdpool::Pool;
/// # use holdpool::Resource;
/// # struct Conn;
/// # impl Resource for Conn {
/// #     type Error = std::io::Error;
/// #     fn release(self) -> Result<(), Self::Error> { Ok(()) }
/// # }
///
/// let pool = Pool::new(2, 4, || Ok::<_, std::io::Error>(Conn)).unwrap();
///
/// {
///     let _conn = pool.get().unwrap();
///     let metrics = pool.metrics();
///     assert_eq!(metrics.produced, 2);
///     assert_eq!(metrics.reused, 1);
///     assert_eq!(metrics.idle, 1);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Resources created by the producer, warm-up included
    pub produced: usize,

    /// Gets served from the free-list
    pub reused: usize,

    /// Resources pushed back into the free-list
    pub returned: usize,

    /// Resources released because the free-list was full or the pool was closed
    pub discarded: usize,

    /// Resources released while closing the pool
    pub drained: usize,

    /// Releases that reported an error
    pub release_failures: usize,

    /// Idle resources currently in the free-list
    pub idle: usize,

    /// Free-list capacity
    pub max_capacity: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("produced".to_string(), self.produced.to_string());
        metrics.insert("reused".to_string(), self.reused.to_string());
        metrics.insert("returned".to_string(), self.returned.to_string());
        metrics.insert("discarded".to_string(), self.discarded.to_string());
        metrics.insert("drained".to_string(), self.drained.to_string());
        metrics.insert("release_failures".to_string(), self.release_failures.to_string());
        metrics.insert("idle".to_string(), self.idle.to_string());
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use holdpool::{MetricsExporter, PoolMetrics};
    /// use std::collections::HashMap;
    ///
    /// let metrics = PoolMetrics {
    ///     produced: 3,
    ///     reused: 10,
    ///     returned: 10,
    ///     discarded: 0,
    ///     drained: 0,
    ///     release_failures: 0,
    ///     idle: 3,
    ///     max_capacity: 8,
    /// };
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = MetricsExporter::export_prometheus(&metrics, "db", Some(&tags));
    /// assert!(output.contains("holdpool_resources_idle{pool=\"db\",service=\"api\"} 3"));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        let gauges = [
            ("holdpool_resources_idle", "Idle resources in the free-list", metrics.idle),
            ("holdpool_capacity", "Free-list capacity", metrics.max_capacity),
        ];
        for (name, help, value) in gauges {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} gauge\n", name));
            output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
        }

        let counters = [
            ("holdpool_resources_produced_total", "Resources created by the producer", metrics.produced),
            ("holdpool_resources_reused_total", "Gets served from the free-list", metrics.reused),
            ("holdpool_resources_returned_total", "Resources returned to the free-list", metrics.returned),
            ("holdpool_resources_discarded_total", "Resources released on return", metrics.discarded),
            ("holdpool_resources_drained_total", "Resources released on close", metrics.drained),
            ("holdpool_release_failures_total", "Releases that reported an error", metrics.release_failures),
        ];
        for (name, help, value) in counters {
            output.push_str(&format!("# HELP {} {}\n", name, help));
            output.push_str(&format!("# TYPE {} counter\n", name));
            output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
        }

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Default)]
pub(crate) struct MetricsTracker {
    pub produced: AtomicUsize,
    pub reused: AtomicUsize,
    pub returned: AtomicUsize,
    pub discarded: AtomicUsize,
    pub drained: AtomicUsize,
    pub release_failures: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_metrics(&self, idle: usize, max_capacity: usize) -> PoolMetrics {
        PoolMetrics {
            produced: self.produced.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            drained: self.drained.load(Ordering::Relaxed),
            release_failures: self.release_failures.load(Ordering::Relaxed),
            idle,
            max_capacity,
        }
    }
}
