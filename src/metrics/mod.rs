// Metrics module - Prometheus-compatible metrics tracking
// Counters for requests, cache behaviour, origin fetches and the optimizer

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Metrics struct tracks counters for Prometheus export
/// Thread-safe via atomic operations and mutexes
#[derive(Debug, Default)]
pub struct Metrics {
    // Request counters
    request_count: AtomicU64,

    // Status code counters (e.g., 200, 404, 500)
    status_counts: Mutex<BTreeMap<u16, u64>>,

    // HTTP method counters (GET, HEAD, POST, etc.)
    method_counts: Mutex<BTreeMap<String, u64>>,

    // Request duration, summed in microseconds
    duration_us_sum: AtomicU64,
    duration_count: AtomicU64,

    // Cache outcome counters
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_coalesced: AtomicU64,
    cache_entries: AtomicU64,

    // Origin fetches and their failures by kind (connect, timeout, ...)
    origin_fetches: AtomicU64,
    fetch_errors: Mutex<BTreeMap<String, u64>>,

    // Optimizer failures by kind (minify, decode, ...) and payload sizes
    optimize_errors: Mutex<BTreeMap<String, u64>>,
    optimizer_bytes_in: AtomicU64,
    optimizer_bytes_out: AtomicU64,

    // Transport
    gzip_responses: AtomicU64,
    bytes_sent: AtomicU64,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the total request count
    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment counter for a specific HTTP status code
    pub fn increment_status_count(&self, status_code: u16) {
        if let Ok(mut counts) = self.status_counts.lock() {
            *counts.entry(status_code).or_insert(0) += 1;
        }
    }

    /// Increment counter for a specific HTTP method
    pub fn increment_method_count(&self, method: &str) {
        if let Ok(mut counts) = self.method_counts.lock() {
            *counts.entry(method.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a request duration in milliseconds
    pub fn record_duration(&self, duration_ms: f64) {
        let duration_us = (duration_ms * 1000.0) as u64;
        self.duration_us_sum.fetch_add(duration_us, Ordering::Relaxed);
        self.duration_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_cache_coalesced(&self) {
        self.cache_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Update the stored-entries gauge
    pub fn set_cache_entries(&self, entries: u64) {
        self.cache_entries.store(entries, Ordering::Relaxed);
    }

    pub fn increment_origin_fetch(&self) {
        self.origin_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment fetch error counter by error kind
    pub fn increment_fetch_error(&self, kind: &str) {
        if let Ok(mut counts) = self.fetch_errors.lock() {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Increment optimizer error counter by error kind
    pub fn increment_optimize_error(&self, kind: &str) {
        if let Ok(mut counts) = self.optimize_errors.lock() {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    /// Record payload sizes before and after optimization
    pub fn record_optimized_bytes(&self, bytes_in: u64, bytes_out: u64) {
        self.optimizer_bytes_in.fetch_add(bytes_in, Ordering::Relaxed);
        self.optimizer_bytes_out
            .fetch_add(bytes_out, Ordering::Relaxed);
    }

    pub fn increment_gzip_responses(&self) {
        self.gzip_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn get_status_count(&self, status_code: u16) -> u64 {
        self.status_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&status_code).copied())
            .unwrap_or(0)
    }

    pub fn get_cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn get_cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn get_cache_coalesced(&self) -> u64 {
        self.cache_coalesced.load(Ordering::Relaxed)
    }

    pub fn get_origin_fetches(&self) -> u64 {
        self.origin_fetches.load(Ordering::Relaxed)
    }

    pub fn get_fetch_error_count(&self, kind: &str) -> u64 {
        self.fetch_errors
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn get_optimize_error_count(&self, kind: &str) -> u64 {
        self.optimize_errors
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn get_optimizer_bytes(&self) -> (u64, u64) {
        (
            self.optimizer_bytes_in.load(Ordering::Relaxed),
            self.optimizer_bytes_out.load(Ordering::Relaxed),
        )
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        // Request metrics
        push_counter(
            &mut output,
            "http_requests_total",
            "Total number of HTTP requests received",
            self.request_count.load(Ordering::Relaxed),
        );

        output.push_str("\n# HELP http_requests_by_status_total HTTP requests by status code\n");
        output.push_str("# TYPE http_requests_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            for (status, count) in counts.iter() {
                output.push_str(&format!(
                    "http_requests_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        output.push_str("\n# HELP http_requests_by_method_total HTTP requests by method\n");
        output.push_str("# TYPE http_requests_by_method_total counter\n");
        if let Ok(counts) = self.method_counts.lock() {
            for (method, count) in counts.iter() {
                output.push_str(&format!(
                    "http_requests_by_method_total{{method=\"{}\"}} {}\n",
                    method, count
                ));
            }
        }

        output.push_str("\n# HELP http_request_duration_seconds Time spent serving requests\n");
        output.push_str("# TYPE http_request_duration_seconds summary\n");
        output.push_str(&format!(
            "http_request_duration_seconds_sum {}\n",
            self.duration_us_sum.load(Ordering::Relaxed) as f64 / 1_000_000.0
        ));
        output.push_str(&format!(
            "http_request_duration_seconds_count {}\n",
            self.duration_count.load(Ordering::Relaxed)
        ));

        // Cache metrics
        output.push('\n');
        push_counter(
            &mut output,
            "cache_hits_total",
            "Requests served from the response cache",
            self.cache_hits.load(Ordering::Relaxed),
        );
        output.push('\n');
        push_counter(
            &mut output,
            "cache_misses_total",
            "Requests that found no cached response",
            self.cache_misses.load(Ordering::Relaxed),
        );
        output.push('\n');
        push_counter(
            &mut output,
            "cache_coalesced_total",
            "Requests that waited on another request's computation",
            self.cache_coalesced.load(Ordering::Relaxed),
        );

        output.push_str("\n# HELP cache_entries Responses currently cached\n");
        output.push_str("# TYPE cache_entries gauge\n");
        output.push_str(&format!(
            "cache_entries {}\n",
            self.cache_entries.load(Ordering::Relaxed)
        ));

        // Origin metrics
        output.push('\n');
        push_counter(
            &mut output,
            "origin_fetches_total",
            "Requests sent to the origin",
            self.origin_fetches.load(Ordering::Relaxed),
        );

        output.push_str("\n# HELP origin_fetch_errors_total Origin fetch failures by kind\n");
        output.push_str("# TYPE origin_fetch_errors_total counter\n");
        if let Ok(counts) = self.fetch_errors.lock() {
            for (kind, count) in counts.iter() {
                output.push_str(&format!(
                    "origin_fetch_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        // Optimizer metrics
        output.push_str("\n# HELP optimizer_errors_total Optimization failures by kind\n");
        output.push_str("# TYPE optimizer_errors_total counter\n");
        if let Ok(counts) = self.optimize_errors.lock() {
            for (kind, count) in counts.iter() {
                output.push_str(&format!(
                    "optimizer_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push('\n');
        push_counter(
            &mut output,
            "optimizer_bytes_in_total",
            "Payload bytes handed to the optimizer",
            self.optimizer_bytes_in.load(Ordering::Relaxed),
        );
        output.push('\n');
        push_counter(
            &mut output,
            "optimizer_bytes_out_total",
            "Payload bytes produced by the optimizer",
            self.optimizer_bytes_out.load(Ordering::Relaxed),
        );

        // Transport metrics
        output.push('\n');
        push_counter(
            &mut output,
            "gzip_responses_total",
            "Responses sent with Content-Encoding: gzip",
            self.gzip_responses.load(Ordering::Relaxed),
        );
        output.push('\n');
        push_counter(
            &mut output,
            "bytes_sent_total",
            "Response body bytes written to clients",
            self.bytes_sent.load(Ordering::Relaxed),
        );

        output
    }
}

fn push_counter(output: &mut String, name: &str, help: &str, value: u64) {
    output.push_str(&format!("# HELP {} {}\n", name, help));
    output.push_str(&format!("# TYPE {} counter\n", name));
    output.push_str(&format!("{} {}\n", name, value));
}
