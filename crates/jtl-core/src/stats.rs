use crate::record::JtlRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Histogram bucket width in milliseconds.
const BUCKET_WIDTH_MS: u64 = 10;
/// Buckets cover 0..30s; anything slower lands in the last one.
const BUCKET_COUNT: usize = 3000;

/// Summarizes generated records with an integer latency histogram
pub struct StatsCollector {
    pub records: u64,
    per_thread: BTreeMap<String, u64>,
    per_label: BTreeMap<String, u64>,
    first_timestamp_ms: Option<i64>,
    last_timestamp_ms: Option<i64>,
    elapsed_total_ms: u64,
    latency_buckets: Vec<u64>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            records: 0,
            per_thread: BTreeMap::new(),
            per_label: BTreeMap::new(),
            first_timestamp_ms: None,
            last_timestamp_ms: None,
            elapsed_total_ms: 0,
            latency_buckets: vec![0; BUCKET_COUNT],
        }
    }

    pub fn record(&mut self, record: &JtlRecord) {
        self.records += 1;
        *self.per_thread.entry(record.thread_name.clone()).or_insert(0) += 1;
        *self.per_label.entry(record.label.clone()).or_insert(0) += 1;

        self.first_timestamp_ms = Some(
            self.first_timestamp_ms
                .map_or(record.time_stamp, |t| t.min(record.time_stamp)),
        );
        self.last_timestamp_ms = Some(
            self.last_timestamp_ms
                .map_or(record.time_stamp, |t| t.max(record.time_stamp)),
        );

        self.elapsed_total_ms += record.elapsed;
        self.record_latency(record.elapsed);
    }

    fn record_latency(&mut self, elapsed_ms: u64) {
        let bucket_idx =
            (elapsed_ms / BUCKET_WIDTH_MS).min((self.latency_buckets.len() - 1) as u64) as usize;
        self.latency_buckets[bucket_idx] += 1;
    }

    /// Calculate percentile from histogram (lower bucket bound, integer ms)
    pub fn percentile(&self, p: u64) -> u64 {
        let total: u64 = self.latency_buckets.iter().sum();
        if total == 0 {
            return 0;
        }

        let target = ((total * p) / 100).max(1);
        let mut cumulative = 0u64;

        for (bucket_idx, &count) in self.latency_buckets.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return bucket_idx as u64 * BUCKET_WIDTH_MS;
            }
        }

        self.latency_buckets.len() as u64 * BUCKET_WIDTH_MS
    }

    pub fn mean_elapsed_ms(&self) -> u64 {
        if self.records == 0 {
            0
        } else {
            self.elapsed_total_ms / self.records
        }
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            records: self.records,
            threads: self.per_thread.len(),
            labels: self.per_label.len(),
            first_timestamp_ms: self.first_timestamp_ms,
            last_timestamp_ms: self.last_timestamp_ms,
            elapsed_mean_ms: self.mean_elapsed_ms(),
            elapsed_p50_ms: self.percentile(50),
            elapsed_p95_ms: self.percentile(95),
            elapsed_p99_ms: self.percentile(99),
            records_per_thread: self.per_thread.clone(),
            records_per_label: self.per_label.clone(),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub records: u64,
    pub threads: usize,
    pub labels: usize,
    pub first_timestamp_ms: Option<i64>,
    pub last_timestamp_ms: Option<i64>,
    pub elapsed_mean_ms: u64,
    pub elapsed_p50_ms: u64,
    pub elapsed_p95_ms: u64,
    pub elapsed_p99_ms: u64,
    pub records_per_thread: BTreeMap<String, u64>,
    pub records_per_label: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(ts: i64, elapsed: u64, label: &str, thread: &str) -> JtlRecord {
        JtlRecord::success(ts, elapsed, label, thread, 5000, 500, 2)
    }

    #[test]
    fn test_stats_collector_basic() {
        let mut stats = StatsCollector::new();

        stats.record(&row(2000, 100, "label0", "Thread-0"));
        stats.record(&row(1500, 300, "label1", "Thread-0"));
        stats.record(&row(2500, 200, "label0", "Thread-1"));

        let summary = stats.summary();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.threads, 2);
        assert_eq!(summary.labels, 2);
        assert_eq!(summary.first_timestamp_ms, Some(1500));
        assert_eq!(summary.last_timestamp_ms, Some(2500));
        assert_eq!(summary.elapsed_mean_ms, 200);
        assert_eq!(summary.records_per_thread["Thread-0"], 2);
        assert_eq!(summary.records_per_label["label0"], 2);
    }

    #[test]
    fn test_empty_summary() {
        let summary = StatsCollector::new().summary();
        assert_eq!(summary.records, 0);
        assert_eq!(summary.first_timestamp_ms, None);
        assert_eq!(summary.elapsed_mean_ms, 0);
        assert_eq!(summary.elapsed_p99_ms, 0);
    }

    #[test]
    fn test_percentile_calculation() {
        let mut stats = StatsCollector::new();

        for _ in 0..50 {
            stats.record(&row(0, 500, "label0", "Thread-0"));
        }
        for _ in 0..30 {
            stats.record(&row(0, 1500, "label0", "Thread-0"));
        }
        for _ in 0..20 {
            stats.record(&row(0, 12_000, "label0", "Thread-0"));
        }

        assert_eq!(stats.percentile(50), 500);
        assert_eq!(stats.percentile(80), 1500);
        assert_eq!(stats.percentile(95), 12_000);
    }

    #[test]
    fn test_slow_samples_clamp_to_last_bucket() {
        let mut stats = StatsCollector::new();
        stats.record(&row(0, 90_000, "label0", "Thread-0"));
        assert_eq!(stats.percentile(99), (BUCKET_COUNT as u64 - 1) * BUCKET_WIDTH_MS);
    }
}
