//! Health statistics and monitoring for the exporter.
//!
//! This module tracks scrape performance, failures and HTTP request rates and
//! renders them as the plain-text table served on `/health`.

use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use container_state_exporter::CollectorStats;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns (last, avg, max, min, count).
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Thread-safe circular buffer for tracking HTTP request timestamps.
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(1024)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            // Keep only last 10 minutes of timestamps to avoid unbounded growth
            if let Some(cutoff) = now.checked_sub(Duration::from_secs(600)) {
                while guard.front().is_some_and(|&t| t < cutoff) {
                    guard.pop_front();
                }
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        if let Ok(guard) = self.inner.lock() {
            match Instant::now().checked_sub(Duration::from_secs(60)) {
                Some(cutoff) => guard.iter().filter(|&&t| t >= cutoff).count() as u64,
                None => guard.len() as u64,
            }
        } else {
            0
        }
    }
}

/// Scrape and request statistics for the exporter.
pub struct HealthStats {
    pub scrape_duration_ms: Stat,
    pub samples_per_scrape: Stat,
    pub response_size_kb: Stat,
    pub scrape_success_count: AtomicU64,
    pub scrape_failure_count: AtomicU64,
    pub http_request_timestamps: RequestTimestamps,
    pub start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            scrape_duration_ms: Stat::default(),
            samples_per_scrape: Stat::default(),
            response_size_kb: Stat::default(),
            scrape_success_count: AtomicU64::new(0),
            scrape_failure_count: AtomicU64::new(0),
            http_request_timestamps: RequestTimestamps::default(),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_scrape_success(&self, duration_ms: f64, samples: usize, response_bytes: usize) {
        self.scrape_success_count.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_ms.add_sample(duration_ms);
        self.samples_per_scrape.add_sample(samples as f64);
        self.response_size_kb
            .add_sample(response_bytes as f64 / 1024.0);
    }

    pub fn record_scrape_failure(&self) {
        self.scrape_failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn get_scrape_success_rate(&self) -> f64 {
        let success = self.scrape_success_count.load(Ordering::Relaxed);
        let failure = self.scrape_failure_count.load(Ordering::Relaxed);
        let total = success + failure;
        if total == 0 {
            100.0
        } else {
            (success as f64 / total as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn render_table(&self, collector: &CollectorStats) -> String {
        let (sd_cur, sd_avg, sd_max, sd_min, _) = self.scrape_duration_ms.snapshot();
        let (sp_cur, sp_avg, sp_max, sp_min, _) = self.samples_per_scrape.snapshot();
        let (rs_cur, rs_avg, rs_max, rs_min, _) = self.response_size_kb.snapshot();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(out, "{}", "-".repeat(left_col + 4 * (col_w + 3))).ok();

        for (label, cur, avg, max, min) in [
            ("scrape duration (ms)", sd_cur, sd_avg, sd_max, sd_min),
            ("samples per scrape", sp_cur, sp_avg, sp_max, sp_min),
            ("response size (KB)", rs_cur, rs_avg, rs_max, rs_min),
        ] {
            writeln!(
                out,
                "{:left$} | {:>col$.2} | {:>col$.2} | {:>col$.2} | {:>col$.2}",
                label,
                cur,
                avg,
                max,
                min,
                left = left_col,
                col = col_w
            )
            .ok();
        }

        writeln!(out).ok();
        writeln!(out, "SCRAPES").ok();
        writeln!(out, "-------").ok();
        writeln!(
            out,
            "{:left$} : {}",
            "successful",
            self.scrape_success_count.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "failed",
            self.scrape_failure_count.load(Ordering::Relaxed),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {:.1}%",
            "success rate",
            self.get_scrape_success_rate(),
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "http requests (last 60s)",
            self.http_request_timestamps.count_last_minute(),
            left = left_col
        )
        .ok();

        writeln!(out).ok();
        writeln!(out, "SNAPSHOT CACHE").ok();
        writeln!(out, "--------------").ok();
        writeln!(out, "{:left$} : {}", "refreshes", collector.refreshes, left = left_col).ok();
        writeln!(
            out,
            "{:left$} : {}",
            "refresh failures",
            collector.refresh_failures,
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "stale snapshots served",
            collector.stale_served,
            left = left_col
        )
        .ok();
        writeln!(
            out,
            "{:left$} : {}",
            "containers in snapshot",
            collector.containers,
            left = left_col
        )
        .ok();
        let last_refresh = collector
            .last_refresh_unix
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .map(|ts| ts.to_rfc3339())
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(out, "{:left$} : {}", "last refresh", last_refresh, left = left_col).ok();

        out
    }
}
