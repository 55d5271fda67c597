//! Process-wide counters for upstream calls and cache behaviour.
//!
//! One [`Metrics`] instance is created at startup and handed to every
//! adapter and cached service as an `Arc`. Every collector lives in the
//! instance's own [`Registry`], rendered by `/metrics`.

use crate::service::Provider;
use crate::Result;
use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Outcome label for upstream calls and repository fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallStatus {
    Success,
    Failure,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    pub fn from_ok(ok: bool) -> Self {
        if ok {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

pub struct Metrics {
    registry: Registry,
    api_calls: IntCounterVec,
    api_call_duration: HistogramVec,
    repository_fetches: IntCounterVec,
    cache_hits: IntCounter,
    cache_misses: IntCounter,
    cache_read_errors: IntCounter,
    cache_write_errors: IntCounter,
    stat_fallbacks: IntCounter,
}

/// Point-in-time copy of the scalar counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_read_errors: u64,
    pub cache_write_errors: u64,
    pub stat_fallbacks: u64,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let counter = |name: &str, help: &str| {
            register_int_counter_with_registry!(Opts::new(name, help), registry)
        };

        Ok(Self {
            api_calls: register_int_counter_vec_with_registry!(
                Opts::new("gits_api_calls_total", "Total number of API calls."),
                &["api_type", "endpoint", "status"],
                registry
            )?,
            api_call_duration: register_histogram_vec_with_registry!(
                HistogramOpts::new("gits_api_call_duration_seconds", "Duration of API calls.")
                    .buckets(prometheus::linear_buckets(0.1, 0.1, 10)?),
                &["api_type", "endpoint"],
                registry
            )?,
            repository_fetches: register_int_counter_vec_with_registry!(
                Opts::new(
                    "gits_repository_fetches_total",
                    "Total number of repository fetch attempts."
                ),
                &["provider", "status"],
                registry
            )?,
            cache_hits: counter("gits_cache_hits_total", "Cache lookups served from the cache.")?,
            cache_misses: counter("gits_cache_misses_total", "Cache lookups that went upstream.")?,
            cache_read_errors: counter(
                "gits_cache_read_errors_total",
                "Cache reads that failed and were treated as misses.",
            )?,
            cache_write_errors: counter("gits_cache_write_errors_total", "Cache writes that failed.")?,
            stat_fallbacks: counter(
                "gits_commit_stat_fallbacks_total",
                "Commits whose stats fell back to zero.",
            )?,
            registry,
        })
    }

    pub fn record_api_call(
        &self,
        provider: Provider,
        endpoint: &'static str,
        status: CallStatus,
        elapsed: Duration,
    ) {
        self.api_calls
            .with_label_values(&[provider.as_str(), endpoint, status.as_str()])
            .inc();
        self.api_call_duration
            .with_label_values(&[provider.as_str(), endpoint])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_repository_fetch(&self, provider: Provider, status: CallStatus) {
        self.repository_fetches
            .with_label_values(&[provider.as_str(), status.as_str()])
            .inc();
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.inc();
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.inc();
    }

    pub fn record_cache_read_error(&self) {
        self.cache_read_errors.inc();
    }

    pub fn record_cache_write_error(&self) {
        self.cache_write_errors.inc();
    }

    pub fn record_stat_fallback(&self) {
        self.stat_fallbacks.inc();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.get(),
            cache_misses: self.cache_misses.get(),
            cache_read_errors: self.cache_read_errors.get(),
            cache_write_errors: self.cache_write_errors.get(),
            stat_fallbacks: self.stat_fallbacks.get(),
        }
    }

    /// Number of upstream calls recorded for one provider/endpoint/status
    pub fn api_call_count(&self, provider: Provider, endpoint: &'static str, status: CallStatus) -> u64 {
        self.api_calls
            .get_metric_with_label_values(&[provider.as_str(), endpoint, status.as_str()])
            .map(|counter| counter.get())
            .unwrap_or(0)
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| crate::Error::Internal(e.to_string()))
    }
}
