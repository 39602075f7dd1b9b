use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use sarathi_core::MatchSource;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    direct_total: AtomicU64,
    fuzzy_total: AtomicU64,
    semantic_total: AtomicU64,
    fallback_total: AtomicU64,
    malformed_total: AtomicU64,
    collaborator_failures_total: AtomicU64,
    verification_rejects_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub direct_total: u64,
    pub fuzzy_total: u64,
    pub semantic_total: u64,
    pub fallback_total: u64,
    pub malformed_total: u64,
    pub collaborator_failures_total: u64,
    pub verification_rejects_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_source(&self, source: MatchSource) {
        let counter = match source {
            MatchSource::Direct => &self.direct_total,
            MatchSource::Fuzzy => &self.fuzzy_total,
            MatchSource::Semantic => &self.semantic_total,
            MatchSource::Fallback => &self.fallback_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_malformed(&self) {
        self.malformed_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_collaborator_failure(&self) {
        self.collaborator_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_verification_reject(&self) {
        self.verification_rejects_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            direct_total: self.direct_total.load(Ordering::Relaxed),
            fuzzy_total: self.fuzzy_total.load(Ordering::Relaxed),
            semantic_total: self.semantic_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            malformed_total: self.malformed_total.load(Ordering::Relaxed),
            collaborator_failures_total: self.collaborator_failures_total.load(Ordering::Relaxed),
            verification_rejects_total: self.verification_rejects_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

/// JSON logs on stderr; stdout belongs to the record stream.
pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,sarathi_agents=info,sarathi_llm=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
            .init();
    });
}
