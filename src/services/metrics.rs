//! Prometheus counters for the HTTP surface and the price cycle.
//!
//! Every `AppState` owns its own registry, so parallel tests never share
//! counters. `GET /metrics` renders the registry in text format.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::{
    models::AssetClass,
    services::{aggregator::FetchOutcome, alert_monitor::CycleReport},
};

struct MetricsInner {
    registry: Registry,
    http_requests: IntCounterVec,
    cycles: IntCounter,
    fetch_failures: IntCounterVec,
    alerts_triggered: IntCounter,
    events_delivered: IntCounter,
    events_dropped: IntCounter,
}

impl MetricsInner {
    fn build() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("marketsentry".to_string()), None)?;

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "HTTP requests served"),
            &["method", "status"],
        )?;
        let cycles = IntCounter::new("price_cycles_total", "Completed price cycles")?;
        let fetch_failures = IntCounterVec::new(
            Opts::new("price_fetch_failures_total", "Failed or timed out class fetches"),
            &["class"],
        )?;
        let alerts_triggered = IntCounter::new("alerts_triggered_total", "Alerts moved to triggered")?;
        let events_delivered = IntCounter::new("hub_events_delivered_total", "Hub events queued to subscribers")?;
        let events_dropped = IntCounter::new("hub_events_dropped_total", "Hub events dropped on full queues")?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(cycles.clone()))?;
        registry.register(Box::new(fetch_failures.clone()))?;
        registry.register(Box::new(alerts_triggered.clone()))?;
        registry.register(Box::new(events_delivered.clone()))?;
        registry.register(Box::new(events_dropped.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            cycles,
            fetch_failures,
            alerts_triggered,
            events_delivered,
            events_dropped,
        })
    }
}

#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl Metrics {
    pub fn new() -> Self {
        // static definitions only
        let inner = MetricsInner::build().expect("static metric definitions are valid");
        Self { inner: Arc::new(inner) }
    }

    pub fn record_request(&self, method: &str, status: u16) {
        let status = status.to_string();
        self.inner
            .http_requests
            .with_label_values(&[method, status.as_str()])
            .inc();
    }

    /// Folds one cycle's report into the counters. Idle cycles count as
    /// cycles but touch nothing else.
    pub fn record_cycle(&self, report: &CycleReport) {
        self.inner.cycles.inc();

        for (class, outcome) in &report.aggregation.outcomes {
            if let FetchOutcome::Failed(_) = outcome {
                self.inner
                    .fetch_failures
                    .with_label_values(&[class.as_str()])
                    .inc();
            }
        }

        if let Some(evaluation) = &report.evaluation {
            self.inner.alerts_triggered.inc_by(evaluation.promoted() as u64);
            self.inner.events_delivered.inc_by(evaluation.delivery.delivered as u64);
            self.inner.events_dropped.inc_by(evaluation.delivery.dropped as u64);
        }
    }

    pub fn requests(&self, method: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.inner
            .http_requests
            .with_label_values(&[method, status.as_str()])
            .get()
    }

    pub fn cycles(&self) -> u64 {
        self.inner.cycles.get()
    }

    pub fn fetch_failures(&self, class: AssetClass) -> u64 {
        self.inner
            .fetch_failures
            .with_label_values(&[class.as_str()])
            .get()
    }

    pub fn alerts_triggered(&self) -> u64 {
        self.inner.alerts_triggered.get()
    }

    pub fn events_delivered(&self) -> u64 {
        self.inner.events_delivered.get()
    }

    pub fn events_dropped(&self) -> u64 {
        self.inner.events_dropped.get()
    }

    /// Renders every registered metric in Prometheus text format.
    pub fn to_prometheus_text(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.inner.registry.gather(), &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
