//! Prometheus metrics registry.

use prometheus::{Counter, Encoder, Gauge, Histogram, HistogramOpts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub requests_total: Counter,
    pub errors_total: Counter,
    pub processing_seconds: Histogram,
    pub phoneme_kl: Gauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = Counter::new("worker_requests_total", "Total messages processed")?;
        let errors_total = Counter::new("worker_errors_total", "Total errors")?;
        let processing_seconds = Histogram::with_opts(HistogramOpts::new(
            "worker_processing_seconds",
            "Audio processing latency (s)",
        ))?;
        let phoneme_kl = Gauge::new("worker_phoneme_kl", "KL divergence vs baseline")?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(processing_seconds.clone()))?;
        registry.register(Box::new(phoneme_kl.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            errors_total,
            processing_seconds,
            phoneme_kl,
        })
    }

    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buf = Vec::new();
        encoder.encode(&families, &mut buf).unwrap_or_default();
        String::from_utf8(buf).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_registered_metric_names() {
        let metrics = Metrics::new().unwrap();
        metrics.requests_total.inc();
        let text = metrics.encode();
        assert!(text.contains("worker_requests_total"));
    }
}
