use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use sslterm_core::ReconcilerState;
use std::path::Path;

/// Reconcile metrics. Every field is gated behind `enabled`.
///
/// When disabled no registry is created and every recording call returns
/// immediately.
pub struct MetricsCollector {
    enabled: bool,
    registry: Option<Registry>,
    pub actions_total: Option<IntCounterVec>,
    pub passes: Option<IntGauge>,
    pub requested: Option<IntGauge>,
    pub confirmed: Option<IntGauge>,
    pub upstreams: Option<IntGauge>,
}

impl MetricsCollector {
    /// Create a new collector. When `enabled = false`, everything is None.
    pub fn new(enabled: bool) -> anyhow::Result<Self> {
        if !enabled {
            return Ok(Self {
                enabled: false,
                registry: None,
                actions_total: None,
                passes: None,
                requested: None,
                confirmed: None,
                upstreams: None,
            });
        }

        let registry = Registry::new();

        let actions_total = IntCounterVec::new(
            Opts::new("reconcile_actions_total", "Reconcile actions taken").namespace("sslterm"),
            &["action"],
        )?;
        let passes = IntGauge::with_opts(
            Opts::new("reconcile_passes", "Passes in the last hook run").namespace("sslterm"),
        )?;
        let requested = IntGauge::with_opts(
            Opts::new("certificate_requested", "1 while a certificate request is outstanding")
                .namespace("sslterm"),
        )?;
        let confirmed = IntGauge::with_opts(
            Opts::new("certificate_confirmed", "1 once the proxy confirmed issuance")
                .namespace("sslterm"),
        )?;
        let upstreams = IntGauge::with_opts(
            Opts::new("upstreams", "Upstreams in the outstanding certificate request").namespace("sslterm"),
        )?;

        registry.register(Box::new(actions_total.clone()))?;
        registry.register(Box::new(passes.clone()))?;
        registry.register(Box::new(requested.clone()))?;
        registry.register(Box::new(confirmed.clone()))?;
        registry.register(Box::new(upstreams.clone()))?;

        Ok(Self {
            enabled: true,
            registry: Some(registry),
            actions_total: Some(actions_total),
            passes: Some(passes),
            requested: Some(requested),
            confirmed: Some(confirmed),
            upstreams: Some(upstreams),
        })
    }

    /// Count one executed action (no-op when disabled).
    #[inline]
    pub fn record_action(&self, action: &str) {
        if let Some(ref counter) = self.actions_total {
            counter.with_label_values(&[action]).inc();
        }
    }

    /// Record the end-of-run picture.
    pub fn record_run(&self, passes: usize, state: &ReconcilerState, upstreams: usize) {
        if !self.enabled {
            return;
        }
        if let Some(ref g) = self.passes {
            g.set(passes as i64);
        }
        if let Some(ref g) = self.requested {
            g.set(i64::from(state.requested));
        }
        if let Some(ref g) = self.confirmed {
            g.set(i64::from(state.confirmed));
        }
        if let Some(ref g) = self.upstreams {
            g.set(upstreams as i64);
        }
    }

    /// Render prometheus text exposition format.
    pub fn render(&self) -> String {
        if let Some(ref registry) = self.registry {
            let encoder = TextEncoder::new();
            let metric_families = registry.gather();
            let mut buffer = Vec::new();
            encoder.encode(&metric_families, &mut buffer).unwrap_or(());
            String::from_utf8(buffer).unwrap_or_default()
        } else {
            String::new()
        }
    }

    /// Write the exposition atomically for a textfile collector.
    /// Does nothing when disabled.
    pub fn write_textfile(&self, path: &Path) -> anyhow::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "metrics textfile written");
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
