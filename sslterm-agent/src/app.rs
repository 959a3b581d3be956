use crate::context::HookContext;
use crate::outbox::{Outbox, SnapshotDeployer, SnapshotProxy, SnapshotReverseProxy};
use sslterm_core::config::SourceKind;
use sslterm_core::{AgentConfig, AppSettings, ReconcilerState};
use sslterm_observability::MetricsCollector;
use sslterm_reconciler::{
    Conditions, DirectSource, Outcome, Reconciler, TwoHopSource, UpstreamSource,
};
use sslterm_store::StateFile;
use std::io::Write;
use tracing::{info, warn};

/// One hook run: load flags, reconcile, emit messages, persist flags.
///
/// Messages are written before the flags are saved. If the process dies
/// in between, the next run repeats the send, which the proxy treats as
/// an idempotent resubmission.
pub fn run_hook(
    config: &AgentConfig,
    context: &HookContext,
    store: &StateFile,
    metrics: &MetricsCollector,
    out: &mut dyn Write,
) -> anyhow::Result<Outcome> {
    let settings = AppSettings::from_source(&context.config);
    let mut persisted = store.load()?;
    let settings_changed = persisted.settings_changed(&settings);

    let kind = config.agent.source;
    let conditions = context.conditions(kind, settings_changed);
    info!(
        source = %kind,
        peer = conditions.peer_available,
        upstream = conditions.source_available,
        config_changed = conditions.config_changed,
        source_changed = conditions.source_changed,
        status_updated = conditions.status_updated,
        "hook context loaded"
    );

    let outbox = Outbox::default();
    let proxy = SnapshotProxy::new(context.proxy_status(), &outbox);

    let outcome = match kind {
        SourceKind::TwoHop => {
            let deployer = SnapshotDeployer::new(context.deployer.workers.clone(), &outbox);
            let source = TwoHopSource::new(&deployer);
            drive(config, &source, &proxy, &outbox, persisted.flags, conditions, &settings)
        }
        SourceKind::Direct => {
            let registry = SnapshotReverseProxy::new(context.services());
            let source = DirectSource::new(&registry);
            drive(config, &source, &proxy, &outbox, persisted.flags, conditions, &settings)
        }
    };

    let sent = outbox.flush_to(out)?;

    persisted.record(outcome.state, outcome.upstreams, &settings);

    for action in &outcome.actions {
        metrics.record_action(action.name());
    }
    metrics.record_run(outcome.passes(), &outcome.state, persisted.upstreams);
    if let Some(path) = &config.observability.metrics.textfile
        && let Err(e) = metrics.write_textfile(path)
    {
        warn!(path = %path.display(), error = %e, "failed to write metrics textfile");
    }

    store.save(&persisted)?;

    info!(
        passes = outcome.passes(),
        messages = sent,
        requested = outcome.state.requested,
        confirmed = outcome.state.confirmed,
        provisioned = outcome.state.provisioned,
        settled = outcome.settled,
        "hook complete"
    );
    Ok(outcome)
}

fn drive(
    config: &AgentConfig,
    source: &dyn UpstreamSource,
    proxy: &SnapshotProxy<'_>,
    outbox: &Outbox,
    flags: ReconcilerState,
    conditions: Conditions,
    settings: &AppSettings,
) -> Outcome {
    Reconciler::new(source, proxy, outbox, config.agent.app_name.clone())
        .with_max_passes(config.agent.max_passes)
        .run(flags, conditions, settings)
}
