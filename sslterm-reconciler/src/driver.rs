use crate::conditions::{Conditions, Trigger};
use crate::discovery::UpstreamSource;
use crate::endpoints::{ProxyEndpoint, StatusReporter};
use crate::rules::{self, Action, Decision, Snapshot};
use sslterm_core::{AppSettings, CertRequest, ReconcilerState, UnitStatus, Upstream};
use tracing::{debug, info, warn};

const DEFAULT_MAX_PASSES: usize = 8;

/// Runs the decision table against live collaborators.
///
/// Holds no flags of its own: state goes in, state comes out, and the
/// caller persists it between hook runs. Within one run it keeps
/// re-evaluating while passes make progress, the way handlers re-fire once
/// their preconditions become true.
pub struct Reconciler<'a> {
    source: &'a dyn UpstreamSource,
    proxy: &'a dyn ProxyEndpoint,
    reporter: &'a dyn StatusReporter,
    app_name: String,
    max_passes: usize,
}

/// What one hook run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub state: ReconcilerState,
    /// One entry per pass, in order.
    pub actions: Vec<Action>,
    /// Upstreams carried by the request sent in this run, if any.
    pub upstreams: Option<usize>,
    /// False when the pass limit cut the run short.
    pub settled: bool,
}

impl Outcome {
    pub fn passes(&self) -> usize {
        self.actions.len()
    }

    pub fn count(&self, name: &str) -> usize {
        self.actions.iter().filter(|a| a.name() == name).count()
    }
}

impl<'a> Reconciler<'a> {
    pub fn new(
        source: &'a dyn UpstreamSource,
        proxy: &'a dyn ProxyEndpoint,
        reporter: &'a dyn StatusReporter,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            source,
            proxy,
            reporter,
            app_name: app_name.into(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Handle a single named trigger on top of the current availability.
    pub fn on_trigger(
        &self,
        trigger: Trigger,
        state: ReconcilerState,
        availability: Conditions,
        settings: &AppSettings,
    ) -> Outcome {
        self.run(state, availability.with_trigger(trigger), settings)
    }

    /// Evaluate until a pass settles or the pass limit is hit.
    pub fn run(
        &self,
        mut state: ReconcilerState,
        mut conditions: Conditions,
        settings: &AppSettings,
    ) -> Outcome {
        let mut actions = Vec::new();
        let mut upstream_count = None;
        let mut settled = false;

        for pass in 1..=self.max_passes {
            let upstreams = self.fetch_upstreams(&conditions, &state, settings);
            let status = self.fetch_status(&conditions, &state);

            let decision = rules::reconcile(&Snapshot {
                kind: self.source.kind(),
                app_name: &self.app_name,
                conditions,
                state,
                settings,
                upstreams: &upstreams,
                status: &status,
            });

            debug!(
                pass,
                action = decision.action.name(),
                requested = decision.state.requested,
                confirmed = decision.state.confirmed,
                provisioned = decision.state.provisioned,
                "reconcile pass"
            );

            self.execute(&decision);
            if let Action::SubmitCertRequest(request) = &decision.action {
                upstream_count = Some(request.upstreams.len());
            }
            state = decision.state;
            let done = decision.action.is_settled();
            actions.push(decision.action);
            conditions = conditions.consume_edges();

            if done {
                settled = true;
                break;
            }
        }

        if !settled {
            warn!(
                max_passes = self.max_passes,
                "reconcile did not settle within the pass limit"
            );
        }

        Outcome {
            state,
            actions,
            upstreams: upstream_count,
            settled,
        }
    }

    fn fetch_upstreams(
        &self,
        conditions: &Conditions,
        state: &ReconcilerState,
        settings: &AppSettings,
    ) -> Vec<Upstream> {
        if conditions.peer_available && conditions.source_available && !state.requested {
            self.source.upstreams(settings)
        } else {
            Vec::new()
        }
    }

    fn fetch_status(&self, conditions: &Conditions, state: &ReconcilerState) -> Vec<UnitStatus> {
        if conditions.status_updated && state.requested && !state.confirmed {
            self.proxy.status()
        } else {
            Vec::new()
        }
    }

    fn execute(&self, decision: &Decision) {
        match &decision.action {
            Action::Noop => {}
            Action::Block(reason) => {
                info!(reason = %reason, "blocked");
            }
            Action::Reset => {
                info!("inputs changed, certificate request will be rebuilt");
            }
            Action::SubmitProvision(spec) => {
                info!(name = %spec.name, nodeport = spec.nodeport, "requesting workload creation");
                self.source.submit_provision(spec.to_resources());
            }
            Action::SubmitCertRequest(request) => {
                let targets: Vec<String> =
                    request.upstreams.iter().map(Upstream::socket_addr).collect();
                info!(
                    fqdns = ?request.fqdn,
                    upstreams = ?targets,
                    "requesting certificate"
                );
                self.proxy.send_cert_info(request);
            }
            Action::ConfirmCertificate { fqdn } => {
                info!(fqdn = %fqdn, "certificate confirmed by proxy");
            }
            Action::Retract => {
                info!("upstream relation gone, retracting certificate request");
                self.proxy.send_cert_info(&CertRequest::retract());
            }
        }

        if let Some(status) = &decision.status {
            self.reporter.set_status(status);
        }
    }
}
