//! The reconcile decision table.
//!
//! `reconcile` is pure: it looks at one condition snapshot plus the
//! persisted flags and picks exactly one action. Executing that action
//! against the collaborators is the driver's job.
//!
//! Rules, first match wins:
//!
//! | # | When                                          | Action                     |
//! |---|-----------------------------------------------|----------------------------|
//! | 1 | requested, source gone (resets on changed inputs) | `Retract`              |
//! | 2 | config or source changed                      | `Reset`                    |
//! | 3 | peer up, source gone                          | `Block` (upstream relation)|
//! | 4 | source up, peer gone (drops the request)      | `Block` (proxy relation)   |
//! | 5 | both up, not requested, setting missing       | `Block` (setting)          |
//! | 6 | ... two-hop and not provisioned               | `SubmitProvision`          |
//! | 7 | ... no upstreams yet                          | `Noop`                     |
//! | 8 | ... otherwise                                 | `SubmitCertRequest`        |
//! | 9 | requested, unconfirmed, status update overlaps| `ConfirmCertificate`       |
//! | - | anything else                                 | `Noop`                     |

use crate::conditions::Conditions;
use crate::provision::WorkloadSpec;
use sslterm_core::config::SourceKind;
use sslterm_core::{AppSettings, CertRequest, ReconcilerState, StatusMessage, UnitStatus, Upstream};

pub const PROXY_ENDPOINT: &str = "ssl-termination";
pub const MSG_WAITING_FOR_CERT: &str = "Waiting for proxy to register certificate";
pub const MSG_READY: &str = "Ready";

/// The single step a reconcile pass decided on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do until the next trigger.
    Noop,
    /// A required input is missing; the message says which.
    Block(String),
    /// Inputs changed: forget the request so the next pass starts over.
    Reset,
    /// Ask the deployer to create the workload.
    SubmitProvision(WorkloadSpec),
    /// Ask the proxy for a certificate.
    SubmitCertRequest(CertRequest),
    /// The proxy reported this configured hostname as issued.
    ConfirmCertificate { fqdn: String },
    /// Tell the proxy the certificate is no longer wanted.
    Retract,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Noop => "noop",
            Action::Block(_) => "block",
            Action::Reset => "reset",
            Action::SubmitProvision(_) => "submit_provision",
            Action::SubmitCertRequest(_) => "submit_cert_request",
            Action::ConfirmCertificate { .. } => "confirm_certificate",
            Action::Retract => "retract",
        }
    }

    /// A settled pass: running again with the same inputs changes nothing.
    pub fn is_settled(&self) -> bool {
        matches!(self, Action::Noop | Action::Block(_))
    }
}

/// Everything `reconcile` looks at.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub kind: SourceKind,
    pub app_name: &'a str,
    pub conditions: Conditions,
    pub state: ReconcilerState,
    pub settings: &'a AppSettings,
    pub upstreams: &'a [Upstream],
    pub status: &'a [UnitStatus],
}

/// Outcome of one pass: the action, the flags after it, and the status to
/// report (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub state: ReconcilerState,
    pub status: Option<StatusMessage>,
}

impl Decision {
    fn new(action: Action, state: ReconcilerState, status: Option<StatusMessage>) -> Self {
        Self { action, state, status }
    }

    fn block(message: String, state: ReconcilerState) -> Self {
        let status = StatusMessage::blocked(message.clone());
        Self::new(Action::Block(message), state, Some(status))
    }

    fn noop(state: ReconcilerState) -> Self {
        Self::new(Action::Noop, state, None)
    }
}

pub fn reconcile(snap: &Snapshot<'_>) -> Decision {
    let c = snap.conditions;
    let mut state = snap.state;

    if state.requested && !c.source_available {
        // The changed-inputs edge is consumed with this pass, so apply
        // its reset here as well.
        if c.inputs_changed() {
            state.reset(snap.kind == SourceKind::TwoHop);
        } else {
            state.clear_request();
        }
        return Decision::new(Action::Retract, state, None);
    }

    if c.inputs_changed() {
        state.reset(snap.kind == SourceKind::TwoHop);
        return Decision::new(Action::Reset, state, None);
    }

    if c.peer_available && !c.source_available {
        return Decision::block(
            format!("Waiting for {} relation", snap.kind.endpoint_name()),
            state,
        );
    }

    if c.source_available && !c.peer_available {
        // The proxy took the request with it; ask again once it is back.
        state.clear_request();
        return Decision::block(format!("Waiting for {PROXY_ENDPOINT} relation"), state);
    }

    if c.peer_available && c.source_available && !state.requested {
        return request(snap, state);
    }

    if state.requested && !state.confirmed && c.status_updated {
        return confirm(snap, state);
    }

    Decision::noop(state)
}

fn request(snap: &Snapshot<'_>, mut state: ReconcilerState) -> Decision {
    let settings = snap.settings;

    if !settings.has_fqdns() {
        return Decision::block("Waiting for fqdns config".into(), state);
    }

    if snap.kind == SourceKind::TwoHop {
        let Some(nodeport) = settings.nodeport else {
            return Decision::block("Waiting for nodeport config".into(), state);
        };
        if !state.provisioned {
            state.mark_provisioned();
            let spec = WorkloadSpec::new(snap.app_name, &settings.fqdns, nodeport);
            return Decision::new(Action::SubmitProvision(spec), state, None);
        }
    }

    if snap.upstreams.is_empty() {
        return Decision::noop(state);
    }

    let request = CertRequest {
        fqdn: settings.fqdns.clone(),
        contact_email: settings.contact_email.clone(),
        credentials: settings.credentials.clone(),
        upstreams: snap.upstreams.to_vec(),
    };
    state.mark_requested();
    Decision::new(
        Action::SubmitCertRequest(request),
        state,
        Some(StatusMessage::waiting(MSG_WAITING_FOR_CERT)),
    )
}

fn confirm(snap: &Snapshot<'_>, mut state: ReconcilerState) -> Decision {
    let matched = snap
        .status
        .iter()
        .find_map(|unit| unit.confirms(&snap.settings.fqdns));

    match matched {
        Some(fqdn) => {
            state.mark_confirmed();
            Decision::new(
                Action::ConfirmCertificate { fqdn: fqdn.to_string() },
                state,
                Some(StatusMessage::active(MSG_READY)),
            )
        }
        None => Decision::noop(state),
    }
}
