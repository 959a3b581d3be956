//! Collaborators the reconciler talks to.
//!
//! Sends are fire-and-forget; reads return whatever the bus snapshotted
//! for the current hook run.

use serde::{Deserialize, Serialize};
use sslterm_core::{CertRequest, StatusMessage, UnitStatus, Upstream};

/// The TLS-termination proxy.
pub trait ProxyEndpoint {
    fn send_cert_info(&self, request: &CertRequest);

    /// Per-unit issuance report. Unparseable units are already dropped.
    fn status(&self) -> Vec<UnitStatus>;
}

/// Human-readable workload status.
pub trait StatusReporter {
    fn set_status(&self, status: &StatusMessage);
}

/// Kubernetes deployer that runs the workload (two-hop source).
pub trait DeployerEndpoint {
    fn worker_addresses(&self) -> Vec<String>;
    fn send_create_request(&self, resources: Vec<serde_json::Value>);
}

/// Reverse-proxy relation that publishes ready-made host entries (direct source).
pub trait ReverseProxyEndpoint {
    fn services(&self) -> Vec<ServiceHosts>;
}

/// One logical service published by a reverse-proxy relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHosts {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub hosts: Vec<Upstream>,
}

impl<T: DeployerEndpoint + ?Sized> DeployerEndpoint for &T {
    fn worker_addresses(&self) -> Vec<String> {
        (**self).worker_addresses()
    }

    fn send_create_request(&self, resources: Vec<serde_json::Value>) {
        (**self).send_create_request(resources)
    }
}

impl<T: ReverseProxyEndpoint + ?Sized> ReverseProxyEndpoint for &T {
    fn services(&self) -> Vec<ServiceHosts> {
        (**self).services()
    }
}
