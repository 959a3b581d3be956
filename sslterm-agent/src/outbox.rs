//! Snapshot-backed collaborators.
//!
//! Reads come from the hook context; every send is queued in an [`Outbox`]
//! and handed back to the event bus as JSON lines once the run finishes.

use serde::Serialize;
use sslterm_core::config::SourceKind;
use sslterm_core::{CertRequest, StatusMessage, UnitStatus};
use sslterm_reconciler::endpoints::{
    DeployerEndpoint, ProxyEndpoint, ReverseProxyEndpoint, ServiceHosts, StatusReporter,
};
use sslterm_reconciler::rules::PROXY_ENDPOINT;
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// One message for the event bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outbound {
    CertInfo {
        endpoint: &'static str,
        #[serde(rename = "cert-info")]
        request: CertRequest,
    },
    CreateRequest {
        endpoint: &'static str,
        resources: Vec<serde_json::Value>,
    },
    Status(StatusMessage),
}

#[derive(Debug, Default)]
pub struct Outbox {
    messages: Mutex<Vec<Outbound>>,
}

impl Outbox {
    // A poisoned lock still holds every queued message; never drop one.
    fn push(&self, message: Outbound) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }

    pub fn messages(&self) -> Vec<Outbound> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write every queued message as one JSON line, in send order.
    pub fn flush_to(&self, out: &mut dyn Write) -> anyhow::Result<usize> {
        let messages = self.messages();
        for message in &messages {
            serde_json::to_writer(&mut *out, message)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(messages.len())
    }
}

impl StatusReporter for Outbox {
    fn set_status(&self, status: &StatusMessage) {
        self.push(Outbound::Status(status.clone()));
    }
}

pub struct SnapshotProxy<'a> {
    status: Vec<UnitStatus>,
    outbox: &'a Outbox,
}

impl<'a> SnapshotProxy<'a> {
    pub fn new(status: Vec<UnitStatus>, outbox: &'a Outbox) -> Self {
        Self { status, outbox }
    }
}

impl ProxyEndpoint for SnapshotProxy<'_> {
    fn send_cert_info(&self, request: &CertRequest) {
        self.outbox.push(Outbound::CertInfo {
            endpoint: PROXY_ENDPOINT,
            request: request.clone(),
        });
    }

    fn status(&self) -> Vec<UnitStatus> {
        self.status.clone()
    }
}

pub struct SnapshotDeployer<'a> {
    workers: Vec<String>,
    outbox: &'a Outbox,
}

impl<'a> SnapshotDeployer<'a> {
    pub fn new(workers: Vec<String>, outbox: &'a Outbox) -> Self {
        Self { workers, outbox }
    }
}

impl DeployerEndpoint for SnapshotDeployer<'_> {
    fn worker_addresses(&self) -> Vec<String> {
        self.workers.clone()
    }

    fn send_create_request(&self, resources: Vec<serde_json::Value>) {
        self.outbox.push(Outbound::CreateRequest {
            endpoint: SourceKind::TwoHop.endpoint_name(),
            resources,
        });
    }
}

pub struct SnapshotReverseProxy {
    services: Vec<ServiceHosts>,
}

impl SnapshotReverseProxy {
    pub fn new(services: Vec<ServiceHosts>) -> Self {
        Self { services }
    }
}

impl ReverseProxyEndpoint for SnapshotReverseProxy {
    fn services(&self) -> Vec<ServiceHosts> {
        self.services.clone()
    }
}
