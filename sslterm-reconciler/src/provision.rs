//! Workload-creation document for the two-hop source.
//!
//! The deployer runs whatever resources it is handed; sslterm asks for a
//! `NodePort` service so every worker exposes the workload on one port.

use serde::Serialize;
use std::collections::BTreeMap;

pub const FQDNS_ANNOTATION: &str = "sslterm.io/fqdns";

const SERVICE_PORT: u16 = 80;

/// What the deployer needs to expose the workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    pub fqdns: Vec<String>,
    pub nodeport: u16,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceManifest {
    api_version: &'static str,
    kind: &'static str,
    metadata: Metadata,
    spec: ServiceSpec,
}

#[derive(Serialize)]
struct Metadata {
    name: String,
    labels: BTreeMap<String, String>,
    annotations: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct ServiceSpec {
    #[serde(rename = "type")]
    service_type: &'static str,
    selector: BTreeMap<String, String>,
    ports: Vec<ServicePort>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServicePort {
    name: &'static str,
    protocol: &'static str,
    port: u16,
    target_port: u16,
    node_port: u16,
}

impl WorkloadSpec {
    pub fn new(app_name: &str, fqdns: &[String], nodeport: u16) -> Self {
        Self {
            name: sanitize_name(app_name),
            fqdns: fqdns.to_vec(),
            nodeport,
        }
    }

    /// Resource list handed to the deployer's create request.
    pub fn to_resources(&self) -> Vec<serde_json::Value> {
        let app_label = BTreeMap::from([("app".to_string(), self.name.clone())]);
        let manifest = ServiceManifest {
            api_version: "v1",
            kind: "Service",
            metadata: Metadata {
                name: self.name.clone(),
                labels: app_label.clone(),
                annotations: BTreeMap::from([(
                    FQDNS_ANNOTATION.to_string(),
                    self.fqdns.join(" "),
                )]),
            },
            spec: ServiceSpec {
                service_type: "NodePort",
                selector: app_label,
                ports: vec![ServicePort {
                    name: "http",
                    protocol: "TCP",
                    port: SERVICE_PORT,
                    target_port: SERVICE_PORT,
                    node_port: self.nodeport,
                }],
            },
        };

        // Plain structs of strings and integers always serialize.
        match serde_json::to_value(&manifest) {
            Ok(v) => vec![v],
            Err(e) => {
                tracing::error!(error = %e, "failed to render workload resource");
                Vec::new()
            }
        }
    }
}

/// Lowercase RFC 1123 label: invalid characters become `-`, trimmed to 63.
pub fn sanitize_name(raw: &str) -> String {
    let mapped: String = raw
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() { c } else { '-' }
        })
        .collect();
    let trimmed: String = mapped.trim_matches('-').chars().take(63).collect();
    let trimmed = trimmed.trim_end_matches('-').to_string();
    if trimmed.is_empty() {
        "sslterm".to_string()
    } else {
        trimmed
    }
}
