//! The hook context: everything the event bus knows for one run.
//!
//! Accepted as YAML or JSON (JSON parses as YAML).

use serde::Deserialize;
use serde_json::Value;
use sslterm_core::cert::parse_status;
use sslterm_core::config::SourceKind;
use sslterm_core::{SslTermError, UnitStatus};
use sslterm_reconciler::endpoints::ServiceHosts;
use sslterm_reconciler::{Conditions, Trigger};
use std::io::Read;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookContext {
    /// Name of the hook that fired, e.g. `kubernetes-deployer-relation-changed`.
    #[serde(default)]
    pub event: Option<String>,

    /// Edges the bus wants handled explicitly.
    #[serde(default)]
    pub triggers: Vec<Trigger>,

    /// Raw application settings.
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,

    #[serde(default)]
    pub proxy: ProxyRelation,

    #[serde(default)]
    pub deployer: DeployerRelation,

    #[serde(default)]
    pub reverseproxy: ReverseProxyRelation,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyRelation {
    #[serde(default)]
    pub available: bool,
    /// Left untyped: a bad payload must not fail the hook.
    #[serde(default)]
    pub status: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeployerRelation {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub workers: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReverseProxyRelation {
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub services: Vec<Value>,
}

impl HookContext {
    /// Read from a file, or from stdin when `source` is `-`.
    pub fn read(source: &str) -> Result<Self, SslTermError> {
        let raw = if source == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(Path::new(source)).map_err(|e| {
                SslTermError::Context(format!("cannot read hook context {source}: {e}"))
            })?
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, SslTermError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Conditions for the first pass of this run.
    pub fn conditions(&self, kind: SourceKind, settings_changed: bool) -> Conditions {
        let source_available = match kind {
            SourceKind::TwoHop => self.deployer.available,
            SourceKind::Direct => self.reverseproxy.available,
        };

        let mut conditions = Conditions::available(self.proxy.available, source_available)
            .with_triggers(self.triggers.iter().copied());
        if let Some(trigger) = self.event.as_deref().and_then(|e| event_trigger(e, kind)) {
            conditions = conditions.with_trigger(trigger);
        }
        if settings_changed {
            conditions = conditions.with_trigger(Trigger::ConfigChanged);
        }
        conditions
    }

    pub fn proxy_status(&self) -> Vec<UnitStatus> {
        parse_status(&self.proxy.status)
    }

    pub fn services(&self) -> Vec<ServiceHosts> {
        self.reverseproxy
            .services
            .iter()
            .filter_map(|svc| match serde_json::from_value::<ServiceHosts>(svc.clone()) {
                Ok(s) => Some(s),
                Err(e) => {
                    debug!(error = %e, service = %svc, "skipping malformed reverse-proxy service");
                    None
                }
            })
            .collect()
    }
}

/// Edge implied by a relation hook name.
///
/// `config-changed` is deliberately absent: whether tracked settings
/// changed is decided by the settings fingerprint.
fn event_trigger(event: &str, kind: SourceKind) -> Option<Trigger> {
    let relation = event.strip_suffix("-relation-changed")?;
    if relation == "ssl-termination" {
        Some(Trigger::StatusUpdated)
    } else if relation == kind.endpoint_name() {
        Some(Trigger::SourceChanged)
    } else {
        None
    }
}
