use figment::{Figment, providers::{Env, Format, Yaml}};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Where upstreams come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// A kubernetes deployer that runs the workload and reports worker IPs.
    TwoHop,
    /// A reverse-proxy relation that already publishes host:port entries.
    Direct,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::TwoHop => "two-hop",
            SourceKind::Direct => "direct",
        }
    }

    /// Name of the upstream-providing relation endpoint.
    pub fn endpoint_name(&self) -> &'static str {
        match self {
            SourceKind::TwoHop => "kubernetes-deployer",
            SourceKind::Direct => "reverseproxy",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Application name, used to name provisioned workload resources.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_source")]
    pub source: SourceKind,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Upper bound on reconcile passes per hook run.
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Observability settings. Metrics are disabled by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// When false, no registry is created at all.
    #[serde(default)]
    pub enabled: bool,
    /// node-exporter textfile target; nothing is written when unset.
    #[serde(default)]
    pub textfile: Option<PathBuf>,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_app_name() -> String { "sslterm".into() }
fn default_source() -> SourceKind { SourceKind::TwoHop }
fn default_state_file() -> PathBuf { PathBuf::from("/var/lib/sslterm/state.json") }
fn default_max_passes() -> usize { 8 }
fn default_log_format() -> LogFormat { LogFormat::Text }

// ── Impls ─────────────────────────────────────────────────────

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            source: default_source(),
            state_file: default_state_file(),
            max_passes: default_max_passes(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from YAML file + env overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let config: AgentConfig = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SSLTERM_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), crate::SslTermError> {
        if self.agent.app_name.trim().is_empty() {
            return Err(crate::SslTermError::Config("agent.app_name must not be empty".into()));
        }
        if self.agent.max_passes == 0 {
            return Err(crate::SslTermError::Config("agent.max_passes must be at least 1".into()));
        }
        Ok(())
    }
}
