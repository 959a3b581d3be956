use crate::endpoints::{DeployerEndpoint, ReverseProxyEndpoint};
use sslterm_core::config::SourceKind;
use sslterm_core::upstream::{self, Upstream};
use sslterm_core::AppSettings;
use tracing::{debug, warn};

/// Strategy for finding the backends a certificate request should carry.
///
/// An empty list means "not published yet" and is never an error.
pub trait UpstreamSource {
    fn kind(&self) -> SourceKind;

    /// Current upstreams, sorted and deduplicated.
    fn upstreams(&self, settings: &AppSettings) -> Vec<Upstream>;

    /// Forward the workload-creation resources. Only two-hop sources
    /// provision anything.
    fn submit_provision(&self, resources: Vec<serde_json::Value>) {
        warn!(
            source = %self.kind(),
            count = resources.len(),
            "source does not accept provisioning requests, dropping"
        );
    }
}

/// Upstreams from a kubernetes deployer: every worker behind the shared node port.
pub struct TwoHopSource<E> {
    endpoint: E,
}

impl<E: DeployerEndpoint> TwoHopSource<E> {
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }
}

impl<E: DeployerEndpoint> UpstreamSource for TwoHopSource<E> {
    fn kind(&self) -> SourceKind {
        SourceKind::TwoHop
    }

    fn upstreams(&self, settings: &AppSettings) -> Vec<Upstream> {
        let Some(port) = settings.nodeport else {
            debug!("no nodeport configured, deployer upstreams unavailable");
            return Vec::new();
        };

        let found: Vec<Upstream> = self
            .endpoint
            .worker_addresses()
            .into_iter()
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .map(|addr| Upstream::new(addr.clone(), addr, port))
            .collect();

        debug!(workers = found.len(), port, "discovered deployer workers");
        upstream::normalize(found)
    }

    fn submit_provision(&self, resources: Vec<serde_json::Value>) {
        self.endpoint.send_create_request(resources);
    }
}

/// Upstreams straight from a reverse-proxy relation, all services flattened.
pub struct DirectSource<E> {
    endpoint: E,
}

impl<E: ReverseProxyEndpoint> DirectSource<E> {
    pub fn new(endpoint: E) -> Self {
        Self { endpoint }
    }
}

impl<E: ReverseProxyEndpoint> UpstreamSource for DirectSource<E> {
    fn kind(&self) -> SourceKind {
        SourceKind::Direct
    }

    fn upstreams(&self, _settings: &AppSettings) -> Vec<Upstream> {
        let services = self.endpoint.services();
        let found: Vec<Upstream> = services
            .into_iter()
            .flat_map(|svc| svc.hosts)
            .collect();

        debug!(hosts = found.len(), "discovered reverse-proxy hosts");
        upstream::normalize(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::ServiceHosts;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDeployer {
        workers: Vec<String>,
        created: Mutex<Vec<Vec<serde_json::Value>>>,
    }

    impl DeployerEndpoint for FakeDeployer {
        fn worker_addresses(&self) -> Vec<String> {
            self.workers.clone()
        }
        fn send_create_request(&self, resources: Vec<serde_json::Value>) {
            self.created.lock().unwrap().push(resources);
        }
    }

    struct FakeRegistry(Vec<ServiceHosts>);

    impl ReverseProxyEndpoint for FakeRegistry {
        fn services(&self) -> Vec<ServiceHosts> {
            self.0.clone()
        }
    }

    fn with_nodeport(port: Option<u16>) -> AppSettings {
        AppSettings {
            fqdns: vec!["a.example.com".into()],
            nodeport: port,
            ..Default::default()
        }
    }

    // ── TwoHopSource ────────────────────────────────────────────

    #[test]
    fn two_hop_builds_one_upstream_per_worker_on_nodeport() {
        let deployer = FakeDeployer {
            workers: vec!["10.0.0.2".into(), "10.0.0.1".into()],
            ..Default::default()
        };
        let source = TwoHopSource::new(&deployer);
        let ups = source.upstreams(&with_nodeport(Some(30080)));
        assert_eq!(
            ups,
            vec![
                Upstream::new("10.0.0.1", "10.0.0.1", 30080),
                Upstream::new("10.0.0.2", "10.0.0.2", 30080),
            ]
        );
    }

    #[test]
    fn two_hop_without_workers_is_empty() {
        let deployer = FakeDeployer::default();
        let source = TwoHopSource::new(&deployer);
        assert!(source.upstreams(&with_nodeport(Some(30080))).is_empty());
    }

    #[test]
    fn two_hop_without_nodeport_is_empty() {
        let deployer = FakeDeployer {
            workers: vec!["10.0.0.1".into()],
            ..Default::default()
        };
        let source = TwoHopSource::new(&deployer);
        assert!(source.upstreams(&with_nodeport(None)).is_empty());
    }

    #[test]
    fn two_hop_skips_blank_addresses() {
        let deployer = FakeDeployer {
            workers: vec!["".into(), "  ".into(), "10.0.0.3".into()],
            ..Default::default()
        };
        let source = TwoHopSource::new(&deployer);
        assert_eq!(source.upstreams(&with_nodeport(Some(80))).len(), 1);
    }

    #[test]
    fn two_hop_forwards_provisioning() {
        let deployer = FakeDeployer::default();
        let source = TwoHopSource::new(&deployer);
        source.submit_provision(vec![serde_json::json!({"kind": "Service"})]);
        assert_eq!(deployer.created.lock().unwrap().len(), 1);
        assert_eq!(source.kind(), SourceKind::TwoHop);
    }

    // ── DirectSource ────────────────────────────────────────────

    #[test]
    fn direct_flattens_all_services() {
        let registry = FakeRegistry(vec![
            ServiceHosts {
                service_name: "web".into(),
                hosts: vec![Upstream::new("web-0", "10.0.0.1", 8080)],
            },
            ServiceHosts {
                service_name: "api".into(),
                hosts: vec![
                    Upstream::new("api-0", "10.0.0.2", 9000),
                    Upstream::new("api-1", "10.0.0.3", 9000),
                ],
            },
        ]);
        let source = DirectSource::new(&registry);
        let ups = source.upstreams(&AppSettings::default());
        assert_eq!(ups.len(), 3);
        assert_eq!(ups[0].hostname, "api-0");
        assert_eq!(ups[2].port, 8080);
    }

    #[test]
    fn direct_with_no_hosts_is_empty() {
        let registry = FakeRegistry(vec![ServiceHosts::default()]);
        let source = DirectSource::new(&registry);
        assert!(source.upstreams(&AppSettings::default()).is_empty());
        assert_eq!(source.kind(), SourceKind::Direct);
    }

    #[test]
    fn direct_ignores_provisioning() {
        let registry = FakeRegistry(Vec::new());
        let source = DirectSource::new(&registry);
        // default impl only logs
        source.submit_provision(vec![serde_json::json!({})]);
    }
}
