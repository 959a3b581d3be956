use crate::upstream::Upstream;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Certificate request sent to the termination proxy.
///
/// Empty fields are skipped on the wire, so the retraction request
/// (`CertRequest::retract()`) serializes to `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fqdn: Vec<String>,

    #[serde(default, rename = "contact-email", skip_serializing_if = "String::is_empty")]
    pub contact_email: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credentials: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Upstream>,
}

impl CertRequest {
    /// The "no certificate wanted" request.
    pub fn retract() -> Self {
        Self::default()
    }

    pub fn is_retraction(&self) -> bool {
        self.fqdn.is_empty()
            && self.contact_email.is_empty()
            && self.credentials.is_empty()
            && self.upstreams.is_empty()
    }
}

/// One proxy unit's report: the hostnames it has issued certificates for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    #[serde(default)]
    pub status: Vec<String>,
}

impl UnitStatus {
    pub fn new<S: Into<String>>(hostnames: impl IntoIterator<Item = S>) -> Self {
        Self {
            status: hostnames.into_iter().map(Into::into).collect(),
        }
    }

    /// First issued hostname that is also one of `fqdns`.
    ///
    /// A shared certificate is reported under a single name, so any
    /// overlap counts as issued.
    pub fn confirms<'a>(&'a self, fqdns: &[String]) -> Option<&'a str> {
        self.status
            .iter()
            .find(|issued| fqdns.iter().any(|f| f == *issued))
            .map(String::as_str)
    }
}

/// Parse the proxy's status payload unit by unit.
///
/// Anything that is not a list yields no units; individual units that do
/// not have the `{status: [..]}` shape are skipped. Malformed input never
/// fails, it simply cannot confirm anything.
pub fn parse_status(value: &serde_json::Value) -> Vec<UnitStatus> {
    let Some(units) = value.as_array() else {
        if !value.is_null() {
            debug!(payload = %value, "proxy status is not a list, ignoring");
        }
        return Vec::new();
    };

    units
        .iter()
        .filter_map(|unit| match serde_json::from_value::<UnitStatus>(unit.clone()) {
            Ok(s) => Some(s),
            Err(e) => {
                debug!(error = %e, unit = %unit, "skipping malformed unit status");
                None
            }
        })
        .collect()
}
