use serde::{Deserialize, Serialize};

/// A backend the proxy routes decrypted traffic to.
///
/// Field names follow the relation wire format (`private-address`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Upstream {
    pub hostname: String,

    #[serde(rename = "private-address")]
    pub address: String,

    pub port: u16,
}

impl Upstream {
    pub fn new(hostname: impl Into<String>, address: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            port,
        }
    }

    /// `address:port` as the proxy would dial it.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Sort and deduplicate an upstream list so that two discoveries of the
/// same backends always produce the same request.
pub fn normalize(mut upstreams: Vec<Upstream>) -> Vec<Upstream> {
    upstreams.sort();
    upstreams.dedup();
    upstreams
}
