use sha2::{Digest, Sha256};
use sslterm_core::AppSettings;

/// SHA-256 over the settings whose change invalidates a certificate
/// request: fqdns, credentials and nodeport. Contact email is left out.
///
/// Fields are separated by a unit separator so that moving text between
/// fields changes the digest.
pub fn fingerprint(settings: &AppSettings) -> String {
    let mut hasher = Sha256::new();
    for fqdn in &settings.fqdns {
        hasher.update(fqdn.as_bytes());
        hasher.update(b"\n");
    }
    hasher.update(b"\x1f");
    hasher.update(settings.credentials.as_bytes());
    hasher.update(b"\x1f");
    if let Some(port) = settings.nodeport {
        hasher.update(port.to_string().as_bytes());
    }
    format!("{:x}", hasher.finalize())
}
