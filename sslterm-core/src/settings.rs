use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::warn;

pub const FQDNS: &str = "fqdns";
pub const CREDENTIALS: &str = "credentials";
pub const CONTACT_EMAIL: &str = "contact-email";
pub const NODEPORT: &str = "nodeport";

static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\*\.)?([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .expect("hostname regex is valid")
});

/// Synchronous read access to the application's named settings.
pub trait ConfigSource {
    /// Current value of `key`, or `None` when unset.
    fn get(&self, key: &str) -> Option<String>;
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl ConfigSource for serde_json::Map<String, serde_json::Value> {
    fn get(&self, key: &str) -> Option<String> {
        match serde_json::Map::get(self, key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Snapshot of the application settings for one reconcile cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Hostnames the certificate must cover, in configured order.
    pub fqdns: Vec<String>,
    pub credentials: String,
    pub contact_email: String,
    /// Shared node port for the two-hop source. Zero counts as unset.
    pub nodeport: Option<u16>,
}

impl AppSettings {
    pub fn from_source(source: &dyn ConfigSource) -> Self {
        let fqdns = source.get(FQDNS).map(|s| parse_fqdns(&s)).unwrap_or_default();

        let nodeport = source.get(NODEPORT).and_then(|raw| {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<u16>() {
                Ok(0) => None,
                Ok(port) => Some(port),
                Err(_) => {
                    warn!(value = %raw, "nodeport is not a valid port, treating as unset");
                    None
                }
            }
        });

        let settings = Self {
            fqdns,
            credentials: source.get(CREDENTIALS).unwrap_or_default(),
            contact_email: source.get(CONTACT_EMAIL).unwrap_or_default(),
            nodeport,
        };

        for bad in settings.invalid_fqdns() {
            warn!(fqdn = %bad, "configured fqdn is not a valid hostname");
        }

        settings
    }

    pub fn has_fqdns(&self) -> bool {
        !self.fqdns.is_empty()
    }

    /// Configured names that do not look like DNS hostnames.
    pub fn invalid_fqdns(&self) -> Vec<&str> {
        self.fqdns
            .iter()
            .filter(|f| f.len() > 253 || !HOSTNAME.is_match(f))
            .map(String::as_str)
            .collect()
    }
}

/// Split the raw `fqdns` setting on any whitespace, dropping repeats.
pub fn parse_fqdns(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw.split_whitespace() {
        if !out.iter().any(|seen| seen == name) {
            out.push(name.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_fqdns_splits_on_newlines_and_spaces() {
        let out = parse_fqdns("a.example.com b.example.com\nc.example.com\n");
        assert_eq!(out, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }

    #[test]
    fn parse_fqdns_drops_duplicates_keeping_order() {
        let out = parse_fqdns("b.example.com a.example.com b.example.com");
        assert_eq!(out, vec!["b.example.com", "a.example.com"]);
    }

    #[test]
    fn parse_fqdns_blank_is_empty() {
        assert!(parse_fqdns("  \n\t ").is_empty());
    }

    #[test]
    fn from_source_applies_defaults() {
        let s = AppSettings::from_source(&source(&[("fqdns", "a.example.com")]));
        assert_eq!(s.fqdns, vec!["a.example.com"]);
        assert_eq!(s.credentials, "");
        assert_eq!(s.contact_email, "");
        assert_eq!(s.nodeport, None);
        assert!(s.has_fqdns());
    }

    #[test]
    fn from_source_reads_every_field() {
        let s = AppSettings::from_source(&source(&[
            ("fqdns", "a.example.com"),
            ("credentials", "secret"),
            ("contact-email", "ops@example.com"),
            ("nodeport", "30080"),
        ]));
        assert_eq!(s.credentials, "secret");
        assert_eq!(s.contact_email, "ops@example.com");
        assert_eq!(s.nodeport, Some(30080));
    }

    #[test]
    fn nodeport_zero_or_garbage_is_unset() {
        let zero = AppSettings::from_source(&source(&[("nodeport", "0")]));
        assert_eq!(zero.nodeport, None);
        let garbage = AppSettings::from_source(&source(&[("nodeport", "http")]));
        assert_eq!(garbage.nodeport, None);
        let too_big = AppSettings::from_source(&source(&[("nodeport", "70000")]));
        assert_eq!(too_big.nodeport, None);
    }

    #[test]
    fn json_map_source_stringifies_numbers() {
        let map = serde_json::json!({"fqdns": "a.example.com", "nodeport": 30080, "credentials": null});
        let map = map.as_object().unwrap().clone();
        let s = AppSettings::from_source(&map);
        assert_eq!(s.nodeport, Some(30080));
        assert_eq!(s.credentials, "");
    }

    #[test]
    fn invalid_fqdns_are_reported() {
        let s = AppSettings {
            fqdns: vec![
                "a.example.com".into(),
                "*.example.com".into(),
                "bad_name.example.com".into(),
                "-lead.example.com".into(),
            ],
            ..Default::default()
        };
        assert_eq!(s.invalid_fqdns(), vec!["bad_name.example.com", "-lead.example.com"]);
    }
}
