use serde::{Deserialize, Serialize};

/// Edge events delivered by the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    /// fqdns, credentials or nodeport changed.
    ConfigChanged,
    /// The upstream source published new data.
    SourceChanged,
    /// The proxy published a new status report.
    StatusUpdated,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::ConfigChanged => "config-changed",
            Trigger::SourceChanged => "source-changed",
            Trigger::StatusUpdated => "status-updated",
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Condition snapshot for one reconcile pass.
///
/// The two `*_available` fields are levels (true for as long as the
/// relation exists). The rest are edges: they describe what happened since
/// the previous run and are consumed once a pass has seen them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conditions {
    pub peer_available: bool,
    pub source_available: bool,
    pub source_changed: bool,
    pub config_changed: bool,
    pub status_updated: bool,
}

impl Conditions {
    pub fn available(peer_available: bool, source_available: bool) -> Self {
        Self {
            peer_available,
            source_available,
            ..Default::default()
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        match trigger {
            Trigger::ConfigChanged => self.config_changed = true,
            Trigger::SourceChanged => self.source_changed = true,
            Trigger::StatusUpdated => self.status_updated = true,
        }
        self
    }

    pub fn with_triggers(self, triggers: impl IntoIterator<Item = Trigger>) -> Self {
        triggers.into_iter().fold(self, Conditions::with_trigger)
    }

    /// Same levels, no pending edges.
    pub fn consume_edges(self) -> Self {
        Self::available(self.peer_available, self.source_available)
    }

    pub fn inputs_changed(&self) -> bool {
        self.config_changed || self.source_changed
    }
}
