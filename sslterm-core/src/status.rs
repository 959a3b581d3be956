use serde::{Deserialize, Serialize};

/// Workload status states understood by the status reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadState {
    Blocked,
    Waiting,
    Active,
}

impl WorkloadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadState::Blocked => "blocked",
            WorkloadState::Waiting => "waiting",
            WorkloadState::Active => "active",
        }
    }
}

impl std::fmt::Display for WorkloadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `(state, message)` pair for the status reporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub state: WorkloadState,
    pub message: String,
}

impl StatusMessage {
    pub fn blocked(message: impl Into<String>) -> Self {
        Self {
            state: WorkloadState::Blocked,
            message: message.into(),
        }
    }

    pub fn waiting(message: impl Into<String>) -> Self {
        Self {
            state: WorkloadState::Waiting,
            message: message.into(),
        }
    }

    pub fn active(message: impl Into<String>) -> Self {
        Self {
            state: WorkloadState::Active,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&WorkloadState::Blocked).unwrap(), "\"blocked\"");
        assert_eq!(serde_json::to_string(&WorkloadState::Active).unwrap(), "\"active\"");
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!(serde_json::from_str::<WorkloadState>("\"maintenance\"").is_err());
    }

    #[test]
    fn display_matches_as_str() {
        for s in [
            WorkloadState::Blocked,
            WorkloadState::Waiting,
            WorkloadState::Active,
        ] {
            assert_eq!(s.to_string(), s.as_str());
        }
    }

    #[test]
    fn constructors_set_state() {
        assert_eq!(StatusMessage::waiting("x").state, WorkloadState::Waiting);
        assert_eq!(StatusMessage::active("Ready").message, "Ready");
    }
}
