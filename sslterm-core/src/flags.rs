use serde::{Deserialize, Serialize};

/// Everything the agent remembers between hook runs.
///
/// `confirmed` implies `requested`; the setters below keep that true no
/// matter which order flags are touched in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerState {
    /// A certificate request was sent and has not been retracted.
    #[serde(default)]
    pub requested: bool,

    /// The proxy reported the certificate as issued.
    #[serde(default)]
    pub confirmed: bool,

    /// The workload-creation request was sent (two-hop source only).
    #[serde(default)]
    pub provisioned: bool,
}

impl ReconcilerState {
    pub fn mark_requested(&mut self) {
        self.requested = true;
    }

    /// No-op unless a request is outstanding.
    pub fn mark_confirmed(&mut self) {
        if self.requested {
            self.confirmed = true;
        }
    }

    pub fn mark_provisioned(&mut self) {
        self.provisioned = true;
    }

    /// Drop the request; confirmation goes with it.
    pub fn clear_request(&mut self) {
        self.requested = false;
        self.confirmed = false;
    }

    /// Forget everything so the next pass re-requests from scratch.
    pub fn reset(&mut self, clear_provisioned: bool) {
        self.clear_request();
        if clear_provisioned {
            self.provisioned = false;
        }
    }

    pub fn is_consistent(&self) -> bool {
        !self.confirmed || self.requested
    }
}
