//! File-based persistence for reconciler flags.
//!
//! The flags written at the end of one hook run are the flags the next run
//! starts from. The file is written atomically: first to a `.tmp` sibling,
//! then renamed over the final path, so a crash mid-write leaves the
//! previous state intact.

use crate::fingerprint::fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sslterm_core::{AppSettings, ReconcilerState, SslTermError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The shape serialized to / deserialized from the state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub flags: ReconcilerState,

    /// Fingerprint of the settings the current flags were derived from.
    #[serde(default)]
    pub settings_fingerprint: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Upstreams carried by the outstanding request, 0 when none is.
    #[serde(default)]
    pub upstreams: usize,
}

impl PersistedState {
    /// True when the tracked settings differ from those last seen, or when
    /// nothing was seen yet.
    pub fn settings_changed(&self, settings: &AppSettings) -> bool {
        self.settings_fingerprint.as_deref() != Some(fingerprint(settings).as_str())
    }

    /// Record the outcome of a hook run. `sent` is the upstream count of
    /// the request sent during the run, if one was.
    pub fn record(&mut self, flags: ReconcilerState, sent: Option<usize>, settings: &AppSettings) {
        if let Some(n) = sent {
            self.upstreams = n;
        }
        if !flags.requested {
            self.upstreams = 0;
        }
        self.flags = flags;
        self.settings_fingerprint = Some(fingerprint(settings));
        self.updated_at = Some(Utc::now());
    }
}

pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state.
    ///
    /// * missing file   → default state (first run)
    /// * malformed file → warning, default state
    /// * unreadable     → error
    pub fn load(&self) -> Result<PersistedState, SslTermError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no state file found, starting fresh");
            return Ok(PersistedState::default());
        }

        let data = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<PersistedState>(&data) {
            Ok(state) => {
                if !state.flags.is_consistent() {
                    warn!(
                        path = %self.path.display(),
                        "state file has confirmed without requested, clearing confirmation"
                    );
                    let mut state = state;
                    state.flags.confirmed = false;
                    return Ok(state);
                }
                debug!(path = %self.path.display(), flags = ?state.flags, "state loaded");
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "state file is malformed, ignoring");
                Ok(PersistedState::default())
            }
        }
    }

    /// Write `state` atomically.
    pub fn save(&self, state: &PersistedState) -> Result<(), SslTermError> {
        let json = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                SslTermError::State(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| SslTermError::State(format!("failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
