pub mod fingerprint;
pub mod state_file;

pub use fingerprint::fingerprint;
pub use state_file::{PersistedState, StateFile};
