pub mod cert;
pub mod config;
pub mod error;
pub mod flags;
pub mod settings;
pub mod status;
pub mod upstream;

pub use cert::{CertRequest, UnitStatus};
pub use config::AgentConfig;
pub use error::SslTermError;
pub use flags::ReconcilerState;
pub use settings::{AppSettings, ConfigSource};
pub use status::{StatusMessage, WorkloadState};
pub use upstream::Upstream;
