pub mod conditions;
pub mod discovery;
pub mod driver;
pub mod endpoints;
pub mod provision;
pub mod rules;

pub use conditions::{Conditions, Trigger};
pub use discovery::{DirectSource, TwoHopSource, UpstreamSource};
pub use driver::{Outcome, Reconciler};
pub use rules::{Action, Decision, Snapshot, reconcile};
