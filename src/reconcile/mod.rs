// Snapshot reconciliation and highlight timing

mod diff;
mod identity;
mod scheduler;

pub use diff::{ChangeRecord, DiffEngine, MergeKind, Reconciliation};
pub use identity::IdentityMap;
pub use scheduler::{HighlightConfig, HighlightPhase, HighlightScheduler, Transition};

#[cfg(test)]
mod tests;
