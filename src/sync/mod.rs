//! Optimistic sync: the pending edit queue and the rename cascade

mod cascade;
mod queue;

pub use cascade::{cascade_rename, rewrite_references};
pub use queue::{FlushFailure, FlushReport, PendingQueue};
