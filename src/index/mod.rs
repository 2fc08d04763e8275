//! In-memory knowledge index: chunk types, the snapshot slot, and the batched builder.
//!
//! A build produces an immutable [`IndexSnapshot`] off to the side and installs it
//! into the [`KnowledgeIndex`] slot as its very last step. Searches clone the current
//! `Arc` and never see a half-built index; failed builds leave the slot untouched.

mod builder;
mod store;
mod types;

pub use builder::build_snapshot;
pub use store::KnowledgeIndex;
pub use types::{Chunk, IndexSnapshot, IndexStatus, IndexSummary};
