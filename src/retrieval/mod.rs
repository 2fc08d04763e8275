//! Retrieval pipeline: query validation, planning, filtering, and ranking
//! stitched together over the current index snapshot.

mod filters;
mod service;
mod types;

pub use service::{RetrievalApi, RetrievalService, RetrievalSettings};
pub use types::{AdvancedSearchOutcome, RetrievalError, SearchHit};
