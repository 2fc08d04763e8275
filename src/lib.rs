#![deny(missing_docs)]

//! Core library for the financial knowledge-base retrieval server.

/// HTTP routing and REST handlers.
pub mod api;
/// Paragraph and sentence aware text chunking.
pub mod chunking;
/// Environment-driven configuration management.
pub mod config;
/// Corpus loading, validation, and tag derivation.
pub mod corpus;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Chat-completion client abstraction and adapters.
pub mod generation;
/// In-memory embedding index snapshots.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Build and search counters.
pub mod metrics;
/// Query planning via the generation provider.
pub mod planner;
/// Cosine similarity scoring and ranking.
pub mod ranking;
/// The retrieval pipeline tying everything together.
pub mod retrieval;
