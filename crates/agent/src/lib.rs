//! Conversational order intake for marea.
//!
//! The pipeline is a constrained loop:
//! 1. **Prompting** (`parse`) — the catalog and customer roster are embedded
//!    in the extraction prompt so the model can anchor its guesses.
//! 2. **Completion** (`llm`) — a pluggable [`llm::LlmClient`] backend.
//! 3. **Decoding** (`parse`) — tolerant JSON extraction into the structured
//!    order shape; malformed output is a recoverable failure.
//! 4. **Orchestration** (`service`) — deterministic resolution, pricing,
//!    persistence, and ledger linking.
//!
//! The model is strictly a translator. It never decides a price, a total, or
//! a balance; those are computed deterministically from the catalog and the
//! stored documents.

pub mod llm;
pub mod parse;
pub mod service;

pub use llm::LlmClient;
pub use parse::ParseError;
pub use service::{LinkOutcome, OrderOutcome, OrderService, ServiceError};
