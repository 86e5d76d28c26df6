//! Financial Document Analyzer
//!
//! Reads a financial PDF, normalizes its text, and runs a fixed crew of
//! agents over it:
//! - A deterministic verifier decides whether the document is financial
//! - An analyst answers the user's query from the document
//! - An advisor and a risk assessor build on the analyst's findings
//!
//! PIPELINE:
//! LOAD → NORMALIZE → VERIFY → ANALYZE → INVEST → RISK → REPORT

pub mod agents;
pub mod api;
pub mod config;
pub mod crew;
pub mod document;
pub mod error;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod tasks;
pub mod tools;
pub mod verification;

pub use error::{AnalyzerError, Result};

// Re-export common types
pub use models::*;
pub use normalize::{normalize, normalize_text};
