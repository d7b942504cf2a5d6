//! # cairn-inference
//!
//! Inference backends for cairn: a Cohere HTTP client implementing the
//! embedding and generation traits, and a deterministic mock backend for
//! tests.

pub mod cohere;
pub mod mock;

pub use cohere::CohereBackend;
pub use mock::MockBackend;
