//! # cairn-core
//!
//! Core types, traits, and abstractions for the cairn knowledge base.
//!
//! This crate provides the record model, the context assembler used by the
//! semantic-search pipeline, and the trait seams behind which the database,
//! vector index, inference, and file-storage implementations live.

pub mod context;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use context::{assemble_context, AssembledContext, ContextConfig};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
