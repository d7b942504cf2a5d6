//! Pipeline services shared by the handlers.

pub mod indexing;
pub mod qa;
