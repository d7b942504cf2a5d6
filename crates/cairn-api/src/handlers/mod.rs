//! HTTP request handlers.

pub mod records;
pub mod search;
