//! Command implementations
//!
//! One module per CLI mode: listing-only and full diagnosis.

pub mod diagnose;
pub mod list;
