//! Database models for the Duka POS backend
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
