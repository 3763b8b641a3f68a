//! Shared types and models for the Duka POS platform
//!
//! This crate contains domain models and the pure bookkeeping math shared
//! between the backend and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
