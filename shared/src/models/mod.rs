//! Domain models for the Duka POS platform

mod customer;
mod inventory;
mod product;
mod sale;

pub use customer::*;
pub use inventory::*;
pub use product::*;
pub use sale::*;
