//! HTTP handlers for the Duka POS backend

pub mod customers;
pub mod health;
pub mod inventory;
pub mod products;
pub mod sales;

pub use customers::*;
pub use health::*;
pub use inventory::*;
pub use products::*;
pub use sales::*;
