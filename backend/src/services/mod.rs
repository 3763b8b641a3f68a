//! Business logic services for the Duka POS backend

pub mod customer;
pub mod inventory;
pub mod product;
pub mod sales;

pub use customer::CustomerService;
pub use inventory::InventoryService;
pub use product::ProductService;
pub use sales::SalesService;
