//! Request middleware for the Duka POS backend

mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser};
