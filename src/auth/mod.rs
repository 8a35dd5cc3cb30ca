//! # Auth Module
//!
//! JWT bearer authentication for HR users:
//! - Token generation and validation
//! - AuthedHr extractor for protected routes
//! - Admin guard derived from the configured admin email list

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;

#[cfg(test)]
mod tests;

pub use extractors::AuthedHr;
pub use models::HrUser;
pub use routes::auth_routes;
