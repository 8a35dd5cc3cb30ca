// src/candidates/handlers/mod.rs

pub mod access;
pub mod applications;
pub mod bulk;

pub use access::*;
pub use applications::*;
pub use bulk::*;
