//! `kassa-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the shared error model. Analytics and any
//! future domain crates build on top of it.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::ProductId;
