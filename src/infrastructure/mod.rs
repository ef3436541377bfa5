//! Infrastructure layer: concrete implementations of domain contracts.
//!
//! - [`cache`] - Redis and no-op caches for public lookups
//! - [`persistence`] - PostgreSQL and in-memory repositories
//! - [`odesli`] - HTTP client for the external link resolver

pub mod cache;
pub mod odesli;
pub mod persistence;
