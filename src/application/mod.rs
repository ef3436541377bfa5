//! Application layer: orchestrates repositories, the cache and domain rules.
//!
//! - [`services::smartlink_service::SmartLinkService`] - SmartLink lifecycle and counters
//! - [`services::identifier_allocator::IdentifierAllocator`] - Unique slug and shortId allocation
//! - [`services::auth_service`] - Identity providers for the admin API

pub mod services;
