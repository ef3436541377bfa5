//! Helpers shared across layers.
//!
//! - [`slug`] - Slug normalization
//! - [`short_id`] - ShortId generation and shape validation
//! - [`timeout`] - Bounded store calls
//! - [`base_url`] - External base URL from request headers
//! - [`country`] - Visitor country from the geolocation header

pub mod base_url;
pub mod country;
pub mod short_id;
pub mod slug;
pub mod timeout;
