//! Business logic services for the application layer.

pub mod auth_service;
pub mod identifier_allocator;
pub mod smartlink_service;

pub use auth_service::{DevIdentityProvider, IdentityProvider, TokenIdentityProvider};
pub use identifier_allocator::IdentifierAllocator;
pub use smartlink_service::{
    CreateSmartLink, PlatformShare, SmartLinkAnalytics, SmartLinkService, build_analytics,
};
