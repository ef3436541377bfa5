//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated
//! by `mockall` for service tests.
//!
//! - [`SmartLinkRepository`] - SmartLink records, counters and identifier checks
//! - [`UserRepository`] - Owners
//! - [`TokenRepository`] - API token authentication

pub mod smartlink_repository;
pub mod token_repository;
pub mod user_repository;

pub use smartlink_repository::{
    SitemapEntry, SmartLinkFilter, SmartLinkRepository, SmartLinkTotals, SortKey, SortOrder,
};
pub use token_repository::{ApiToken, TokenRepository, TokenSelector};
pub use user_repository::UserRepository;

#[cfg(test)]
pub use smartlink_repository::MockSmartLinkRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
